use flowcore::{GraphError, InPort, Message, Node, PortError, IN_PORT, OUT_PORT};
use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use std::sync::Arc;

/// A directed link from one node's output port to another node's input port
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub from_node: String,
    pub from_port: String,
    pub to_node: String,
    pub to_port: String,
}

/// A wired graph of node instances.
///
/// `Flow` owns the nodes, enforces unique ids, rejects connections that would
/// form a cycle or give an input port a second upstream, and lets callers
/// inject messages into any node.
pub struct Flow {
    nodes: HashMap<String, Arc<dyn Node>>,
    graph: DiGraph<String, ()>,
    indices: HashMap<String, NodeIndex>,
    in_ports: HashMap<(String, String), InPort>,
    connections: Vec<Connection>,
}

impl Flow {
    pub fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            graph: DiGraph::new(),
            indices: HashMap::new(),
            in_ports: HashMap::new(),
            connections: Vec::new(),
        }
    }

    pub fn add_node(&mut self, node: Arc<dyn Node>) -> Result<(), GraphError> {
        let id = node.id().to_string();
        if self.nodes.contains_key(&id) {
            return Err(GraphError::DuplicateNode(id));
        }
        let index = self.graph.add_node(id.clone());
        self.indices.insert(id.clone(), index);
        tracing::debug!(node_id = %id, node_type = %node.node_type(), "Added node to flow");
        self.nodes.insert(id, node);
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&Arc<dyn Node>> {
        self.nodes.get(id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    fn lookup(&self, id: &str) -> Result<(Arc<dyn Node>, NodeIndex), GraphError> {
        let node = self
            .nodes
            .get(id)
            .cloned()
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        let index = self
            .indices
            .get(id)
            .copied()
            .ok_or_else(|| GraphError::NodeNotFound(id.to_string()))?;
        Ok((node, index))
    }

    /// Connect `from.from_port` to `to.to_port`.
    pub fn connect(
        &mut self,
        from: &str,
        from_port: &str,
        to: &str,
        to_port: &str,
    ) -> Result<(), GraphError> {
        let (from_node, from_index) = self.lookup(from)?;
        let (to_node, to_index) = self.lookup(to)?;

        let out = from_node
            .context()
            .output(from_port)
            .ok_or_else(|| PortError::UnknownPort {
                node_id: from.to_string(),
                port: from_port.to_string(),
            })?;
        if !to_node.context().has_input(to_port) {
            return Err(PortError::UnknownPort {
                node_id: to.to_string(),
                port: to_port.to_string(),
            }
            .into());
        }

        let edge = self.graph.add_edge(from_index, to_index, ());
        if is_cyclic_directed(&self.graph) {
            self.graph.remove_edge(edge);
            return Err(GraphError::CyclicDependency {
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        let in_port = self
            .in_ports
            .entry((to.to_string(), to_port.to_string()))
            .or_insert_with(|| InPort::new(to_port, to_node.clone()))
            .clone();
        if let Err(err) = out.connect(in_port) {
            self.graph.remove_edge(edge);
            return Err(err.into());
        }

        tracing::info!(from, from_port, to, to_port, "Connected nodes");
        self.connections.push(Connection {
            from_node: from.to_string(),
            from_port: from_port.to_string(),
            to_node: to.to_string(),
            to_port: to_port.to_string(),
        });
        Ok(())
    }

    /// Connect two single-input/single-output nodes on their default ports.
    pub fn pipe(&mut self, from: &str, to: &str) -> Result<(), GraphError> {
        self.connect(from, OUT_PORT, to, IN_PORT)
    }

    /// Nodes without any upstream connection, sorted by id
    pub fn sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = self
            .graph
            .node_indices()
            .filter(|idx| {
                self.graph
                    .neighbors_directed(*idx, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .map(|idx| self.graph[idx].as_str())
            .collect();
        sources.sort_unstable();
        sources
    }

    /// Deliver `message` to a node's entry point and wait for the whole
    /// downstream traversal to finish.
    pub async fn inject(&self, node_id: &str, message: Message) -> Result<(), GraphError> {
        let node = self
            .nodes
            .get(node_id)
            .ok_or_else(|| GraphError::NodeNotFound(node_id.to_string()))?;
        tracing::debug!(node_id, message_id = %message.id(), "Injecting message");
        node.on_message(message).await;
        Ok(())
    }
}

impl Default for Flow {
    fn default() -> Self {
        Self::new()
    }
}
