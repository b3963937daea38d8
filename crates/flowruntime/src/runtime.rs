use crate::{registry::NodeRegistry, Flow};
use flowcore::{EventBus, FlowEvent, GraphError, Node, NodeConfig};
use std::sync::Arc;

/// Node registry plus the event bus every created node reports to
pub struct FlowRuntime {
    registry: Arc<NodeRegistry>,
    event_bus: Arc<EventBus>,
}

impl FlowRuntime {
    /// Runtime with an empty registry
    pub fn new() -> Self {
        Self::with_config(RuntimeConfig::default())
    }

    pub fn with_config(config: RuntimeConfig) -> Self {
        let registry = Arc::new(NodeRegistry::new());
        Self::with_registry(registry, config)
    }

    /// Runtime over an already populated registry, e.g. after
    /// `flownodes::register_all`
    pub fn with_registry(registry: Arc<NodeRegistry>, config: RuntimeConfig) -> Self {
        Self {
            registry,
            event_bus: Arc::new(EventBus::new(config.event_buffer_size)),
        }
    }

    pub fn registry(&self) -> &Arc<NodeRegistry> {
        &self.registry
    }

    /// Build a node of a registered type, wired to this runtime's event bus
    pub fn create_node(
        &self,
        node_type: &str,
        node_id: &str,
        config: &NodeConfig,
    ) -> Result<Arc<dyn Node>, GraphError> {
        let events = self.event_bus.create_emitter(node_id);
        self.registry.create_node(node_type, node_id, config, events)
    }

    /// Build a node and add it to `flow`
    pub fn add_node(
        &self,
        flow: &mut Flow,
        node_type: &str,
        node_id: &str,
        config: &NodeConfig,
    ) -> Result<(), GraphError> {
        let node = self.create_node(node_type, node_id, config)?;
        flow.add_node(node)
    }

    /// Receiver for failures, emits and info events of every node built here
    pub fn subscribe_events(&self) -> tokio::sync::broadcast::Receiver<FlowEvent> {
        self.event_bus.subscribe()
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }
}

impl Default for FlowRuntime {
    fn default() -> Self {
        Self::new()
    }
}

/// Runtime settings
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// Capacity of the event broadcast channel; slow subscribers lag past it
    pub event_buffer_size: usize,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            event_buffer_size: 1000,
        }
    }
}
