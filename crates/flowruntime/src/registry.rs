use flowcore::{EventEmitter, GraphError, Node, NodeConfig, NodeError};
use std::collections::HashMap;
use std::sync::Arc;

/// Builds instances of one node type from string-keyed configuration
pub trait NodeFactory: Send + Sync {
    /// Create a node with the given id and configuration.
    ///
    /// Configuration is validated here, so a bad config never reaches
    /// message processing.
    fn create(
        &self,
        node_id: &str,
        config: &NodeConfig,
        events: EventEmitter,
    ) -> Result<Arc<dyn Node>, NodeError>;

    /// Type name the factory is registered under, e.g. `file.read`
    fn node_type(&self) -> &str;

    /// Description, ports and config keys shown by `flow nodes`
    fn metadata(&self) -> NodeMetadata {
        NodeMetadata::default()
    }
}

/// Human-readable description of a node type
#[derive(Debug, Clone)]
pub struct NodeMetadata {
    pub description: String,
    pub category: String,
    pub inputs: Vec<PortDefinition>,
    pub outputs: Vec<PortDefinition>,
    pub config: Vec<ConfigKey>,
}

impl Default for NodeMetadata {
    fn default() -> Self {
        Self {
            description: String::new(),
            category: "general".to_string(),
            inputs: Vec::new(),
            outputs: Vec::new(),
            config: Vec::new(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PortDefinition {
    pub name: String,
    pub description: String,
}

impl PortDefinition {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ConfigKey {
    pub name: String,
    pub description: String,
    pub required: bool,
}

impl ConfigKey {
    pub fn required(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: true,
        }
    }

    pub fn optional(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            required: false,
        }
    }
}

/// Node types by name.
///
/// Registering a second factory for the same type replaces the first.
pub struct NodeRegistry {
    factories: HashMap<String, Arc<dyn NodeFactory>>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(&mut self, factory: Arc<dyn NodeFactory>) {
        let node_type = factory.node_type().to_string();
        tracing::debug!(node_type = %node_type, "Registered node type");
        if self.factories.insert(node_type.clone(), factory).is_some() {
            tracing::warn!(node_type = %node_type, "Replaced existing factory");
        }
    }

    /// Build a node through the factory registered for `node_type`.
    ///
    /// Factory failures surface as [`GraphError::Node`].
    pub fn create_node(
        &self,
        node_type: &str,
        node_id: &str,
        config: &NodeConfig,
        events: EventEmitter,
    ) -> Result<Arc<dyn Node>, GraphError> {
        let factory = self
            .factories
            .get(node_type)
            .ok_or_else(|| GraphError::UnknownNodeType(node_type.to_string()))?;

        let node = factory.create(node_id, config, events)?;
        tracing::debug!(node_id, node_type, "Created node");
        Ok(node)
    }

    /// Registered type names in lexical order
    pub fn list_node_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self.factories.keys().cloned().collect();
        types.sort();
        types
    }

    pub fn get_metadata(&self, node_type: &str) -> Option<NodeMetadata> {
        self.factories.get(node_type).map(|f| f.metadata())
    }
}

impl Default for NodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
