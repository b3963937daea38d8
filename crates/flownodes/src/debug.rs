use async_trait::async_trait;
use flowcore::{EventEmitter, Message, Node, NodeConfig, NodeContext, NodeError};
use flowruntime::{NodeFactory, NodeMetadata, PortDefinition};
use std::sync::Arc;

/// Logs every message it sees and forwards it unchanged
pub struct DebugNode {
    ctx: NodeContext,
}

impl DebugNode {
    pub const NODE_TYPE: &'static str = "debug.log";

    pub fn new(id: impl Into<String>) -> Self {
        Self {
            ctx: NodeContext::in_out(id),
        }
    }

    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.ctx.set_events(events);
        self
    }
}

#[async_trait]
impl Node for DebugNode {
    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn context(&self) -> &NodeContext {
        &self.ctx
    }

    async fn process(&self, message: Message) -> Result<(), NodeError> {
        tracing::info!(
            node_id = %self.id(),
            message_id = %message.id(),
            "DEBUG: {}",
            message.payload_text()
        );
        self.ctx
            .events()
            .info(format!("DEBUG: {}", message.payload_text()));

        // Also log all metadata for visibility
        for (key, value) in message.metadata() {
            tracing::debug!(node_id = %self.id(), "  {}: {:?}", key, value);
        }

        self.emit(message).await;
        Ok(())
    }
}

pub struct DebugNodeFactory;

impl NodeFactory for DebugNodeFactory {
    fn create(
        &self,
        node_id: &str,
        _config: &NodeConfig,
        events: EventEmitter,
    ) -> Result<Arc<dyn Node>, NodeError> {
        flowcore::require_non_blank("Node id", node_id)?;
        Ok(Arc::new(DebugNode::new(node_id).with_events(events)))
    }

    fn node_type(&self) -> &str {
        DebugNode::NODE_TYPE
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Logs messages for debugging and passes them through".to_string(),
            category: "debug".to_string(),
            inputs: vec![PortDefinition::new("in", "Any message")],
            outputs: vec![PortDefinition::new("out", "The same message")],
            config: vec![],
        }
    }
}
