use crate::{ErrorKind, MessageId, NodeError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Events published while messages move through a flow
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum FlowEvent {
    MessageEmitted {
        node_id: String,
        message_id: MessageId,
        port: String,
        connections: usize,
        timestamp: DateTime<Utc>,
    },
    NodeFailed {
        node_id: String,
        kind: ErrorKind,
        error: String,
        timestamp: DateTime<Utc>,
    },
    NodeEvent {
        node_id: String,
        event: NodeEvent,
        timestamp: DateTime<Utc>,
    },
}

impl FlowEvent {
    pub fn node_id(&self) -> &str {
        match self {
            FlowEvent::MessageEmitted { node_id, .. }
            | FlowEvent::NodeFailed { node_id, .. }
            | FlowEvent::NodeEvent { node_id, .. } => node_id,
        }
    }
}

/// Events specific to node execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event_type")]
pub enum NodeEvent {
    Info { message: String },
    Warning { message: String },
}

/// Reporter handed to each node.
///
/// A detached emitter (no bus) silently drops everything, which keeps nodes
/// usable in isolation.
#[derive(Clone, Debug)]
pub struct EventEmitter {
    node_id: String,
    sender: Option<broadcast::Sender<FlowEvent>>,
}

impl EventEmitter {
    pub fn new(node_id: impl Into<String>, sender: broadcast::Sender<FlowEvent>) -> Self {
        Self {
            node_id: node_id.into(),
            sender: Some(sender),
        }
    }

    pub fn detached(node_id: impl Into<String>) -> Self {
        Self {
            node_id: node_id.into(),
            sender: None,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn is_attached(&self) -> bool {
        self.sender.is_some()
    }

    fn publish(&self, event: FlowEvent) {
        if let Some(sender) = &self.sender {
            // No subscribers is not an error.
            let _ = sender.send(event);
        }
    }

    /// Emit a node-specific event
    pub fn emit(&self, event: NodeEvent) {
        self.publish(FlowEvent::NodeEvent {
            node_id: self.node_id.clone(),
            event,
            timestamp: Utc::now(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(NodeEvent::Info {
            message: message.into(),
        });
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(NodeEvent::Warning {
            message: message.into(),
        });
    }

    pub fn failed(&self, error: &NodeError) {
        self.publish(FlowEvent::NodeFailed {
            node_id: self.node_id.clone(),
            kind: error.kind(),
            error: error.to_string(),
            timestamp: Utc::now(),
        });
    }

    pub fn message_emitted(&self, message_id: MessageId, port: &str, connections: usize) {
        self.publish(FlowEvent::MessageEmitted {
            node_id: self.node_id.clone(),
            message_id,
            port: port.to_string(),
            connections,
            timestamp: Utc::now(),
        });
    }
}

/// Broadcast bus shared by the nodes of one flow
pub struct EventBus {
    sender: broadcast::Sender<FlowEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<FlowEvent> {
        self.sender.subscribe()
    }

    pub fn emit(&self, event: FlowEvent) {
        let _ = self.sender.send(event);
    }

    pub fn create_emitter(&self, node_id: impl Into<String>) -> EventEmitter {
        EventEmitter::new(node_id, self.sender.clone())
    }
}
