// crates/flownodes/tests/common/mod.rs
#![allow(dead_code)]

use async_trait::async_trait;
use flowcore::{
    ErrorKind, EventBus, FlowEvent, InPort, Message, Node, NodeContext, NodeError, IN_PORT,
    OUT_PORT,
};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

/// Terminal node collecting everything it receives
pub struct Capture {
    ctx: NodeContext,
    messages: Mutex<Vec<Message>>,
}

impl Capture {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            ctx: NodeContext::in_out(id),
            messages: Mutex::new(Vec::new()),
        })
    }

    pub fn messages(&self) -> Vec<Message> {
        self.messages.lock().unwrap().clone()
    }

    pub fn payloads(&self) -> Vec<String> {
        self.messages()
            .iter()
            .map(Message::payload_text)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.messages.lock().unwrap().len()
    }
}

#[async_trait]
impl Node for Capture {
    fn node_type(&self) -> &str {
        "test.capture"
    }

    fn context(&self) -> &NodeContext {
        &self.ctx
    }

    async fn process(&self, message: Message) -> Result<(), NodeError> {
        self.messages.lock().unwrap().push(message);
        Ok(())
    }
}

/// Connect a fresh capture node to `node`'s output port
pub fn capture_output(node: &dyn Node) -> Arc<Capture> {
    let capture = Capture::new(&format!("{}-capture", node.id()));
    node.context()
        .output(OUT_PORT)
        .expect("node has an output port")
        .connect(InPort::new(IN_PORT, capture.clone()))
        .expect("fresh port connects");
    capture
}

/// Drain pending failure kinds from an event subscription
pub fn failures(rx: &mut broadcast::Receiver<FlowEvent>) -> Vec<ErrorKind> {
    let mut kinds = Vec::new();
    while let Ok(event) = rx.try_recv() {
        if let FlowEvent::NodeFailed { kind, .. } = event {
            kinds.push(kind);
        }
    }
    kinds
}

pub fn event_bus() -> EventBus {
    EventBus::new(256)
}
