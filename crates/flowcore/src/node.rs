use crate::{EventEmitter, Message, NodeError, OutPort};
use async_trait::async_trait;

/// Input port name of the single-input node shape
pub const IN_PORT: &str = "in";
/// Output port name of the single-output node shape
pub const OUT_PORT: &str = "out";

/// Core trait that all processing nodes implement.
///
/// Implementors provide [`Node::process`]; callers only ever use
/// [`Node::on_message`], which never fails and routes any error from
/// `process` into [`Node::handle_error`]. A failed message leaves the node
/// ready for the next one.
#[async_trait]
pub trait Node: Send + Sync {
    /// Type identifier (e.g. "file.read", "debug.log")
    fn node_type(&self) -> &str;

    /// Ports, id and reporter of this node
    fn context(&self) -> &NodeContext;

    fn id(&self) -> &str {
        self.context().node_id()
    }

    /// Handle one incoming message, emitting zero or more results.
    async fn process(&self, message: Message) -> Result<(), NodeError>;

    /// Entry point used by upstream ports and external drivers.
    async fn on_message(&self, message: Message) {
        if let Err(error) = self.process(message).await {
            self.handle_error(error);
        }
    }

    /// Send a finished message to every connected output port.
    async fn emit(&self, message: Message) {
        self.context().emit(message).await;
    }

    /// Report a processing failure. Nothing is emitted.
    fn handle_error(&self, error: NodeError) {
        tracing::error!(
            node_id = %self.id(),
            node_type = %self.node_type(),
            kind = ?error.kind(),
            "{}",
            error
        );
        self.context().events().failed(&error);
    }
}

/// Identity and wiring of a node instance
#[derive(Debug)]
pub struct NodeContext {
    node_id: String,
    inputs: Vec<String>,
    outputs: Vec<OutPort>,
    events: EventEmitter,
}

impl NodeContext {
    /// A context without ports; add them with `with_input`/`with_output`.
    pub fn new(node_id: impl Into<String>) -> Self {
        let node_id = node_id.into();
        Self {
            events: EventEmitter::detached(node_id.clone()),
            node_id,
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// The one-input, one-output shape used by transform-style nodes.
    pub fn in_out(node_id: impl Into<String>) -> Self {
        Self::new(node_id).with_input(IN_PORT).with_output(OUT_PORT)
    }

    pub fn with_input(mut self, name: impl Into<String>) -> Self {
        self.inputs.push(name.into());
        self
    }

    pub fn with_output(mut self, name: impl Into<String>) -> Self {
        self.outputs.push(OutPort::new(name));
        self
    }

    pub fn set_events(&mut self, events: EventEmitter) {
        self.events = events;
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn events(&self) -> &EventEmitter {
        &self.events
    }

    pub fn inputs(&self) -> &[String] {
        &self.inputs
    }

    pub fn has_input(&self, name: &str) -> bool {
        self.inputs.iter().any(|input| input == name)
    }

    pub fn outputs(&self) -> &[OutPort] {
        &self.outputs
    }

    pub fn output(&self, name: &str) -> Option<&OutPort> {
        self.outputs.iter().find(|port| port.name() == name)
    }

    /// Push `message` through every output port, in declaration order.
    pub async fn emit(&self, message: Message) {
        for port in &self.outputs {
            let delivered = port.propagate(&message).await;
            tracing::trace!(
                node_id = %self.node_id,
                port = %port.name(),
                message_id = %message.id(),
                delivered,
                "Emitted message"
            );
            self.events
                .message_emitted(message.id(), port.name(), delivered);
        }
    }
}
