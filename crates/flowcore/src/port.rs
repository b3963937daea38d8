use crate::{Message, Node, PortError};
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

/// Receiving end of a connection, bound to the node it delivers into.
///
/// Cloning yields another handle to the same port; a port accepts exactly one
/// upstream connection over its lifetime.
#[derive(Clone)]
pub struct InPort {
    inner: Arc<InPortInner>,
}

struct InPortInner {
    name: String,
    node: Arc<dyn Node>,
    connected: AtomicBool,
}

impl InPort {
    pub fn new(name: impl Into<String>, node: Arc<dyn Node>) -> Self {
        Self {
            inner: Arc::new(InPortInner {
                name: name.into(),
                node,
                connected: AtomicBool::new(false),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn node_id(&self) -> &str {
        self.inner.node.id()
    }

    pub fn is_connected(&self) -> bool {
        self.inner.connected.load(Ordering::Acquire)
    }

    /// Hand a message to the owning node's entry point.
    pub async fn receive(&self, message: Message) {
        self.inner.node.on_message(message).await;
    }

    fn claim(&self) -> Result<(), PortError> {
        if self.inner.connected.swap(true, Ordering::AcqRel) {
            return Err(PortError::AlreadyConnected(format!(
                "{}.{}",
                self.node_id(),
                self.name()
            )));
        }
        Ok(())
    }
}

impl fmt::Debug for InPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InPort")
            .field("name", &self.inner.name)
            .field("node_id", &self.node_id())
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// Sending end of a node. Broadcasts to every connected [`InPort`].
pub struct OutPort {
    name: String,
    connections: RwLock<Vec<InPort>>,
}

impl OutPort {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            connections: RwLock::new(Vec::new()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn connect(&self, port: InPort) -> Result<(), PortError> {
        port.claim()?;
        tracing::debug!(
            out_port = %self.name,
            target_node = %port.node_id(),
            target_port = %port.name(),
            "Connecting port"
        );
        self.connections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(port);
        Ok(())
    }

    pub fn connection_count(&self) -> usize {
        self.connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Deliver `message` to every downstream port in connection order.
    ///
    /// Returns once every downstream `on_message` has returned. Each
    /// downstream receives its own clone. Returns the number of deliveries.
    pub async fn propagate(&self, message: &Message) -> usize {
        let targets: Vec<InPort> = self
            .connections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        for target in &targets {
            target.receive(message.clone()).await;
        }
        targets.len()
    }
}

impl fmt::Debug for OutPort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutPort")
            .field("name", &self.name)
            .field("connections", &self.connection_count())
            .finish()
    }
}
