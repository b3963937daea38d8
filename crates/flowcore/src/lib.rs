//! Core abstractions for the flow engine
//!
//! Messages, ports and the [`Node`] contract. Nodes receive a [`Message`] on
//! their entry point, emit zero or more messages through their [`OutPort`]s
//! and report failures through their error hook instead of the data channel.

mod config;
mod error;
pub mod events;
mod message;
mod node;
mod port;
mod value;

pub use config::{require_non_blank, ConfigExt, NodeConfig};
pub use error::{ErrorKind, GraphError, NodeError, PortError};
pub use events::*;
pub use message::{Message, MessageId, Metadata};
pub use node::{Node, NodeContext, IN_PORT, OUT_PORT};
pub use port::{InPort, OutPort};
pub use value::Value;
