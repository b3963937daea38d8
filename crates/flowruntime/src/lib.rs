//! Wiring layer for the flow engine
//!
//! Builds nodes by type name through the [`NodeRegistry`], connects them into
//! a [`Flow`] and injects messages into it.

mod flow;
mod registry;
mod runtime;

pub use flow::{Connection, Flow};
pub use registry::{ConfigKey, NodeFactory, NodeMetadata, NodeRegistry, PortDefinition};
pub use runtime::{FlowRuntime, RuntimeConfig};
