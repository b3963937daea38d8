//! Standard node library
//!
//! File reader/writer nodes plus small utility nodes

mod debug;
pub mod file;
mod transform;

use flowruntime::NodeRegistry;
use std::sync::Arc;

pub use debug::{DebugNode, DebugNodeFactory};
pub use file::{
    Encoding, PathLocks, ReadFileNode, ReadFileNodeFactory, ReadMode, WriteFileNode,
    WriteFileNodeFactory, WriteMode,
};
pub use transform::TransformNode;

/// Register all standard nodes with a registry
pub fn register_all(registry: &mut NodeRegistry) {
    registry.register(Arc::new(DebugNodeFactory));
    registry.register(Arc::new(ReadFileNodeFactory));
    registry.register(Arc::new(WriteFileNodeFactory));
}
