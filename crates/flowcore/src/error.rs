use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;
use thiserror::Error;

/// Failure raised while constructing or running a single node.
///
/// Every variant maps onto one [`ErrorKind`] so the error hook and event
/// subscribers can tell "not found" apart from "permission denied" without
/// parsing messages.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum NodeError {
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Invalid path '{path}': {reason}")]
    PathResolution { path: String, reason: String },

    #[error("File not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("File already exists: {0}")]
    AlreadyExists(String),

    #[error("I/O error on '{path}': {message}")]
    Io { path: String, message: String },

    #[error("Execution failed: {0}")]
    ExecutionFailed(String),
}

impl NodeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            NodeError::InvalidConfiguration(_) => ErrorKind::InvalidConfiguration,
            NodeError::PathResolution { .. } => ErrorKind::PathResolution,
            NodeError::NotFound(_) => ErrorKind::NotFound,
            NodeError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            NodeError::AlreadyExists(_) => ErrorKind::AlreadyExists,
            NodeError::Io { .. } => ErrorKind::Io,
            NodeError::ExecutionFailed(_) => ErrorKind::ExecutionFailed,
        }
    }

    /// Classify an I/O error raised while touching `path`.
    pub fn from_io(path: impl AsRef<Path>, err: io::Error) -> Self {
        let path = path.as_ref().display().to_string();
        match err.kind() {
            io::ErrorKind::NotFound => NodeError::NotFound(path),
            io::ErrorKind::PermissionDenied => NodeError::PermissionDenied(path),
            io::ErrorKind::AlreadyExists => NodeError::AlreadyExists(path),
            io::ErrorKind::InvalidInput => NodeError::PathResolution {
                path,
                reason: err.to_string(),
            },
            _ => NodeError::Io {
                path,
                message: err.to_string(),
            },
        }
    }
}

/// Logical error categories reported through the error hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidConfiguration,
    PathResolution,
    NotFound,
    PermissionDenied,
    AlreadyExists,
    Io,
    ExecutionFailed,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PortError {
    #[error("Input port '{0}' already has an upstream connection")]
    AlreadyConnected(String),

    #[error("Unknown port '{port}' on node '{node_id}'")]
    UnknownPort { node_id: String, port: String },
}

#[derive(Error, Debug)]
pub enum GraphError {
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    #[error("Node not found: {0}")]
    NodeNotFound(String),

    #[error("Unknown node type: {0}")]
    UnknownNodeType(String),

    #[error("Connection {from} -> {to} would create a cycle")]
    CyclicDependency { from: String, to: String },

    #[error(transparent)]
    Port(#[from] PortError),

    #[error(transparent)]
    Node(#[from] NodeError),
}
