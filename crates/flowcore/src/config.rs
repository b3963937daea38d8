use crate::{NodeError, Value};
use std::collections::HashMap;

/// Static configuration used to build a node
pub type NodeConfig = HashMap<String, Value>;

/// Typed lookups over a [`NodeConfig`].
pub trait ConfigExt {
    /// Get a required, non-blank string entry
    fn require_str(&self, name: &str) -> Result<&str, NodeError>;

    /// Get an optional string entry; present but non-string is an error
    fn get_str(&self, name: &str) -> Result<Option<&str>, NodeError>;

    /// Get an optional boolean entry; present but non-bool is an error
    fn get_bool(&self, name: &str) -> Result<Option<bool>, NodeError>;
}

impl ConfigExt for NodeConfig {
    fn require_str(&self, name: &str) -> Result<&str, NodeError> {
        let value = self
            .get_str(name)?
            .ok_or_else(|| NodeError::InvalidConfiguration(format!("Missing config: {}", name)))?;
        require_non_blank(name, value)?;
        Ok(value)
    }

    fn get_str(&self, name: &str) -> Result<Option<&str>, NodeError> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_str().map(Some).ok_or_else(|| {
                NodeError::InvalidConfiguration(format!("Config '{}' must be a string", name))
            }),
        }
    }

    fn get_bool(&self, name: &str) -> Result<Option<bool>, NodeError> {
        match self.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => value.as_bool().map(Some).ok_or_else(|| {
                NodeError::InvalidConfiguration(format!("Config '{}' must be a boolean", name))
            }),
        }
    }
}

/// Reject empty or whitespace-only values.
pub fn require_non_blank(name: &str, value: &str) -> Result<(), NodeError> {
    if value.trim().is_empty() {
        return Err(NodeError::InvalidConfiguration(format!(
            "{} cannot be empty",
            name
        )));
    }
    Ok(())
}
