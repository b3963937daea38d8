use crate::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

pub type MessageId = Uuid;

/// Metadata accumulated by a message as it travels through the graph.
pub type Metadata = BTreeMap<String, Value>;

/// Envelope flowing between nodes: a payload plus metadata.
///
/// Messages are owned values. Fan-out hands every downstream consumer its own
/// clone, so a node that enriches metadata never changes what a sibling sees.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    payload: Value,
    #[serde(default)]
    metadata: Metadata,
}

impl Message {
    pub fn new(payload: impl Into<Value>) -> Self {
        Self::with_metadata(payload, Metadata::new())
    }

    pub fn with_metadata(payload: impl Into<Value>, metadata: Metadata) -> Self {
        Self {
            id: Uuid::new_v4(),
            payload: payload.into(),
            metadata,
        }
    }

    /// A message with a `Null` payload, used to trigger source nodes.
    pub fn empty() -> Self {
        Self::new(Value::Null)
    }

    pub fn insert_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn id(&self) -> MessageId {
        self.id
    }

    pub fn payload(&self) -> &Value {
        &self.payload
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.get(key)
    }

    /// Payload rendered as text; an absent payload yields `""`.
    pub fn payload_text(&self) -> String {
        self.payload.to_text()
    }

    pub fn into_parts(self) -> (Value, Metadata) {
        (self.payload, self.metadata)
    }
}

impl Default for Message {
    fn default() -> Self {
        Self::empty()
    }
}
