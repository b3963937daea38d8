mod base;

pub use base::{EventBus, EventEmitter, FlowEvent, NodeEvent};
