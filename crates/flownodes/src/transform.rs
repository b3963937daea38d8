use async_trait::async_trait;
use flowcore::{EventEmitter, Message, Node, NodeContext, NodeError};

type TransformFn = dyn Fn(Message) -> Result<Vec<Message>, NodeError> + Send + Sync;

/// Single-input, single-output node driven by a closure.
///
/// Every message returned by the closure is emitted in order: an empty vector
/// filters the input out, several entries split it.
pub struct TransformNode {
    ctx: NodeContext,
    transform: Box<TransformFn>,
}

impl TransformNode {
    pub const NODE_TYPE: &'static str = "transform.fn";

    pub fn new<F>(id: impl Into<String>, transform: F) -> Self
    where
        F: Fn(Message) -> Result<Vec<Message>, NodeError> + Send + Sync + 'static,
    {
        Self {
            ctx: NodeContext::in_out(id),
            transform: Box::new(transform),
        }
    }

    /// Keep only messages matching `predicate`
    pub fn filter<P>(id: impl Into<String>, predicate: P) -> Self
    where
        P: Fn(&Message) -> bool + Send + Sync + 'static,
    {
        Self::new(id, move |message| {
            Ok(if predicate(&message) {
                vec![message]
            } else {
                Vec::new()
            })
        })
    }

    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.ctx.set_events(events);
        self
    }
}

#[async_trait]
impl Node for TransformNode {
    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn context(&self) -> &NodeContext {
        &self.ctx
    }

    async fn process(&self, message: Message) -> Result<(), NodeError> {
        let outputs = (self.transform)(message)?;
        for output in outputs {
            self.emit(output).await;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flowcore::{InPort, IN_PORT, OUT_PORT};
    use std::sync::{Arc, Mutex};

    struct Sink {
        ctx: NodeContext,
        got: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Node for Sink {
        fn node_type(&self) -> &str {
            "test.sink"
        }

        fn context(&self) -> &NodeContext {
            &self.ctx
        }

        async fn process(&self, message: Message) -> Result<(), NodeError> {
            self.got.lock().unwrap().push(message.payload_text());
            Ok(())
        }
    }

    fn wire(node: &TransformNode) -> Arc<Sink> {
        let sink = Arc::new(Sink {
            ctx: NodeContext::in_out("sink"),
            got: Mutex::new(Vec::new()),
        });
        node.context()
            .output(OUT_PORT)
            .unwrap()
            .connect(InPort::new(IN_PORT, sink.clone()))
            .unwrap();
        sink
    }

    #[tokio::test]
    async fn test_split_words() {
        let node = TransformNode::new("split", |message| {
            Ok(message
                .payload_text()
                .split_whitespace()
                .map(Message::new)
                .collect())
        });
        let sink = wire(&node);

        node.on_message(Message::new("one two three")).await;
        assert_eq!(*sink.got.lock().unwrap(), vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_filter_and_failure() {
        let node = TransformNode::filter("keep", |m| m.payload_text().starts_with('k'));
        let sink = wire(&node);

        node.on_message(Message::new("drop")).await;
        node.on_message(Message::new("keep")).await;
        assert_eq!(*sink.got.lock().unwrap(), vec!["keep"]);

        let failing = TransformNode::new("fail", |_| {
            Err(NodeError::ExecutionFailed("nope".to_string()))
        });
        let failing_sink = wire(&failing);
        failing.on_message(Message::new("x")).await;
        assert!(failing_sink.got.lock().unwrap().is_empty());
    }
}
