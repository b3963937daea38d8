use super::{ReadFileNode, ReadMode, WriteFileNode, WriteMode};
use flowcore::{ConfigExt, EventEmitter, Node, NodeConfig, NodeError};
use flowruntime::{ConfigKey, NodeFactory, NodeMetadata, PortDefinition};
use std::sync::Arc;

pub struct ReadFileNodeFactory;

impl ReadFileNodeFactory {
    pub fn build(node_id: &str, config: &NodeConfig) -> Result<ReadFileNode, NodeError> {
        let mut node = ReadFileNode::new(node_id, config.require_str("path")?)?;
        if let Some(encoding) = config.get_str("encoding")? {
            node = node.with_encoding_name(encoding)?;
        }
        if let Some(mode) = config.get_str("mode")? {
            node = node.with_mode(ReadMode::parse(mode)?);
        }
        Ok(node)
    }
}

impl NodeFactory for ReadFileNodeFactory {
    fn create(
        &self,
        node_id: &str,
        config: &NodeConfig,
        events: EventEmitter,
    ) -> Result<Arc<dyn Node>, NodeError> {
        Ok(Arc::new(Self::build(node_id, config)?.with_events(events)))
    }

    fn node_type(&self) -> &str {
        ReadFileNode::NODE_TYPE
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Read a file into one message, or one message per line".to_string(),
            category: "file".to_string(),
            inputs: vec![PortDefinition::new("in", "Trigger; content is ignored")],
            outputs: vec![PortDefinition::new("out", "File content")],
            config: vec![
                ConfigKey::required("path", "File to read"),
                ConfigKey::optional("encoding", "Character encoding, default UTF-8"),
                ConfigKey::optional("mode", "\"whole\" (default) or \"lines\""),
            ],
        }
    }
}

pub struct WriteFileNodeFactory;

impl WriteFileNodeFactory {
    /// `write_mode` wins over `append`; with neither the writer auto-detects.
    pub fn build(node_id: &str, config: &NodeConfig) -> Result<WriteFileNode, NodeError> {
        let mut node = WriteFileNode::new(node_id, config.require_str("path")?)?;
        if let Some(encoding) = config.get_str("encoding")? {
            node = node.with_encoding_name(encoding)?;
        }
        match (config.get_str("write_mode")?, config.get_bool("append")?) {
            (Some(mode), _) => node = node.with_mode(WriteMode::parse(mode)?),
            (None, Some(append)) => node = node.with_append(append),
            (None, None) => {}
        }
        if let Some(newline) = config.get_bool("trailing_newline")? {
            node = node.with_trailing_newline(newline);
        }
        Ok(node)
    }
}

impl NodeFactory for WriteFileNodeFactory {
    fn create(
        &self,
        node_id: &str,
        config: &NodeConfig,
        events: EventEmitter,
    ) -> Result<Arc<dyn Node>, NodeError> {
        Ok(Arc::new(Self::build(node_id, config)?.with_events(events)))
    }

    fn node_type(&self) -> &str {
        WriteFileNode::NODE_TYPE
    }

    fn metadata(&self) -> NodeMetadata {
        NodeMetadata {
            description: "Write message payloads to a file and pass the message on".to_string(),
            category: "file".to_string(),
            inputs: vec![PortDefinition::new("in", "Message whose payload is written")],
            outputs: vec![PortDefinition::new("out", "The same message, after the write")],
            config: vec![
                ConfigKey::required("path", "File to write"),
                ConfigKey::optional("encoding", "Character encoding, default UTF-8"),
                ConfigKey::optional("append", "Fixed mode: append (true) or truncate (false)"),
                ConfigKey::optional(
                    "write_mode",
                    "\"auto\" (default), \"append\", \"truncate\" or \"create_new\"",
                ),
                ConfigKey::optional("trailing_newline", "Write \\n after each payload"),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file::Encoding;
    use flowcore::Value;

    fn config(entries: &[(&str, Value)]) -> NodeConfig {
        entries
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_reader_from_config() {
        let node = ReadFileNodeFactory::build(
            "r",
            &config(&[
                ("path", Value::from("data/in.txt")),
                ("encoding", Value::from("latin1")),
                ("mode", Value::from("lines")),
            ]),
        )
        .unwrap();
        assert_eq!(node.encoding(), Encoding::Latin1);
        assert_eq!(node.mode(), ReadMode::Lines);
        assert_eq!(node.path().as_str(), "data/in.txt");
    }

    #[test]
    fn test_writer_mode_resolution() {
        let auto = WriteFileNodeFactory::build("w", &config(&[("path", Value::from("o.txt"))]))
            .unwrap();
        assert_eq!(auto.mode(), WriteMode::Auto);
        assert!(!auto.trailing_newline());

        let fixed = WriteFileNodeFactory::build(
            "w",
            &config(&[("path", Value::from("o.txt")), ("append", Value::from(false))]),
        )
        .unwrap();
        assert_eq!(fixed.mode(), WriteMode::Truncate);

        let strict = WriteFileNodeFactory::build(
            "w",
            &config(&[
                ("path", Value::from("o.txt")),
                ("append", Value::from(true)),
                ("write_mode", Value::from("create-new")),
                ("trailing_newline", Value::from(true)),
            ]),
        )
        .unwrap();
        assert_eq!(strict.mode(), WriteMode::CreateNew);
        assert!(strict.trailing_newline());
    }

    #[test]
    fn test_invalid_config_fails_at_construction() {
        let missing = WriteFileNodeFactory::build("w", &NodeConfig::new());
        assert!(matches!(missing, Err(NodeError::InvalidConfiguration(_))));

        let bad_encoding = ReadFileNodeFactory::build(
            "r",
            &config(&[("path", Value::from("a.txt")), ("encoding", Value::from("EBCDIC-XX"))]),
        );
        assert!(matches!(bad_encoding, Err(NodeError::InvalidConfiguration(_))));

        let bad_mode = WriteFileNodeFactory::build(
            "w",
            &config(&[("path", Value::from("a.txt")), ("write_mode", Value::from("sometimes"))]),
        );
        assert!(matches!(bad_mode, Err(NodeError::InvalidConfiguration(_))));
    }
}
