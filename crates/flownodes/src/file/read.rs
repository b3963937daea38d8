use super::{Encoding, FilePath};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use flowcore::{
    require_non_blank, EventEmitter, Message, Metadata, Node, NodeContext, NodeError, Value,
};
use tokio::io::AsyncReadExt;

/// How a [`ReadFileNode`] turns file content into messages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReadMode {
    /// One message carrying the whole file plus file metadata
    #[default]
    WholeFile,
    /// One message per line, in file order, without line terminators
    Lines,
}

impl ReadMode {
    pub fn parse(name: &str) -> Result<Self, NodeError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "whole" | "whole_file" | "file" => Ok(ReadMode::WholeFile),
            "lines" | "line" => Ok(ReadMode::Lines),
            other => Err(NodeError::InvalidConfiguration(format!(
                "Unknown read mode: '{}'",
                other
            ))),
        }
    }
}

/// Reads a file each time it is triggered.
///
/// The incoming message only acts as a trigger; its content is ignored.
pub struct ReadFileNode {
    ctx: NodeContext,
    path: FilePath,
    encoding: Encoding,
    mode: ReadMode,
}

impl ReadFileNode {
    pub const NODE_TYPE: &'static str = "file.read";

    /// UTF-8, whole-file reader. Fails on a blank id or path.
    pub fn new(id: impl Into<String>, path: &str) -> Result<Self, NodeError> {
        let id = id.into();
        require_non_blank("Node id", &id)?;
        Ok(Self {
            ctx: NodeContext::in_out(id),
            path: FilePath::parse(path)?,
            encoding: Encoding::default(),
            mode: ReadMode::default(),
        })
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_encoding_name(self, name: &str) -> Result<Self, NodeError> {
        Ok(self.with_encoding(Encoding::for_name(name)?))
    }

    pub fn with_mode(mut self, mode: ReadMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_events(mut self, events: EventEmitter) -> Self {
        self.ctx.set_events(events);
        self
    }

    pub fn path(&self) -> &FilePath {
        &self.path
    }

    pub fn encoding(&self) -> Encoding {
        self.encoding
    }

    pub fn mode(&self) -> ReadMode {
        self.mode
    }

    fn io_error(&self, err: std::io::Error) -> NodeError {
        NodeError::from_io(self.path.as_str(), err)
    }

    /// Check existence, open, read and decode. The handle never outlives
    /// this call.
    async fn read_text(&self) -> Result<(String, std::fs::Metadata), NodeError> {
        let path = self.path.as_path();

        if !tokio::fs::try_exists(path).await.map_err(|e| self.io_error(e))? {
            return Err(NodeError::NotFound(self.path.as_str().to_string()));
        }

        let mut file = tokio::fs::File::open(path)
            .await
            .map_err(|e| self.io_error(e))?;
        let info = file.metadata().await.map_err(|e| self.io_error(e))?;
        if info.is_dir() {
            return Err(NodeError::Io {
                path: self.path.as_str().to_string(),
                message: "path is a directory".to_string(),
            });
        }

        let mut bytes = Vec::with_capacity(info.len() as usize);
        file.read_to_end(&mut bytes)
            .await
            .map_err(|e| self.io_error(e))?;

        let text = self
            .encoding
            .decode(&bytes)
            .map_err(|message| NodeError::Io {
                path: self.path.as_str().to_string(),
                message,
            })?;
        Ok((text, info))
    }

    fn file_metadata(&self, info: &std::fs::Metadata) -> Metadata {
        let mut metadata = Metadata::new();
        metadata.insert("source_file".to_string(), Value::from(self.path.as_str()));
        metadata.insert("file_size".to_string(), Value::from(info.len()));
        metadata.insert(
            "file_encoding".to_string(),
            Value::from(self.encoding.name()),
        );
        if let Ok(modified) = info.modified() {
            let modified: DateTime<Utc> = modified.into();
            metadata.insert(
                "last_modified".to_string(),
                Value::from(modified.timestamp_millis()),
            );
        }
        metadata
    }
}

/// Lines terminated by `\n`, `\r\n` or a lone `\r`, terminators stripped.
/// A final terminator does not start another line.
fn split_lines(text: &str) -> Vec<&str> {
    let mut lines = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        match rest.find(|c: char| c == '\n' || c == '\r') {
            Some(pos) => {
                lines.push(&rest[..pos]);
                let skip = if rest[pos..].starts_with("\r\n") { 2 } else { 1 };
                rest = &rest[pos + skip..];
            }
            None => {
                lines.push(rest);
                break;
            }
        }
    }
    lines
}

#[async_trait]
impl Node for ReadFileNode {
    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn context(&self) -> &NodeContext {
        &self.ctx
    }

    async fn process(&self, trigger: Message) -> Result<(), NodeError> {
        tracing::debug!(node_id = %self.id(), trigger = %trigger.id(), "Read triggered");

        let (text, info) = self.read_text().await?;

        match self.mode {
            ReadMode::WholeFile => {
                let message = Message::with_metadata(text, self.file_metadata(&info));
                self.emit(message).await;
                tracing::info!(
                    node_id = %self.id(),
                    path = %self.path.as_str(),
                    encoding = %self.encoding,
                    "Successfully read file"
                );
            }
            ReadMode::Lines => {
                let mut count = 0usize;
                for (index, line) in split_lines(&text).into_iter().enumerate() {
                    let message = Message::new(line)
                        .insert_metadata("source_file", self.path.as_str())
                        .insert_metadata("line_number", (index + 1) as i64);
                    self.emit(message).await;
                    count += 1;
                }
                if count == 0 {
                    self.ctx
                        .events()
                        .warn(format!("{} has no lines", self.path.as_str()));
                }
                tracing::info!(
                    node_id = %self.id(),
                    path = %self.path.as_str(),
                    encoding = %self.encoding,
                    lines = count,
                    "Successfully read file lines"
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_lines_terminators() {
        assert!(split_lines("").is_empty());
        assert_eq!(split_lines("one\rtwo\r"), vec!["one", "two"]);
        assert_eq!(split_lines("a\r\n\rb"), vec!["a", "", "b"]);
        assert_eq!(split_lines("x\n\ny\n"), vec!["x", "", "y"]);
        assert_eq!(split_lines("tail"), vec!["tail"]);
    }
}
