use super::{Encoding, FilePath, PathLocks};
use async_trait::async_trait;
use flowcore::{require_non_blank, EventEmitter, Message, Node, NodeContext, NodeError};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Policy deciding how each write opens the target file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WriteMode {
    /// Append when the file exists, create it otherwise. Decided per write.
    #[default]
    Auto,
    /// Always append, creating the file if needed
    Append,
    /// Always replace the file content
    Truncate,
    /// Create the file; fail with `AlreadyExists` if it is present
    CreateNew,
}

impl WriteMode {
    /// Fixed mode from an explicit append flag
    pub fn fixed(append: bool) -> Self {
        if append {
            WriteMode::Append
        } else {
            WriteMode::Truncate
        }
    }

    pub fn parse(name: &str) -> Result<Self, NodeError> {
        match name.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "auto" => Ok(WriteMode::Auto),
            "append" => Ok(WriteMode::Append),
            "truncate" | "overwrite" => Ok(WriteMode::Truncate),
            "create_new" | "create" => Ok(WriteMode::CreateNew),
            other => Err(NodeError::InvalidConfiguration(format!(
                "Unknown write mode: '{}'",
                other
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            WriteMode::Auto => "auto",
            WriteMode::Append => "append",
            WriteMode::Truncate => "truncate",
            WriteMode::CreateNew => "create_new",
        }
    }
}

/// Concrete open strategy applied to one write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OpenMode {
    Append,
    Truncate,
    CreateNew,
}

impl OpenMode {
    fn as_str(&self) -> &'static str {
        match self {
            OpenMode::Append => "append",
            OpenMode::Truncate => "truncate",
            OpenMode::CreateNew => "create",
        }
    }
}

/// Writes each message payload to a file, then forwards the message as-is.
///
/// Writes from one node are serialized on its [`PathLocks`]. Writers that
/// target the same file can share a `PathLocks` to serialize across nodes.
pub struct WriteFileNode {
    ctx: NodeContext,
    path: FilePath,
    encoding: Encoding,
    mode: WriteMode,
    trailing_newline: bool,
    locks: PathLocks,
}

impl WriteFileNode {
    pub const NODE_TYPE: &'static str = "file.write";

    /// UTF-8 writer in auto-detect mode. Fails on a blank id or path.
    pub fn new(id: impl Into<String>, path: &str) -> Result<Self, NodeError> {
        let id = id.into();
        require_non_blank("Node id", &id)?;
        Ok(Self {
            ctx: NodeContext::in_out(id),
            path: FilePath::parse(path)?,
            encoding: Encoding::default(),
            mode: WriteMode::default(),
            trailing_newline: false,
            locks: PathLocks::new(),
        })
    }

    /// Switch to fixed mode with an explicit append flag.
    pub fn with_append(self, append: bool) -> Self {
        self.with_mode(WriteMode::fixed(append))
    }

    pub fn with_mode(mut self, mode: WriteMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    pub fn with_encoding_name(self, name: &str) -> Result<Self, NodeError> {
        Ok(self.with_encoding(Encoding::for_name(name)?))
    }

    /// Write `\n` after every payload.
    pub fn with_trailing_newline(mut self, enabled: bool) -> Self {
        self.trailing_newline = enabled;
        self
    }

    pub fn with_path_locks(mut self, locks: PathLocks) -> Self {
        self.locks = locks;
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

    pub fn mode(&self) -> WriteMode {
        self.mode
    }

    pub fn trailing_newline(&self) -> bool {
        self.trailing_newline
    }

    fn io_error(&self, err: std::io::Error) -> NodeError {
        NodeError::from_io(self.path.as_str(), err)
    }

    async fn ensure_parent_dir(&self) -> Result<(), NodeError> {
        let Some(parent) = self.path.parent() else {
            return Ok(());
        };
        let exists = tokio::fs::try_exists(parent)
            .await
            .map_err(|e| NodeError::from_io(parent, e))?;
        if !exists {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                tracing::error!(node_id = %self.id(), dir = %parent.display(), "Failed to create directory");
                NodeError::from_io(parent, e)
            })?;
            tracing::info!(node_id = %self.id(), dir = %parent.display(), "Created directory");
        }
        Ok(())
    }

    async fn open_mode(&self) -> Result<OpenMode, NodeError> {
        Ok(match self.mode {
            WriteMode::Append => OpenMode::Append,
            WriteMode::Truncate => OpenMode::Truncate,
            WriteMode::CreateNew => OpenMode::CreateNew,
            WriteMode::Auto => {
                let exists = tokio::fs::try_exists(self.path.as_path())
                    .await
                    .map_err(|e| self.io_error(e))?;
                if exists {
                    OpenMode::Append
                } else {
                    OpenMode::CreateNew
                }
            }
        })
    }

    /// Open, write and flush. The handle is dropped before returning.
    async fn write_bytes(&self, mode: OpenMode, bytes: &[u8]) -> Result<(), NodeError> {
        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Append => options.append(true).create(true),
            OpenMode::Truncate => options.write(true).create(true).truncate(true),
            OpenMode::CreateNew => options.write(true).create_new(true),
        };

        let mut file = options
            .open(self.path.as_path())
            .await
            .map_err(|e| self.io_error(e))?;
        file.write_all(bytes).await.map_err(|e| self.io_error(e))?;
        file.flush().await.map_err(|e| self.io_error(e))?;
        Ok(())
    }
}

#[async_trait]
impl Node for WriteFileNode {
    fn node_type(&self) -> &str {
        Self::NODE_TYPE
    }

    fn context(&self) -> &NodeContext {
        &self.ctx
    }

    async fn process(&self, message: Message) -> Result<(), NodeError> {
        let mut content = message.payload_text();
        if self.trailing_newline {
            content.push('\n');
        }
        let bytes = self
            .encoding
            .encode(&content)
            .map_err(|reason| NodeError::Io {
                path: self.path.as_str().to_string(),
                message: reason,
            })?;

        // The path lock is dropped before emitting: downstream writers may
        // share this lock table.
        let applied = {
            let _guard = self.locks.lock(self.path.as_path()).await;
            self.ensure_parent_dir().await?;
            let applied = self.open_mode().await?;
            self.write_bytes(applied, &bytes).await?;
            applied
        };

        tracing::info!(
            node_id = %self.id(),
            path = %self.path.as_str(),
            mode = applied.as_str(),
            bytes = bytes.len(),
            "Successfully wrote to file"
        );

        self.emit(message).await;
        Ok(())
    }
}
