use flowcore::{require_non_blank, NodeError};
use std::path::{Component, Path, PathBuf};

/// A validated file path as configured on a node.
///
/// Keeps the string the node was configured with (reported as `source_file`)
/// next to its lexically normalized form (used for I/O and locking).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePath {
    configured: String,
    resolved: PathBuf,
}

impl FilePath {
    pub fn parse(raw: &str) -> Result<Self, NodeError> {
        require_non_blank("File path", raw)?;
        if raw.contains('\0') {
            return Err(NodeError::PathResolution {
                path: raw.escape_debug().to_string(),
                reason: "path contains a NUL byte".to_string(),
            });
        }

        let resolved = normalize(Path::new(raw));
        if resolved.as_os_str().is_empty() {
            return Err(NodeError::PathResolution {
                path: raw.to_string(),
                reason: "path does not name a file".to_string(),
            });
        }

        Ok(Self {
            configured: raw.to_string(),
            resolved,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.configured
    }

    pub fn as_path(&self) -> &Path {
        &self.resolved
    }

    pub fn parent(&self) -> Option<&Path> {
        self.resolved
            .parent()
            .filter(|parent| !parent.as_os_str().is_empty())
    }
}

/// Drop `.` components and fold `..` into the preceding component where one
/// exists. Symlinks are not consulted.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => out.push(".."),
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}
