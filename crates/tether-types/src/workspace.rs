use serde::{Deserialize, Serialize};

/// Reserved id of the synthetic Default workspace.
pub const DEFAULT_WORKSPACE_ID: &str = "default";

/// Path of the Default workspace; also the "no directory header" sentinel.
pub const ROOT_PATH: &str = "/";

const DEFAULT_WORKSPACE_NAME: &str = "Default";
const FALLBACK_WORKSPACE_NAME: &str = "Workspace";

/// A client-local grouping of sessions by server-side working directory.
/// The server has no notion of workspaces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workspace {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub path: String,
    /// Epoch milliseconds
    #[serde(rename = "createdAt", default)]
    pub created_at: i64,
}

impl Workspace {
    /// Build a user workspace. When `name` is absent or blank, the last
    /// path segment is used.
    pub fn new(path: impl Into<String>, name: Option<&str>) -> Self {
        let path = path.into();
        let name = match name.map(str::trim) {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => derive_name(&path),
        };
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name,
            path,
            created_at: crate::now_ms(),
        }
    }

    /// The synthetic Default workspace pinned to the server root.
    pub fn default_workspace() -> Self {
        Self {
            id: DEFAULT_WORKSPACE_ID.to_string(),
            name: DEFAULT_WORKSPACE_NAME.to_string(),
            path: ROOT_PATH.to_string(),
            created_at: 0,
        }
    }

    pub fn is_default(&self) -> bool {
        self.id == DEFAULT_WORKSPACE_ID
    }

    /// Directory header value for requests made in this workspace, or
    /// `None` when the server default applies.
    pub fn directory(&self) -> Option<&str> {
        directory_for_path(&self.path)
    }
}

/// Display name for a path: its last non-empty segment.
pub fn derive_name(path: &str) -> String {
    path.split(['/', '\\'])
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_WORKSPACE_NAME.to_string())
}

/// Map a workspace path to a directory header value. The root sentinel
/// and empty paths map to `None`.
pub fn directory_for_path(path: &str) -> Option<&str> {
    let trimmed = path.trim();
    if trimmed.is_empty() || trimmed == ROOT_PATH {
        None
    } else {
        Some(trimmed)
    }
}
