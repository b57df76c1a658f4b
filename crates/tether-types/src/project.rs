use serde::{Deserialize, Serialize};

/// A project (working tree) known to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    #[serde(default)]
    pub worktree: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vcs: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
}

/// An entry of a server-side directory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileNode {
    pub name: String,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: FileKind,
    #[serde(default)]
    pub ignored: bool,
}

impl FileNode {
    pub fn is_dir(&self) -> bool {
        self.kind == FileKind::Directory
    }
}

/// Directories first, then files, each alphabetical; ignored entries dropped.
/// Used by the directory picker of the workspace-creation flow.
pub fn directories_first(mut nodes: Vec<FileNode>) -> Vec<FileNode> {
    nodes.retain(|n| !n.ignored);
    nodes.sort_by(|a, b| {
        b.is_dir()
            .cmp(&a.is_dir())
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
    });
    nodes
}
