use serde::{Deserialize, Serialize};
use crate::{ClientError, Result};

/// Storage key holding the persisted workspace list.
pub const WORKSPACES_KEY: &str = "tether:workspaces";

/// Storage key holding the persisted current-workspace pointer.
pub const CURRENT_WORKSPACE_KEY: &str = "tether:current-workspace";

/// Storage key holding the config of the last successful connection.
pub const CONFIG_KEY: &str = "tether:config";

/// Request header that scopes a call to a server-side working directory.
pub const DIRECTORY_HEADER: &str = "x-opencode-directory";

/// Client configuration. Only `server_url` is user-facing; the rest are
/// tuning knobs with the defaults the live subscriber expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    pub server_url: String,
    /// Fallback polling period for the active session
    pub poll_interval_ms: u64,
    /// Delay before reopening a failed event stream
    pub reconnect_delay_ms: u64,
    /// Maximum characters kept in a session preview
    pub preview_max_chars: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            poll_interval_ms: 2_000,
            reconnect_delay_ms: 3_000,
            preview_max_chars: 100,
        }
    }
}

impl ClientConfig {
    pub fn with_server_url(mut self, url: impl Into<String>) -> Self {
        self.server_url = url.into();
        self
    }
}

const DEFAULT_SERVER_URL: &str = "http://localhost:4096";

/// Normalize a server URL typed into the connect form.
///
/// Trims whitespace and trailing slashes and assumes `http://` when no
/// scheme was given.
pub fn normalize_server_url(input: &str) -> Result<String> {
    let trimmed = input.trim().trim_end_matches('/');
    if trimmed.is_empty() {
        return Err(ClientError::Config("Server URL is empty".to_string()));
    }
    if trimmed.contains(char::is_whitespace) {
        return Err(ClientError::Config(format!(
            "Server URL contains whitespace: {}",
            trimmed
        )));
    }
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("http://{}", trimmed))
    }
}
