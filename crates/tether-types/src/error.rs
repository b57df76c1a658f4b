use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Event stream error: {0}")]
    EventStream(String),

    #[error("Not connected to a server")]
    NotConnected,

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Spawn error: {0}")]
    Spawn(String),

    #[error("Cancelled")]
    Cancelled,

    #[error("JS interop error: {0}")]
    JsInterop(String),

    #[error("{0}")]
    Other(String),
}

impl ClientError {
    /// Connectivity failures: the server could not be reached at all, or
    /// answered with a non-2xx status.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, ClientError::Network(_) | ClientError::Http { .. })
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Serialization(e.to_string())
    }
}
