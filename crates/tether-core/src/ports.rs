//! Port traits: the hexagonal architecture boundary.
//!
//! These traits are defined here in `tether-core` (pure Rust).
//! Implementations live in `tether-platform` (browser/WebView adapters).
//! The core never imports platform code; it only depends on these traits.

use std::future::Future;
use std::pin::Pin;
use std::rc::Rc;
use async_trait::async_trait;
use futures::Stream;
use serde_json::Value;
use tether_types::{
    Result,
    message::{Message, PromptRequest},
    project::{FileNode, Project},
    session::{CreateSessionRequest, Session},
};

// ─── Remote Port ─────────────────────────────────────────────

/// Raw server event bodies, one JSON value per SSE message.
/// An `Err` item means the transport failed and the stream should be reopened.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<Value>>>>;

/// Transport to the coding-assistant server.
///
/// `directory` is the value of the directory header for this request;
/// `None` means no header is sent and the server default applies.
#[async_trait(?Send)]
pub trait RemotePort {
    async fn list_sessions(&self, directory: Option<&str>) -> Result<Vec<Session>>;

    async fn get_session(&self, id: &str, directory: Option<&str>) -> Result<Session>;

    async fn list_messages(&self, session_id: &str, directory: Option<&str>) -> Result<Vec<Message>>;

    async fn create_session(
        &self,
        req: &CreateSessionRequest,
        directory: Option<&str>,
    ) -> Result<Session>;

    async fn send_prompt(
        &self,
        session_id: &str,
        req: &PromptRequest,
        directory: Option<&str>,
    ) -> Result<()>;

    async fn list_projects(&self) -> Result<Vec<Project>>;

    /// List the entries of `path` on the server filesystem
    async fn list_files(&self, path: &str, directory: Option<&str>) -> Result<Vec<FileNode>>;

    /// Open the server event stream
    fn subscribe_events(&self, directory: Option<&str>) -> EventStream;

    /// Base URL this transport talks to (for logging/debug)
    fn base_url(&self) -> &str;
}

/// Builds a [`RemotePort`] for a server URL. Construction must not touch
/// the network; the caller verifies the connection itself.
pub trait RemoteConnector {
    fn connect(&self, base_url: &str) -> Result<Rc<dyn RemotePort>>;
}

// ─── Storage Port ────────────────────────────────────────────

#[async_trait(?Send)]
pub trait StoragePort {
    /// Get a value by key
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>>;

    /// Set a value
    async fn set(&self, key: &str, value: &[u8]) -> Result<()>;

    /// Delete a value
    async fn delete(&self, key: &str) -> Result<()>;

    /// Check if a key exists
    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.get(key).await?.is_some())
    }

    /// Name of this backend (for logging/debug)
    fn backend_name(&self) -> &str;
}

// ─── Timer Port ──────────────────────────────────────────────

pub type Sleep = Pin<Box<dyn Future<Output = ()>>>;

/// Single-threaded timer source.
pub trait TimerPort {
    /// Resolve after `ms` milliseconds
    fn sleep(&self, ms: u64) -> Sleep;
}
