//! HTTP adapter for the coding-assistant server.
//!
//! Uses browser `fetch()` via gloo-net. Directory-scoped calls carry the
//! directory header when the caller passes one.

use std::rc::Rc;
use async_trait::async_trait;
use gloo_net::http::{Request, RequestBuilder, Response};
use serde::de::DeserializeOwned;

use tether_core::ports::*;
use tether_types::{
    ClientError, Result,
    config::DIRECTORY_HEADER,
    message::{Message, PromptRequest},
    project::{FileNode, Project},
    session::{CreateSessionRequest, Session},
};

use crate::events;

pub struct HttpRemote {
    base_url: String,
}

impl HttpRemote {
    /// `base_url` must already be normalized (scheme, no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { base_url: base_url.into() }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get(&self, path: &str, directory: Option<&str>) -> RequestBuilder {
        with_directory(Request::get(&self.url(path)), directory)
    }

    fn post(&self, path: &str, directory: Option<&str>) -> RequestBuilder {
        with_directory(Request::post(&self.url(path)), directory)
    }
}

fn with_directory(builder: RequestBuilder, directory: Option<&str>) -> RequestBuilder {
    match directory {
        Some(dir) => builder.header(DIRECTORY_HEADER, dir),
        None => builder,
    }
}

fn segment(id: &str) -> String {
    String::from(js_sys::encode_uri_component(id))
}

async fn send(builder: RequestBuilder) -> Result<Response> {
    let response = builder
        .send()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;
    ensure_ok(response).await
}

async fn send_json<B: serde::Serialize>(builder: RequestBuilder, body: &B) -> Result<Response> {
    let response = builder
        .json(body)
        .map_err(|e| ClientError::Serialization(e.to_string()))?
        .send()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;
    ensure_ok(response).await
}

async fn ensure_ok(response: Response) -> Result<Response> {
    if response.ok() {
        return Ok(response);
    }
    let status = response.status();
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "unknown error".to_string());
    Err(ClientError::Http { status, body })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let text = response
        .text()
        .await
        .map_err(|e| ClientError::Network(e.to_string()))?;
    Ok(serde_json::from_str(&text)?)
}

#[async_trait(?Send)]
impl RemotePort for HttpRemote {
    async fn list_sessions(&self, directory: Option<&str>) -> Result<Vec<Session>> {
        read_json(send(self.get("/session", directory)).await?).await
    }

    async fn get_session(&self, id: &str, directory: Option<&str>) -> Result<Session> {
        let path = format!("/session/{}", segment(id));
        read_json(send(self.get(&path, directory)).await?).await
    }

    async fn list_messages(&self, session_id: &str, directory: Option<&str>) -> Result<Vec<Message>> {
        let path = format!("/session/{}/message", segment(session_id));
        read_json(send(self.get(&path, directory)).await?).await
    }

    async fn create_session(
        &self,
        req: &CreateSessionRequest,
        directory: Option<&str>,
    ) -> Result<Session> {
        read_json(send_json(self.post("/session", directory), req).await?).await
    }

    async fn send_prompt(
        &self,
        session_id: &str,
        req: &PromptRequest,
        directory: Option<&str>,
    ) -> Result<()> {
        let path = format!("/session/{}/message", segment(session_id));
        // The reply is the assistant message; the caller re-reads the list.
        send_json(self.post(&path, directory), req).await?;
        Ok(())
    }

    async fn list_projects(&self) -> Result<Vec<Project>> {
        read_json(send(self.get("/project", None)).await?).await
    }

    async fn list_files(&self, path: &str, directory: Option<&str>) -> Result<Vec<FileNode>> {
        let builder = self.get("/file", directory).query([("path", path)]);
        read_json(send(builder).await?).await
    }

    fn subscribe_events(&self, directory: Option<&str>) -> EventStream {
        events::open(&self.base_url, directory)
    }

    fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Builds an [`HttpRemote`] per connection attempt.
#[derive(Debug, Default, Clone, Copy)]
pub struct HttpConnector;

impl HttpConnector {
    pub fn new() -> Self {
        Self
    }
}

impl RemoteConnector for HttpConnector {
    fn connect(&self, base_url: &str) -> Result<Rc<dyn RemotePort>> {
        let remote: Rc<dyn RemotePort> = Rc::new(HttpRemote::new(base_url));
        Ok(remote)
    }
}
