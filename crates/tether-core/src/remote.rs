//! Remote client facade.
//!
//! Callers pass the workspace path; the facade decides whether it becomes a
//! directory header. The root path `/` never does.

use std::rc::Rc;
use tether_types::{
    Result,
    message::{Message, PromptRequest},
    project::{FileNode, Project},
    session::{CreateSessionRequest, Session},
    workspace::directory_for_path,
};
use crate::ports::{EventStream, RemotePort};

#[derive(Clone)]
pub struct RemoteClient {
    port: Rc<dyn RemotePort>,
}

impl RemoteClient {
    pub fn new(port: Rc<dyn RemotePort>) -> Self {
        Self { port }
    }

    pub fn base_url(&self) -> &str {
        self.port.base_url()
    }

    /// Lightweight call used to prove the server is reachable.
    pub async fn verify(&self) -> Result<()> {
        self.port.list_sessions(None).await.map(|_| ())
    }

    pub async fn list_sessions(&self, workspace_path: &str) -> Result<Vec<Session>> {
        self.port.list_sessions(directory_for_path(workspace_path)).await
    }

    pub async fn get_session(&self, id: &str, workspace_path: &str) -> Result<Session> {
        self.port
            .get_session(id, directory_for_path(workspace_path))
            .await
    }

    pub async fn list_messages(&self, session_id: &str, workspace_path: &str) -> Result<Vec<Message>> {
        self.port
            .list_messages(session_id, directory_for_path(workspace_path))
            .await
    }

    pub async fn create_session(
        &self,
        req: &CreateSessionRequest,
        workspace_path: &str,
    ) -> Result<Session> {
        self.port
            .create_session(req, directory_for_path(workspace_path))
            .await
    }

    pub async fn send_prompt(
        &self,
        session_id: &str,
        text: &str,
        workspace_path: &str,
    ) -> Result<()> {
        let req = PromptRequest::text(text);
        self.port
            .send_prompt(session_id, &req, directory_for_path(workspace_path))
            .await
    }

    pub async fn list_projects(&self) -> Result<Vec<Project>> {
        self.port.list_projects().await
    }

    pub async fn list_files(&self, path: &str, workspace_path: &str) -> Result<Vec<FileNode>> {
        self.port
            .list_files(path, directory_for_path(workspace_path))
            .await
    }

    pub fn events(&self, workspace_path: &str) -> EventStream {
        self.port.subscribe_events(directory_for_path(workspace_path))
    }
}
