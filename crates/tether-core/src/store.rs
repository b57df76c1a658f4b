//! Session store: the cache layer between the UI and the server.
//!
//! Holds three stale-while-revalidate caches (sessions per workspace,
//! messages per session, projects) plus the derived session previews.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tether_types::{
    ClientError, Result,
    event::StateEvent,
    message::{preview_text, Message},
    project::{directories_first, FileNode, Project},
    session::{group_sessions, sort_by_activity, CreateSessionRequest, Session, SessionGroup},
};
use crate::cache::{FetchMode, LoadPhase, SwrCache};
use crate::event_bus::EventBus;
use crate::remote::RemoteClient;

const PROJECTS_KEY: &str = "projects";

/// Cache key of the session list for a workspace path.
pub fn sessions_key(workspace_path: &str) -> String {
    format!("sessions:{}", workspace_path)
}

pub struct SessionStore {
    remote: RemoteClient,
    event_bus: EventBus,
    preview_max_chars: usize,
    sessions: SwrCache<Vec<Session>>,
    messages: SwrCache<Vec<Message>>,
    projects: SwrCache<Vec<Project>>,
    previews: RefCell<Rc<HashMap<String, String>>>,
    last_error: RefCell<Option<String>>,
}

impl SessionStore {
    pub fn new(remote: RemoteClient, event_bus: EventBus, preview_max_chars: usize) -> Self {
        Self {
            remote,
            event_bus,
            preview_max_chars,
            sessions: SwrCache::new(),
            messages: SwrCache::new(),
            projects: SwrCache::new(),
            previews: RefCell::new(Rc::new(HashMap::new())),
            last_error: RefCell::new(None),
        }
    }

    pub fn remote(&self) -> &RemoteClient {
        &self.remote
    }

    // ─── Sessions ────────────────────────────────────────────

    /// Session list for a workspace, most recently active first.
    ///
    /// After every network load, sessions without a cached message list get
    /// their messages fetched once so a preview can be shown. That step is
    /// best-effort: a failure leaves the preview empty and is only logged.
    pub async fn load_sessions(&self, workspace_path: &str, mode: FetchMode) -> Result<Vec<Session>> {
        let key = sessions_key(workspace_path);
        if mode == FetchMode::Cached {
            if let Some(cached) = self.sessions.get(&key) {
                return Ok(cached);
            }
        }

        let remote = &self.remote;
        let result = self
            .sessions
            .fetch(&key, mode, || async move {
                let mut list = remote.list_sessions(workspace_path).await?;
                sort_by_activity(&mut list);
                Ok(list)
            })
            .await;

        match result {
            Ok(list) => {
                self.enrich_previews(&list, workspace_path).await;
                self.on_success(mode);
                self.event_bus.emit(StateEvent::SessionsUpdated);
                Ok(list)
            }
            Err(e) => Err(self.on_failure(mode, e)),
        }
    }

    pub fn sessions(&self, workspace_path: &str) -> Option<Vec<Session>> {
        self.sessions.get(&sessions_key(workspace_path))
    }

    pub fn session_groups(&self, workspace_path: &str) -> Vec<SessionGroup> {
        self.sessions(workspace_path)
            .map(|list| group_sessions(&list))
            .unwrap_or_default()
    }

    pub fn sessions_phase(&self, workspace_path: &str) -> LoadPhase {
        self.sessions.phase(&sessions_key(workspace_path))
    }

    /// Fetch one session and fold it into the cached list, if there is one.
    pub async fn get_session(&self, id: &str, workspace_path: &str) -> Result<Session> {
        let session = self
            .remote
            .get_session(id, workspace_path)
            .await
            .map_err(|e| self.on_failure(FetchMode::Forced, e))?;
        self.upsert_session(workspace_path, session.clone());
        Ok(session)
    }

    pub async fn create_session(&self, title: Option<&str>, workspace_path: &str) -> Result<Session> {
        let req = CreateSessionRequest {
            title: title.map(str::trim).filter(|t| !t.is_empty()).map(String::from),
            parent_id: None,
        };
        let session = self
            .remote
            .create_session(&req, workspace_path)
            .await
            .map_err(|e| self.on_failure(FetchMode::Forced, e))?;
        log::info!("Created session {}", session.id);

        // A new session has nothing to preview.
        self.messages.insert(&session.id, Vec::new());
        self.upsert_session(workspace_path, session.clone());
        Ok(session)
    }

    fn upsert_session(&self, workspace_path: &str, session: Session) {
        let key = sessions_key(workspace_path);
        let Some(mut list) = self.sessions.get(&key) else {
            return;
        };
        match list.iter_mut().find(|s| s.id == session.id) {
            Some(existing) => *existing = session,
            None => list.push(session),
        }
        sort_by_activity(&mut list);
        self.sessions.insert(&key, list);
        self.event_bus.emit(StateEvent::SessionsUpdated);
    }

    async fn enrich_previews(&self, sessions: &[Session], workspace_path: &str) {
        let missing = sessions
            .iter()
            .filter(|s| !self.messages.contains(&s.id))
            .map(|s| async move {
                match self.remote.list_messages(&s.id, workspace_path).await {
                    Ok(messages) => self.messages.insert(&s.id, messages),
                    Err(e) => log::debug!("Preview for {} unavailable: {}", s.id, e),
                }
            });
        futures::future::join_all(missing).await;

        let mut next = (**self.previews.borrow()).clone();
        for session in sessions {
            let preview = self
                .messages
                .get(&session.id)
                .map(|m| preview_text(&m, self.preview_max_chars))
                .unwrap_or_default();
            next.insert(session.id.clone(), preview);
        }
        *self.previews.borrow_mut() = Rc::new(next);
    }

    pub fn preview(&self, session_id: &str) -> String {
        self.previews
            .borrow()
            .get(session_id)
            .cloned()
            .unwrap_or_default()
    }

    // ─── Messages ────────────────────────────────────────────

    pub async fn load_messages(
        &self,
        session_id: &str,
        workspace_path: &str,
        mode: FetchMode,
    ) -> Result<Vec<Message>> {
        if mode == FetchMode::Cached {
            if let Some(cached) = self.messages.get(session_id) {
                return Ok(cached);
            }
        }

        let remote = &self.remote;
        let result = self
            .messages
            .fetch(session_id, mode, || remote.list_messages(session_id, workspace_path))
            .await;

        match result {
            Ok(messages) => {
                self.set_preview(session_id, &messages);
                self.on_success(mode);
                self.event_bus.emit(StateEvent::MessagesUpdated {
                    session_id: session_id.to_string(),
                });
                Ok(messages)
            }
            Err(e) => Err(self.on_failure(mode, e)),
        }
    }

    pub fn messages(&self, session_id: &str) -> Option<Vec<Message>> {
        self.messages.get(session_id)
    }

    pub fn messages_phase(&self, session_id: &str) -> LoadPhase {
        self.messages.phase(session_id)
    }

    /// Post a prompt, then quietly pull the session's messages so the
    /// user's own message shows up without waiting for the stream.
    pub async fn send_prompt(&self, session_id: &str, text: &str, workspace_path: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(ClientError::Other("Message is empty".to_string()));
        }
        self.remote
            .send_prompt(session_id, text, workspace_path)
            .await
            .map_err(|e| self.on_failure(FetchMode::Forced, e))?;
        if let Err(e) = self
            .load_messages(session_id, workspace_path, FetchMode::Silent)
            .await
        {
            log::debug!("Refresh after prompt failed: {}", e);
        }
        Ok(())
    }

    fn set_preview(&self, session_id: &str, messages: &[Message]) {
        let preview = preview_text(messages, self.preview_max_chars);
        let mut next = (**self.previews.borrow()).clone();
        next.insert(session_id.to_string(), preview);
        *self.previews.borrow_mut() = Rc::new(next);
    }

    // ─── Projects & files ────────────────────────────────────

    pub async fn load_projects(&self, mode: FetchMode) -> Result<Vec<Project>> {
        let remote = &self.remote;
        match self
            .projects
            .fetch(PROJECTS_KEY, mode, || remote.list_projects())
            .await
        {
            Ok(projects) => {
                self.on_success(mode);
                self.event_bus.emit(StateEvent::ProjectsUpdated);
                Ok(projects)
            }
            Err(e) => Err(self.on_failure(mode, e)),
        }
    }

    pub fn projects(&self) -> Option<Vec<Project>> {
        self.projects.get(PROJECTS_KEY)
    }

    pub fn projects_phase(&self) -> LoadPhase {
        self.projects.phase(PROJECTS_KEY)
    }

    /// Directory listing for the workspace-creation picker. Errors go back
    /// to the caller for inline display and are not recorded here.
    pub async fn list_files(&self, path: &str, workspace_path: &str) -> Result<Vec<FileNode>> {
        let nodes = self.remote.list_files(path, workspace_path).await?;
        Ok(directories_first(nodes))
    }

    // ─── Errors & lifecycle ──────────────────────────────────

    pub fn last_error(&self) -> Option<String> {
        self.last_error.borrow().clone()
    }

    pub fn clear_error(&self) {
        *self.last_error.borrow_mut() = None;
    }

    /// Forget every cached entity.
    pub fn clear(&self) {
        self.sessions.clear();
        self.messages.clear();
        self.projects.clear();
        *self.previews.borrow_mut() = Rc::new(HashMap::new());
        self.clear_error();
    }

    fn on_success(&self, mode: FetchMode) {
        if mode != FetchMode::Silent {
            self.clear_error();
        }
    }

    /// Background refreshes fail quietly; anything the user asked for is
    /// surfaced as the shared error message.
    fn on_failure(&self, mode: FetchMode, e: ClientError) -> ClientError {
        if mode == FetchMode::Silent {
            log::debug!("Background refresh failed: {}", e);
        } else {
            log::warn!("Fetch failed: {}", e);
            *self.last_error.borrow_mut() = Some(e.to_string());
            self.event_bus.emit(StateEvent::Error {
                message: e.to_string(),
            });
        }
        e
    }
}
