//! Application state, the single object the UI talks to.
//!
//! Built explicitly with its ports at startup; nothing here is global.
//! Connection lifecycle:
//!
//! ```text
//! Disconnected ──connect──▶ Connecting ──verified──▶ Connected
//!      ▲                        │                        │
//!      └────────failed──────────┘◀──────disconnect───────┘
//! ```
//!
//! A disconnect drops the client, the store (every cache) and the live
//! subscription, so nothing from one server survives into the next.

use std::cell::{Cell, RefCell};
use std::rc::Rc;
use futures::task::LocalSpawn;
use serde::Serialize;
use tether_types::{
    ClientError, Result,
    config::{normalize_server_url, ClientConfig},
    event::StateEvent,
    message::Message,
    project::{FileNode, Project},
    session::{Session, SessionGroup},
    workspace::Workspace,
};
use crate::cache::{FetchMode, LoadPhase};
use crate::event_bus::EventBus;
use crate::ports::{RemoteConnector, StoragePort, TimerPort};
use crate::remote::RemoteClient;
use crate::store::SessionStore;
use crate::subscriber::{LiveSubscriber, SubscriptionState};
use crate::workspace::WorkspaceManager;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum ConnectionState {
    Disconnected { error: Option<String> },
    Connecting { url: String },
    Connected { url: String },
}

struct Connection {
    store: Rc<SessionStore>,
    subscriber: LiveSubscriber,
}

pub struct AppState {
    config: ClientConfig,
    connector: Rc<dyn RemoteConnector>,
    timer: Rc<dyn TimerPort>,
    spawner: Rc<dyn LocalSpawn>,
    event_bus: EventBus,
    workspaces: WorkspaceManager,
    state: RefCell<ConnectionState>,
    connection: RefCell<Option<Rc<Connection>>>,
    /// Bumped by every connect/disconnect; a verification that finishes
    /// under a stale value is discarded.
    generation: Cell<u64>,
}

impl AppState {
    pub fn new(
        config: ClientConfig,
        connector: Rc<dyn RemoteConnector>,
        storage: Rc<dyn StoragePort>,
        timer: Rc<dyn TimerPort>,
        spawner: Rc<dyn LocalSpawn>,
    ) -> Self {
        let event_bus = EventBus::new();
        Self {
            config,
            connector,
            timer,
            spawner,
            workspaces: WorkspaceManager::new(storage, event_bus.clone()),
            event_bus,
            state: RefCell::new(ConnectionState::Disconnected { error: None }),
            connection: RefCell::new(None),
            generation: Cell::new(0),
        }
    }

    /// Restore persisted workspaces. Call once after construction.
    pub async fn init(&self) {
        self.workspaces.load().await;
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn event_bus(&self) -> &EventBus {
        &self.event_bus
    }

    pub fn drain_events(&self) -> Vec<StateEvent> {
        self.event_bus.drain()
    }

    // ─── Connection ──────────────────────────────────────────

    pub fn connection_state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    pub fn is_connected(&self) -> bool {
        matches!(*self.state.borrow(), ConnectionState::Connected { .. })
    }

    /// Connect to `url` and verify the server answers a session listing.
    /// Any existing connection is torn down first.
    pub async fn connect(&self, url: &str) -> Result<()> {
        self.teardown();
        let generation = self.bump_generation();

        let url = match normalize_server_url(url) {
            Ok(url) => url,
            Err(e) => {
                self.set_state(ConnectionState::Disconnected { error: Some(e.to_string()) });
                return Err(e);
            }
        };
        self.set_state(ConnectionState::Connecting { url: url.clone() });
        log::info!("Connecting to {}", url);

        let verified = match self.connector.connect(&url) {
            Ok(port) => {
                let remote = RemoteClient::new(port);
                remote.verify().await.map(|_| remote)
            }
            Err(e) => Err(e),
        };

        if self.generation.get() != generation {
            log::info!("Connection attempt to {} superseded", url);
            return Err(ClientError::Cancelled);
        }

        match verified {
            Ok(remote) => {
                let store = Rc::new(SessionStore::new(
                    remote,
                    self.event_bus.clone(),
                    self.config.preview_max_chars,
                ));
                let subscriber = LiveSubscriber::new(
                    store.clone(),
                    self.timer.clone(),
                    self.spawner.clone(),
                    self.event_bus.clone(),
                    self.config.poll_interval_ms,
                    self.config.reconnect_delay_ms,
                );
                *self.connection.borrow_mut() = Some(Rc::new(Connection { store, subscriber }));
                self.set_state(ConnectionState::Connected { url: url.clone() });
                log::info!("Connected to {}", url);
                Ok(())
            }
            Err(e) => {
                log::warn!("Connection to {} failed: {}", url, e);
                self.set_state(ConnectionState::Disconnected { error: Some(e.to_string()) });
                Err(e)
            }
        }
    }

    pub fn disconnect(&self) {
        self.bump_generation();
        self.teardown();
        self.set_state(ConnectionState::Disconnected { error: None });
        log::info!("Disconnected");
    }

    fn teardown(&self) {
        let Some(conn) = self.connection.borrow_mut().take() else {
            return;
        };
        conn.subscriber.unsubscribe();
        conn.store.clear();
    }

    fn bump_generation(&self) -> u64 {
        let next = self.generation.get() + 1;
        self.generation.set(next);
        next
    }

    fn set_state(&self, next: ConnectionState) {
        let (connected, error) = match &next {
            ConnectionState::Connected { .. } => (true, None),
            ConnectionState::Connecting { .. } => (false, None),
            ConnectionState::Disconnected { error } => (false, error.clone()),
        };
        *self.state.borrow_mut() = next;
        self.event_bus
            .emit(StateEvent::ConnectionChanged { connected, error });
    }

    fn connection(&self) -> Result<Rc<Connection>> {
        self.connection
            .borrow()
            .clone()
            .ok_or(ClientError::NotConnected)
    }

    pub fn store(&self) -> Result<Rc<SessionStore>> {
        self.connection().map(|c| c.store.clone())
    }

    // ─── Workspaces ──────────────────────────────────────────

    pub fn workspaces(&self) -> &WorkspaceManager {
        &self.workspaces
    }

    pub fn current_workspace(&self) -> Workspace {
        self.workspaces.current_or_default()
    }

    pub async fn create_workspace(&self, path: &str, name: Option<&str>) -> Result<Workspace> {
        self.workspaces.create(path, name).await
    }

    pub async fn delete_workspace(&self, id: &str) -> Result<bool> {
        self.workspaces.delete(id).await
    }

    /// Switch workspace. The live subscription belongs to the previous
    /// directory, so it is dropped.
    pub async fn select_workspace(&self, id: Option<&str>) -> Result<Workspace> {
        if let Ok(conn) = self.connection() {
            conn.subscriber.unsubscribe();
        }
        self.workspaces.select(id).await
    }

    // ─── Sessions & messages ─────────────────────────────────

    pub async fn load_sessions(&self, mode: FetchMode) -> Result<Vec<Session>> {
        let store = self.store()?;
        store
            .load_sessions(&self.workspaces.current_path(), mode)
            .await
    }

    pub fn sessions(&self) -> Option<Vec<Session>> {
        let store = self.store().ok()?;
        store.sessions(&self.workspaces.current_path())
    }

    pub fn session_groups(&self) -> Vec<SessionGroup> {
        self.store()
            .map(|s| s.session_groups(&self.workspaces.current_path()))
            .unwrap_or_default()
    }

    pub fn sessions_phase(&self) -> LoadPhase {
        self.store()
            .map(|s| s.sessions_phase(&self.workspaces.current_path()))
            .unwrap_or(LoadPhase::Idle)
    }

    pub async fn get_session(&self, id: &str) -> Result<Session> {
        let store = self.store()?;
        store.get_session(id, &self.workspaces.current_path()).await
    }

    pub async fn create_session(&self, title: Option<&str>) -> Result<Session> {
        let store = self.store()?;
        store
            .create_session(title, &self.workspaces.current_path())
            .await
    }

    pub async fn load_messages(&self, session_id: &str, mode: FetchMode) -> Result<Vec<Message>> {
        let store = self.store()?;
        store
            .load_messages(session_id, &self.workspaces.current_path(), mode)
            .await
    }

    pub fn messages(&self, session_id: &str) -> Option<Vec<Message>> {
        self.store().ok()?.messages(session_id)
    }

    pub async fn send_prompt(&self, session_id: &str, text: &str) -> Result<()> {
        let store = self.store()?;
        store
            .send_prompt(session_id, text, &self.workspaces.current_path())
            .await
    }

    pub async fn load_projects(&self, mode: FetchMode) -> Result<Vec<Project>> {
        let store = self.store()?;
        store.load_projects(mode).await
    }

    pub fn projects(&self) -> Option<Vec<Project>> {
        self.store().ok()?.projects()
    }

    pub async fn list_files(&self, path: &str) -> Result<Vec<FileNode>> {
        let store = self.store()?;
        store.list_files(path, &self.workspaces.current_path()).await
    }

    pub fn last_error(&self) -> Option<String> {
        self.store().ok()?.last_error()
    }

    // ─── Live updates ────────────────────────────────────────

    pub fn subscribe(&self, session_id: &str) -> Result<()> {
        let conn = self.connection()?;
        conn.subscriber
            .subscribe(session_id, &self.workspaces.current_path())
    }

    /// Stop live updates. Must run whenever the chat view goes away,
    /// however it was left.
    pub fn unsubscribe(&self) {
        if let Ok(conn) = self.connection() {
            conn.subscriber.unsubscribe();
        }
    }

    pub fn subscription_state(&self) -> SubscriptionState {
        self.connection()
            .map(|c| c.subscriber.state())
            .unwrap_or(SubscriptionState::Unsubscribed)
    }

    pub fn active_session(&self) -> Option<String> {
        self.connection().ok()?.subscriber.active_session()
    }
}
