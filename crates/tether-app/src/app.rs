//! `TetherClient`, the object the mobile UI holds.
//!
//! Async calls return JS Promises; values cross the boundary as JSON.
//! The UI re-renders after draining [`TetherClient::drain_events`].

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use gloo_utils::format::JsValueSerdeExt;
use js_sys::Promise;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::future_to_promise;

use tether_core::app_state::AppState;
use tether_core::cache::FetchMode;
use tether_core::ports::StoragePort;
use tether_core::records;
use tether_platform::storage::auto_detect_storage;
use tether_platform::{GlooTimer, HttpConnector, WasmSpawner};
use tether_types::{config::{ClientConfig, CONFIG_KEY}, ClientError};

use crate::view::{self, Snapshot};

fn js_error(e: ClientError) -> JsValue {
    js_sys::Error::new(&e.to_string()).into()
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    JsValue::from_serde(value).map_err(|e| js_error(e.into()))
}

fn promise<T, F>(fut: F) -> Promise
where
    T: Serialize,
    F: Future<Output = tether_types::Result<T>> + 'static,
{
    future_to_promise(async move {
        let value = fut.await.map_err(js_error)?;
        to_js(&value)
    })
}

fn mode(force: bool) -> FetchMode {
    if force {
        FetchMode::Forced
    } else {
        FetchMode::Cached
    }
}

#[wasm_bindgen]
pub struct TetherClient {
    state: Rc<AppState>,
    storage: Rc<dyn StoragePort>,
    server_url: Rc<RefCell<String>>,
}

#[wasm_bindgen]
impl TetherClient {
    /// Build a client on the best available storage and restore the saved
    /// workspaces and server URL. Does not connect.
    pub async fn create() -> TetherClient {
        let storage = auto_detect_storage().await;
        let config: ClientConfig = records::load(storage.as_ref(), CONFIG_KEY)
            .await
            .unwrap_or_default();
        let server_url = Rc::new(RefCell::new(config.server_url.clone()));

        let state = Rc::new(AppState::new(
            config,
            Rc::new(HttpConnector::new()),
            storage.clone(),
            Rc::new(GlooTimer::new()),
            Rc::new(WasmSpawner::new()),
        ));
        state.init().await;
        log::info!("Client ready, storage: {}", storage.backend_name());

        TetherClient { state, storage, server_url }
    }

    // ─── Connection ──────────────────────────────────────────

    /// Last URL connected to, or the default.
    #[wasm_bindgen(js_name = serverUrl)]
    pub fn server_url(&self) -> String {
        self.server_url.borrow().clone()
    }

    /// Resolves once the server has answered; the URL is remembered for
    /// the next launch.
    pub fn connect(&self, url: String) -> Promise {
        let state = self.state.clone();
        let storage = self.storage.clone();
        let server_url = self.server_url.clone();
        promise(async move {
            state.connect(&url).await?;
            let connected = state.store()?.remote().base_url().to_string();
            let config = state.config().clone().with_server_url(connected);
            *server_url.borrow_mut() = config.server_url.clone();
            if let Err(e) = records::save(storage.as_ref(), CONFIG_KEY, &config).await {
                log::warn!("Failed to remember server URL: {}", e);
            }
            Ok(())
        })
    }

    pub fn disconnect(&self) {
        self.state.disconnect();
    }

    /// Connection, workspace, subscription and error state in one value.
    pub fn snapshot(&self) -> Result<JsValue, JsValue> {
        to_js(&Snapshot::of(&self.state))
    }

    #[wasm_bindgen(js_name = drainEvents)]
    pub fn drain_events(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state.drain_events())
    }

    #[wasm_bindgen(js_name = lastError)]
    pub fn last_error(&self) -> Option<String> {
        self.state.last_error()
    }

    // ─── Sessions & messages ─────────────────────────────────

    /// Session tree of the current workspace. Resolves from cache unless
    /// `force` is set.
    #[wasm_bindgen(js_name = loadSessions)]
    pub fn load_sessions(&self, force: bool) -> Promise {
        let state = self.state.clone();
        promise(async move {
            state.load_sessions(mode(force)).await?;
            let store = state.store()?;
            Ok(view::session_tree(&state.session_groups(), &store))
        })
    }

    /// Cached session tree; empty before the first load.
    pub fn sessions(&self) -> Result<JsValue, JsValue> {
        let tree = match self.state.store() {
            Ok(store) => view::session_tree(&self.state.session_groups(), &store),
            Err(_) => Vec::new(),
        };
        to_js(&tree)
    }

    #[wasm_bindgen(js_name = createSession)]
    pub fn create_session(&self, title: Option<String>) -> Promise {
        let state = self.state.clone();
        promise(async move { state.create_session(title.as_deref()).await })
    }

    #[wasm_bindgen(js_name = loadMessages)]
    pub fn load_messages(&self, session_id: String, force: bool) -> Promise {
        let state = self.state.clone();
        promise(async move {
            let messages = state.load_messages(&session_id, mode(force)).await?;
            Ok(view::message_views(&messages))
        })
    }

    pub fn messages(&self, session_id: &str) -> Result<JsValue, JsValue> {
        let messages = self.state.messages(session_id).unwrap_or_default();
        to_js(&view::message_views(&messages))
    }

    #[wasm_bindgen(js_name = messagesPhase)]
    pub fn messages_phase(&self, session_id: &str) -> String {
        self.state
            .store()
            .map(|s| view::phase_label(s.messages_phase(session_id)))
            .unwrap_or("idle")
            .to_string()
    }

    #[wasm_bindgen(js_name = sendPrompt)]
    pub fn send_prompt(&self, session_id: String, text: String) -> Promise {
        let state = self.state.clone();
        promise(async move { state.send_prompt(&session_id, &text).await })
    }

    // ─── Projects & files ────────────────────────────────────

    #[wasm_bindgen(js_name = loadProjects)]
    pub fn load_projects(&self, force: bool) -> Promise {
        let state = self.state.clone();
        promise(async move { state.load_projects(mode(force)).await })
    }

    /// Directory entries for the workspace picker, directories first.
    #[wasm_bindgen(js_name = listFiles)]
    pub fn list_files(&self, path: String) -> Promise {
        let state = self.state.clone();
        promise(async move { state.list_files(&path).await })
    }

    // ─── Live updates ────────────────────────────────────────

    pub fn subscribe(&self, session_id: &str) -> Result<(), JsValue> {
        self.state.subscribe(session_id).map_err(js_error)
    }

    /// Call on every exit from the chat view.
    pub fn unsubscribe(&self) {
        self.state.unsubscribe();
    }

    // ─── Workspaces ──────────────────────────────────────────

    /// Default first, then the saved workspaces.
    pub fn workspaces(&self) -> Result<JsValue, JsValue> {
        to_js(&self.state.workspaces().displayed())
    }

    #[wasm_bindgen(js_name = createWorkspace)]
    pub fn create_workspace(&self, path: String, name: Option<String>) -> Promise {
        let state = self.state.clone();
        promise(async move { state.create_workspace(&path, name.as_deref()).await })
    }

    #[wasm_bindgen(js_name = deleteWorkspace)]
    pub fn delete_workspace(&self, id: String) -> Promise {
        let state = self.state.clone();
        promise(async move { state.delete_workspace(&id).await })
    }

    /// `null` selects Default.
    #[wasm_bindgen(js_name = selectWorkspace)]
    pub fn select_workspace(&self, id: Option<String>) -> Promise {
        let state = self.state.clone();
        promise(async move { state.select_workspace(id.as_deref()).await })
    }
}

impl Drop for TetherClient {
    fn drop(&mut self) {
        self.state.disconnect();
    }
}
