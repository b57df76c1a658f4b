//! Workspace manager: CRUD over the locally stored workspace list.
//!
//! The Default workspace is synthesized on read and never stored, so it can
//! be neither deleted nor duplicated by a reload.

use std::cell::RefCell;
use std::rc::Rc;
use tether_types::{
    ClientError, Result,
    config::{CURRENT_WORKSPACE_KEY, WORKSPACES_KEY},
    event::StateEvent,
    workspace::{Workspace, ROOT_PATH},
};
use crate::event_bus::EventBus;
use crate::ports::StoragePort;
use crate::records;

pub struct WorkspaceManager {
    storage: Rc<dyn StoragePort>,
    event_bus: EventBus,
    workspaces: RefCell<Rc<Vec<Workspace>>>,
    current: RefCell<Option<Workspace>>,
}

impl WorkspaceManager {
    pub fn new(storage: Rc<dyn StoragePort>, event_bus: EventBus) -> Self {
        Self {
            storage,
            event_bus,
            workspaces: RefCell::new(Rc::new(Vec::new())),
            current: RefCell::new(None),
        }
    }

    /// Restore the list and the selection. Missing or corrupt records read
    /// as empty; a selection that no longer matches a stored workspace is
    /// dropped.
    pub async fn load(&self) {
        let list: Vec<Workspace> = records::load(self.storage.as_ref(), WORKSPACES_KEY)
            .await
            .unwrap_or_default();
        let pointer: Option<Workspace> =
            records::load(self.storage.as_ref(), CURRENT_WORKSPACE_KEY).await;

        let current = pointer.and_then(|p| list.iter().find(|w| w.id == p.id).cloned());
        log::info!(
            "Loaded {} workspace(s) from {}, current: {}",
            list.len(),
            self.storage.backend_name(),
            current.as_ref().map(|w| w.name.as_str()).unwrap_or("Default")
        );

        *self.workspaces.borrow_mut() = Rc::new(list);
        *self.current.borrow_mut() = current;
        self.event_bus.emit(StateEvent::WorkspacesChanged);
    }

    /// User-created workspaces, in creation order, without Default.
    pub fn workspaces(&self) -> Rc<Vec<Workspace>> {
        self.workspaces.borrow().clone()
    }

    /// What the picker shows: Default first, then the stored list.
    pub fn displayed(&self) -> Vec<Workspace> {
        let stored = self.workspaces();
        let mut out = Vec::with_capacity(stored.len() + 1);
        out.push(Workspace::default_workspace());
        out.extend(stored.iter().cloned());
        out
    }

    /// The selected user workspace; `None` means Default.
    pub fn current(&self) -> Option<Workspace> {
        self.current.borrow().clone()
    }

    pub fn current_or_default(&self) -> Workspace {
        self.current().unwrap_or_else(Workspace::default_workspace)
    }

    /// Path of the selected workspace, `/` for Default.
    pub fn current_path(&self) -> String {
        self.current
            .borrow()
            .as_ref()
            .map(|w| w.path.clone())
            .unwrap_or_else(|| ROOT_PATH.to_string())
    }

    pub fn find(&self, id: &str) -> Option<Workspace> {
        if id == tether_types::workspace::DEFAULT_WORKSPACE_ID {
            return Some(Workspace::default_workspace());
        }
        self.workspaces.borrow().iter().find(|w| w.id == id).cloned()
    }

    pub async fn create(&self, path: &str, name: Option<&str>) -> Result<Workspace> {
        let path = path.trim();
        if path.is_empty() {
            return Err(ClientError::Config("Workspace path is empty".to_string()));
        }
        let workspace = Workspace::new(path, name);

        let mut next = (**self.workspaces.borrow()).clone();
        next.push(workspace.clone());
        *self.workspaces.borrow_mut() = Rc::new(next);
        self.event_bus.emit(StateEvent::WorkspacesChanged);
        log::info!("Created workspace {} at {}", workspace.name, workspace.path);

        self.persist_list().await?;
        Ok(workspace)
    }

    /// Remove a workspace. Returns `false` when nothing was removed, which
    /// includes every attempt to delete Default.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let before = self.workspaces();
        if !before.iter().any(|w| w.id == id) {
            return Ok(false);
        }
        let next: Vec<Workspace> = before.iter().filter(|w| w.id != id).cloned().collect();
        *self.workspaces.borrow_mut() = Rc::new(next);

        let was_current = self
            .current
            .borrow()
            .as_ref()
            .is_some_and(|w| w.id == id);
        if was_current {
            *self.current.borrow_mut() = None;
        }
        self.event_bus.emit(StateEvent::WorkspacesChanged);

        self.persist_list().await?;
        if was_current {
            records::clear(self.storage.as_ref(), CURRENT_WORKSPACE_KEY).await?;
        }
        Ok(true)
    }

    /// Change the selection. Selecting Default (or `None`) clears the
    /// stored pointer.
    pub async fn set_current(&self, workspace: Option<Workspace>) -> Result<()> {
        let workspace = workspace.filter(|w| !w.is_default());
        *self.current.borrow_mut() = workspace.clone();
        self.event_bus.emit(StateEvent::WorkspacesChanged);

        match workspace {
            Some(w) => records::save(self.storage.as_ref(), CURRENT_WORKSPACE_KEY, &w).await,
            None => records::clear(self.storage.as_ref(), CURRENT_WORKSPACE_KEY).await,
        }
    }

    /// Select by id; `None` or an unknown id selects Default.
    pub async fn select(&self, id: Option<&str>) -> Result<Workspace> {
        let workspace = id.and_then(|id| self.find(id));
        self.set_current(workspace).await?;
        Ok(self.current_or_default())
    }

    async fn persist_list(&self) -> Result<()> {
        let list = self.workspaces();
        records::save(self.storage.as_ref(), WORKSPACES_KEY, list.as_slice())
            .await
            .map_err(|e| {
                log::warn!("Failed to persist workspaces: {}", e);
                e
            })
    }
}
