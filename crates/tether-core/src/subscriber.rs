//! Live updates for the active session.
//!
//! Two tasks run per subscription: one reads the server event stream and
//! reopens it after a delay when it fails, the other polls on a fixed
//! interval as a backstop for unreliable streams. Both share one
//! [`CancelToken`] and are wrapped in `Abortable`, so after
//! [`LiveSubscriber::unsubscribe`] neither can touch the cache again.

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;
use futures::future::{abortable, AbortHandle};
use futures::task::{LocalSpawn, LocalSpawnExt};
use futures::StreamExt;
use serde::Serialize;
use serde_json::Value;
use tether_types::{
    ClientError, Result,
    event::{normalize, StateEvent},
};
use crate::cache::FetchMode;
use crate::event_bus::EventBus;
use crate::ports::TimerPort;
use crate::store::SessionStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SubscriptionState {
    Unsubscribed,
    Subscribing,
    Subscribed,
    Reconnecting,
    Closing,
}

impl SubscriptionState {
    pub fn label(&self) -> &'static str {
        match self {
            SubscriptionState::Unsubscribed => "unsubscribed",
            SubscriptionState::Subscribing => "subscribing",
            SubscriptionState::Subscribed => "subscribed",
            SubscriptionState::Reconnecting => "reconnecting",
            SubscriptionState::Closing => "closing",
        }
    }
}

/// Shared cancellation flag, checked before every cache mutation and
/// before every reconnect.
#[derive(Clone, Default)]
pub struct CancelToken(Rc<Cell<bool>>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

/// Publishes state transitions on the event bus.
#[derive(Clone)]
struct StateTracker {
    state: Rc<Cell<SubscriptionState>>,
    event_bus: EventBus,
}

impl StateTracker {
    fn set(&self, session_id: Option<&str>, next: SubscriptionState) {
        if self.state.replace(next) != next {
            self.event_bus.emit(StateEvent::SubscriptionChanged {
                session_id: session_id.map(String::from),
                state: next.label().to_string(),
            });
        }
    }
}

struct ActiveSubscription {
    session_id: String,
    token: CancelToken,
    handles: Vec<AbortHandle>,
}

pub struct LiveSubscriber {
    store: Rc<SessionStore>,
    timer: Rc<dyn TimerPort>,
    spawner: Rc<dyn LocalSpawn>,
    tracker: StateTracker,
    poll_interval_ms: u64,
    reconnect_delay_ms: u64,
    active: RefCell<Option<ActiveSubscription>>,
}

impl LiveSubscriber {
    pub fn new(
        store: Rc<SessionStore>,
        timer: Rc<dyn TimerPort>,
        spawner: Rc<dyn LocalSpawn>,
        event_bus: EventBus,
        poll_interval_ms: u64,
        reconnect_delay_ms: u64,
    ) -> Self {
        Self {
            store,
            timer,
            spawner,
            tracker: StateTracker {
                state: Rc::new(Cell::new(SubscriptionState::Unsubscribed)),
                event_bus,
            },
            poll_interval_ms,
            reconnect_delay_ms,
            active: RefCell::new(None),
        }
    }

    pub fn state(&self) -> SubscriptionState {
        self.tracker.state.get()
    }

    pub fn active_session(&self) -> Option<String> {
        self.active.borrow().as_ref().map(|a| a.session_id.clone())
    }

    /// Make `session_id` the active session. Any previous subscription is
    /// torn down first. Its messages are refreshed right away, then the
    /// stream and poll tasks start.
    pub fn subscribe(&self, session_id: &str, workspace_path: &str) -> Result<()> {
        self.unsubscribe();

        let token = CancelToken::new();
        let ctx = TaskContext {
            store: self.store.clone(),
            timer: self.timer.clone(),
            tracker: self.tracker.clone(),
            token: token.clone(),
            session_id: Rc::from(session_id),
            workspace_path: Rc::from(workspace_path),
            reconnect_delay_ms: self.reconnect_delay_ms,
        };
        self.tracker.set(Some(session_id), SubscriptionState::Subscribing);
        log::info!("Subscribing to session {}", session_id);

        let mut handles = Vec::with_capacity(3);
        let tasks: [std::pin::Pin<Box<dyn Future<Output = ()>>>; 3] = [
            Box::pin(ctx.clone().initial_refresh()),
            Box::pin(ctx.clone().run_stream()),
            Box::pin(ctx.run_poll(self.poll_interval_ms)),
        ];
        for task in tasks {
            match self.spawn(task) {
                Ok(handle) => handles.push(handle),
                Err(e) => {
                    token.cancel();
                    handles.iter().for_each(AbortHandle::abort);
                    self.tracker.set(None, SubscriptionState::Unsubscribed);
                    return Err(e);
                }
            }
        }

        *self.active.borrow_mut() = Some(ActiveSubscription {
            session_id: session_id.to_string(),
            token,
            handles,
        });
        Ok(())
    }

    /// Stop live updates. Safe to call any number of times.
    pub fn unsubscribe(&self) {
        let Some(active) = self.active.borrow_mut().take() else {
            return;
        };
        self.tracker
            .set(Some(active.session_id.as_str()), SubscriptionState::Closing);
        active.token.cancel();
        for handle in &active.handles {
            handle.abort();
        }
        self.tracker.set(None, SubscriptionState::Unsubscribed);
        log::info!("Unsubscribed from session {}", active.session_id);
    }

    fn spawn(&self, task: impl Future<Output = ()> + 'static) -> Result<AbortHandle> {
        let (task, handle) = abortable(task);
        self.spawner
            .spawn_local(async move {
                let _ = task.await;
            })
            .map_err(|e| ClientError::Spawn(e.to_string()))?;
        Ok(handle)
    }
}

impl Drop for LiveSubscriber {
    fn drop(&mut self) {
        self.unsubscribe();
    }
}

// ─── Tasks ───────────────────────────────────────────────────

#[derive(Clone)]
struct TaskContext {
    store: Rc<SessionStore>,
    timer: Rc<dyn TimerPort>,
    tracker: StateTracker,
    token: CancelToken,
    session_id: Rc<str>,
    workspace_path: Rc<str>,
    reconnect_delay_ms: u64,
}

impl TaskContext {
    async fn initial_refresh(self) {
        if self.token.is_cancelled() {
            return;
        }
        if let Err(e) = self
            .store
            .load_messages(&self.session_id, &self.workspace_path, FetchMode::Forced)
            .await
        {
            log::warn!("Initial load of {} failed: {}", self.session_id, e);
        }
    }

    /// Quiet refresh: no spinner, failures only logged by the store.
    async fn refresh(&self) {
        if self.token.is_cancelled() {
            return;
        }
        let _ = self
            .store
            .load_messages(&self.session_id, &self.workspace_path, FetchMode::Silent)
            .await;
    }

    async fn run_stream(self) {
        loop {
            if self.token.is_cancelled() {
                return;
            }
            let mut events = self.store.remote().events(&self.workspace_path);
            self.tracker
                .set(Some(&*self.session_id), SubscriptionState::Subscribed);

            while let Some(item) = events.next().await {
                if self.token.is_cancelled() {
                    return;
                }
                match item {
                    Ok(raw) => self.dispatch(&raw).await,
                    Err(e) => {
                        log::warn!("Event stream for {} failed: {}", self.session_id, e);
                        break;
                    }
                }
            }

            if self.token.is_cancelled() {
                return;
            }
            self.tracker
                .set(Some(&*self.session_id), SubscriptionState::Reconnecting);
            self.timer.sleep(self.reconnect_delay_ms).await;
        }
    }

    async fn dispatch(&self, raw: &Value) {
        let Some(event) = normalize(raw) else {
            return;
        };
        if !event.is_for(&self.session_id) || !event.kind.affects_messages() {
            return;
        }
        log::debug!("{:?} for {}, refreshing", event.kind, self.session_id);
        self.refresh().await;
    }

    async fn run_poll(self, interval_ms: u64) {
        loop {
            self.timer.sleep(interval_ms).await;
            if self.token.is_cancelled() {
                return;
            }
            self.refresh().await;
        }
    }
}
