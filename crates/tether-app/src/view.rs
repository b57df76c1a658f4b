//! Shapes handed to the UI. Field names are camelCase on the JS side.

use serde::Serialize;
use tether_core::app_state::{AppState, ConnectionState};
use tether_core::cache::LoadPhase;
use tether_core::store::SessionStore;
use tether_types::{
    message::{Message, Part, Role},
    session::{Session, SessionGroup},
    workspace::Workspace,
};

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionView {
    pub id: String,
    pub title: String,
    pub preview: String,
    pub updated_at: Option<String>,
    pub parent_id: Option<String>,
    pub children: Vec<SessionView>,
}

impl SessionView {
    fn from_session(session: &Session, store: &SessionStore) -> Self {
        Self {
            id: session.id.clone(),
            title: session.display_title().to_string(),
            preview: store.preview(&session.id),
            updated_at: session
                .updated_at
                .clone()
                .or_else(|| session.created_at.clone()),
            parent_id: session.parent_id.clone(),
            children: Vec::new(),
        }
    }

    pub fn from_group(group: &SessionGroup, store: &SessionStore) -> Self {
        let mut view = Self::from_session(&group.session, store);
        view.children = group
            .children
            .iter()
            .map(|c| Self::from_session(c, store))
            .collect();
        view
    }
}

pub fn session_tree(groups: &[SessionGroup], store: &SessionStore) -> Vec<SessionView> {
    groups
        .iter()
        .map(|g| SessionView::from_group(g, store))
        .collect()
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageView {
    pub id: String,
    pub role: Role,
    pub created_at: Option<String>,
    pub text: String,
    /// Parts the chat view knows how to draw, in order
    pub parts: Vec<Part>,
}

impl From<&Message> for MessageView {
    fn from(m: &Message) -> Self {
        Self {
            id: m.info.id.clone(),
            role: m.info.role.clone(),
            created_at: m.info.created_at.clone(),
            text: m.text(),
            parts: m.renderable_parts().cloned().collect(),
        }
    }
}

pub fn message_views(messages: &[Message]) -> Vec<MessageView> {
    messages.iter().map(MessageView::from).collect()
}

pub fn phase_label(phase: LoadPhase) -> &'static str {
    match phase {
        LoadPhase::Idle => "idle",
        LoadPhase::Loading => "loading",
        LoadPhase::Refreshing => "refreshing",
    }
}

/// Everything the shell of the UI needs for one render.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    pub connection: ConnectionState,
    pub workspace: Workspace,
    pub subscription: &'static str,
    pub active_session: Option<String>,
    pub sessions_phase: &'static str,
    pub last_error: Option<String>,
}

impl Snapshot {
    pub fn of(state: &AppState) -> Self {
        Self {
            connection: state.connection_state(),
            workspace: state.current_workspace(),
            subscription: state.subscription_state().label(),
            active_session: state.active_session(),
            sessions_phase: phase_label(state.sessions_phase()),
            last_error: state.last_error(),
        }
    }
}
