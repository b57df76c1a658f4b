use serde::{Deserialize, Serialize};
use serde_json::Value;

// ─── Server events ───────────────────────────────────────────

/// Kind of a server-sent event, as far as this client cares.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventKind {
    MessageUpdated,
    MessagePartUpdated,
    SessionUpdated,
    SessionStatus,
    Other(String),
}

impl EventKind {
    pub fn from_type(ty: &str) -> Self {
        match ty {
            "message.updated" => EventKind::MessageUpdated,
            "message.part.updated" => EventKind::MessagePartUpdated,
            "session.updated" => EventKind::SessionUpdated,
            "session.status" => EventKind::SessionStatus,
            other => EventKind::Other(other.to_string()),
        }
    }

    /// Kinds that change what the active session's message list shows.
    pub fn affects_messages(&self) -> bool {
        !matches!(self, EventKind::Other(_))
    }

    fn is_session_scoped(&self, ty: &str) -> bool {
        matches!(self, EventKind::SessionUpdated | EventKind::SessionStatus)
            || ty.starts_with("session.")
    }
}

/// Canonical form of every server event shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedEvent {
    pub kind: EventKind,
    pub session_id: Option<String>,
    pub payload: Value,
}

impl NormalizedEvent {
    pub fn is_for(&self, session_id: &str) -> bool {
        self.session_id.as_deref() == Some(session_id)
    }
}

/// Map a raw event body onto [`NormalizedEvent`].
///
/// Accepts `{type, properties}` and the directory-wrapped
/// `{directory, payload: {type, properties}}`. Returns `None` when no
/// `type` can be found.
pub fn normalize(raw: &Value) -> Option<NormalizedEvent> {
    let event = match raw.get("payload") {
        Some(inner) if inner.get("type").is_some() => inner,
        _ => raw,
    };
    let ty = event.get("type")?.as_str()?;
    let kind = EventKind::from_type(ty);
    let props = event.get("properties").unwrap_or(&Value::Null);

    let mut session_id = [
        &["sessionID"][..],
        &["info", "sessionID"][..],
        &["part", "sessionID"][..],
    ]
    .iter()
    .find_map(|path| string_at(props, path));

    if session_id.is_none() && kind.is_session_scoped(ty) {
        session_id = string_at(props, &["info", "id"]);
    }

    Some(NormalizedEvent {
        kind,
        session_id,
        payload: props.clone(),
    })
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |v, key| v.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
}

// ─── State notifications ─────────────────────────────────────

/// Notifications published by the core for the UI to react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum StateEvent {
    /// Connection state machine moved
    ConnectionChanged { connected: bool, error: Option<String> },

    /// Session list for the current workspace was replaced
    SessionsUpdated,

    /// Message list of one session was replaced
    MessagesUpdated { session_id: String },

    ProjectsUpdated,

    /// Workspace list or selection changed
    WorkspacesChanged,

    /// Live subscription moved to a new state
    SubscriptionChanged { session_id: Option<String>, state: String },

    /// A fetch failed; cached data stays visible
    Error { message: String },
}
