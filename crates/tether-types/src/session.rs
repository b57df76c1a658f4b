use std::collections::{HashMap, HashSet};

use chrono::{DateTime, SecondsFormat};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A remote conversation. The server is authoritative; the owning
/// directory is implied by the request header and not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "SessionWire")]
pub struct Session {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "updatedAt", skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(rename = "parentID", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: None,
            created_at: None,
            updated_at: None,
            parent_id: None,
        }
    }

    /// Sort key for "most recently active first".
    pub fn activity_key(&self) -> &str {
        self.updated_at
            .as_deref()
            .or(self.created_at.as_deref())
            .unwrap_or("")
    }

    pub fn is_child(&self) -> bool {
        self.parent_id.is_some()
    }

    pub fn display_title(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.trim().is_empty() => t,
            _ => "Untitled session",
        }
    }
}

/// Sort sessions descending by `updatedAt ?? createdAt`, compared as strings.
pub fn sort_by_activity(sessions: &mut [Session]) {
    sessions.sort_by(|a, b| b.activity_key().cmp(a.activity_key()));
}

/// A root session with every descendant flattened under it, for nested
/// display.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionGroup {
    pub session: Session,
    pub children: Vec<Session>,
}

/// Nest sessions under their top-level ancestor. Input order is kept for
/// both roots and children. A session whose parent is not in the list, or
/// whose ancestry loops, is shown as a root.
pub fn group_sessions(sessions: &[Session]) -> Vec<SessionGroup> {
    let parents: HashMap<&str, Option<&str>> = sessions
        .iter()
        .map(|s| (s.id.as_str(), s.parent_id.as_deref()))
        .collect();
    let roots: Vec<Option<&str>> = sessions.iter().map(|s| top_ancestor(s, &parents)).collect();

    let mut groups: Vec<SessionGroup> = sessions
        .iter()
        .zip(&roots)
        .filter(|(_, root)| root.is_none())
        .map(|(s, _)| SessionGroup {
            session: s.clone(),
            children: Vec::new(),
        })
        .collect();

    for (session, root) in sessions.iter().zip(&roots) {
        let Some(root) = root else {
            continue;
        };
        if let Some(group) = groups.iter_mut().find(|g| g.session.id == *root) {
            group.children.push(session.clone());
        }
    }
    groups
}

/// Highest known ancestor of `session`, or `None` when it is a root itself.
fn top_ancestor<'a>(session: &'a Session, parents: &HashMap<&'a str, Option<&'a str>>) -> Option<&'a str> {
    let mut seen = HashSet::from([session.id.as_str()]);
    let mut top = None;
    let mut next = session.parent_id.as_deref();
    while let Some(id) = next {
        if !seen.insert(id) {
            return None;
        }
        let Some(&parent) = parents.get(id) else {
            break;
        };
        top = Some(id);
        next = parent;
    }
    top
}

/// Body of a create-session request.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateSessionRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(rename = "parentID", skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
}

// ─── Wire shape ──────────────────────────────────────────────

/// Accepts both the flat `createdAt`/`updatedAt` strings and the server's
/// `time: {created, updated}` epoch-millisecond numbers.
#[derive(Deserialize)]
struct SessionWire {
    id: String,
    #[serde(default)]
    title: Option<String>,
    #[serde(rename = "createdAt", default)]
    created_at: Option<String>,
    #[serde(rename = "updatedAt", default)]
    updated_at: Option<String>,
    #[serde(rename = "parentID", default)]
    parent_id: Option<String>,
    #[serde(default)]
    time: Option<WireTime>,
}

#[derive(Deserialize)]
struct WireTime {
    #[serde(default)]
    created: Option<Value>,
    #[serde(default)]
    updated: Option<Value>,
}

impl From<SessionWire> for Session {
    fn from(w: SessionWire) -> Self {
        let (created, updated) = match w.time {
            Some(t) => (
                t.created.as_ref().and_then(timestamp_string),
                t.updated.as_ref().and_then(timestamp_string),
            ),
            None => (None, None),
        };
        Self {
            id: w.id,
            title: w.title,
            created_at: w.created_at.or(created),
            updated_at: w.updated_at.or(updated),
            parent_id: w.parent_id,
        }
    }
}

/// Render a wire timestamp as a fixed-width RFC 3339 string so that string
/// comparison orders chronologically.
pub(crate) fn timestamp_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => {
            let ms = n.as_i64().or_else(|| n.as_f64().map(|f| f as i64))?;
            DateTime::from_timestamp_millis(ms)
                .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
        }
        _ => None,
    }
}
