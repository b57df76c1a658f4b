use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Author of a message
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A message as returned by the session message listing:
/// header info plus an ordered list of parts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub info: MessageInfo,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "MessageInfoWire")]
pub struct MessageInfo {
    pub id: String,
    pub role: Role,
    #[serde(rename = "createdAt", skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(rename = "sessionID", skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
}

/// One typed piece of a message. Unknown part types are kept as `Other`
/// so a listing never fails on a part kind this client does not render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Part {
    Text {
        #[serde(default)]
        text: String,
    },
    Tool {
        #[serde(default)]
        tool: String,
        #[serde(default)]
        state: Value,
    },
    File {
        #[serde(default)]
        mime: String,
        #[serde(default)]
        url: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        filename: Option<String>,
    },
    #[serde(other)]
    Other,
}

impl Part {
    pub fn is_image(&self) -> bool {
        matches!(self, Part::File { mime, .. } if mime.starts_with("image/"))
    }

    /// Only text, tool and image parts are drawn; everything else is skipped.
    pub fn is_renderable(&self) -> bool {
        match self {
            Part::Text { .. } | Part::Tool { .. } => true,
            Part::File { .. } => self.is_image(),
            Part::Other => false,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Part::Text { text } => Some(text.as_str()),
            _ => None,
        }
    }
}

impl Message {
    /// Parts to render, in array order.
    pub fn renderable_parts(&self) -> impl Iterator<Item = &Part> {
        self.parts.iter().filter(|p| p.is_renderable())
    }

    /// All text parts joined with newlines.
    pub fn text(&self) -> String {
        self.parts
            .iter()
            .filter_map(Part::as_text)
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Preview line for a session list row: the newest message that carries
/// any text, collapsed and truncated.
pub fn preview_text(messages: &[Message], max_chars: usize) -> String {
    messages
        .iter()
        .rev()
        .map(Message::text)
        .find(|t| !t.is_empty())
        .map(|t| truncate_preview(&t, max_chars))
        .unwrap_or_default()
}

/// Collapse whitespace runs to single spaces and cut at `max_chars`
/// characters, appending an ellipsis when something was dropped.
pub fn truncate_preview(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }
    let mut out: String = collapsed.chars().take(max_chars).collect();
    out.truncate(out.trim_end().len());
    out.push('…');
    out
}

/// Body of a prompt (send message) request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest {
    pub parts: Vec<PromptPart>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PromptPart {
    Text { text: String },
}

impl PromptRequest {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            parts: vec![PromptPart::Text { text: text.into() }],
        }
    }
}

// ─── Wire shape ──────────────────────────────────────────────

#[derive(Deserialize)]
struct MessageInfoWire {
    id: String,
    role: Role,
    #[serde(rename = "createdAt", default)]
    created_at: Option<String>,
    #[serde(rename = "sessionID", default)]
    session_id: Option<String>,
    #[serde(default)]
    time: Option<MessageTimeWire>,
}

#[derive(Deserialize)]
struct MessageTimeWire {
    #[serde(default)]
    created: Option<Value>,
}

impl From<MessageInfoWire> for MessageInfo {
    fn from(w: MessageInfoWire) -> Self {
        let created = w
            .time
            .and_then(|t| t.created)
            .as_ref()
            .and_then(crate::session::timestamp_string);
        Self {
            id: w.id,
            role: w.role,
            created_at: w.created_at.or(created),
            session_id: w.session_id,
        }
    }
}
