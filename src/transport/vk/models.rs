//! Wire shapes of the VK API and the Bots Long Poll server.

use serde::Deserialize;
use serde_json::Value;

use crate::dto::message::IncomingMessage;

/// Generic `{"response": ...}` / `{"error": ...}` envelope.
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    /// Method result on success.
    pub response: Option<T>,
    /// Failure details otherwise.
    pub error: Option<ApiError>,
}

/// Error object of a failed method call.
#[derive(Debug, Deserialize)]
pub struct ApiError {
    /// Numeric VK error code.
    pub error_code: i64,
    /// Human-readable description.
    pub error_msg: String,
}

/// `groups.getById` result.
#[derive(Debug, Deserialize)]
pub struct GroupsResponse {
    /// Requested communities; the token's own when no id is passed.
    pub groups: Vec<Group>,
}

/// A VK community.
#[derive(Debug, Clone, Deserialize)]
pub struct Group {
    /// Community id (positive).
    pub id: i64,
    /// Community title.
    #[serde(default)]
    pub name: String,
}

/// `users.get` entry.
#[derive(Debug, Deserialize)]
pub struct UserProfile {
    /// User id.
    pub id: i64,
    /// Given name.
    #[serde(default)]
    pub first_name: String,
    /// Family name.
    #[serde(default)]
    pub last_name: String,
    /// Short address, when the user picked one.
    #[serde(default)]
    pub screen_name: Option<String>,
}

impl UserProfile {
    /// Screen name when set, otherwise "First Last".
    pub fn display_name(&self) -> String {
        match self.screen_name.as_deref() {
            Some(screen_name) if !screen_name.is_empty() => screen_name.to_owned(),
            _ if self.last_name.is_empty() => self.first_name.clone(),
            _ => format!("{} {}", self.first_name, self.last_name),
        }
    }
}

/// Connection parameters returned by `groups.getLongPollServer`.
#[derive(Debug, Clone, Deserialize)]
pub struct LongPollServer {
    /// Session key for `a_check`.
    pub key: String,
    /// Full URL to poll.
    pub server: String,
    /// Initial event cursor.
    #[serde(deserialize_with = "string_or_number")]
    pub ts: String,
}

/// Body of an `a_check` response.
#[derive(Debug, Deserialize)]
pub struct PollResponse {
    /// Cursor to pass to the next request.
    #[serde(default, deserialize_with = "optional_string_or_number")]
    pub ts: Option<String>,
    /// Events since the previous cursor.
    #[serde(default)]
    pub updates: Vec<Update>,
    /// 1: history lost, 2: key expired, 3: session lost.
    pub failed: Option<i64>,
}

/// One long-poll event.
#[derive(Debug, Deserialize)]
pub struct Update {
    /// Event type, e.g. `message_new`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Event body; its shape depends on `kind`.
    #[serde(default)]
    pub object: Value,
}

/// Body of a `message_new` event.
#[derive(Debug, Deserialize)]
pub struct MessageNewObject {
    /// The new message.
    pub message: Message,
}

/// Message as delivered by VK.
#[derive(Debug, Deserialize)]
pub struct Message {
    /// Conversation id.
    pub peer_id: i64,
    /// Sender id.
    pub from_id: i64,
    /// Message text.
    #[serde(default)]
    pub text: String,
    /// Button payload, double-encoded.
    pub payload: Option<String>,
}

impl From<Message> for IncomingMessage {
    fn from(message: Message) -> Self {
        Self {
            peer_id: message.peer_id,
            from_id: message.from_id,
            text: message.text,
            payload: message.payload.filter(|payload| !payload.is_empty()),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {other}"
        ))),
    }
}

fn optional_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    string_or_number(deserializer).map(Some)
}
