use crate::dto::keyboard::Keyboard;

/// One inbound chat message as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    /// Conversation identifier; replies go here.
    pub peer_id: i64,
    /// Platform id of the sender.
    pub from_id: i64,
    /// Message text, possibly empty.
    pub text: String,
    /// Raw button payload, still double-encoded.
    pub payload: Option<String>,
}

/// A message the bot sends back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// Message body.
    pub text: String,
    /// Keyboard sent along with the message, if any.
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    /// Plain text reply.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    /// Reply carrying `keyboard`.
    pub fn with_keyboard(text: impl Into<String>, keyboard: Keyboard) -> Self {
        Self {
            text: text.into(),
            keyboard: Some(keyboard),
        }
    }
}
