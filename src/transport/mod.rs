//! Messaging platform seam and its VK implementation.

pub mod vk;

use std::error::Error;

use futures::future::BoxFuture;
use thiserror::Error;

use crate::dto::message::Reply;

/// Failure reported by a [`Messenger`].
#[derive(Debug, Error)]
pub enum TransportError {
    /// The platform request could not be completed.
    #[error("messaging platform request failed: {message}")]
    Request {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The platform returned no profile for the user.
    #[error("no profile for user `{0}`")]
    UnknownUser(i64),
}

/// Outbound side of the messaging platform.
pub trait Messenger: Send + Sync {
    /// Deliver one reply to the conversation `peer_id`.
    fn send(&self, peer_id: i64, reply: Reply) -> BoxFuture<'static, Result<(), TransportError>>;

    /// Screen name of `user_id`, or "First Last" when the profile has none.
    fn display_name(&self, user_id: i64) -> BoxFuture<'static, Result<String, TransportError>>;
}
