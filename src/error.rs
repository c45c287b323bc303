//! Errors surfaced by the conversation services.

use thiserror::Error;

use crate::{dto::payload::PayloadError, state::recording::InvalidTransition};

/// Errors that abort handling of a single message.
///
/// Storage failures never surface here: the services turn them into user-facing replies.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The button payload could not be decoded, or a keyboard payload could not be built.
    #[error("malformed payload")]
    Payload(#[from] PayloadError),
    /// The recording flow was asked to move past its terminal step.
    #[error("recording flow out of order")]
    Transition(#[from] InvalidTransition),
}
