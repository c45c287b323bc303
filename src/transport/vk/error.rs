//! Error types for the VK API client.

use reqwest::StatusCode;
use thiserror::Error;

use crate::transport::TransportError;

/// Convenient result alias returning [`VkError`] failures.
pub type VkResult<T> = Result<T, VkError>;

/// Failures that can occur while talking to the VK API or the long-poll server.
#[derive(Debug, Error)]
pub enum VkError {
    /// Building the HTTP client failed.
    #[error("failed to build VK client")]
    ClientBuilder {
        #[source]
        source: reqwest::Error,
    },
    /// A request could not be sent.
    #[error("failed to send VK request `{method}`")]
    RequestSend {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// The server answered with a non-success HTTP status.
    #[error("unexpected VK response status {status} for `{method}`")]
    RequestStatus {
        method: &'static str,
        status: StatusCode,
    },
    /// The body was not the JSON we expected.
    #[error("failed to decode VK response for `{method}`")]
    DecodeResponse {
        method: &'static str,
        #[source]
        source: reqwest::Error,
    },
    /// VK returned an `error` envelope.
    #[error("VK method `{method}` failed with code {code}: {message}")]
    Api {
        method: &'static str,
        code: i64,
        message: String,
    },
    /// The envelope held neither `response` nor `error`.
    #[error("VK method `{method}` returned an empty envelope")]
    EmptyEnvelope { method: &'static str },
    /// `groups.getById` returned no group for the token.
    #[error("access token is not bound to a community")]
    NoGroup,
    /// A reply keyboard could not be serialized.
    #[error("failed to encode reply keyboard")]
    EncodeKeyboard {
        #[source]
        source: serde_json::Error,
    },
}

impl From<VkError> for TransportError {
    fn from(err: VkError) -> Self {
        TransportError::Request {
            message: err.to_string(),
            source: Box::new(err),
        }
    }
}
