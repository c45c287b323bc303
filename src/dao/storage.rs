use std::{error::Error, future::Future, time::Duration};

use thiserror::Error;
use tokio::time::timeout;

/// Result alias for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Error raised by storage backends regardless of the underlying database.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend could not serve the request.
    #[error("storage unavailable: {message}")]
    Unavailable {
        message: String,
        #[source]
        source: Box<dyn Error + Send + Sync>,
    },
    /// The call exceeded its deadline.
    #[error("storage operation `{operation}` timed out after {limit:?}")]
    Timeout {
        operation: &'static str,
        limit: Duration,
    },
}

impl StorageError {
    /// Construct an unavailable error from any backend failure.
    pub fn unavailable(message: String, source: impl Error + Send + Sync + 'static) -> Self {
        StorageError::Unavailable {
            message,
            source: Box::new(source),
        }
    }
}

/// Outcome of a lookup that keeps "nothing matched" apart from "the store failed".
#[derive(Debug)]
pub enum Lookup<T> {
    /// A matching row exists.
    Found(T),
    /// The query ran and matched nothing.
    NotFound,
    /// The query could not be answered.
    Failed(StorageError),
}

#[cfg(test)]
impl<T> Lookup<T> {
    pub(crate) fn found(self) -> Option<T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::NotFound | Lookup::Failed(_) => None,
        }
    }

    pub(crate) fn is_not_found(&self) -> bool {
        matches!(self, Lookup::NotFound)
    }
}

impl<T> From<StorageResult<Option<T>>> for Lookup<T> {
    fn from(value: StorageResult<Option<T>>) -> Self {
        match value {
            Ok(Some(found)) => Lookup::Found(found),
            Ok(None) => Lookup::NotFound,
            Err(err) => Lookup::Failed(err),
        }
    }
}

/// Run a storage future under `limit`, turning an elapsed deadline into [`StorageError::Timeout`].
pub async fn bounded<T, Fut>(operation: &'static str, limit: Duration, work: Fut) -> StorageResult<T>
where
    Fut: Future<Output = StorageResult<T>>,
{
    match timeout(limit, work).await {
        Ok(result) => result,
        Err(_) => Err(StorageError::Timeout { operation, limit }),
    }
}
