//! Persistence: stores, models and the gateway used by the services.

/// Typed, time-bounded persistence operations.
pub mod gateway;
/// Database model definitions.
pub mod models;
/// Store backends for users and results.
pub mod result_store;
/// Storage error and lookup outcome types.
pub mod storage;
