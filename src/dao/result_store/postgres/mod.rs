//! PostgreSQL-backed [`ResultStore`](super::ResultStore) built on sqlx.

mod config;
mod connection;
mod error;
mod schema;
mod store;

pub use config::PostgresConfig;
pub use error::{PostgresDaoError, PostgresResult};
pub use store::PostgresResultStore;
