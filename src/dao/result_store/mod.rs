#[cfg(test)]
pub(crate) mod failing;
pub mod memory;
#[cfg(feature = "postgres-store")]
pub mod postgres;

use futures::future::BoxFuture;

use crate::dao::models::{GameResultEntity, NewGameResult, NewMinimalResult, UserEntity};
use crate::dao::storage::StorageResult;

/// Abstraction over the relational store holding users and game results.
///
/// Every future is `'static` so callers can wrap it in a timeout without borrowing the store.
pub trait ResultStore: Send + Sync {
    /// Create missing tables/columns and seed users; a no-op once it has succeeded.
    fn ensure_schema(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn find_user_by_id(&self, id: i32) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn find_user_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn find_user_by_vk_username(
        &self,
        vk_username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn find_user_by_vk_id(&self, vk_id: i64)
    -> BoxFuture<'static, StorageResult<Option<UserEntity>>>;
    fn list_usernames(&self) -> BoxFuture<'static, StorageResult<Vec<String>>>;
    /// Results where the user played either side, newest first.
    fn list_results_for_user(
        &self,
        user_id: i32,
    ) -> BoxFuture<'static, StorageResult<Vec<GameResultEntity>>>;
    fn insert_result(&self, result: NewGameResult) -> BoxFuture<'static, StorageResult<()>>;
    fn insert_minimal_result(
        &self,
        result: NewMinimalResult,
    ) -> BoxFuture<'static, StorageResult<()>>;
}
