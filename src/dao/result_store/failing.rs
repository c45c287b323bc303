//! Test double that fails selected operations and delegates the rest to a memory store.

use std::io;

use futures::future::BoxFuture;

use crate::dao::{
    models::{GameResultEntity, NewGameResult, NewMinimalResult, UserEntity},
    result_store::{ResultStore, memory::MemoryResultStore},
    storage::{StorageError, StorageResult},
};

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum StoreOperation {
    EnsureSchema,
    FindUserById,
    FindUserByUsername,
    FindUserByExternal,
    ListUsernames,
    ListResults,
    InsertResult,
}

pub(crate) struct FailingStore {
    inner: MemoryResultStore,
    failing: Vec<StoreOperation>,
}

impl FailingStore {
    pub(crate) fn new(inner: MemoryResultStore, failing: &[StoreOperation]) -> Self {
        Self {
            inner,
            failing: failing.to_vec(),
        }
    }

    fn guard<T: Send + 'static>(
        &self,
        operation: StoreOperation,
        delegate: impl FnOnce(&MemoryResultStore) -> BoxFuture<'static, StorageResult<T>>,
    ) -> BoxFuture<'static, StorageResult<T>> {
        if self.failing.contains(&operation) {
            Box::pin(async move {
                Err(StorageError::unavailable(
                    format!("{operation:?} failed"),
                    io::Error::other("injected failure"),
                ))
            })
        } else {
            delegate(&self.inner)
        }
    }
}

impl ResultStore for FailingStore {
    fn ensure_schema(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.guard(StoreOperation::EnsureSchema, |inner| inner.ensure_schema())
    }

    fn find_user_by_id(&self, id: i32) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        self.guard(StoreOperation::FindUserById, |inner| inner.find_user_by_id(id))
    }

    fn find_user_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        self.guard(StoreOperation::FindUserByUsername, |inner| {
            inner.find_user_by_username(username)
        })
    }

    fn find_user_by_vk_username(
        &self,
        vk_username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        self.guard(StoreOperation::FindUserByExternal, |inner| {
            inner.find_user_by_vk_username(vk_username)
        })
    }

    fn find_user_by_vk_id(
        &self,
        vk_id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        self.guard(StoreOperation::FindUserByExternal, |inner| {
            inner.find_user_by_vk_id(vk_id)
        })
    }

    fn list_usernames(&self) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        self.guard(StoreOperation::ListUsernames, |inner| inner.list_usernames())
    }

    fn list_results_for_user(
        &self,
        user_id: i32,
    ) -> BoxFuture<'static, StorageResult<Vec<GameResultEntity>>> {
        self.guard(StoreOperation::ListResults, |inner| {
            inner.list_results_for_user(user_id)
        })
    }

    fn insert_result(&self, result: NewGameResult) -> BoxFuture<'static, StorageResult<()>> {
        self.guard(StoreOperation::InsertResult, |inner| inner.insert_result(result))
    }

    fn insert_minimal_result(
        &self,
        result: NewMinimalResult,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.guard(StoreOperation::InsertResult, |inner| {
            inner.insert_minimal_result(result)
        })
    }
}
