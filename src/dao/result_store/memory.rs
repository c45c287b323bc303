//! In-process [`ResultStore`] used for local runs without PostgreSQL and as the test double.

use std::sync::Arc;

use futures::future::BoxFuture;
use tokio::sync::RwLock;

use crate::dao::{
    models::{GameResultEntity, NewGameResult, NewMinimalResult, SEED_USERNAMES, UserEntity},
    result_store::ResultStore,
    storage::StorageResult,
};

#[derive(Default)]
struct Tables {
    users: Vec<UserEntity>,
    results: Vec<GameResultEntity>,
    seeded: bool,
}

impl Tables {
    fn next_user_id(&self) -> i32 {
        self.users.iter().map(|user| user.id).max().unwrap_or(0) + 1
    }

    fn next_result_id(&self) -> i32 {
        self.results.iter().map(|row| row.id).max().unwrap_or(0) + 1
    }
}

/// Memory-backed store mirroring the PostgreSQL semantics (seeding, ordering, unique usernames).
#[derive(Clone, Default)]
pub struct MemoryResultStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryResultStore {
    /// Empty tables; the seed users are inserted by the first schema check.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a user directly, returning the stored row. Existing usernames are returned unchanged.
    pub async fn insert_user(
        &self,
        username: &str,
        vk_id: Option<i64>,
        vk_username: Option<&str>,
    ) -> UserEntity {
        let mut tables = self.tables.write().await;
        if let Some(existing) = tables.users.iter().find(|user| user.username == username) {
            return existing.clone();
        }
        let user = UserEntity {
            id: tables.next_user_id(),
            username: username.to_owned(),
            vk_id,
            vk_username: vk_username.map(str::to_owned),
        };
        tables.users.push(user.clone());
        user
    }

    /// Snapshot of every stored result in insertion order.
    pub async fn results(&self) -> Vec<GameResultEntity> {
        self.tables.read().await.results.clone()
    }

    async fn find_user(&self, predicate: impl Fn(&UserEntity) -> bool) -> Option<UserEntity> {
        let tables = self.tables.read().await;
        tables.users.iter().find(|user| predicate(user)).cloned()
    }
}

impl ResultStore for MemoryResultStore {
    fn ensure_schema(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            {
                let tables = store.tables.read().await;
                if tables.seeded {
                    return Ok(());
                }
            }
            for username in SEED_USERNAMES {
                store.insert_user(username, None, None).await;
            }
            store.tables.write().await.seeded = true;
            Ok(())
        })
    }

    fn find_user_by_id(&self, id: i32) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_user(|user| user.id == id).await) })
    }

    fn find_user_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_user(|user| user.username == username).await) })
    }

    fn find_user_by_vk_username(
        &self,
        vk_username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            Ok(store
                .find_user(|user| user.vk_username.as_deref() == Some(vk_username.as_str()))
                .await)
        })
    }

    fn find_user_by_vk_id(
        &self,
        vk_id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move { Ok(store.find_user(|user| user.vk_id == Some(vk_id)).await) })
    }

    fn list_usernames(&self) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            let mut users = tables.users.clone();
            users.sort_by_key(|user| user.id);
            Ok(users.into_iter().map(|user| user.username).collect())
        })
    }

    fn list_results_for_user(
        &self,
        user_id: i32,
    ) -> BoxFuture<'static, StorageResult<Vec<GameResultEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let tables = store.tables.read().await;
            let mut rows: Vec<GameResultEntity> = tables
                .results
                .iter()
                .filter(|row| row.first_user_id == user_id || row.second_user_id == user_id)
                .cloned()
                .collect();
            rows.sort_by(|a, b| b.datetime.cmp(&a.datetime).then(b.id.cmp(&a.id)));
            Ok(rows)
        })
    }

    fn insert_result(&self, result: NewGameResult) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            let mut tables = store.tables.write().await;
            let id = tables.next_result_id();
            tables.results.push(GameResultEntity::from_new(id, result));
            Ok(())
        })
    }

    fn insert_minimal_result(
        &self,
        result: NewMinimalResult,
    ) -> BoxFuture<'static, StorageResult<()>> {
        self.insert_result(result.into())
    }
}
