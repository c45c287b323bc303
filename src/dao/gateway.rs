use std::{sync::Arc, time::Duration};

use futures::future::BoxFuture;

use crate::dao::{
    models::{GameResultEntity, NewGameResult, NewMinimalResult, UserEntity},
    result_store::ResultStore,
    storage::{Lookup, StorageResult, bounded},
};

/// Typed persistence operations used by the conversation services.
///
/// Each call first runs the store's schema-readiness check and is bounded by a single deadline.
#[derive(Clone)]
pub struct PersistenceGateway {
    store: Arc<dyn ResultStore>,
    timeout: Duration,
}

impl PersistenceGateway {
    /// Wrap `store`, bounding every call by `timeout`.
    pub fn new(store: Arc<dyn ResultStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    async fn run<T>(
        &self,
        operation: &'static str,
        work: BoxFuture<'static, StorageResult<T>>,
    ) -> StorageResult<T> {
        let schema = self.store.ensure_schema();
        bounded(operation, self.timeout, async move {
            schema.await?;
            work.await
        })
        .await
    }

    /// User with primary key `id`.
    pub async fn find_user_by_id(&self, id: i32) -> Lookup<UserEntity> {
        self.run("find_user_by_id", self.store.find_user_by_id(id))
            .await
            .into()
    }

    /// User whose username equals `username` exactly.
    pub async fn find_user_by_username(&self, username: &str) -> Lookup<UserEntity> {
        self.run(
            "find_user_by_username",
            self.store.find_user_by_username(username.to_owned()),
        )
        .await
        .into()
    }

    /// Resolve a platform sender: the handle is tried first, then the numeric id.
    ///
    /// An empty handle or a zero id skips the corresponding lookup.
    pub async fn find_user_by_external(&self, vk_id: i64, vk_username: &str) -> Lookup<UserEntity> {
        if !vk_username.is_empty() {
            match self
                .run(
                    "find_user_by_vk_username",
                    self.store.find_user_by_vk_username(vk_username.to_owned()),
                )
                .await
            {
                Ok(Some(user)) => return Lookup::Found(user),
                Ok(None) => {}
                Err(err) => return Lookup::Failed(err),
            }
        }

        if vk_id == 0 {
            return Lookup::NotFound;
        }

        self.run("find_user_by_vk_id", self.store.find_user_by_vk_id(vk_id))
            .await
            .into()
    }

    /// Every username in id order.
    pub async fn list_usernames(&self) -> StorageResult<Vec<String>> {
        self.run("list_usernames", self.store.list_usernames()).await
    }

    /// Results where `user_id` played either side, newest first.
    pub async fn list_results_for_user(&self, user_id: i32) -> StorageResult<Vec<GameResultEntity>> {
        self.run(
            "list_results_for_user",
            self.store.list_results_for_user(user_id),
        )
        .await
    }

    /// Store a fully populated result row.
    pub async fn insert_result(&self, result: NewGameResult) -> StorageResult<()> {
        self.run("insert_result", self.store.insert_result(result))
            .await
    }

    /// Seven-field insertion for callers that do not collect event type or rosters.
    pub async fn insert_minimal_result(&self, result: NewMinimalResult) -> StorageResult<()> {
        self.run(
            "insert_minimal_result",
            self.store.insert_minimal_result(result),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use time::macros::datetime;

    use super::*;
    use crate::dao::{
        result_store::{
            failing::{FailingStore, StoreOperation},
            memory::MemoryResultStore,
        },
        storage::StorageError,
    };

    fn gateway(store: &MemoryResultStore) -> PersistenceGateway {
        PersistenceGateway::new(Arc::new(store.clone()), Duration::from_secs(1))
    }

    #[tokio::test]
    async fn external_lookup_prefers_handle() {
        let store = MemoryResultStore::new();
        let by_handle = store.insert_user("ivan", Some(1), Some("ivan_vk")).await;
        store.insert_user("petr", Some(2), None).await;

        let found = gateway(&store).find_user_by_external(2, "ivan_vk").await;
        assert_eq!(found.found(), Some(by_handle));
    }

    #[tokio::test]
    async fn external_lookup_falls_back_to_id() {
        let store = MemoryResultStore::new();
        let by_id = store.insert_user("petr", Some(42), Some("petr_vk")).await;

        let found = gateway(&store)
            .find_user_by_external(42, "someone_else")
            .await;
        assert_eq!(found.found(), Some(by_id));
    }

    #[tokio::test]
    async fn external_lookup_without_id_is_not_found() {
        let store = MemoryResultStore::new();
        store.insert_user("petr", Some(42), Some("petr_vk")).await;

        let found = gateway(&store).find_user_by_external(0, "nobody").await;
        assert!(found.is_not_found());
    }

    #[tokio::test]
    async fn operations_seed_schema_first() {
        let store = MemoryResultStore::new();
        let names = gateway(&store).list_usernames().await.unwrap();
        assert_eq!(names.len(), 5);
        assert!(names.contains(&"danya".to_owned()));
    }

    #[tokio::test]
    async fn full_insert_round_trips() {
        let store = MemoryResultStore::new();
        let gateway = gateway(&store);
        gateway
            .insert_result(NewGameResult {
                game_type: 1,
                datetime: datetime!(2025-04-02 12:00),
                first_user_id: 1,
                second_user_id: 2,
                first_user_op: 10,
                second_user_op: 7,
                first_user_tp: 3,
                second_user_tp: 1,
                first_user_roster: "Knights".into(),
                second_user_roster: "Orks".into(),
            })
            .await
            .unwrap();

        let rows = gateway.list_results_for_user(2).await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].game_type, 1);
        assert_eq!(rows[0].first_user_roster, "Knights");
    }

    #[tokio::test]
    async fn schema_failure_fails_every_operation() {
        let store = FailingStore::new(MemoryResultStore::new(), &[StoreOperation::EnsureSchema]);
        let gateway = PersistenceGateway::new(Arc::new(store), Duration::from_secs(1));

        assert!(matches!(
            gateway.find_user_by_id(1).await,
            Lookup::Failed(StorageError::Unavailable { .. })
        ));
        assert!(gateway.list_usernames().await.is_err());
    }

    #[tokio::test]
    async fn handle_lookup_failure_does_not_fall_through() {
        let memory = MemoryResultStore::new();
        memory.insert_user("petr", Some(42), None).await;
        let store = FailingStore::new(memory, &[StoreOperation::FindUserByExternal]);
        let gateway = PersistenceGateway::new(Arc::new(store), Duration::from_secs(1));

        assert!(matches!(
            gateway.find_user_by_external(42, "petr_vk").await,
            Lookup::Failed(_)
        ));
    }

    #[tokio::test]
    async fn minimal_insert_is_listed_for_both_players() {
        let store = MemoryResultStore::new();
        let gateway = gateway(&store);
        gateway
            .insert_minimal_result(NewMinimalResult {
                datetime: datetime!(2025-06-01 20:00),
                first_user_id: 3,
                first_user_tp: 5,
                first_user_op: 12,
                second_user_id: 4,
                second_user_tp: 2,
                second_user_op: 9,
            })
            .await
            .unwrap();

        for user_id in [3, 4] {
            let rows = gateway.list_results_for_user(user_id).await.unwrap();
            assert_eq!(rows.len(), 1);
            assert_eq!(rows[0].game_type, 0);
            assert_eq!((rows[0].first_user_tp, rows[0].second_user_tp), (5, 2));
        }
        assert!(gateway.list_results_for_user(5).await.unwrap().is_empty());
    }
}
