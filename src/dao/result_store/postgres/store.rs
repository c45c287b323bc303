use std::sync::Arc;

use futures::future::BoxFuture;
use sqlx::PgPool;
use tokio::sync::OnceCell;

use crate::dao::{
    models::{GameResultEntity, NewGameResult, NewMinimalResult, UserEntity},
    result_store::ResultStore,
    storage::{StorageError, StorageResult},
};

use super::{
    config::PostgresConfig,
    connection::establish_pool,
    error::{PostgresDaoError, PostgresResult},
    schema,
};

const SELECT_USER: &str = "SELECT id, username, vk_id, vk_username FROM users";

const SELECT_USER_RESULTS: &str = r#"
SELECT
    id,
    game_type,
    datetime,
    first_user_id,
    second_user_id,
    first_user_op,
    second_user_op,
    first_user_tp,
    second_user_tp,
    first_user_roster,
    second_user_roster
FROM results
WHERE first_user_id = $1 OR second_user_id = $1
ORDER BY datetime DESC, id DESC
"#;

const INSERT_RESULT: &str = r#"
INSERT INTO results (
    game_type,
    datetime,
    first_user_id,
    second_user_id,
    first_user_op,
    second_user_op,
    first_user_tp,
    second_user_tp,
    first_user_roster,
    second_user_roster
) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
"#;

const INSERT_MINIMAL_RESULT: &str = r#"
INSERT INTO results (
    datetime,
    first_user_id,
    first_user_tp,
    first_user_op,
    second_user_id,
    second_user_tp,
    second_user_op
) VALUES ($1, $2, $3, $4, $5, $6, $7)
"#;

/// PostgreSQL-backed [`ResultStore`] implementation.
#[derive(Clone)]
pub struct PostgresResultStore {
    pool: PgPool,
    schema_ready: Arc<OnceCell<()>>,
}

impl PostgresResultStore {
    /// Open the pool, wait for the server and prepare the schema once.
    pub async fn connect(config: PostgresConfig) -> PostgresResult<Self> {
        let pool = establish_pool(&config).await?;
        let store = Self {
            pool,
            schema_ready: Arc::new(OnceCell::new()),
        };
        store.prepare_schema().await?;
        Ok(store)
    }

    async fn prepare_schema(&self) -> PostgresResult<()> {
        self.schema_ready
            .get_or_try_init(|| schema::prepare(&self.pool))
            .await?;
        Ok(())
    }

    async fn find_user_where(
        &self,
        by: &'static str,
        predicate: &'static str,
        value: UserKey,
    ) -> PostgresResult<Option<UserEntity>> {
        let sql = format!("{SELECT_USER} WHERE {predicate} = $1 LIMIT 1");
        let query = sqlx::query_as::<_, UserEntity>(&sql);
        let query = match value {
            UserKey::Int(id) => query.bind(id),
            UserKey::BigInt(id) => query.bind(id),
            UserKey::Text(text) => query.bind(text),
        };
        query
            .fetch_optional(&self.pool)
            .await
            .map_err(|source| PostgresDaoError::FindUser { by, source })
    }

    async fn list_usernames_internal(&self) -> PostgresResult<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT username FROM users ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|source| PostgresDaoError::ListUsernames { source })
    }

    async fn list_results_internal(&self, user_id: i32) -> PostgresResult<Vec<GameResultEntity>> {
        sqlx::query_as::<_, GameResultEntity>(SELECT_USER_RESULTS)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|source| PostgresDaoError::ListResults { user_id, source })
    }

    async fn insert_result_internal(&self, result: NewGameResult) -> PostgresResult<()> {
        sqlx::query(INSERT_RESULT)
            .bind(result.game_type)
            .bind(result.datetime)
            .bind(result.first_user_id)
            .bind(result.second_user_id)
            .bind(result.first_user_op)
            .bind(result.second_user_op)
            .bind(result.first_user_tp)
            .bind(result.second_user_tp)
            .bind(result.first_user_roster)
            .bind(result.second_user_roster)
            .execute(&self.pool)
            .await
            .map_err(|source| PostgresDaoError::InsertResult {
                form: "full",
                source,
            })?;
        Ok(())
    }

    async fn insert_minimal_internal(&self, result: NewMinimalResult) -> PostgresResult<()> {
        sqlx::query(INSERT_MINIMAL_RESULT)
            .bind(result.datetime)
            .bind(result.first_user_id)
            .bind(result.first_user_tp)
            .bind(result.first_user_op)
            .bind(result.second_user_id)
            .bind(result.second_user_tp)
            .bind(result.second_user_op)
            .execute(&self.pool)
            .await
            .map_err(|source| PostgresDaoError::InsertResult {
                form: "minimal",
                source,
            })?;
        Ok(())
    }
}

/// Typed value bound to a single-column user lookup.
enum UserKey {
    Int(i32),
    BigInt(i64),
    Text(String),
}

impl ResultStore for PostgresResultStore {
    fn ensure_schema(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.prepare_schema().await.map_err(Into::into) })
    }

    fn find_user_by_id(&self, id: i32) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_user_where("id", "id", UserKey::Int(id))
                .await
                .map_err(Into::into)
        })
    }

    fn find_user_by_username(
        &self,
        username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_user_where("username", "username", UserKey::Text(username))
                .await
                .map_err(Into::into)
        })
    }

    fn find_user_by_vk_username(
        &self,
        vk_username: String,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_user_where("VK username", "vk_username", UserKey::Text(vk_username))
                .await
                .map_err(Into::into)
        })
    }

    fn find_user_by_vk_id(
        &self,
        vk_id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<UserEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_user_where("VK id", "vk_id", UserKey::BigInt(vk_id))
                .await
                .map_err(Into::into)
        })
    }

    fn list_usernames(&self) -> BoxFuture<'static, StorageResult<Vec<String>>> {
        let store = self.clone();
        Box::pin(async move { store.list_usernames_internal().await.map_err(Into::into) })
    }

    fn list_results_for_user(
        &self,
        user_id: i32,
    ) -> BoxFuture<'static, StorageResult<Vec<GameResultEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_results_internal(user_id).await.map_err(Into::into) })
    }

    fn insert_result(&self, result: NewGameResult) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_result_internal(result).await.map_err(Into::into) })
    }

    fn insert_minimal_result(
        &self,
        result: NewMinimalResult,
    ) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.insert_minimal_internal(result).await.map_err(Into::into) })
    }
}

impl From<PostgresDaoError> for StorageError {
    fn from(err: PostgresDaoError) -> Self {
        StorageError::unavailable(err.to_string(), err)
    }
}
