//! Idempotent DDL bringing older databases up to the current column set.

use sqlx::PgPool;

use crate::dao::models::SEED_USERNAMES;

use super::error::{PostgresDaoError, PostgresResult};

const CREATE_USERS: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id       SERIAL PRIMARY KEY,
    username TEXT NOT NULL UNIQUE
)
"#;

const CREATE_RESULTS: &str = r#"
CREATE TABLE IF NOT EXISTS results (
    id               SERIAL PRIMARY KEY,
    datetime         TIMESTAMP NOT NULL,
    first_user_id    INTEGER NOT NULL REFERENCES users(id),
    first_user_tp    INTEGER NOT NULL,
    first_user_op    INTEGER NOT NULL,
    second_user_id   INTEGER NOT NULL REFERENCES users(id),
    second_user_tp   INTEGER NOT NULL,
    second_user_op   INTEGER NOT NULL
)
"#;

/// Ordered `(step, statement)` pairs; every statement is safe to rerun.
const MIGRATIONS: &[(&str, &str)] = &[
    ("create users table", CREATE_USERS),
    (
        "add users.vk_id",
        "ALTER TABLE users ADD COLUMN IF NOT EXISTS vk_id BIGINT",
    ),
    (
        "add users.vk_username",
        "ALTER TABLE users ADD COLUMN IF NOT EXISTS vk_username TEXT",
    ),
    ("create results table", CREATE_RESULTS),
    (
        "drop legacy results.type",
        "ALTER TABLE results DROP COLUMN IF EXISTS type",
    ),
    (
        "add results.game_type",
        "ALTER TABLE results ADD COLUMN IF NOT EXISTS game_type INTEGER NOT NULL DEFAULT 0",
    ),
    (
        "add results.first_user_roster",
        "ALTER TABLE results ADD COLUMN IF NOT EXISTS first_user_roster TEXT NOT NULL DEFAULT ''",
    ),
    (
        "add results.second_user_roster",
        "ALTER TABLE results ADD COLUMN IF NOT EXISTS second_user_roster TEXT NOT NULL DEFAULT ''",
    ),
];

/// Create missing tables and columns, then seed the fixed usernames.
pub async fn prepare(pool: &PgPool) -> PostgresResult<()> {
    for &(step, statement) in MIGRATIONS {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|source| PostgresDaoError::Schema { step, source })?;
    }

    for username in SEED_USERNAMES {
        sqlx::query("INSERT INTO users (username) VALUES ($1) ON CONFLICT (username) DO NOTHING")
            .bind(username)
            .execute(pool)
            .await
            .map_err(|source| PostgresDaoError::Schema {
                step: "seed users",
                source,
            })?;
    }

    Ok(())
}
