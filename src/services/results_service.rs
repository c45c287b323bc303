//! "My results" listing.

use std::{collections::HashMap, fmt::Write};

use time::{format_description::BorrowedFormatItem, macros::format_description};
use tracing::{info, warn};

use crate::{
    dao::{gateway::PersistenceGateway, models::GameResultEntity, storage::Lookup},
    dto::message::Reply,
};

/// Maximum number of rows shown in one listing.
pub const MAX_LISTED_RESULTS: usize = 10;

const DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[day].[month].[year] [hour]:[minute]");
const UNKNOWN_OPPONENT: &str = "неизвестен";

const UNRESOLVED_USER: &str = "Не удалось определить тебя в БД, результаты недоступны.";
const LISTING_FAILED: &str = "Ошибка получения результатов, попробуй позже.";
const NO_RESULTS: &str = "📊 У тебя пока нет записанных результатов.";
const HEADER: &str = "📊 Твои последние результаты:\n";

/// Build the results listing for the acting user, newest first.
pub async fn show_results(
    gateway: &PersistenceGateway,
    peer_id: i64,
    user_id: Option<i32>,
) -> Reply {
    let Some(user_id) = user_id else {
        warn!(peer_id, "results: sender is not linked to a user row");
        return Reply::text(UNRESOLVED_USER);
    };

    let rows = match gateway.list_results_for_user(user_id).await {
        Ok(rows) => rows,
        Err(err) => {
            warn!(peer_id, user_id, error = %err, "results: listing failed");
            return Reply::text(LISTING_FAILED);
        }
    };
    if rows.is_empty() {
        return Reply::text(NO_RESULTS);
    }

    let mut names = OpponentNames::new(gateway, peer_id);
    let mut body = String::from(HEADER);
    for row in rows.iter().take(MAX_LISTED_RESULTS) {
        let line = Perspective::of(row, user_id);
        let name = names.resolve(line.opponent_id).await;
        // Writing into a String cannot fail.
        let _ = writeln!(
            body,
            "{} — ты: {}, оппонент ({}): {}",
            format_datetime(row),
            line.mine,
            name,
            line.theirs
        );
    }

    info!(peer_id, user_id, shown = rows.len().min(MAX_LISTED_RESULTS), "results: listed");
    Reply::text(body)
}

/// A result row seen from the acting user's side.
struct Perspective {
    mine: i32,
    theirs: i32,
    opponent_id: i32,
}

impl Perspective {
    fn of(row: &GameResultEntity, user_id: i32) -> Self {
        if row.first_user_id == user_id {
            Self {
                mine: row.first_user_op,
                theirs: row.second_user_op,
                opponent_id: row.second_user_id,
            }
        } else {
            Self {
                mine: row.second_user_op,
                theirs: row.first_user_op,
                opponent_id: row.first_user_id,
            }
        }
    }
}

/// Opponent usernames looked up at most once per listing.
struct OpponentNames<'a> {
    gateway: &'a PersistenceGateway,
    peer_id: i64,
    cache: HashMap<i32, String>,
}

impl<'a> OpponentNames<'a> {
    fn new(gateway: &'a PersistenceGateway, peer_id: i64) -> Self {
        Self {
            gateway,
            peer_id,
            cache: HashMap::new(),
        }
    }

    async fn resolve(&mut self, user_id: i32) -> String {
        if let Some(name) = self.cache.get(&user_id) {
            return name.clone();
        }
        let name = match self.gateway.find_user_by_id(user_id).await {
            Lookup::Found(user) => user.username,
            Lookup::NotFound => UNKNOWN_OPPONENT.to_owned(),
            Lookup::Failed(err) => {
                warn!(peer_id = self.peer_id, user_id, error = %err, "results: opponent lookup failed");
                UNKNOWN_OPPONENT.to_owned()
            }
        };
        self.cache.insert(user_id, name.clone());
        name
    }
}

fn format_datetime(row: &GameResultEntity) -> String {
    row.datetime
        .format(DATE_FORMAT)
        .unwrap_or_else(|_| row.datetime.to_string())
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, time::Duration};

    use time::{Duration as TimeDuration, macros::datetime};

    use super::*;
    use crate::dao::{
        models::NewGameResult,
        result_store::{
            failing::{FailingStore, StoreOperation},
            memory::MemoryResultStore,
        },
    };

    fn result(first: i32, second: i32, ops: (i32, i32), at: time::PrimitiveDateTime) -> NewGameResult {
        NewGameResult {
            game_type: 0,
            datetime: at,
            first_user_id: first,
            second_user_id: second,
            first_user_op: ops.0,
            second_user_op: ops.1,
            first_user_tp: 0,
            second_user_tp: 0,
            first_user_roster: String::new(),
            second_user_roster: String::new(),
        }
    }

    async fn seeded() -> (MemoryResultStore, PersistenceGateway) {
        let store = MemoryResultStore::new();
        let gateway = PersistenceGateway::new(Arc::new(store.clone()), Duration::from_secs(1));
        gateway.list_usernames().await.unwrap();
        (store, gateway)
    }

    async fn id_of(gateway: &PersistenceGateway, name: &str) -> i32 {
        gateway.find_user_by_username(name).await.found().unwrap().id
    }

    #[tokio::test]
    async fn unresolved_user_gets_no_listing() {
        let (_, gateway) = seeded().await;
        let reply = show_results(&gateway, 1, None).await;
        assert_eq!(reply.text, UNRESOLVED_USER);
    }

    #[tokio::test]
    async fn empty_history() {
        let (_, gateway) = seeded().await;
        let reply = show_results(&gateway, 1, Some(1)).await;
        assert_eq!(reply.text, NO_RESULTS);
    }

    #[tokio::test]
    async fn listing_failure_is_reported() {
        let store = FailingStore::new(MemoryResultStore::new(), &[StoreOperation::ListResults]);
        let gateway = PersistenceGateway::new(Arc::new(store), Duration::from_secs(1));
        let reply = show_results(&gateway, 1, Some(1)).await;
        assert_eq!(reply.text, LISTING_FAILED);
    }

    #[tokio::test]
    async fn scores_are_attributed_to_the_querying_side() {
        let (_, gateway) = seeded().await;
        let rezonov = id_of(&gateway, "rezonov").await;
        let danya = id_of(&gateway, "danya").await;
        gateway
            .insert_result(result(rezonov, danya, (10, 7), datetime!(2025-03-02 18:05)))
            .await
            .unwrap();

        let mine = show_results(&gateway, 1, Some(rezonov)).await;
        assert_eq!(
            mine.text,
            "📊 Твои последние результаты:\n02.03.2025 18:05 — ты: 10, оппонент (danya): 7\n"
        );

        let theirs = show_results(&gateway, 1, Some(danya)).await;
        assert_eq!(
            theirs.text,
            "📊 Твои последние результаты:\n02.03.2025 18:05 — ты: 7, оппонент (rezonov): 10\n"
        );
    }

    #[tokio::test]
    async fn shows_ten_newest_rows() {
        let (_, gateway) = seeded().await;
        let me = id_of(&gateway, "mishka").await;
        let other = id_of(&gateway, "andrew").await;
        let start = datetime!(2025-01-01 10:00);
        for day in 0..11 {
            gateway
                .insert_result(result(me, other, (day, 0), start + TimeDuration::days(day.into())))
                .await
                .unwrap();
        }

        let reply = show_results(&gateway, 1, Some(me)).await;
        let lines: Vec<&str> = reply.text.lines().skip(1).collect();
        assert_eq!(lines.len(), MAX_LISTED_RESULTS);
        assert!(lines[0].starts_with("11.01.2025 10:00 — ты: 10,"));
        assert!(lines[9].starts_with("02.01.2025 10:00 — ты: 1,"));
    }

    #[tokio::test]
    async fn unknown_opponent_gets_placeholder() {
        let store = MemoryResultStore::new();
        let inner = PersistenceGateway::new(Arc::new(store.clone()), Duration::from_secs(1));
        let me = store.insert_user("ivan", None, None).await;
        inner
            .insert_result(result(me.id, 999, (5, 6), datetime!(2025-05-05 05:05)))
            .await
            .unwrap();
        inner
            .insert_result(result(2, me.id, (4, 2), datetime!(2025-05-04 05:05)))
            .await
            .unwrap();

        let failing = FailingStore::new(store, &[StoreOperation::FindUserById]);
        let gateway = PersistenceGateway::new(Arc::new(failing), Duration::from_secs(1));
        let reply = show_results(&gateway, 1, Some(me.id)).await;
        assert!(reply.text.contains("оппонент (неизвестен): 6"));
        assert!(reply.text.contains("ты: 2, оппонент (неизвестен): 4"));

        let reply = show_results(&inner, 1, Some(me.id)).await;
        assert!(reply.text.contains("ты: 5, оппонент (неизвестен): 6"));
        assert!(reply.text.contains("ты: 2, оппонент (rezonov): 4"));
    }
}
