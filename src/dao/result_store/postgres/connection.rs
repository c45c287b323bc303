use std::time::Duration;

use sqlx::{
    PgPool,
    postgres::{PgConnectOptions, PgPoolOptions},
};
use tokio::time::sleep;
use tracing::{info, warn};

use super::{
    config::PostgresConfig,
    error::{PostgresDaoError, PostgresResult},
};

const CONNECT_ATTEMPTS: u32 = 10;

/// Doubling delay between readiness checks, capped at five seconds.
struct Backoff {
    delay: Duration,
}

impl Backoff {
    const FIRST: Duration = Duration::from_millis(250);
    const CAP: Duration = Duration::from_secs(5);

    fn new() -> Self {
        Self { delay: Self::FIRST }
    }

    async fn wait(&mut self) {
        sleep(self.delay).await;
        self.delay = (self.delay * 2).min(Self::CAP);
    }
}

/// Build a lazy pool, then query it with `SELECT 1` until the server answers or attempts run out.
pub async fn establish_pool(config: &PostgresConfig) -> PostgresResult<PgPool> {
    let options = config
        .url
        .parse::<PgConnectOptions>()
        .map_err(|source| PostgresDaoError::Connect {
            attempts: 0,
            source,
        })?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect_lazy_with(options);

    let mut backoff = Backoff::new();
    let mut attempt = 0;
    loop {
        attempt += 1;
        match sqlx::query("SELECT 1").execute(&pool).await {
            Ok(_) => {
                info!(attempt, "PostgreSQL is reachable");
                return Ok(pool);
            }
            Err(source) if attempt >= CONNECT_ATTEMPTS => {
                return Err(PostgresDaoError::Connect {
                    attempts: attempt,
                    source,
                });
            }
            Err(err) => {
                warn!(attempt, error = %err, "PostgreSQL not ready; retrying");
                backoff.wait().await;
            }
        }
    }
}
