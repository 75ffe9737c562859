//! database (db) union structure.
use std::str::FromStr;

use axum::extract::FromRef;
use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};

use crate::AppState;
use crate::user::UserRepository;

/// Database file used when `config.yaml` has no `sqlite` entry.
pub const DEFAULT_DATABASE_PATH: &str = "sqlite://matcha.db";
/// Default maximum pool connections.
pub const DEFAULT_POOL_SIZE: u32 = 10;

/// Custom db structure to pass to Axum.
#[derive(Clone)]
pub struct Database {
    /// Connection pool to the SQLite file.
    pub sqlite: SqlitePool,
}

impl Database {
    /// Init database connections.
    pub async fn new(path: &str, pool: u32) -> Result<Self, sqlx::Error> {
        let options =
            SqliteConnectOptions::from_str(path)?.create_if_missing(true);
        let sqlite = SqlitePoolOptions::new()
            .max_connections(pool)
            .connect_with(options)
            .await?;

        tracing::info!(%path, "sqlite connected");

        Ok(Self { sqlite })
    }

    /// Access the [`UserRepository`] backed by this pool.
    pub fn users(&self) -> UserRepository {
        UserRepository::new(self.sqlite.clone())
    }
}

impl FromRef<AppState> for Database {
    fn from_ref(app_state: &AppState) -> Database {
        app_state.db.clone()
    }
}
