use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use sqlx::Error as SqlxError;

pub const IN_MEMORY_PATH: &str = ":memory:";

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DbConfig {
    path: String,
    max_connections: Option<u32>,
}

impl DbConfig {
    const MAX_CONN_FALLBACK: u32 = 5;

    /// Fresh private database, one per pool. Pinned to a single connection
    /// since every connection to `:memory:` opens a distinct database.
    pub fn in_memory() -> Self {
        Self {
            path: IN_MEMORY_PATH.to_string(),
            max_connections: Some(1),
        }
    }

    pub fn get_url(&self) -> String {
        if self.path == IN_MEMORY_PATH {
            "sqlite::memory:".to_string()
        } else {
            // mode=rwc creates the database file on first start
            format!("sqlite://{}?mode=rwc", self.path)
        }
    }

    pub fn max_connections(&self) -> u32 {
        self.max_connections.unwrap_or(Self::MAX_CONN_FALLBACK)
    }
}

pub struct DbConnection {
    pool: SqlitePool,
}

impl DbConnection {
    pub async fn connect(config: &DbConfig) -> Result<Self, SqlxError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections())
            .connect(&config.get_url())
            .await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}
