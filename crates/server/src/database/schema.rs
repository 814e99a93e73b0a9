use sqlx::{Error as SqlxError, Sqlite, Transaction};
use tracing::instrument;

use crate::database::connection::DbConnection;

impl DbConnection {
    /// Creates the schema if absent; safe to run on every startup.
    pub async fn init_schema(&self) -> Result<(), SqlxError> {
        let mut transaction = self.pool().begin().await?;
        create_all_tables(&mut transaction).await?;
        transaction.commit().await?;
        Ok(())
    }

    pub async fn drop_schema(&self) -> Result<(), SqlxError> {
        let mut transaction = self.pool().begin().await?;
        drop_all_tables(&mut transaction).await?;
        transaction.commit().await?;
        Ok(())
    }
}

#[instrument(skip_all)]
pub async fn create_all_tables(transaction: &mut Transaction<'_, Sqlite>) -> Result<(), SqlxError> {
    sqlx::query(
        "
            CREATE TABLE IF NOT EXISTS users (
                id              INTEGER PRIMARY KEY AUTOINCREMENT,
                username        TEXT NOT NULL UNIQUE,
                email           TEXT NOT NULL UNIQUE COLLATE NOCASE,
                fullname        TEXT,
                password_hash   TEXT NOT NULL,
                created_at      TEXT NOT NULL,
                updated_at      TEXT NOT NULL,
                last_login_at   TEXT NOT NULL,
                deleted_at      TEXT
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query(
        "
            CREATE TABLE IF NOT EXISTS resources (
                id                  INTEGER PRIMARY KEY AUTOINCREMENT,
                title               TEXT NOT NULL,
                description         TEXT,
                tags                TEXT,
                type                TEXT NOT NULL,
                url                 TEXT NOT NULL,
                original_filename   TEXT,
                source              TEXT NOT NULL,
                created_at          TEXT NOT NULL,
                updated_at          TEXT NOT NULL,
                read_status         INTEGER NOT NULL DEFAULT 0,
                starred             INTEGER NOT NULL DEFAULT 0,
                user_id             INTEGER NOT NULL REFERENCES users(id)
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    sqlx::query(
        "
            CREATE TABLE IF NOT EXISTS sessions (
                token        TEXT PRIMARY KEY,
                user_id      INTEGER NOT NULL REFERENCES users(id),
                username     TEXT NOT NULL,
                created_at   TEXT NOT NULL,
                expires_at   TEXT NOT NULL
            );
        ",
    )
    .execute(transaction.as_mut())
    .await?;
    let indexes = [
        "CREATE INDEX IF NOT EXISTS idx_resources_user_id ON resources(user_id);",
        "CREATE INDEX IF NOT EXISTS idx_resources_created_at ON resources(created_at);",
        "CREATE INDEX IF NOT EXISTS idx_sessions_user_id ON sessions(user_id);",
    ];
    for statement in &indexes {
        sqlx::query(statement).execute(transaction.as_mut()).await?;
    }
    Ok(())
}

#[instrument(skip_all)]
pub async fn drop_all_tables(transaction: &mut Transaction<'_, Sqlite>) -> Result<(), SqlxError> {
    let statements = [
        "DROP TABLE IF EXISTS sessions;",
        "DROP TABLE IF EXISTS resources;",
        "DROP TABLE IF EXISTS users;",
    ];
    for statement in &statements {
        sqlx::query(statement).execute(transaction.as_mut()).await?;
    }
    Ok(())
}
