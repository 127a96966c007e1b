//! Storage layer: SQLite knowledge base of learned extraction rules.
//!
//! Holds DB pool setup, the migration runner and the label-keyed rule store.

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::str::FromStr;
use thiserror::Error;

pub mod knowledge_base;

pub use knowledge_base::{KnowledgeRecord, RuleSet, RuleStore, SqliteRuleStore};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("migration failed: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),
    #[error("failed to encode rule set: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("corrupt rule set for label '{label}': {reason}")]
    Corrupt { label: String, reason: String },
}

pub async fn connect(database_url: &str) -> Result<SqlitePool, StoreError> {
    let mut url = database_url.to_string();
    if !database_url.starts_with("sqlite:") {
        let path = std::path::PathBuf::from(database_url);
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let norm = path.to_string_lossy().replace('\\', "/");
        if path.is_absolute() {
            url = format!("sqlite:///{}", norm.trim_start_matches('/'));
        } else {
            url = format!("sqlite://{}", norm);
        }
    }
    // FULL makes every committed write durable before the call returns.
    let connect_opts = SqliteConnectOptions::from_str(&url)?
        .create_if_missing(true)
        .synchronous(SqliteSynchronous::Full);

    let mut opts = SqlitePoolOptions::new();
    if url.contains("memory") {
        // A private in-memory database lives only as long as its single connection.
        opts = opts
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None);
    } else {
        opts = opts.max_connections(5);
    }
    let pool = opts.connect_with(connect_opts).await?;
    tracing::debug!(url = %url, "sqlite pool connected");
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), StoreError> {
    // Applies SQLx migrations located in crates/storage/migrations.
    // Safe to run multiple times (idempotent).
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
