//! Label-keyed persistence of learned rule sets.
//!
//! Concurrency contract: every `upsert` is a single `INSERT .. ON CONFLICT` statement, so a
//! record is always replaced atomically. Two writers learning for the same label race and the
//! last one wins; no per-field merge happens at this layer.

use crate::{connect, migrate, StoreError};
use serde::{Deserialize, Serialize};
use sqlx::{Row, SqlitePool};
use std::collections::BTreeMap;
use tracing::debug;

/// Field name -> regex pattern.
pub type RuleSet = BTreeMap<String, String>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeRecord {
    pub label: String,
    pub rules: RuleSet,
    pub created_at: i64,
    pub updated_at: i64,
}

#[async_trait::async_trait]
pub trait RuleStore: Send + Sync {
    /// Stored rules for `label`, or `None` when the label has never been learned.
    async fn lookup(&self, label: &str) -> Result<Option<RuleSet>, StoreError>;

    /// Create the record for `label` or replace its rule set entirely.
    async fn upsert(&self, label: &str, rules: &RuleSet) -> Result<(), StoreError>;

    /// Every stored record, ordered by label.
    async fn list(&self) -> Result<Vec<KnowledgeRecord>, StoreError>;

    async fn close(&self);
}

#[derive(Clone)]
pub struct SqliteRuleStore {
    pool: SqlitePool,
}

impl SqliteRuleStore {
    /// Connects (creating the database file if needed) and applies migrations.
    pub async fn open(database_url: &str) -> Result<Self, StoreError> {
        let pool = connect(database_url).await?;
        migrate(&pool).await?;
        Ok(Self { pool })
    }

    /// Wraps an already migrated pool.
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn decode_rules(label: &str, raw: &str) -> Result<RuleSet, StoreError> {
    serde_json::from_str(raw).map_err(|e| StoreError::Corrupt {
        label: label.to_string(),
        reason: e.to_string(),
    })
}

#[async_trait::async_trait]
impl RuleStore for SqliteRuleStore {
    async fn lookup(&self, label: &str) -> Result<Option<RuleSet>, StoreError> {
        let raw: Option<String> =
            sqlx::query_scalar("SELECT rules_json FROM knowledge_base WHERE label = ?1")
                .bind(label)
                .fetch_optional(&self.pool)
                .await?;
        raw.map(|r| decode_rules(label, &r)).transpose()
    }

    async fn upsert(&self, label: &str, rules: &RuleSet) -> Result<(), StoreError> {
        let rules_json = serde_json::to_string(rules)?;
        let now = chrono::Utc::now().timestamp();
        sqlx::query(
            "INSERT INTO knowledge_base (label, rules_json, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(label) DO UPDATE SET
               rules_json = excluded.rules_json,
               updated_at = excluded.updated_at",
        )
        .bind(label)
        .bind(rules_json)
        .bind(now)
        .execute(&self.pool)
        .await?;
        debug!(label, rules = rules.len(), "rule set stored");
        Ok(())
    }

    async fn list(&self) -> Result<Vec<KnowledgeRecord>, StoreError> {
        let rows = sqlx::query(
            "SELECT label, rules_json, created_at, updated_at FROM knowledge_base ORDER BY label",
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| -> Result<KnowledgeRecord, StoreError> {
                let label: String = row.try_get("label")?;
                let raw: String = row.try_get("rules_json")?;
                let rules = decode_rules(&label, &raw)?;
                Ok(KnowledgeRecord {
                    label,
                    rules,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }

    async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn corrupt_rules_json_is_reported_with_label() {
        let err = decode_rules("invoice_v1", "not json").unwrap_err();
        match err {
            StoreError::Corrupt { label, .. } => assert_eq!(label, "invoice_v1"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn rules_json_must_be_an_object_of_strings() {
        assert!(decode_rules("a", r#"{"total": 3}"#).is_err());
        let rules = decode_rules("a", r#"{"total": "(1\\.0)"}"#).unwrap();
        assert_eq!(rules.get("total").map(String::as_str), Some("(1\\.0)"));
    }
}
