use std::collections::BTreeMap;
use storage::{RuleSet, RuleStore, SqliteRuleStore, StoreError};

fn rules(pairs: &[(&str, &str)]) -> RuleSet {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect::<BTreeMap<_, _>>()
}

#[tokio::test]
async fn lookup_of_unknown_label_is_absent() {
    let store = SqliteRuleStore::open("sqlite::memory:").await.unwrap();
    assert!(store.lookup("never_seen").await.unwrap().is_none());
    store.close().await;
}

#[tokio::test]
async fn upsert_creates_then_replaces_whole_rule_set() {
    let store = SqliteRuleStore::open("sqlite::memory:").await.unwrap();

    store
        .upsert("invoice_v1", &rules(&[("total", "(1234\\.56)"), ("date", "(2024-01-10)")]))
        .await
        .unwrap();
    assert_eq!(
        store.lookup("invoice_v1").await.unwrap(),
        Some(rules(&[("total", "(1234\\.56)"), ("date", "(2024-01-10)")]))
    );

    // Replacement, not a merge: "date" disappears.
    store
        .upsert("invoice_v1", &rules(&[("total", "(99)")]))
        .await
        .unwrap();
    assert_eq!(
        store.lookup("invoice_v1").await.unwrap(),
        Some(rules(&[("total", "(99)")]))
    );

    let records = store.list().await.unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].label, "invoice_v1");
    assert!(records[0].updated_at >= records[0].created_at);
}

#[tokio::test]
async fn labels_are_isolated() {
    let store = SqliteRuleStore::open("sqlite::memory:").await.unwrap();
    store.upsert("a", &rules(&[("x", "(1)")])).await.unwrap();
    store.upsert("b", &rules(&[("y", "(2)")])).await.unwrap();

    assert_eq!(store.lookup("a").await.unwrap(), Some(rules(&[("x", "(1)")])));
    assert_eq!(store.lookup("b").await.unwrap(), Some(rules(&[("y", "(2)")])));
    let labels: Vec<String> = store.list().await.unwrap().into_iter().map(|r| r.label).collect();
    assert_eq!(labels, vec!["a".to_string(), "b".to_string()]);
}

#[tokio::test]
async fn records_survive_close_and_reopen() {
    let temp = tempfile::tempdir().unwrap();
    let db_path = temp.path().join("nested").join("kb.db");
    let db_path = db_path.to_string_lossy().into_owned();

    let store = SqliteRuleStore::open(&db_path).await.unwrap();
    store
        .upsert("receipt", &rules(&[("merchant", "(ACME)")]))
        .await
        .unwrap();
    store.close().await;

    let reopened = SqliteRuleStore::open(&db_path).await.unwrap();
    assert_eq!(
        reopened.lookup("receipt").await.unwrap(),
        Some(rules(&[("merchant", "(ACME)")]))
    );
    reopened.close().await;
}

#[tokio::test]
async fn corrupt_record_surfaces_as_store_error() {
    let store = SqliteRuleStore::open("sqlite::memory:").await.unwrap();
    sqlx::query("INSERT INTO knowledge_base (label, rules_json) VALUES (?1, ?2)")
        .bind("broken")
        .bind("[not, an, object")
        .execute(store.pool())
        .await
        .unwrap();

    let err = store.lookup("broken").await.unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
    assert!(store.list().await.is_err());
}

#[tokio::test]
async fn closed_store_reports_database_error() {
    let store = SqliteRuleStore::open("sqlite::memory:").await.unwrap();
    store.close().await;
    let err = store.lookup("anything").await.unwrap_err();
    assert!(matches!(err, StoreError::Database(_)));
}
