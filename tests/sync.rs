//! Schema synchronization against a live store: idempotency and
//! additive-only evolution.

use modelbase_sdk::{FieldSpec, ModelDescriptor, Registry, ScalarType};
use serde_json::{json, Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;

async fn memory_pool() -> SqlitePool {
    let options = SqliteConnectOptions::from_str("sqlite::memory:")
        .unwrap()
        .foreign_keys(true);
    SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .unwrap()
}

fn object(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => unreachable!(),
    }
}

async fn column_names(pool: &SqlitePool, table: &str) -> Vec<String> {
    sqlx::query(&format!("PRAGMA table_info(\"{}\")", table))
        .fetch_all(pool)
        .await
        .unwrap()
        .iter()
        .map(|r| r.get::<String, _>("name"))
        .collect()
}

#[tokio::test]
async fn sync_is_idempotent() {
    let pool = memory_pool().await;
    let registry = Registry::new(
        "Widget",
        ModelDescriptor::new().field("name", FieldSpec::scalar(ScalarType::Text)),
        pool.clone(),
    )
    .unwrap();

    let first = registry.sync_storage().await.unwrap();
    assert!(first > 0);
    assert_eq!(registry.sync_storage().await.unwrap(), 0);
}

#[tokio::test]
async fn fresh_sync_creates_identity_and_declared_columns() {
    let pool = memory_pool().await;
    let registry = Registry::new(
        "Widget",
        ModelDescriptor::new()
            .field("name", FieldSpec::scalar(ScalarType::Text))
            .field("owner", FieldSpec::reference("Organization")),
        pool.clone(),
    )
    .unwrap();
    registry.sync_storage().await.unwrap();

    assert_eq!(
        column_names(&pool, "Widget").await,
        ["id", "name", "owner_id"]
    );
}

#[tokio::test]
async fn descriptor_growth_is_additive_and_preserves_rows() {
    let pool = memory_pool().await;

    let v1 = Registry::new(
        "Widget",
        ModelDescriptor::new().field("name", FieldSpec::scalar(ScalarType::Text)),
        pool.clone(),
    )
    .unwrap();
    v1.sync_storage().await.unwrap();
    let created = v1.create(object(json!({"name": "survivor"}))).await.unwrap();
    let id = created["id"].as_str().unwrap().to_string();

    let v2 = Registry::new(
        "Widget",
        ModelDescriptor::new()
            .field("name", FieldSpec::scalar(ScalarType::Text))
            .field("count", FieldSpec::scalar(ScalarType::Int)),
        pool.clone(),
    )
    .unwrap();
    assert_eq!(v2.sync_storage().await.unwrap(), 1);

    assert_eq!(column_names(&pool, "Widget").await, ["id", "name", "count"]);

    let row = v2.get(&id).await.unwrap().unwrap();
    assert_eq!(row["name"], json!("survivor"));
    assert_eq!(row["count"], Value::Null);
}
