//! Example consumer: loads a model set, syncs storage, runs the generic
//! CRUD surface, and prints the schema document an API layer would consume.

use modelbase_sdk::{build_document, validate, ModelSet, Ref, Registry};
use serde_json::{json, Map, Value};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use std::str::FromStr;

fn object(v: Value) -> Map<String, Value> {
    match v {
        Value::Object(m) => m,
        _ => unreachable!("literal bodies are objects"),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("modelbase_sdk=info")),
        )
        .init();

    let database_url =
        std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite:modelbase.db?mode=rwc".into());
    // Foreign keys are a connection-wide setting, enabled once here.
    let options = SqliteConnectOptions::from_str(&database_url)?.foreign_keys(true);
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    let models: ModelSet = serde_json::from_value(json!({
        "Organization": {
            "fields": {
                "name": { "type": "text" }
            }
        },
        "Account": {
            "fields": {
                "kind": { "type": "text" },
                "reference": { "type": "text" },
                "secret": {
                    "type": "text",
                    "modifiers": [ { "kind": "encrypt", "key": "change-me" } ]
                },
                "organization": { "ref": "Organization" }
            }
        },
        "AuditEntry": {
            "history": "private",
            "fields": {
                "entry": { "type": "text" }
            }
        }
    }))?;
    validate(&models)?;

    let mut registries = Vec::new();
    for (name, descriptor) in &models {
        registries.push(Registry::new(name.clone(), descriptor.clone(), pool.clone())?);
    }
    // Same-table syncs must never run concurrently; keep this sequential.
    for registry in &registries {
        tracing::info!(entity = registry.name(), "syncing storage");
        registry.sync_storage().await?;
    }

    let organizations = &registries[0];
    let accounts = &registries[1];

    let org = organizations.create(object(json!({"name": "acme"}))).await?;
    let org_id = org["id"].as_str().unwrap_or_default().to_string();
    tracing::info!(id = %org_id, "created organization");

    let account = accounts
        .create(object(json!({
            "kind": "billing",
            "secret": "correct horse battery staple",
            "organization": { "id": org_id }
        })))
        .await?;
    let account_id = account["id"].as_str().unwrap_or_default().to_string();

    let updated = accounts
        .update(
            &Ref {
                id: account_id.clone(),
            },
            object(json!({"kind": "operations"})),
        )
        .await?;
    tracing::info!(account = ?updated, "updated account");

    if let Some(found) = accounts.find("kind", json!("operations")).await? {
        tracing::info!(id = %found["id"], "found account by kind");
    }
    tracing::info!(count = organizations.list_all().await?.len(), "organizations");

    println!("{}", build_document(&registries));
    Ok(())
}
