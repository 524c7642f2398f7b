//! Additive-only schema synchronization: ensure the table exists and every
//! resolved column is present. Existing columns are never renamed, dropped,
//! or retyped.

use crate::error::RegistryError;
use crate::model::{FieldKind, PhysicalType, StorageField};
use crate::sql::quoted;
use sqlx::{Row, SqlitePool};
use std::collections::HashSet;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SchemaOp {
    /// Create the table with only the identity column.
    CreateTable,
    AddColumn {
        column: String,
        physical: PhysicalType,
        /// Target entity for foreign-key columns.
        references: Option<String>,
    },
}

/// Plan the DDL for one entity against the observed column set. Pure;
/// applying the plan and re-planning yields an empty plan.
pub fn plan(exists: bool, existing: &HashSet<String>, fields: &[StorageField]) -> Vec<SchemaOp> {
    let mut ops = Vec::new();
    if !exists {
        ops.push(SchemaOp::CreateTable);
    }
    for field in fields {
        if field.physical == PhysicalType::Id {
            continue;
        }
        let column = field.column_name();
        if exists && existing.contains(&column) {
            continue;
        }
        let references = match &field.kind {
            FieldKind::Reference { target } => Some(target.clone()),
            FieldKind::Column => None,
        };
        ops.push(SchemaOp::AddColumn {
            column,
            physical: field.physical,
            references,
        });
    }
    ops
}

fn render(table: &str, op: &SchemaOp) -> String {
    match op {
        SchemaOp::CreateTable => format!(
            "CREATE TABLE IF NOT EXISTS {} ({} CHAR(32) NOT NULL PRIMARY KEY)",
            quoted(table),
            quoted("id")
        ),
        SchemaOp::AddColumn {
            column,
            physical,
            references,
        } => {
            let mut sql = format!(
                "ALTER TABLE {} ADD COLUMN {} {}",
                quoted(table),
                quoted(column),
                physical.sql()
            );
            if let Some(target) = references {
                sql.push_str(&format!(" REFERENCES {}({})", quoted(target), quoted("id")));
            }
            sql
        }
    }
}

/// Observed column names; zero rows means the table is absent.
pub async fn existing_columns(
    pool: &SqlitePool,
    table: &str,
) -> Result<HashSet<String>, RegistryError> {
    let sql = format!("PRAGMA table_info({})", quoted(table));
    tracing::debug!(sql = %sql, "introspect");
    let rows = sqlx::query(&sql).fetch_all(pool).await?;
    let mut columns = HashSet::with_capacity(rows.len());
    for row in &rows {
        columns.insert(row.try_get::<String, _>("name")?);
    }
    Ok(columns)
}

/// Apply the plan for one entity. Returns the number of DDL statements
/// executed; a second run against an unchanged descriptor executes zero.
pub async fn sync(
    pool: &SqlitePool,
    table: &str,
    fields: &[StorageField],
) -> Result<usize, RegistryError> {
    let existing = existing_columns(pool, table).await?;
    let ops = plan(!existing.is_empty(), &existing, fields);
    for op in &ops {
        let sql = render(table, op);
        tracing::info!(sql = %sql, "schema sync");
        sqlx::query(&sql).execute(pool).await?;
    }
    Ok(ops.len())
}
