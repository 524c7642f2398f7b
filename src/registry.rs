//! Per-entity engine: storage sync, generic CRUD, and the metadata an
//! external schema builder consumes.

use crate::error::{ModelError, RegistryError};
use crate::mapper;
use crate::model::{
    resolve, FieldTable, HistoryMode, ModelDescriptor, PhysicalType, StorageField,
};
use crate::sql::{self, QueryBuf, SqliteBindValue};
use crate::sync;
use crate::validation;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use sqlx::SqlitePool;
use uuid::Uuid;

/// Non-owning, by-id reference to a stored record.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ref {
    pub id: String,
}

/// One registry per named entity. Owns the mapping between object shape and
/// row shape; relies on the store's statement-level atomicity and adds no
/// locking of its own.
pub struct Registry {
    name: String,
    descriptor: ModelDescriptor,
    table: FieldTable,
    /// Physical projection in resolver order, shared by every statement.
    columns: Vec<String>,
    pool: SqlitePool,
}

impl Registry {
    /// Pure construction: resolves the storage layout, performs no I/O.
    pub fn new(
        name: impl Into<String>,
        descriptor: ModelDescriptor,
        pool: SqlitePool,
    ) -> Result<Self, ModelError> {
        let name = name.into();
        let table = FieldTable::new(resolve(&name, &descriptor)?);
        let columns = table.fields().iter().map(|f| f.column_name()).collect();
        Ok(Registry {
            name,
            descriptor,
            table,
            columns,
            pool,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn descriptor(&self) -> &ModelDescriptor {
        &self.descriptor
    }

    pub fn storage_fields(&self) -> &[StorageField] {
        self.table.fields()
    }

    /// Idempotent, additive-only DDL. Call before any CRUD for this entity;
    /// syncs touching the same table must be serialized by the caller.
    /// Returns the number of DDL statements executed.
    pub async fn sync_storage(&self) -> Result<usize, RegistryError> {
        sync::sync(&self.pool, &self.name, self.table.fields()).await
    }

    fn unknown_field(&self, field: &str) -> RegistryError {
        RegistryError::UnknownField {
            entity: self.name.clone(),
            field: field.to_string(),
        }
    }

    async fn execute(&self, q: QueryBuf) -> Result<(), RegistryError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "execute");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        query.execute(&self.pool).await?;
        Ok(())
    }

    async fn fetch_optional(&self, q: QueryBuf) -> Result<Option<Value>, RegistryError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let mut query = sqlx::query(&q.sql);
        for p in &q.params {
            query = query.bind(SqliteBindValue::from_json(p));
        }
        let row = query.fetch_optional(&self.pool).await?;
        row.map(|r| mapper::row_to_record(&r, &self.table)).transpose()
    }

    /// Insert a new record under a fresh identity and return the canonical
    /// stored form, re-read after the write. Any client-supplied id is
    /// ignored; unknown params fail before anything is written.
    pub async fn create(&self, params: Map<String, Value>) -> Result<Value, RegistryError> {
        validation::validate_create(&self.descriptor, &params)?;
        let id = Uuid::new_v4().simple().to_string();
        let pairs = mapper::full_row(&self.name, &self.table, &id, &params)?;
        self.execute(sql::insert(&self.name, pairs)).await?;
        self.get(&id)
            .await?
            .ok_or(RegistryError::Db(sqlx::Error::RowNotFound))
    }

    /// Partial update: fields absent from the patch stay untouched. An
    /// empty patch writes nothing and returns the current record. Returns
    /// None when the target id does not exist.
    pub async fn update(
        &self,
        target: &Ref,
        patch: Map<String, Value>,
    ) -> Result<Option<Value>, RegistryError> {
        validation::validate_patch(&self.descriptor, &patch)?;
        let pairs = mapper::patch_row(&self.name, &self.table, &patch)?;
        if !pairs.is_empty() {
            self.execute(sql::update_by_id(&self.name, pairs, &target.id))
                .await?;
        }
        self.get(&target.id).await
    }

    /// Single-row lookup by identity; absent is a normal outcome, never an
    /// error.
    pub async fn get(&self, id: &str) -> Result<Option<Value>, RegistryError> {
        self.fetch_optional(sql::select_by_id(&self.name, &self.columns, id))
            .await
    }

    /// Single-row lookup by an arbitrary declared field. Reference fields
    /// match by `.id`; column probes run the store-side pipeline so they
    /// compare against stored forms. First row wins when duplicates exist.
    pub async fn find(&self, field: &str, value: Value) -> Result<Option<Value>, RegistryError> {
        let storage = self
            .table
            .get(field)
            .ok_or_else(|| self.unknown_field(field))?;
        let probe = mapper::stored_value(storage, value)?;
        self.fetch_optional(sql::select_by_column(
            &self.name,
            &self.columns,
            &storage.column_name(),
            probe,
        ))
        .await
    }

    /// Full scan; ordering is storage-defined and must not be relied on.
    pub async fn list_all(&self) -> Result<Vec<Value>, RegistryError> {
        let q = sql::select_all(&self.name, &self.columns);
        tracing::debug!(sql = %q.sql, "query");
        let rows = sqlx::query(&q.sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|r| mapper::row_to_record(r, &self.table))
            .collect()
    }

    /// SDL type fragment: one `name: ApiType` line per storage field,
    /// references typed as their target entity.
    pub fn typedef(&self) -> String {
        let lines: Vec<String> = self
            .table
            .fields()
            .iter()
            .map(|f| format!("\t{}: {}", f.name, f.api_type_name()))
            .collect();
        format!("type {} {{\n{}\n}}", self.name, lines.join("\n"))
    }

    /// Generic query surface consumed by the schema builder.
    pub fn queries(&self) -> Vec<String> {
        vec![
            format!("find{}: [{}!]!", self.name, self.name),
            format!("get{}(id: String): {}", self.name, self.name),
        ]
    }

    /// Generic mutation surface. None for private entities: they cannot be
    /// mutated through the generic API, which is not an error condition.
    pub fn mutations(&self) -> Option<Vec<String>> {
        if self.descriptor.history == HistoryMode::Private {
            return None;
        }
        let mut args = vec!["id: String".to_string()];
        for field in self.table.fields() {
            if field.physical == PhysicalType::Id {
                continue;
            }
            // references take a Ref input here, unlike the typedef
            args.push(format!("{}: {}", field.name, field.api.name()));
        }
        Some(vec![format!(
            "save{}({}): {}",
            self.name,
            args.join(", "),
            self.name
        )])
    }
}
