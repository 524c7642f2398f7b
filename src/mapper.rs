//! Conversion between the flat row form used by the store and the
//! structured record form returned to callers.

use crate::error::{ModifierError, RegistryError};
use crate::model::{FieldKind, FieldTable, PhysicalType, StorageField, ID_FIELD};
use crate::modifier::{from_raw, json_type_name, value_into};
use serde_json::{json, Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::Row;

fn modifier_err(field: &StorageField, source: ModifierError) -> RegistryError {
    RegistryError::Modifier {
        field: field.name.clone(),
        source,
    }
}

fn unknown_field(entity: &str, field: &str) -> RegistryError {
    RegistryError::UnknownField {
        entity: entity.to_string(),
        field: field.to_string(),
    }
}

/// Stored form of one write-side value. References hold `{id}` boxes (a
/// bare id string is accepted); columns run the modifier pipeline.
pub(crate) fn stored_value(field: &StorageField, value: Value) -> Result<Value, RegistryError> {
    match &field.kind {
        FieldKind::Reference { .. } => match value {
            Value::Null => Ok(Value::Null),
            Value::String(id) => Ok(Value::String(id)),
            Value::Object(mut obj) => match obj.remove(ID_FIELD) {
                Some(Value::String(id)) => Ok(Value::String(id)),
                _ => Err(RegistryError::Validation(format!(
                    "{} requires an id reference",
                    field.name
                ))),
            },
            other => Err(RegistryError::Validation(format!(
                "{} requires an id reference, got {}",
                field.name,
                json_type_name(&other)
            ))),
        },
        FieldKind::Column => value_into(&field.modifiers, value).map_err(|e| modifier_err(field, e)),
    }
}

/// Full row for `create`: every param key must resolve, every field emits
/// one pair in resolver order. The identity pair always carries the
/// supplied id, regardless of any client-provided value.
pub fn full_row(
    entity: &str,
    table: &FieldTable,
    id: &str,
    params: &Map<String, Value>,
) -> Result<Vec<(String, Value)>, RegistryError> {
    for key in params.keys() {
        if table.get(key).is_none() {
            return Err(unknown_field(entity, key));
        }
    }
    let mut pairs = Vec::with_capacity(table.fields().len());
    for field in table.fields() {
        if field.physical == PhysicalType::Id {
            pairs.push((field.column_name(), Value::String(id.to_string())));
            continue;
        }
        let value = params.get(&field.name).cloned().unwrap_or(Value::Null);
        pairs.push((field.column_name(), stored_value(field, value)?));
    }
    Ok(pairs)
}

/// Patch pairs for `update`: only fields present in the patch, resolver
/// order. Unknown keys are rejected before any write; the identity field is
/// never updated.
pub fn patch_row(
    entity: &str,
    table: &FieldTable,
    patch: &Map<String, Value>,
) -> Result<Vec<(String, Value)>, RegistryError> {
    for key in patch.keys() {
        if table.get(key).is_none() {
            return Err(unknown_field(entity, key));
        }
    }
    let mut pairs = Vec::new();
    for field in table.fields() {
        if field.physical == PhysicalType::Id {
            continue;
        }
        let Some(value) = patch.get(&field.name) else {
            continue;
        };
        pairs.push((field.column_name(), stored_value(field, value.clone())?));
    }
    Ok(pairs)
}

fn decode_cell(row: &SqliteRow, idx: usize, physical: PhysicalType) -> Result<Value, sqlx::Error> {
    Ok(match physical {
        PhysicalType::Id | PhysicalType::Text | PhysicalType::Blob => row
            .try_get::<Option<String>, _>(idx)?
            .map(Value::String)
            .unwrap_or(Value::Null),
        PhysicalType::Int => row
            .try_get::<Option<i64>, _>(idx)?
            .map(|n| Value::Number(n.into()))
            .unwrap_or(Value::Null),
        PhysicalType::Decimal => match row.try_get::<Option<f64>, _>(idx) {
            Ok(v) => v
                .and_then(|n| serde_json::Number::from_f64(n).map(Value::Number))
                .unwrap_or(Value::Null),
            // NUMERIC affinity can hold an integer-typed cell
            Err(_) => row
                .try_get::<Option<i64>, _>(idx)?
                .map(|n| Value::Number(n.into()))
                .unwrap_or(Value::Null),
        },
        PhysicalType::Boolean => row
            .try_get::<Option<bool>, _>(idx)?
            .map(Value::Bool)
            .unwrap_or(Value::Null),
    })
}

/// Map one row into a record, decoding each cell by ordinal in resolver
/// order. References box as `{id}`; columns run the load-side pipeline.
pub fn row_to_record(row: &SqliteRow, table: &FieldTable) -> Result<Value, RegistryError> {
    let mut record = Map::with_capacity(table.fields().len());
    for (idx, field) in table.fields().iter().enumerate() {
        let raw = decode_cell(row, idx, field.physical)?;
        let value = match &field.kind {
            FieldKind::Reference { .. } => {
                if raw.is_null() {
                    Value::Null
                } else {
                    json!({ ID_FIELD: raw })
                }
            }
            FieldKind::Column => from_raw(&field.modifiers, raw).map_err(|e| modifier_err(field, e))?,
        };
        record.insert(field.name.clone(), value);
    }
    Ok(Value::Object(record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{resolve, FieldSpec, ModelDescriptor, ModifierSpec, ScalarType};
    use serde_json::json;

    fn table() -> FieldTable {
        let descriptor = ModelDescriptor::new()
            .field("name", FieldSpec::scalar(ScalarType::Text))
            .field(
                "secret",
                FieldSpec::scalar(ScalarType::Text)
                    .with_modifiers(vec![ModifierSpec::Encrypt { key: "k".into() }]),
            )
            .field("owner", FieldSpec::reference("Organization"));
        FieldTable::new(resolve("Widget", &descriptor).unwrap())
    }

    fn object(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => unreachable!(),
        }
    }

    #[test]
    fn full_row_covers_every_field_in_order() {
        let params = object(json!({"name": "a", "owner": {"id": "deadbeef"}}));
        let pairs = full_row("Widget", &table(), "abc123", &params).unwrap();
        let columns: Vec<&str> = pairs.iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(columns, ["id", "name", "secret", "owner_id"]);
        assert_eq!(pairs[0].1, json!("abc123"));
        assert_eq!(pairs[1].1, json!("a"));
        assert_eq!(pairs[2].1, Value::Null);
        assert_eq!(pairs[3].1, json!("deadbeef"));
    }

    #[test]
    fn client_supplied_id_is_overridden() {
        let params = object(json!({"id": "spoofed", "name": "a"}));
        let pairs = full_row("Widget", &table(), "genuine", &params).unwrap();
        assert_eq!(pairs[0].1, json!("genuine"));
    }

    #[test]
    fn unknown_param_is_rejected() {
        let params = object(json!({"bogus": 1}));
        assert!(matches!(
            full_row("Widget", &table(), "abc", &params),
            Err(RegistryError::UnknownField { field, .. }) if field == "bogus"
        ));
    }

    #[test]
    fn patch_row_emits_only_present_fields() {
        let patch = object(json!({"name": "b"}));
        let pairs = patch_row("Widget", &table(), &patch).unwrap();
        assert_eq!(pairs.len(), 1);
        assert_eq!(pairs[0], ("name".to_string(), json!("b")));
    }

    #[test]
    fn column_values_run_the_pipeline() {
        let patch = object(json!({"secret": "s3cret"}));
        let pairs = patch_row("Widget", &table(), &patch).unwrap();
        let stored = pairs[0].1.as_str().unwrap();
        assert!(stored.starts_with('~'));
        assert!(!stored.contains("s3cret"));
    }

    #[test]
    fn reference_values_require_an_id() {
        let patch = object(json!({"owner": {"name": "no id"}}));
        assert!(matches!(
            patch_row("Widget", &table(), &patch),
            Err(RegistryError::Validation(_))
        ));
    }
}
