//! Resolved storage layout: one storage field per declared field plus the
//! implicit identity field.

use crate::error::ModelError;
use crate::model::types::{FieldSpec, ModelDescriptor, ModifierSpec, ScalarType};
use crate::modifier::{Encrypt, JsonCodec, Modifier};
use std::collections::HashMap;
use std::sync::Arc;

/// Reserved name of the implicit identity field.
pub const ID_FIELD: &str = "id";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhysicalType {
    Id,
    Text,
    Blob,
    Int,
    Decimal,
    Boolean,
}

impl PhysicalType {
    /// Column type used in DDL.
    pub fn sql(self) -> &'static str {
        match self {
            PhysicalType::Id => "CHAR(32)",
            PhysicalType::Text => "TEXT",
            PhysicalType::Blob => "BLOB",
            PhysicalType::Int => "INTEGER",
            PhysicalType::Decimal => "DECIMAL",
            PhysicalType::Boolean => "BOOLEAN",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiType {
    Id,
    String,
    Int,
    Float,
    Boolean,
    Ref,
}

impl ApiType {
    pub fn name(self) -> &'static str {
        match self {
            ApiType::Id => "ID",
            ApiType::String => "String",
            ApiType::Int => "Int",
            ApiType::Float => "Float",
            ApiType::Boolean => "Boolean",
            ApiType::Ref => "Ref",
        }
    }
}

#[derive(Clone, Debug)]
pub enum FieldKind {
    Column,
    /// Foreign key into the named entity's identity column.
    Reference { target: String },
}

/// Storage-facing form of one declared field.
#[derive(Clone, Debug)]
pub struct StorageField {
    pub name: String,
    pub kind: FieldKind,
    pub physical: PhysicalType,
    pub api: ApiType,
    /// Transform chain, column kind only. Applied store-side in declared
    /// order and load-side in reverse.
    pub modifiers: Vec<Arc<dyn Modifier>>,
}

impl StorageField {
    /// Physical column name; references store under `<name>_id`.
    pub fn column_name(&self) -> String {
        match self.kind {
            FieldKind::Reference { .. } => format!("{}_id", self.name),
            FieldKind::Column => self.name.clone(),
        }
    }

    /// Type name used in typedefs; references render as their target entity.
    pub fn api_type_name(&self) -> &str {
        match &self.kind {
            FieldKind::Reference { target } => target,
            FieldKind::Column => self.api.name(),
        }
    }

    pub fn is_reference(&self) -> bool {
        matches!(self.kind, FieldKind::Reference { .. })
    }
}

fn scalar_mapping(scalar: ScalarType) -> (PhysicalType, ApiType) {
    match scalar {
        ScalarType::Text => (PhysicalType::Text, ApiType::String),
        ScalarType::Blob => (PhysicalType::Blob, ApiType::String),
        ScalarType::Int => (PhysicalType::Int, ApiType::Int),
        ScalarType::Decimal => (PhysicalType::Decimal, ApiType::Float),
        ScalarType::Datetime => (PhysicalType::Text, ApiType::String),
        ScalarType::Timestamp => (PhysicalType::Int, ApiType::Int),
        ScalarType::Boolean => (PhysicalType::Boolean, ApiType::Boolean),
        // Lenient default: unrecognized kinds store as text, never an error.
        ScalarType::Unknown => (PhysicalType::Text, ApiType::String),
    }
}

fn build_chain(specs: &[ModifierSpec]) -> Vec<Arc<dyn Modifier>> {
    specs
        .iter()
        .map(|spec| match spec {
            ModifierSpec::Encrypt { key } => Arc::new(Encrypt::new(key)) as Arc<dyn Modifier>,
            ModifierSpec::Json => Arc::new(JsonCodec) as Arc<dyn Modifier>,
        })
        .collect()
}

/// Derive the storage layout for one entity. The identity field comes
/// first, then declared fields in declaration order; SQL projections and
/// typedefs reuse this order verbatim.
pub fn resolve(entity: &str, descriptor: &ModelDescriptor) -> Result<Vec<StorageField>, ModelError> {
    let mut fields = Vec::with_capacity(descriptor.fields.len() + 1);
    fields.push(StorageField {
        name: ID_FIELD.to_string(),
        kind: FieldKind::Column,
        physical: PhysicalType::Id,
        api: ApiType::Id,
        modifiers: Vec::new(),
    });

    for (name, spec) in &descriptor.fields {
        if name == ID_FIELD {
            return Err(ModelError::ReservedField(format!("{entity}.{name}")));
        }
        let field = match spec {
            FieldSpec::Reference { target } => StorageField {
                name: name.clone(),
                kind: FieldKind::Reference {
                    target: target.clone(),
                },
                physical: PhysicalType::Text,
                api: ApiType::Ref,
                modifiers: Vec::new(),
            },
            FieldSpec::Scalar {
                scalar, modifiers, ..
            } => {
                let (physical, api) = scalar_mapping(*scalar);
                StorageField {
                    name: name.clone(),
                    kind: FieldKind::Column,
                    physical,
                    api,
                    modifiers: build_chain(modifiers),
                }
            }
        };
        fields.push(field);
    }
    Ok(fields)
}

/// Resolved fields plus a name index, built once per registry.
#[derive(Clone, Debug)]
pub struct FieldTable {
    fields: Arc<[StorageField]>,
    index: HashMap<String, usize>,
}

impl FieldTable {
    pub fn new(fields: Vec<StorageField>) -> Self {
        let index = fields
            .iter()
            .enumerate()
            .map(|(i, f)| (f.name.clone(), i))
            .collect();
        FieldTable {
            fields: fields.into(),
            index,
        }
    }

    pub fn get(&self, name: &str) -> Option<&StorageField> {
        self.index.get(name).map(|&i| &self.fields[i])
    }

    pub fn fields(&self) -> &[StorageField] {
        &self.fields
    }
}
