//! Raw descriptor types matching the model JSON documents.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A named set of descriptors, as loaded from configuration.
pub type ModelSet = IndexMap<String, ModelDescriptor>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScalarType {
    Text,
    Blob,
    Int,
    Decimal,
    Datetime,
    Timestamp,
    Boolean,
    /// Unrecognized kind names land here and store as text.
    #[serde(other)]
    Unknown,
}

/// Policy tag controlling which generic mutation surface an entity exposes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HistoryMode {
    #[default]
    Default,
    AppendOnly,
    Private,
    Archive,
}

/// Declarative form of one field modifier; resolved into a transform chain
/// at registry construction.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ModifierSpec {
    /// Key-tagged encryption at rest.
    Encrypt { key: String },
    /// Structured value serialized to its textual storage form.
    Json,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ValidationRule {
    #[serde(default)]
    pub required: Option<bool>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub max_length: Option<u32>,
    #[serde(default)]
    pub min_length: Option<u32>,
    #[serde(default)]
    pub pattern: Option<String>,
    #[serde(default)]
    pub minimum: Option<f64>,
    #[serde(default)]
    pub maximum: Option<f64>,
}

/// One declared field: a scalar column or a reference to another entity.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldSpec {
    Reference {
        #[serde(rename = "ref")]
        target: String,
    },
    Scalar {
        #[serde(rename = "type")]
        scalar: ScalarType,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        validations: Vec<ValidationRule>,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        modifiers: Vec<ModifierSpec>,
    },
}

impl FieldSpec {
    pub fn scalar(scalar: ScalarType) -> Self {
        FieldSpec::Scalar {
            scalar,
            validations: Vec::new(),
            modifiers: Vec::new(),
        }
    }

    pub fn reference(target: impl Into<String>) -> Self {
        FieldSpec::Reference {
            target: target.into(),
        }
    }

    pub fn with_modifiers(self, modifiers: Vec<ModifierSpec>) -> Self {
        match self {
            FieldSpec::Scalar {
                scalar, validations, ..
            } => FieldSpec::Scalar {
                scalar,
                validations,
                modifiers,
            },
            other => other,
        }
    }

    pub fn with_validations(self, validations: Vec<ValidationRule>) -> Self {
        match self {
            FieldSpec::Scalar {
                scalar, modifiers, ..
            } => FieldSpec::Scalar {
                scalar,
                validations,
                modifiers,
            },
            other => other,
        }
    }
}

/// Declarative, static description of one entity. Immutable once a registry
/// is built from it; field order is declaration order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub fields: IndexMap<String, FieldSpec>,
    #[serde(default)]
    pub history: HistoryMode,
}

impl ModelDescriptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, name: impl Into<String>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    pub fn with_history(mut self, history: HistoryMode) -> Self {
        self.history = history;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn scalar_and_reference_parse_untagged() {
        let spec: FieldSpec = serde_json::from_value(json!({"type": "text"})).unwrap();
        assert!(matches!(
            spec,
            FieldSpec::Scalar {
                scalar: ScalarType::Text,
                ..
            }
        ));

        let spec: FieldSpec = serde_json::from_value(json!({"ref": "Organization"})).unwrap();
        assert!(matches!(spec, FieldSpec::Reference { target } if target == "Organization"));
    }

    #[test]
    fn unknown_scalar_kind_is_tolerated() {
        let spec: FieldSpec = serde_json::from_value(json!({"type": "geopoint"})).unwrap();
        assert!(matches!(
            spec,
            FieldSpec::Scalar {
                scalar: ScalarType::Unknown,
                ..
            }
        ));
    }

    #[test]
    fn descriptor_preserves_declaration_order() {
        let descriptor: ModelDescriptor = serde_json::from_value(json!({
            "fields": {
                "zulu": {"type": "text"},
                "alpha": {"type": "int"},
                "mike": {"ref": "Other"}
            }
        }))
        .unwrap();
        let names: Vec<&str> = descriptor.fields.keys().map(String::as_str).collect();
        assert_eq!(names, ["zulu", "alpha", "mike"]);
        assert_eq!(descriptor.history, HistoryMode::Default);
    }

    #[test]
    fn history_mode_parses_kebab_case() {
        let descriptor: ModelDescriptor =
            serde_json::from_value(json!({"fields": {}, "history": "append-only"})).unwrap();
        assert_eq!(descriptor.history, HistoryMode::AppendOnly);
    }
}
