//! Model-set validation: reserved names, reference integrity, and rule
//! sanity, checked before any registry is built.

use crate::error::ModelError;
use crate::model::resolved::ID_FIELD;
use crate::model::types::{FieldSpec, ModelSet};
use regex::Regex;

pub fn validate(models: &ModelSet) -> Result<(), ModelError> {
    for (entity, descriptor) in models {
        for (field, spec) in &descriptor.fields {
            if field == ID_FIELD {
                return Err(ModelError::ReservedField(format!("{entity}.{field}")));
            }
            match spec {
                FieldSpec::Reference { target } => {
                    if !models.contains_key(target) {
                        return Err(ModelError::MissingReference {
                            entity: entity.clone(),
                            field: field.clone(),
                            target: target.clone(),
                        });
                    }
                }
                FieldSpec::Scalar { validations, .. } => {
                    for rule in validations {
                        if let Some(pattern) = &rule.pattern {
                            Regex::new(pattern).map_err(|e| ModelError::InvalidRule {
                                field: format!("{entity}.{field}"),
                                reason: e.to_string(),
                            })?;
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
