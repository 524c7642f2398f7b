//! Field validation from descriptor rules, applied before any write.

use crate::error::RegistryError;
use crate::model::{FieldSpec, ModelDescriptor, ValidationRule};
use regex::Regex;
use serde_json::{Map, Value};

/// Validate a create body: required rules enforced, present values checked.
pub fn validate_create(
    descriptor: &ModelDescriptor,
    params: &Map<String, Value>,
) -> Result<(), RegistryError> {
    for (name, spec) in &descriptor.fields {
        let FieldSpec::Scalar { validations, .. } = spec else {
            continue;
        };
        let val = params.get(name);
        for rule in validations {
            if rule.required == Some(true) && (val.is_none() || val == Some(&Value::Null)) {
                return Err(RegistryError::Validation(format!("{name} is required")));
            }
        }
        if let Some(v) = val {
            validate_field(name, v, validations)?;
        }
    }
    Ok(())
}

/// Validate only the fields present in a patch; required is not enforced
/// for missing fields.
pub fn validate_patch(
    descriptor: &ModelDescriptor,
    patch: &Map<String, Value>,
) -> Result<(), RegistryError> {
    for (name, value) in patch {
        if let Some(FieldSpec::Scalar { validations, .. }) = descriptor.fields.get(name) {
            validate_field(name, value, validations)?;
        }
    }
    Ok(())
}

fn validate_field(name: &str, v: &Value, rules: &[ValidationRule]) -> Result<(), RegistryError> {
    if v.is_null() {
        return Ok(());
    }
    for rule in rules {
        apply_rule(name, v, rule)?;
    }
    Ok(())
}

fn apply_rule(col: &str, v: &Value, rule: &ValidationRule) -> Result<(), RegistryError> {
    if let Some(format) = &rule.format {
        validate_format(col, v, format)?;
    }
    if let Some(max) = rule.max_length {
        if let Some(s) = v.as_str() {
            if s.len() > max as usize {
                return Err(RegistryError::Validation(format!(
                    "{} must be at most {} characters",
                    col, max
                )));
            }
        }
    }
    if let Some(min) = rule.min_length {
        if let Some(s) = v.as_str() {
            if s.len() < min as usize {
                return Err(RegistryError::Validation(format!(
                    "{} must be at least {} characters",
                    col, min
                )));
            }
        }
    }
    if let Some(pattern) = &rule.pattern {
        let re = Regex::new(pattern)
            .map_err(|_| RegistryError::Validation(format!("invalid pattern for {}", col)))?;
        if let Some(s) = v.as_str() {
            if !re.is_match(s) {
                return Err(RegistryError::Validation(format!(
                    "{} does not match required pattern",
                    col
                )));
            }
        }
    }
    if let Some(min) = rule.minimum {
        if let Some(n) = v.as_f64() {
            if n < min {
                return Err(RegistryError::Validation(format!(
                    "{} must be at least {}",
                    col, min
                )));
            }
        }
    }
    if let Some(max) = rule.maximum {
        if let Some(n) = v.as_f64() {
            if n > max {
                return Err(RegistryError::Validation(format!(
                    "{} must be at most {}",
                    col, max
                )));
            }
        }
    }
    Ok(())
}

fn validate_format(col: &str, v: &Value, format: &str) -> Result<(), RegistryError> {
    match format.to_lowercase().as_str() {
        "email" => {
            if let Some(s) = v.as_str() {
                if !s.contains('@') || s.len() < 3 {
                    return Err(RegistryError::Validation(format!(
                        "{} must be a valid email",
                        col
                    )));
                }
            }
        }
        "uuid" => {
            if let Some(s) = v.as_str() {
                if uuid::Uuid::parse_str(s).is_err() {
                    return Err(RegistryError::Validation(format!(
                        "{} must be a valid UUID",
                        col
                    )));
                }
            }
        }
        "datetime" => {
            if let Some(s) = v.as_str() {
                if chrono::DateTime::parse_from_rfc3339(s).is_err() {
                    return Err(RegistryError::Validation(format!(
                        "{} must be an RFC 3339 datetime",
                        col
                    )));
                }
            }
        }
        _ => {}
    }
    Ok(())
}
