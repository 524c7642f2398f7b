//! Symmetric per-field transforms applied between an in-memory value and
//! its stored form.

use crate::error::ModifierError;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::sync::Arc;

/// A named, symmetric transform pair carrying its own configuration.
/// Invariant: `load(store(v)) == v` for every valid `v`.
pub trait Modifier: fmt::Debug + Send + Sync {
    fn name(&self) -> &'static str;
    fn store(&self, value: Value) -> Result<Value, ModifierError>;
    fn load(&self, stored: Value) -> Result<Value, ModifierError>;
}

/// Store-side chain application, declared order. Null bypasses the chain
/// entirely, so the short-circuit holds for every implementation.
pub fn value_into(chain: &[Arc<dyn Modifier>], value: Value) -> Result<Value, ModifierError> {
    if value.is_null() {
        return Ok(Value::Null);
    }
    chain.iter().try_fold(value, |v, m| m.store(v))
}

/// Load-side chain application, reverse order. Null bypasses the chain.
pub fn from_raw(chain: &[Arc<dyn Modifier>], stored: Value) -> Result<Value, ModifierError> {
    if stored.is_null() {
        return Ok(Value::Null);
    }
    chain.iter().rev().try_fold(stored, |v, m| m.load(v))
}

pub(crate) fn json_type_name(v: &Value) -> &'static str {
    match v {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Key-tagged encryption at rest. Stored form is `~<tag>:<hex body>`: the
/// tag identifies the key, the body is the text XORed with a keystream
/// derived from the key digest. Deterministic, so stored forms remain
/// comparable for lookups. Obfuscation, not a real cipher.
pub struct Encrypt {
    tag: String,
    pad: Vec<u8>,
}

impl Encrypt {
    pub fn new(key: &str) -> Self {
        let digest = Sha256::digest(key.as_bytes());
        Encrypt {
            tag: hex::encode(&digest[..4]),
            pad: digest.to_vec(),
        }
    }

    fn xor(&self, bytes: &[u8]) -> Vec<u8> {
        bytes
            .iter()
            .zip(self.pad.iter().cycle())
            .map(|(b, k)| b ^ k)
            .collect()
    }
}

impl fmt::Debug for Encrypt {
    // key material stays out of debug output
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Encrypt").field("tag", &self.tag).finish()
    }
}

impl Modifier for Encrypt {
    fn name(&self) -> &'static str {
        "encrypt"
    }

    fn store(&self, value: Value) -> Result<Value, ModifierError> {
        let text = value
            .as_str()
            .ok_or_else(|| ModifierError::NotText(json_type_name(&value)))?;
        let body = hex::encode(self.xor(text.as_bytes()));
        Ok(Value::String(format!("~{}:{}", self.tag, body)))
    }

    fn load(&self, stored: Value) -> Result<Value, ModifierError> {
        let text = stored
            .as_str()
            .ok_or_else(|| ModifierError::NotText(json_type_name(&stored)))?;
        let rest = text
            .strip_prefix('~')
            .ok_or_else(|| ModifierError::Malformed("missing key tag".into()))?;
        let (tag, body) = rest
            .split_once(':')
            .ok_or_else(|| ModifierError::Malformed("missing key tag".into()))?;
        if tag != self.tag {
            return Err(ModifierError::KeyMismatch {
                found: tag.to_string(),
                expected: self.tag.clone(),
            });
        }
        let bytes = hex::decode(body).map_err(|e| ModifierError::Malformed(e.to_string()))?;
        let plain =
            String::from_utf8(self.xor(&bytes)).map_err(|e| ModifierError::Malformed(e.to_string()))?;
        Ok(Value::String(plain))
    }
}

/// Structured values serialized to their textual storage form.
#[derive(Clone, Copy, Debug)]
pub struct JsonCodec;

impl Modifier for JsonCodec {
    fn name(&self) -> &'static str {
        "json"
    }

    fn store(&self, value: Value) -> Result<Value, ModifierError> {
        Ok(Value::String(serde_json::to_string(&value)?))
    }

    fn load(&self, stored: Value) -> Result<Value, ModifierError> {
        let text = stored
            .as_str()
            .ok_or_else(|| ModifierError::NotText(json_type_name(&stored)))?;
        Ok(serde_json::from_str(text)?)
    }
}
