use crate::error::ExtractError;
use std::collections::BTreeMap;

pub use storage::RuleSet;

/// Field name -> description. Descriptions are handed to the model untouched.
pub type Schema = BTreeMap<String, serde_json::Value>;

/// Field name -> extracted value, `None` when the field was not found.
pub type ExtractionResult = BTreeMap<String, Option<String>>;

/// A result covering every schema field with no value.
pub fn all_absent(schema: &Schema) -> ExtractionResult {
    schema.keys().map(|k| (k.clone(), None)).collect()
}

/// Restricts `values` to exactly the keys of `schema`, filling gaps with `None`.
pub fn project(schema: &Schema, mut values: ExtractionResult) -> ExtractionResult {
    schema
        .keys()
        .map(|k| (k.clone(), values.remove(k).flatten()))
        .collect()
}

/// Decodes a schema payload; it must be a JSON object.
pub fn parse_schema(raw: &str) -> Result<Schema, ExtractError> {
    let value: serde_json::Value = serde_json::from_str(raw)
        .map_err(|e| ExtractError::InvalidInput(format!("schema is not valid JSON: {e}")))?;
    match value {
        serde_json::Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(ExtractError::InvalidInput(format!(
            "schema must be a JSON object, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}
