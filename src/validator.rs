//! Payload validation against per-resource JSON Schemas.

use std::path::PathBuf;

use serde_json::Value;

use crate::loader::load_json;
use crate::types::{is_valid_resource_name, schema_file_name, ValidationResult};

/// Validates candidate records against `{schema_dir}/{resource}.schema`.
///
/// Schemas are loaded and compiled on every call, so edits to schema files
/// take effect on the next request.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    schema_dir: PathBuf,
}

impl SchemaValidator {
    pub fn new(schema_dir: impl Into<PathBuf>) -> Self {
        Self {
            schema_dir: schema_dir.into(),
        }
    }

    /// Validate `candidate` against the schema of `resource`.
    ///
    /// A schema that cannot be found, read, parsed or compiled is reported
    /// through `message`; it is never an error to the caller.
    pub fn validate(&self, resource: &str, candidate: &Value) -> ValidationResult {
        if !is_valid_resource_name(resource) {
            return ValidationResult::unavailable(format!(
                "invalid resource name \"{}\"",
                resource
            ));
        }

        let path = self.schema_dir.join(schema_file_name(resource));
        let schema = match load_json(&path) {
            Ok(schema) => schema,
            Err(e) => {
                tracing::warn!(resource, error = %e, "schema unavailable");
                return ValidationResult::unavailable(e.to_string());
            }
        };

        validate_against_schema(&schema, candidate)
    }
}

/// Validate a document against an already-loaded schema.
///
/// Each violation is reported as `"<instance path> <message>"`, in the order
/// the schema engine produces them.
pub fn validate_against_schema(schema: &Value, candidate: &Value) -> ValidationResult {
    let validator = match jsonschema::validator_for(schema) {
        Ok(validator) => validator,
        Err(e) => return ValidationResult::unavailable(format!("invalid schema: {}", e)),
    };

    let errors: Vec<String> = validator
        .iter_errors(candidate)
        .map(|e| format!("{} {}", e.instance_path, e))
        .collect();

    if errors.is_empty() {
        ValidationResult::valid()
    } else {
        ValidationResult::invalid(errors)
    }
}
