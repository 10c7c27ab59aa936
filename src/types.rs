//! Core types shared by the store, validator, handler and router.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Reserved record field holding the server-assigned identifier.
pub const ID_FIELD: &str = "_id";

/// File extension of persisted collections.
pub const COLLECTION_EXT: &str = "json";

/// File extension of resource schemas.
pub const SCHEMA_EXT: &str = "schema";

/// A resource's full contents. The shape of elements is not enforced on read.
pub type Collection = Vec<Value>;

/// Returns the `_id` of a record, if it has a string one.
pub fn record_id(record: &Value) -> Option<&str> {
    record.get(ID_FIELD).and_then(Value::as_str)
}

/// Returns true if `name` can be used as a flat file name in the data directory.
pub fn is_valid_resource_name(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && !name.contains(['/', '\\', '\0'])
}

/// File name of the collection document for `resource`.
pub fn collection_file_name(resource: &str) -> String {
    format!("{}.{}", resource, COLLECTION_EXT)
}

/// File name of the schema document for `resource`.
pub fn schema_file_name(resource: &str) -> String {
    format!("{}.{}", resource, SCHEMA_EXT)
}

/// Structured outcome of checking a candidate record against a schema.
///
/// `errors` is present only when the schema was evaluated and rejected the
/// document; `message` only when the schema itself could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationResult {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            errors: None,
            message: None,
        }
    }

    pub fn invalid(errors: Vec<String>) -> Self {
        Self {
            is_valid: false,
            errors: Some(errors),
            message: None,
        }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            errors: None,
            message: Some(message.into()),
        }
    }
}

/// Resource handler operation, as selected by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    List,
    GetById,
    Create,
    Update,
    Delete,
    Validate,
}

impl Operation {
    /// HTTP status code reported when this operation fails.
    ///
    /// The status depends on the operation, not on the kind of failure:
    ///
    /// | Operation | Status |
    /// |-----------|--------|
    /// | List, GetById | 404 |
    /// | Create, Update, Delete | 500 |
    /// | Validate | 200 (outcome carried in the body) |
    pub fn failure_status(&self) -> u16 {
        match self {
            Operation::List | Operation::GetById => 404,
            Operation::Create | Operation::Update | Operation::Delete => 500,
            Operation::Validate => 200,
        }
    }

    /// Lowercase name used in log output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::List => "list",
            Operation::GetById => "get",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
            Operation::Validate => "validate",
        }
    }
}
