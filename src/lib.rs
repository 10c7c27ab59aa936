//! Mock REST API Server
//!
//! Generic CRUD endpoints over per-resource JSON files, with JSON Schema
//! validation of every write.
//!
//! A data directory holds one `<resource>.json` array per resource and an
//! optional `<resource>.schema` JSON Schema next to it. Writes to a resource
//! without a schema are rejected.
//!
//! # Example
//!
//! ```
//! use mock_rest::{ResourceHandler, ResourceStore, SchemaValidator};
//! use serde_json::json;
//!
//! let dir = tempfile::tempdir().unwrap();
//! std::fs::write(dir.path().join("widgets.json"), "[]").unwrap();
//! std::fs::write(
//!     dir.path().join("widgets.schema"),
//!     r#"{"type":"object","required":["name"],"properties":{"name":{"type":"string"}}}"#,
//! )
//! .unwrap();
//!
//! let handler = ResourceHandler::new(
//!     ResourceStore::new(dir.path()),
//!     SchemaValidator::new(dir.path()),
//! );
//!
//! let created = handler.create("widgets", json!({ "name": "foo" })).unwrap();
//! let id = created["_id"].as_str().unwrap();
//! assert_eq!(handler.get_by_id("widgets", id).unwrap(), created);
//! ```
//!
//! # Routes
//!
//! | Method | Path | Success | Failure |
//! |--------|------|---------|---------|
//! | `GET` | `/api/{resource}` | 200 + array | 404 |
//! | `GET` | `/api/{resource}/{id}` | 200 + record | 404 |
//! | `POST` | `/api/{resource}` | 200 + created record | 500 |
//! | `PUT` | `/api/{resource}/{id}` | 200 + updated record | 500 |
//! | `DELETE` | `/api/{resource}/{id}` | 200 + `{}` | 500 |
//! | `POST` | `/api/validate/{resource}` | 200 + validation result | - |

mod api;
mod check;
mod config;
mod error;
mod handler;
mod loader;
mod server;
mod store;
mod types;
mod validator;

pub use api::{api_routes, ApiError, ApiState, ErrorResponse};
pub use check::{
    check, check_collection_file, check_schema_file, CheckResult, Diagnostic, FileResult,
    FileStatus, Severity,
};
pub use config::ServerConfig;
pub use error::{ConfigError, HandlerError, LoadError, StoreError};
pub use handler::ResourceHandler;
pub use loader::load_json;
pub use server::MockServer;
pub use store::ResourceStore;
pub use types::{
    collection_file_name, is_valid_resource_name, record_id, schema_file_name, Collection,
    Operation, ValidationResult, ID_FIELD,
};
pub use validator::{validate_against_schema, SchemaValidator};
