//! Resource CRUD operations over the store and validator.
//!
//! Every write is a whole-collection read-modify-write. Writers to the same
//! resource name are serialized through a per-name lock so concurrent
//! requests cannot lose each other's updates; different resources proceed
//! independently.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use uuid::Uuid;

use crate::error::{HandlerError, StoreError};
use crate::store::ResourceStore;
use crate::types::{record_id, Collection, ValidationResult, ID_FIELD};
use crate::validator::SchemaValidator;

/// Orchestrates list, get, create, update, delete and validate-only requests.
#[derive(Debug)]
pub struct ResourceHandler {
    store: ResourceStore,
    validator: SchemaValidator,
    locks: ResourceLocks,
}

impl ResourceHandler {
    pub fn new(store: ResourceStore, validator: SchemaValidator) -> Self {
        Self {
            store,
            validator,
            locks: ResourceLocks::default(),
        }
    }

    /// Return the full collection for `resource`.
    pub fn list(&self, resource: &str) -> Result<Value, HandlerError> {
        Ok(Value::Array(self.store.read(resource)?))
    }

    /// Return the first record in `resource` whose `_id` equals `id`.
    pub fn get_by_id(&self, resource: &str, id: &str) -> Result<Value, HandlerError> {
        self.store
            .read(resource)?
            .into_iter()
            .find(|record| record_id(record) == Some(id))
            .ok_or_else(|| HandlerError::IdNotFound { id: id.to_string() })
    }

    /// Validate `body`, assign it a fresh `_id` and insert it first in the collection.
    ///
    /// Any `_id` supplied by the caller is replaced.
    pub fn create(&self, resource: &str, body: Value) -> Result<Value, HandlerError> {
        let mut body = body;
        let lock = self.lock_for(resource)?;
        let _guard = lock.lock();

        let saved = self.store.read(resource)?;
        self.check(resource, &body)?;

        let id = Uuid::new_v4().to_string();
        set_id(&mut body, &id)?;

        let mut records = Collection::with_capacity(saved.len() + 1);
        records.push(body.clone());
        records.extend(saved);
        self.store.write(resource, &records)?;

        tracing::info!(resource, id = %id, "created record");
        Ok(body)
    }

    /// Replace the first record whose `_id` equals `id` with `body`.
    ///
    /// The path `id` always wins over an `_id` in the body. When no record
    /// matches, the collection is rewritten unchanged and the body is still
    /// returned.
    pub fn update(&self, resource: &str, id: &str, body: Value) -> Result<Value, HandlerError> {
        let mut body = body;
        set_id(&mut body, id)?;

        let lock = self.lock_for(resource)?;
        let _guard = lock.lock();

        let mut records = self.store.read(resource)?;
        self.check(resource, &body)?;

        match records.iter_mut().find(|record| record_id(record) == Some(id)) {
            Some(slot) => *slot = body.clone(),
            None => tracing::warn!(resource, id, "update matched no record"),
        }
        self.store.write(resource, &records)?;

        tracing::info!(resource, id, "updated record");
        Ok(body)
    }

    /// Remove every record whose `_id` equals `id`. Removing nothing is not an error.
    pub fn delete(&self, resource: &str, id: &str) -> Result<Value, HandlerError> {
        let lock = self.lock_for(resource)?;
        let _guard = lock.lock();

        let records = self.store.read(resource)?;
        let before = records.len();
        let kept: Collection = records
            .into_iter()
            .filter(|record| record_id(record) != Some(id))
            .collect();
        let removed = before - kept.len();
        self.store.write(resource, &kept)?;

        tracing::info!(resource, id, removed, "deleted records");
        Ok(Value::Object(Default::default()))
    }

    /// Run the schema validator only; the store is never touched.
    pub fn validate_only(&self, resource: &str, body: &Value) -> ValidationResult {
        self.validator.validate(resource, body)
    }

    /// Writer lock for an existing resource.
    ///
    /// Unsafe or unknown names fail before a lock entry is created, so the
    /// lock table only ever holds names backed by a collection file.
    fn lock_for(&self, resource: &str) -> Result<Arc<Mutex<()>>, HandlerError> {
        self.store.path_for(resource)?;
        if !self.store.exists(resource) {
            return Err(StoreError::NotFound {
                resource: resource.to_string(),
            }
            .into());
        }
        Ok(self.locks.get(resource))
    }

    fn check(&self, resource: &str, body: &Value) -> Result<(), HandlerError> {
        let result = self.validator.validate(resource, body);
        if result.is_valid {
            return Ok(());
        }
        match (result.errors, result.message) {
            (Some(errors), _) => Err(HandlerError::Invalid { errors }),
            (None, Some(message)) => Err(HandlerError::SchemaUnavailable { message }),
            (None, None) => Err(HandlerError::Invalid { errors: Vec::new() }),
        }
    }
}

fn set_id(body: &mut Value, id: &str) -> Result<(), HandlerError> {
    let record = body.as_object_mut().ok_or(HandlerError::NotAnObject)?;
    record.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
    Ok(())
}

/// One mutex per resource name, created on first use.
#[derive(Debug, Default)]
struct ResourceLocks {
    inner: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl ResourceLocks {
    fn get(&self, resource: &str) -> Arc<Mutex<()>> {
        let mut locks = self.inner.lock();
        Arc::clone(locks.entry(resource.to_string()).or_default())
    }
}
