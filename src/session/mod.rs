//! Pluggable session persistence.
//!
//! Sessions are opaque JSON documents keyed by id. Writes deep-merge into
//! the stored document and stamp `updated_at` (plus `created_at` on the
//! first write); reads return the document verbatim. Two backends:
//! in-memory for development, SQLite for persistence.

pub mod memory;
pub mod sqlite;

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use tracing::info;

use crate::config::{SessionBackend, SessionConfig};

pub use memory::MemorySessionStore;
pub use sqlite::SqliteSessionStore;

/// Key-value document store for agent sessions.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Whether documents survive a restart.
    fn is_persistent(&self) -> bool;

    /// Fetch a session document, or `None` when the id is unknown.
    async fn read(&self, session_id: &str) -> Result<Option<Value>, String>;

    /// Deep-merge `data` into the stored document and return the result.
    /// Stamps `updated_at` on every write and `created_at` on the first.
    /// `data` must be a JSON object.
    async fn write(&self, session_id: &str, data: Value) -> Result<Value, String>;

    async fn exists(&self, session_id: &str) -> Result<bool, String>;

    /// Remove a session. Returns whether it existed.
    async fn delete(&self, session_id: &str) -> Result<bool, String>;
}

/// RFC 3339 UTC timestamp for the `created_at`/`updated_at` fields.
pub(crate) fn now_string() -> String {
    Utc::now().to_rfc3339()
}

/// Recursive object merge: object fields merge key by key, everything else
/// (scalars, arrays) is overwritten by the incoming value.
pub(crate) fn merge_into(target: &mut Value, incoming: &Value) {
    match (target, incoming) {
        (Value::Object(existing), Value::Object(new)) => {
            for (key, value) in new {
                merge_into(existing.entry(key.clone()).or_insert(Value::Null), value);
            }
        }
        (slot, value) => *slot = value.clone(),
    }
}

/// Merge `data` into `existing` (if any) and stamp the timestamps.
/// Shared by both backends so their write semantics cannot drift.
pub(crate) fn merged_document(
    existing: Option<Value>,
    data: Value,
) -> Result<Value, String> {
    if !data.is_object() {
        return Err("session data must be a JSON object".to_string());
    }

    let is_new = existing.is_none();
    let mut document = existing.unwrap_or_else(|| Value::Object(Default::default()));
    merge_into(&mut document, &data);

    let now = now_string();
    if let Value::Object(fields) = &mut document {
        if is_new {
            fields.insert("created_at".to_string(), Value::String(now.clone()));
        }
        fields.insert("updated_at".to_string(), Value::String(now));
    }
    Ok(document)
}

/// Build the session store the configuration asks for.
pub fn create_session_store(config: &SessionConfig) -> Result<Arc<dyn SessionStore>, String> {
    let store: Arc<dyn SessionStore> = match config.backend {
        SessionBackend::Memory => Arc::new(MemorySessionStore::new()),
        SessionBackend::Sqlite => {
            Arc::new(SqliteSessionStore::open(Path::new(&config.db_path))?)
        }
    };
    info!(
        backend = ?config.backend,
        persistent = store.is_persistent(),
        "session store ready"
    );
    Ok(store)
}
