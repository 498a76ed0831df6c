//! In-memory session store (non-persistent).

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use super::{merged_document, SessionStore};

#[derive(Clone)]
pub struct MemorySessionStore {
    sessions: Arc<RwLock<HashMap<String, Value>>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

impl Default for MemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    fn is_persistent(&self) -> bool {
        false
    }

    async fn read(&self, session_id: &str) -> Result<Option<Value>, String> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn write(&self, session_id: &str, data: Value) -> Result<Value, String> {
        let mut sessions = self.sessions.write().await;
        let existing = sessions.get(session_id).cloned();
        let document = merged_document(existing, data)?;
        sessions.insert(session_id.to_string(), document.clone());
        Ok(document)
    }

    async fn exists(&self, session_id: &str) -> Result<bool, String> {
        Ok(self.sessions.read().await.contains_key(session_id))
    }

    async fn delete(&self, session_id: &str) -> Result<bool, String> {
        Ok(self.sessions.write().await.remove(session_id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_read_returns_none_for_unknown_sessions() {
        let store = MemorySessionStore::new();
        assert_eq!(store.read("missing").await.expect("read"), None);
        assert!(!store.exists("missing").await.expect("exists"));
    }

    #[tokio::test]
    async fn test_write_creates_and_stamps_the_document() {
        let store = MemorySessionStore::new();
        let doc = store
            .write("s1", json!({ "user": "ada", "state": { "step": 1 } }))
            .await
            .expect("write session");

        assert_eq!(doc["user"], "ada");
        assert!(doc["created_at"].is_string());
        assert!(doc["updated_at"].is_string());
        assert!(store.exists("s1").await.expect("exists"));

        let read_back = store.read("s1").await.expect("read").expect("present");
        assert_eq!(read_back, doc);
    }

    #[tokio::test]
    async fn test_second_write_merges_and_keeps_created_at() {
        let store = MemorySessionStore::new();
        let first = store
            .write("s1", json!({ "state": { "step": 1, "branch": "main" } }))
            .await
            .expect("first write");

        let second = store
            .write("s1", json!({ "state": { "step": 2 } }))
            .await
            .expect("second write");

        assert_eq!(second["state"]["step"], 2);
        assert_eq!(second["state"]["branch"], "main");
        assert_eq!(second["created_at"], first["created_at"]);
        assert!(
            second["updated_at"].as_str().expect("updated_at")
                >= first["updated_at"].as_str().expect("updated_at")
        );
    }

    #[tokio::test]
    async fn test_write_rejects_non_object_data() {
        let store = MemorySessionStore::new();
        let err = store.write("s1", json!("just a string")).await.unwrap_err();
        assert!(err.contains("JSON object"));
        assert!(!store.exists("s1").await.expect("exists"));
    }

    #[tokio::test]
    async fn test_delete_reports_whether_the_session_existed() {
        let store = MemorySessionStore::new();
        store
            .write("s1", json!({ "a": 1 }))
            .await
            .expect("write session");

        assert!(store.delete("s1").await.expect("delete"));
        assert!(!store.delete("s1").await.expect("second delete"));
        assert_eq!(store.read("s1").await.expect("read"), None);
    }
}
