//! SQLite-backed session store.
//!
//! One row per session, the document stored as JSON text. The connection
//! sits behind a mutex; statements are short and never held across awaits.

use std::path::Path;
use std::sync::Mutex;

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use super::{merged_document, SessionStore};

pub struct SqliteSessionStore {
    db: Mutex<Connection>,
}

impl SqliteSessionStore {
    /// Open or create the session database at `path`.
    pub fn open(path: &Path) -> Result<Self, String> {
        let db = Connection::open(path)
            .map_err(|e| format!("Failed to open session database: {e}"))?;
        db.execute_batch(
            "CREATE TABLE IF NOT EXISTS sessions (
                id TEXT PRIMARY KEY,
                document TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );",
        )
        .map_err(|e| format!("Failed to initialize session database: {e}"))?;
        Ok(Self { db: Mutex::new(db) })
    }

    /// In-memory database, used by tests.
    pub fn in_memory() -> Result<Self, String> {
        Self::open(Path::new(":memory:"))
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, String> {
        self.db
            .lock()
            .map_err(|_| "session database lock poisoned".to_string())
    }

    fn fetch_document(db: &Connection, session_id: &str) -> Result<Option<Value>, String> {
        let text: Option<String> = db
            .query_row(
                "SELECT document FROM sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| format!("Failed to read session: {e}"))?;

        match text {
            Some(t) => serde_json::from_str(&t)
                .map(Some)
                .map_err(|e| format!("Stored session is not valid JSON: {e}")),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    fn is_persistent(&self) -> bool {
        true
    }

    async fn read(&self, session_id: &str) -> Result<Option<Value>, String> {
        let db = self.lock()?;
        Self::fetch_document(&db, session_id)
    }

    async fn write(&self, session_id: &str, data: Value) -> Result<Value, String> {
        let db = self.lock()?;
        let existing = Self::fetch_document(&db, session_id)?;
        let document = merged_document(existing, data)?;

        let created_at = document["created_at"].as_str().unwrap_or_default();
        let updated_at = document["updated_at"].as_str().unwrap_or_default();
        let text = serde_json::to_string(&document)
            .map_err(|e| format!("Failed to serialize session: {e}"))?;

        db.execute(
            "INSERT INTO sessions (id, document, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(id) DO UPDATE SET
                document = excluded.document,
                updated_at = excluded.updated_at",
            params![session_id, text, created_at, updated_at],
        )
        .map_err(|e| format!("Failed to write session: {e}"))?;

        Ok(document)
    }

    async fn exists(&self, session_id: &str) -> Result<bool, String> {
        let db = self.lock()?;
        let count: i64 = db
            .query_row(
                "SELECT COUNT(*) FROM sessions WHERE id = ?1",
                params![session_id],
                |row| row.get(0),
            )
            .map_err(|e| format!("Failed to check session: {e}"))?;
        Ok(count > 0)
    }

    async fn delete(&self, session_id: &str) -> Result<bool, String> {
        let db = self.lock()?;
        let removed = db
            .execute("DELETE FROM sessions WHERE id = ?1", params![session_id])
            .map_err(|e| format!("Failed to delete session: {e}"))?;
        Ok(removed > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_round_trips_a_session_document() {
        let store = SqliteSessionStore::in_memory().expect("open");
        let written = store
            .write("s1", json!({ "user": "ada", "state": { "step": 1 } }))
            .await
            .expect("write session");

        let read_back = store.read("s1").await.expect("read").expect("present");
        assert_eq!(read_back, written);
        assert!(store.exists("s1").await.expect("exists"));
    }

    #[tokio::test]
    async fn test_merges_on_rewrite_and_keeps_created_at() {
        let store = SqliteSessionStore::in_memory().expect("open");
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
    }

    #[tokio::test]
    async fn test_documents_survive_reopening_the_database() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("sessions.db");

        {
            let store = SqliteSessionStore::open(&path).expect("open");
            store
                .write("persistent", json!({ "kept": true }))
                .await
                .expect("write session");
        }

        let reopened = SqliteSessionStore::open(&path).expect("reopen");
        assert!(reopened.is_persistent());
        let doc = reopened
            .read("persistent")
            .await
            .expect("read")
            .expect("document survived");
        assert_eq!(doc["kept"], true);
    }

    #[tokio::test]
    async fn test_delete_reports_whether_the_session_existed() {
        let store = SqliteSessionStore::in_memory().expect("open");
        store
            .write("s1", json!({ "a": 1 }))
            .await
            .expect("write session");

        assert!(store.delete("s1").await.expect("delete"));
        assert!(!store.delete("s1").await.expect("second delete"));
        assert!(!store.exists("s1").await.expect("exists"));
    }
}
