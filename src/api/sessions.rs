//! Session persistence endpoints.
//!
//! Sessions are free-form JSON documents keyed by id. Writes merge into
//! the stored document instead of replacing it, so runners can checkpoint
//! partial state (conversation turns, pending MR context) incrementally.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use super::types::CreatedSession;
use super::AppState;

fn internal(err: String) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err)
}

fn not_found(id: &str) -> (StatusCode, String) {
    (StatusCode::NOT_FOUND, format!("Session not found: {id}"))
}

fn require_object(data: &Value) -> Result<(), (StatusCode, String)> {
    if data.is_object() {
        Ok(())
    } else {
        Err((
            StatusCode::BAD_REQUEST,
            "session data must be a JSON object".to_string(),
        ))
    }
}

/// POST /api/sessions - create a session under a generated id.
pub async fn create_session(
    State(state): State<AppState>,
    body: Option<Json<Value>>,
) -> Result<Json<CreatedSession>, (StatusCode, String)> {
    let data = match body {
        Some(Json(Value::Null)) | None => json!({}),
        Some(Json(value)) => value,
    };
    require_object(&data)?;

    let session_id = Uuid::new_v4().to_string();
    let document = state
        .sessions
        .write(&session_id, data)
        .await
        .map_err(internal)?;

    info!(session_id = %session_id, "session created");
    Ok(Json(CreatedSession {
        session_id,
        document,
    }))
}

/// GET /api/sessions/:id - fetch the stored document.
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, (StatusCode, String)> {
    match state.sessions.read(&id).await.map_err(internal)? {
        Some(document) => Ok(Json(document)),
        None => Err(not_found(&id)),
    }
}

/// PUT /api/sessions/:id - merge data into the document and return it.
pub async fn put_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    require_object(&body)?;
    let document = state.sessions.write(&id, body).await.map_err(internal)?;
    Ok(Json(document))
}

/// DELETE /api/sessions/:id - remove the session.
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    if state.sessions.delete(&id).await.map_err(internal)? {
        info!(session_id = %id, "session deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found(&id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;

    #[tokio::test]
    async fn test_session_lifecycle_through_the_handlers() {
        let state = test_state();

        let Json(created) = create_session(
            State(state.clone()),
            Some(Json(json!({"agent": "companion"}))),
        )
        .await
        .expect("create");
        let id = created.session_id.clone();
        assert_eq!(created.document["agent"], "companion");
        assert!(created.document["created_at"].is_string());

        let Json(doc) = get_session(State(state.clone()), Path(id.clone()))
            .await
            .expect("read back");
        assert_eq!(doc["agent"], "companion");

        let Json(doc) = put_session(
            State(state.clone()),
            Path(id.clone()),
            Json(json!({"state": {"mr_iid": 7}})),
        )
        .await
        .expect("merge write");
        assert_eq!(doc["agent"], "companion");
        assert_eq!(doc["state"]["mr_iid"], 7);

        let status = delete_session(State(state.clone()), Path(id.clone()))
            .await
            .expect("delete");
        assert_eq!(status, StatusCode::NO_CONTENT);

        let err = get_session(State(state), Path(id))
            .await
            .expect_err("gone after delete");
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_session_defaults_to_an_empty_document() {
        let Json(created) = create_session(State(test_state()), None)
            .await
            .expect("create without body");
        assert!(created.document["created_at"].is_string());
        assert!(created.document["updated_at"].is_string());
    }

    #[tokio::test]
    async fn test_non_object_payloads_are_bad_requests() {
        let state = test_state();

        let err = put_session(
            State(state.clone()),
            Path("s1".to_string()),
            Json(json!([1, 2, 3])),
        )
        .await
        .expect_err("arrays are rejected");
        assert_eq!(err.0, StatusCode::BAD_REQUEST);

        let err = create_session(State(state), Some(Json(json!("text"))))
            .await
            .expect_err("strings are rejected");
        assert_eq!(err.0, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_deleting_a_missing_session_is_a_404() {
        let err = delete_session(State(test_state()), Path("missing".to_string()))
            .await
            .expect_err("nothing to delete");
        assert_eq!(err.0, StatusCode::NOT_FOUND);
    }
}
