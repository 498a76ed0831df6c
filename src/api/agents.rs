//! Agent catalog and tool invocation endpoints.
//!
//! The catalog is read-only: runners list the personas, fetch one card,
//! and inspect the tool definitions they would hand to the model. Tool
//! invocation goes through the persona's own registry so each persona
//! only ever reaches the tools (and the token) it was bound to.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::info;

use crate::agents::{find_persona, AgentPersona, PERSONAS};
use crate::tools::ToolDefinition;

use super::types::{AgentCard, AgentSummary};
use super::AppState;

fn lookup(name: &str) -> Result<&'static AgentPersona, (StatusCode, String)> {
    find_persona(name).ok_or_else(|| (StatusCode::NOT_FOUND, format!("Unknown agent: {name}")))
}

/// GET /api/agents - list all personas.
pub async fn list_agents(State(state): State<AppState>) -> Json<Vec<AgentSummary>> {
    let summaries = PERSONAS
        .iter()
        .map(|persona| AgentSummary::from_persona(persona, &state.llm))
        .collect();
    Json(summaries)
}

/// GET /api/agents/:name - full agent card.
pub async fn get_agent(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<AgentCard>, (StatusCode, String)> {
    let persona = lookup(&name)?;
    Ok(Json(AgentCard::from_persona(persona, &state.llm)))
}

/// GET /api/agents/:name/tools - tool definitions in binding order.
pub async fn list_agent_tools(
    State(state): State<AppState>,
    Path(name): Path<String>,
) -> Result<Json<Vec<ToolDefinition>>, (StatusCode, String)> {
    let persona = lookup(&name)?;
    Ok(Json(state.agents.tool_definitions(persona)))
}

/// POST /api/agents/:name/tools/:tool - invoke one tool through the persona.
///
/// Routing errors (unknown agent, tool not bound to the agent) are HTTP
/// 404s. Execution failures are not: the tool result is always returned
/// with HTTP 200, and a failed call is an `{"error": ...}` object in the
/// body, exactly as the model would see it.
pub async fn invoke_agent_tool(
    State(state): State<AppState>,
    Path((name, tool)): Path<(String, String)>,
    Json(body): Json<Value>,
) -> Result<Json<Value>, (StatusCode, String)> {
    let persona = lookup(&name)?;
    if !persona.tools.contains(&tool.as_str()) {
        return Err((
            StatusCode::NOT_FOUND,
            format!("Agent '{name}' has no tool '{tool}'"),
        ));
    }

    let args = if body.is_null() { json!({}) } else { body };
    info!(agent = %name, tool = %tool, "invoking tool");
    let result = state.agents.invoke_tool(persona, &tool, args).await;
    Ok(Json(result))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_state;

    #[tokio::test]
    async fn test_list_agents_returns_all_personas() {
        let Json(summaries) = list_agents(State(test_state())).await;
        let names: Vec<&str> = summaries.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["companion", "mr_reviewer", "code_reader"]);
    }

    #[tokio::test]
    async fn test_get_agent_rejects_unknown_names() {
        let err = get_agent(State(test_state()), Path("nope".to_string()))
            .await
            .expect_err("unknown agent");
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        assert!(err.1.contains("nope"));
    }

    #[tokio::test]
    async fn test_tool_listing_matches_the_binding_order() {
        let Json(defs) = list_agent_tools(State(test_state()), Path("code_reader".to_string()))
            .await
            .expect("known agent");
        let names: Vec<&str> = defs.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names.first(), Some(&"get_mr_info"));
        assert!(!names.contains(&"merge_mr"));
    }

    #[tokio::test]
    async fn test_invoking_an_unbound_tool_is_a_routing_404() {
        let err = invoke_agent_tool(
            State(test_state()),
            Path(("code_reader".to_string(), "merge_mr".to_string())),
            Json(json!({})),
        )
        .await
        .expect_err("merge_mr is not bound to the reader");
        assert_eq!(err.0, StatusCode::NOT_FOUND);
        assert!(err.1.contains("merge_mr"));
    }

    #[tokio::test]
    async fn test_execution_failures_come_back_in_band() {
        // Missing arguments fail inside the tool, so the HTTP layer still
        // answers 200 with an error object.
        let Json(result) = invoke_agent_tool(
            State(test_state()),
            Path(("companion".to_string(), "get_mr_info".to_string())),
            Json(Value::Null),
        )
        .await
        .expect("bound tool");
        let message = result["error"].as_str().expect("error key");
        assert!(message.contains("project_id"));
    }
}
