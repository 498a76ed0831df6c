//! Agent tools: one callable per forge operation.
//!
//! Every tool validates its arguments, performs exactly one remote call, and
//! returns a JSON payload. Failures of any kind are flattened by the registry
//! into the uniform `{"error": "<label>: <cause>"}` shape the agent runner
//! expects; nothing is retried.

pub mod merge_requests;
pub mod repository;

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::gitlab::GitLabClient;

/// A single capability exposed to an agent persona.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Unique tool name, as referenced by persona tool lists.
    fn name(&self) -> &str;

    /// Description shown to the LLM.
    fn description(&self) -> &str;

    /// JSON schema for the tool's arguments.
    fn parameters_schema(&self) -> Value;

    /// Run the tool. The success payload is returned verbatim to the caller;
    /// errors are converted to the uniform error dict by the registry.
    async fn execute(&self, args: Value) -> anyhow::Result<Value>;
}

/// Serializable tool card: what `GET /api/agents/:name/tools` returns.
#[derive(Debug, Clone, Serialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub parameters: Value,
}

/// The set of tools available to one credential.
///
/// Two registries exist at runtime, one per token, so the review persona's
/// calls never ride on the write token.
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self { tools: Vec::new() }
    }

    /// Registry holding the full forge toolset bound to `client`.
    pub fn forge_tools(client: Arc<GitLabClient>) -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(merge_requests::GetMrInfo::new(client.clone())));
        registry.register(Arc::new(merge_requests::GetMrChangeFiles::new(
            client.clone(),
        )));
        registry.register(Arc::new(merge_requests::PostCommentOnMr::new(
            client.clone(),
        )));
        registry.register(Arc::new(merge_requests::CreateMr::new(client.clone())));
        registry.register(Arc::new(merge_requests::ApproveMr::new(client.clone())));
        registry.register(Arc::new(merge_requests::MergeMr::new(client.clone())));
        registry.register(Arc::new(merge_requests::CheckMrAuthor::new(client.clone())));

        registry.register(Arc::new(repository::GetFileContent::new(client.clone())));
        registry.register(Arc::new(repository::ReadRepo::new(client.clone())));
        registry.register(Arc::new(repository::CreateBranch::new(client.clone())));
        registry.register(Arc::new(repository::CreateCommit::new(client.clone())));
        registry.register(Arc::new(repository::CompareBranches::new(client.clone())));
        registry.register(Arc::new(repository::GetCommitInfo::new(client.clone())));
        registry.register(Arc::new(repository::ListBranches::new(client)));

        registry
    }

    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.push(tool);
    }

    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name)
    }

    pub fn names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools
            .iter()
            .map(|t| ToolDefinition {
                name: t.name().to_string(),
                description: t.description().to_string(),
                parameters: t.parameters_schema(),
            })
            .collect()
    }

    /// Run `name` with `args`, flattening every failure into the uniform
    /// error dict. The result is always a JSON object.
    pub async fn execute(&self, name: &str, args: Value) -> Value {
        let Some(tool) = self.get(name) else {
            return json!({ "error": format!("Unknown tool: {name}") });
        };

        debug!(tool = name, "executing tool");
        match tool.execute(args).await {
            Ok(result) => result,
            Err(e) => {
                warn!(tool = name, error = %format!("{e:#}"), "tool call failed");
                json!({ "error": format!("{e:#}") })
            }
        }
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Pull a required integer argument out of the args object.
pub(crate) fn require_u64(args: &Value, key: &str) -> anyhow::Result<u64> {
    args[key]
        .as_u64()
        .ok_or_else(|| anyhow::anyhow!("Missing or invalid '{key}' argument"))
}

/// Pull a required string argument out of the args object.
pub(crate) fn require_str<'a>(args: &'a Value, key: &str) -> anyhow::Result<&'a str> {
    args[key]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing or invalid '{key}' argument"))
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Echo;

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "echo"
        }

        fn description(&self) -> &str {
            "Echo the arguments back."
        }

        fn parameters_schema(&self) -> Value {
            json!({ "type": "object", "properties": {} })
        }

        async fn execute(&self, args: Value) -> anyhow::Result<Value> {
            Ok(json!({ "echoed": args }))
        }
    }

    struct AlwaysFails;

    #[async_trait]
    impl Tool for AlwaysFails {
        fn name(&self) -> &str {
            "always_fails"
        }

        fn description(&self) -> &str {
            "Fails with a labeled error."
        }

        fn parameters_schema(&self) -> Value {
            json!({ "type": "object", "properties": {} })
        }

        async fn execute(&self, _args: Value) -> anyhow::Result<Value> {
            use anyhow::Context;
            let result: anyhow::Result<Value> = Err(anyhow::anyhow!("connection refused"));
            result.context("Failed to reach the forge")
        }
    }

    #[tokio::test]
    async fn test_execute_returns_success_payload_verbatim() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));

        let result = registry.execute("echo", json!({ "x": 1 })).await;
        assert_eq!(result, json!({ "echoed": { "x": 1 } }));
    }

    #[tokio::test]
    async fn test_execute_flattens_failures_into_error_dict() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(AlwaysFails));

        let result = registry.execute("always_fails", json!({})).await;
        assert_eq!(
            result["error"],
            "Failed to reach the forge: connection refused"
        );
        assert_eq!(result.as_object().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_execute_rejects_unknown_tool_names() {
        let registry = ToolRegistry::new();
        let result = registry.execute("does_not_exist", json!({})).await;
        assert_eq!(result["error"], "Unknown tool: does_not_exist");
    }

    #[test]
    fn test_definitions_carry_name_description_and_schema() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo));

        let defs = registry.definitions();
        assert_eq!(defs.len(), 1);
        assert_eq!(defs[0].name, "echo");
        assert_eq!(defs[0].parameters["type"], "object");
    }

    #[test]
    fn test_require_helpers_report_the_missing_key() {
        let args = json!({ "project_id": 7 });
        assert_eq!(require_u64(&args, "project_id").unwrap(), 7);

        let err = require_str(&args, "branch_name").unwrap_err();
        assert!(err.to_string().contains("branch_name"));

        let err = require_u64(&json!({ "project_id": "seven" }), "project_id").unwrap_err();
        assert!(err.to_string().contains("project_id"));
    }
}
