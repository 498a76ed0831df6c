//! Repository tools: branches, commits, comparisons, and file access.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::{require_str, require_u64, Tool};
use crate::gitlab::types::{CommitAction, NewBranch, NewCommit};
use crate::gitlab::GitLabClient;

const DEFAULT_MAX_FILES: u64 = 50;

/// Fetch one file's decoded content at a ref.
pub struct GetFileContent {
    gitlab: Arc<GitLabClient>,
}

impl GetFileContent {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for GetFileContent {
    fn name(&self) -> &str {
        "get_file_content"
    }

    fn description(&self) -> &str {
        "Fetch the content of a single file at a given ref."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "file_path": {
                    "type": "string",
                    "description": "File path relative to the repository root"
                },
                "ref": {
                    "type": "string",
                    "description": "Branch, tag, or commit SHA"
                }
            },
            "required": ["project_id", "file_path", "ref"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let file_path = require_str(&args, "file_path")?;
        let git_ref = require_str(&args, "ref")?;

        let file = self
            .gitlab
            .get_file(project_id, file_path, git_ref)
            .await
            .context("Failed to fetch file content")?;
        let content = file
            .decoded_content()
            .context("Failed to fetch file content")?;

        Ok(json!({
            "file_path": file.file_path,
            "ref": git_ref,
            "content": content,
            "size": file.size,
            "commit_id": file.commit_id
        }))
    }
}

/// Browse a repository: list its tree, or read one file.
pub struct ReadRepo {
    gitlab: Arc<GitLabClient>,
}

impl ReadRepo {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for ReadRepo {
    fn name(&self) -> &str {
        "read_repo"
    }

    fn description(&self) -> &str {
        "Read a repository: without file_path, list the file tree (capped at max_files); with file_path, return that file's content."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "file_path": {
                    "type": "string",
                    "description": "Optional: file to read instead of listing the tree"
                },
                "ref": {
                    "type": "string",
                    "description": "Branch, tag, or commit SHA (default: main)"
                },
                "max_files": {
                    "type": "integer",
                    "description": "Maximum tree entries to return (default: 50)"
                }
            },
            "required": ["project_id"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let git_ref = args["ref"].as_str().unwrap_or("main");

        if let Some(file_path) = args["file_path"].as_str() {
            let file = self
                .gitlab
                .get_file(project_id, file_path, git_ref)
                .await
                .with_context(|| format!("Failed to read file '{file_path}'"))?;
            let content = file
                .decoded_content()
                .with_context(|| format!("Failed to read file '{file_path}'"))?;
            return Ok(json!({
                "file_path": file.file_path,
                "content": content,
                "size": file.size,
                "commit_id": file.commit_id
            }));
        }

        let max_files = args["max_files"].as_u64().unwrap_or(DEFAULT_MAX_FILES);
        let per_page = max_files.min(100) as u32;
        let entries = self
            .gitlab
            .repo_tree(project_id, git_ref, true, per_page)
            .await
            .context("Failed to list repository tree")?;

        let file_tree: Vec<Value> = entries
            .iter()
            .take(max_files as usize)
            .map(|e| json!({ "type": e.entry_type, "path": e.path }))
            .collect();

        Ok(json!({
            "project_id": project_id,
            "ref": git_ref,
            "total_files": file_tree.len(),
            "file_tree": file_tree
        }))
    }
}

/// Create a branch from a ref, reporting instead of failing when it exists.
pub struct CreateBranch {
    gitlab: Arc<GitLabClient>,
}

impl CreateBranch {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for CreateBranch {
    fn name(&self) -> &str {
        "create_branch"
    }

    fn description(&self) -> &str {
        "Create a branch from a ref. Reports status \"exists\" if the branch is already there."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "branch_name": {
                    "type": "string",
                    "description": "Name for the new branch"
                },
                "ref": {
                    "type": "string",
                    "description": "Ref to branch from (default: main)"
                }
            },
            "required": ["project_id", "branch_name"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let branch_name = require_str(&args, "branch_name")?;
        let git_ref = args["ref"].as_str().unwrap_or("main");

        // Existing branches are a normal outcome, not an error.
        match self.gitlab.get_branch(project_id, branch_name).await {
            Ok(_) => {
                return Ok(json!({
                    "status": "exists",
                    "message": format!("Branch '{branch_name}' already exists")
                }))
            }
            Err(e) if e.status() == Some(404) => {}
            Err(e) => return Err(e).context("Failed to create branch"),
        }

        let request = NewBranch {
            branch: branch_name.to_string(),
            git_ref: git_ref.to_string(),
        };
        let branch = self
            .gitlab
            .create_branch(project_id, &request)
            .await
            .context("Failed to create branch")?;

        Ok(json!({
            "status": "success",
            "branch_name": branch.name,
            "message": format!("Created branch '{branch_name}' from '{git_ref}'")
        }))
    }
}

/// Commit a list of file actions to a branch.
pub struct CreateCommit {
    gitlab: Arc<GitLabClient>,
}

impl CreateCommit {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }

    /// `actions` arrives either as a JSON array or as a string holding one,
    /// depending on how the model serialized the call.
    fn parse_actions(value: &Value) -> anyhow::Result<Vec<CommitAction>> {
        match value {
            Value::String(s) => {
                serde_json::from_str(s).context("Invalid 'actions' JSON string")
            }
            Value::Array(_) => {
                serde_json::from_value(value.clone()).context("Invalid 'actions' array")
            }
            _ => Err(anyhow::anyhow!("Missing or invalid 'actions' argument")),
        }
    }
}

#[async_trait]
impl Tool for CreateCommit {
    fn name(&self) -> &str {
        "create_commit"
    }

    fn description(&self) -> &str {
        "Commit file actions to a branch. actions is a JSON list like [{\"action\": \"create\", \"file_path\": \"path\", \"content\": \"...\"}]."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "branch_name": {
                    "type": "string",
                    "description": "Branch to commit to"
                },
                "commit_message": {
                    "type": "string",
                    "description": "Commit message; start it with the work-item id, e.g. #12345"
                },
                "actions": {
                    "type": "string",
                    "description": "JSON list of file actions (create/update/delete/move with file_path and content)"
                },
                "author_name": {
                    "type": "string",
                    "description": "Optional commit author name"
                },
                "author_email": {
                    "type": "string",
                    "description": "Optional commit author email"
                }
            },
            "required": ["project_id", "branch_name", "commit_message", "actions"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let branch_name = require_str(&args, "branch_name")?;
        let commit_message = require_str(&args, "commit_message")?;
        let actions = Self::parse_actions(&args["actions"])?;

        let request = NewCommit {
            branch: branch_name.to_string(),
            commit_message: commit_message.to_string(),
            actions,
            author_name: args["author_name"].as_str().map(|s| s.to_string()),
            author_email: args["author_email"].as_str().map(|s| s.to_string()),
        };

        let commit = self
            .gitlab
            .create_commit(project_id, &request)
            .await
            .context("Failed to create commit")?;
        Ok(json!({
            "status": "success",
            "commit_id": commit.id,
            "message": format!("Commit created on '{branch_name}'")
        }))
    }
}

/// Compare two refs: commits between them plus file diffs.
pub struct CompareBranches {
    gitlab: Arc<GitLabClient>,
}

impl CompareBranches {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for CompareBranches {
    fn name(&self) -> &str {
        "compare_branches"
    }

    fn description(&self) -> &str {
        "Compare two branches (or any two refs): commits in between and the file diffs."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "from": {
                    "type": "string",
                    "description": "Base ref"
                },
                "to": {
                    "type": "string",
                    "description": "Head ref"
                }
            },
            "required": ["project_id", "from", "to"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let from = require_str(&args, "from")?;
        let to = require_str(&args, "to")?;

        let comparison = self
            .gitlab
            .compare(project_id, from, to)
            .await
            .context("Failed to compare branches")?;

        Ok(json!({
            "from": from,
            "to": to,
            "commit_count": comparison.commits.len(),
            "commits": serde_json::to_value(&comparison.commits)?,
            "diffs": serde_json::to_value(&comparison.diffs)?,
            "compare_timeout": comparison.compare_timeout
        }))
    }
}

/// Fetch one commit's details, including line stats.
pub struct GetCommitInfo {
    gitlab: Arc<GitLabClient>,
}

impl GetCommitInfo {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for GetCommitInfo {
    fn name(&self) -> &str {
        "get_commit_info"
    }

    fn description(&self) -> &str {
        "Fetch a commit's details: message, author, parents, and line stats."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "sha": {
                    "type": "string",
                    "description": "Commit SHA (full or abbreviated)"
                }
            },
            "required": ["project_id", "sha"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let sha = require_str(&args, "sha")?;

        let commit = self
            .gitlab
            .get_commit(project_id, sha)
            .await
            .context("Failed to fetch commit details")?;
        Ok(serde_json::to_value(commit)?)
    }
}

/// List branches, optionally filtered by a search term.
pub struct ListBranches {
    gitlab: Arc<GitLabClient>,
}

impl ListBranches {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for ListBranches {
    fn name(&self) -> &str {
        "list_branches"
    }

    fn description(&self) -> &str {
        "List the repository's branches. An optional search term filters by name."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "search": {
                    "type": "string",
                    "description": "Optional name filter"
                }
            },
            "required": ["project_id"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let search = args["search"].as_str();

        let branches = self
            .gitlab
            .list_branches(project_id, search)
            .await
            .context("Failed to list branches")?;

        Ok(json!({
            "total": branches.len(),
            "branches": serde_json::to_value(&branches)?
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline_client() -> Arc<GitLabClient> {
        Arc::new(GitLabClient::new("http://127.0.0.1:9", "test-token").unwrap())
    }

    #[test]
    fn test_parse_actions_accepts_a_json_string() {
        let value = json!("[{\"action\": \"create\", \"file_path\": \"a.txt\", \"content\": \"hi\"}]");
        let actions = CreateCommit::parse_actions(&value).unwrap();
        assert_eq!(actions.len(), 1);
        assert_eq!(actions[0].action, "create");
        assert_eq!(actions[0].file_path, "a.txt");
    }

    #[test]
    fn test_parse_actions_accepts_an_inline_array() {
        let value = json!([
            { "action": "update", "file_path": "b.txt", "content": "new" },
            { "action": "delete", "file_path": "c.txt" }
        ]);
        let actions = CreateCommit::parse_actions(&value).unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[1].action, "delete");
        assert_eq!(actions[1].content, None);
    }

    #[test]
    fn test_parse_actions_rejects_malformed_json() {
        let err = CreateCommit::parse_actions(&json!("not json at all")).unwrap_err();
        assert!(format!("{err:#}").contains("Invalid 'actions' JSON string"));

        let err = CreateCommit::parse_actions(&json!(42)).unwrap_err();
        assert!(err.to_string().contains("actions"));
    }

    #[tokio::test]
    async fn test_create_commit_validates_before_calling_out() {
        let tool = CreateCommit::new(offline_client());
        let err = tool
            .execute(json!({
                "project_id": 1,
                "branch_name": "b",
                "commit_message": "#1 msg",
                "actions": "{broken"
            }))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("actions"));
    }

    #[tokio::test]
    async fn test_create_branch_requires_a_name() {
        let tool = CreateBranch::new(offline_client());
        let err = tool.execute(json!({ "project_id": 3 })).await.unwrap_err();
        assert!(err.to_string().contains("branch_name"));
    }

    #[tokio::test]
    async fn test_compare_requires_both_refs() {
        let tool = CompareBranches::new(offline_client());
        let err = tool
            .execute(json!({ "project_id": 3, "from": "main" }))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("to"));
    }

    #[test]
    fn test_read_repo_only_requires_the_project_id() {
        let schema = ReadRepo::new(offline_client()).parameters_schema();
        assert_eq!(schema["required"], json!(["project_id"]));
        assert!(schema["properties"]["file_path"].is_object());
        assert!(schema["properties"]["max_files"].is_object());
    }
}
