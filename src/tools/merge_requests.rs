//! Merge-request tools: metadata, diffs, comments, approval, and merging.
//!
//! Approval and merging are deliberately permissive at this level; the
//! review-workflow rules (who may approve, when a merge is allowed) live in
//! persona prompt text, not here.

use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::{json, Value};

use super::{require_str, require_u64, Tool};
use crate::gitlab::types::NewMergeRequest;
use crate::gitlab::GitLabClient;

/// Fetch a merge request's metadata.
pub struct GetMrInfo {
    gitlab: Arc<GitLabClient>,
}

impl GetMrInfo {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for GetMrInfo {
    fn name(&self) -> &str {
        "get_mr_info"
    }

    fn description(&self) -> &str {
        "Fetch a merge request's metadata: title, description, state, author, branches, and merge status."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "mr_iid": {
                    "type": "integer",
                    "description": "Project-scoped merge request number"
                }
            },
            "required": ["project_id", "mr_iid"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let mr_iid = require_u64(&args, "mr_iid")?;

        let mr = self
            .gitlab
            .get_merge_request(project_id, mr_iid)
            .await
            .context("Failed to fetch MR details")?;
        Ok(serde_json::to_value(mr)?)
    }
}

/// Fetch the files changed by a merge request, with diffs.
pub struct GetMrChangeFiles {
    gitlab: Arc<GitLabClient>,
}

impl GetMrChangeFiles {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for GetMrChangeFiles {
    fn name(&self) -> &str {
        "get_mr_change_files"
    }

    fn description(&self) -> &str {
        "List the files changed by a merge request, including per-file diffs."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "mr_iid": {
                    "type": "integer",
                    "description": "Project-scoped merge request number"
                }
            },
            "required": ["project_id", "mr_iid"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let mr_iid = require_u64(&args, "mr_iid")?;

        let changes = self
            .gitlab
            .get_merge_request_changes(project_id, mr_iid)
            .await
            .context("Failed to fetch MR changes")?;
        Ok(serde_json::to_value(changes)?)
    }
}

/// Post a comment (note) on a merge request.
pub struct PostCommentOnMr {
    gitlab: Arc<GitLabClient>,
}

impl PostCommentOnMr {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for PostCommentOnMr {
    fn name(&self) -> &str {
        "post_comment_on_mr"
    }

    fn description(&self) -> &str {
        "Post a comment on a merge request. Use this to leave review feedback."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "mr_iid": {
                    "type": "integer",
                    "description": "Project-scoped merge request number"
                },
                "comment": {
                    "type": "string",
                    "description": "Comment body (Markdown)"
                }
            },
            "required": ["project_id", "mr_iid", "comment"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let mr_iid = require_u64(&args, "mr_iid")?;
        let comment = require_str(&args, "comment")?;

        let note = self
            .gitlab
            .create_merge_request_note(project_id, mr_iid, comment)
            .await
            .context("Failed to post comment")?;
        Ok(json!({
            "status": "success",
            "note_id": note.id,
            "message": format!("Comment posted on MR !{mr_iid}")
        }))
    }
}

/// Open a merge request from a source branch into a target branch.
pub struct CreateMr {
    gitlab: Arc<GitLabClient>,
}

impl CreateMr {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for CreateMr {
    fn name(&self) -> &str {
        "create_mr"
    }

    fn description(&self) -> &str {
        "Open a merge request from a source branch into a target branch."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "title": {
                    "type": "string",
                    "description": "Merge request title"
                },
                "description": {
                    "type": "string",
                    "description": "Merge request description (Markdown)"
                },
                "source_branch": {
                    "type": "string",
                    "description": "Branch containing the changes"
                },
                "target_branch": {
                    "type": "string",
                    "description": "Branch to merge into (default: main)"
                }
            },
            "required": ["project_id", "title", "source_branch"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let title = require_str(&args, "title")?;
        let source_branch = require_str(&args, "source_branch")?;
        let target_branch = args["target_branch"].as_str().unwrap_or("main");
        let description = args["description"].as_str().map(|s| s.to_string());

        let request = NewMergeRequest {
            source_branch: source_branch.to_string(),
            target_branch: target_branch.to_string(),
            title: title.to_string(),
            description,
        };

        let mr = self
            .gitlab
            .create_merge_request(project_id, &request)
            .await
            .context("Failed to create MR")?;
        Ok(json!({
            "status": "success",
            "mr_iid": mr.iid,
            "mr_url": mr.web_url,
            "message": format!("Created MR !{}", mr.iid)
        }))
    }
}

/// Approve a merge request.
pub struct ApproveMr {
    gitlab: Arc<GitLabClient>,
}

impl ApproveMr {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for ApproveMr {
    fn name(&self) -> &str {
        "approve_mr"
    }

    fn description(&self) -> &str {
        "Approve a merge request. Approving your own MR is rejected by the forge; delegate to the reviewer instead."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "mr_iid": {
                    "type": "integer",
                    "description": "Project-scoped merge request number"
                }
            },
            "required": ["project_id", "mr_iid"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let mr_iid = require_u64(&args, "mr_iid")?;

        // 404 and 401 get dedicated hints; the forge answers 404 both for
        // self-approval and for instances without the approval feature.
        match self.gitlab.approve_merge_request(project_id, mr_iid).await {
            Ok(()) => Ok(json!({
                "status": "success",
                "message": format!("MR !{mr_iid} approved")
            })),
            Err(e) if e.status() == Some(404) => Ok(json!({
                "error": "Approval failed (404): the token may not be allowed to approve this MR (own MRs cannot be approved), or approvals are disabled on this instance",
                "detail": e.to_string()
            })),
            Err(e) if e.status() == Some(401) => Ok(json!({
                "error": "Approval failed (401): authentication failed, check the token's permissions",
                "detail": e.to_string()
            })),
            Err(e) => Err(e).context("Failed to approve MR"),
        }
    }
}

/// Merge a merge request, refusing when the forge reports it unmergeable.
pub struct MergeMr {
    gitlab: Arc<GitLabClient>,
}

impl MergeMr {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for MergeMr {
    fn name(&self) -> &str {
        "merge_mr"
    }

    fn description(&self) -> &str {
        "Merge an approved merge request. Only call this after explicit human confirmation."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "mr_iid": {
                    "type": "integer",
                    "description": "Project-scoped merge request number"
                }
            },
            "required": ["project_id", "mr_iid"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let mr_iid = require_u64(&args, "mr_iid")?;

        let mr = self
            .gitlab
            .get_merge_request(project_id, mr_iid)
            .await
            .context("Failed to merge MR")?;

        if !mr.is_mergeable() {
            return Ok(json!({
                "error": "MR is not mergeable",
                "merge_status": mr.merge_status
            }));
        }

        self.gitlab
            .merge_merge_request(project_id, mr_iid)
            .await
            .context("Failed to merge MR")?;
        Ok(json!({
            "status": "success",
            "message": format!("MR !{mr_iid} merged")
        }))
    }
}

/// Compare a merge request's author against the token's own identity.
pub struct CheckMrAuthor {
    gitlab: Arc<GitLabClient>,
}

impl CheckMrAuthor {
    pub fn new(gitlab: Arc<GitLabClient>) -> Self {
        Self { gitlab }
    }
}

#[async_trait]
impl Tool for CheckMrAuthor {
    fn name(&self) -> &str {
        "check_mr_author"
    }

    fn description(&self) -> &str {
        "Check whether a merge request was authored by the current token's user. Use this before approving."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "project_id": {
                    "type": "integer",
                    "description": "Numeric project id"
                },
                "mr_iid": {
                    "type": "integer",
                    "description": "Project-scoped merge request number"
                }
            },
            "required": ["project_id", "mr_iid"]
        })
    }

    async fn execute(&self, args: Value) -> anyhow::Result<Value> {
        let project_id = require_u64(&args, "project_id")?;
        let mr_iid = require_u64(&args, "mr_iid")?;

        let mr = self
            .gitlab
            .get_merge_request(project_id, mr_iid)
            .await
            .context("Failed to check MR author")?;
        let me = self
            .gitlab
            .current_user()
            .await
            .context("Failed to check MR author")?;

        let is_own = mr.author.id == me.id;
        Ok(json!({
            "mr_author": mr.author.username,
            "current_user": me.username,
            "is_own_mr": is_own
        }))
    }
}
