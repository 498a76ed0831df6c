//! Typed payloads for the GitLab v4 REST API.
//!
//! Only the fields the tools inspect or report are modeled; GitLab returns
//! many more, and unknown fields are ignored on deserialization.

use serde::{Deserialize, Serialize};

/// A GitLab user (MR author, commit author, or the token's own identity).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub name: String,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// A merge request as returned by `GET /projects/:id/merge_requests/:iid`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequest {
    pub id: u64,
    /// Project-scoped MR number (the `!123` one).
    pub iid: u64,
    pub project_id: u64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    /// `opened`, `closed`, `merged`, or `locked`.
    pub state: String,
    pub author: User,
    pub source_branch: String,
    pub target_branch: String,
    /// `can_be_merged`, `cannot_be_merged`, or `checking`.
    #[serde(default)]
    pub merge_status: Option<String>,
    #[serde(default)]
    pub detailed_merge_status: Option<String>,
    #[serde(default)]
    pub draft: bool,
    #[serde(default)]
    pub has_conflicts: bool,
    #[serde(default)]
    pub sha: Option<String>,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
    #[serde(default)]
    pub merged_at: Option<String>,
}

impl MergeRequest {
    /// Whether GitLab currently reports the MR as mergeable.
    pub fn is_mergeable(&self) -> bool {
        self.merge_status.as_deref() == Some("can_be_merged")
    }
}

/// The `GET …/merge_requests/:iid/changes` payload: the MR plus its diffs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeRequestChanges {
    #[serde(flatten)]
    pub merge_request: MergeRequest,
    #[serde(default)]
    pub changes: Vec<FileDiff>,
    #[serde(default)]
    pub changes_count: Option<String>,
}

/// A single file diff within an MR or branch comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileDiff {
    pub old_path: String,
    pub new_path: String,
    #[serde(default)]
    pub diff: String,
    #[serde(default)]
    pub new_file: bool,
    #[serde(default)]
    pub renamed_file: bool,
    #[serde(default)]
    pub deleted_file: bool,
}

/// A repository branch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Branch {
    pub name: String,
    #[serde(default)]
    pub merged: bool,
    #[serde(default)]
    pub protected: bool,
    #[serde(default)]
    pub default: bool,
    #[serde(default)]
    pub web_url: Option<String>,
    #[serde(default)]
    pub commit: Option<CommitSummary>,
}

/// Abbreviated commit info embedded in branch payloads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitSummary {
    pub id: String,
    #[serde(default)]
    pub short_id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
}

/// A commit as returned by `GET …/repository/commits/:sha`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Commit {
    pub id: String,
    #[serde(default)]
    pub short_id: Option<String>,
    pub title: String,
    #[serde(default)]
    pub message: Option<String>,
    pub author_name: String,
    pub author_email: String,
    #[serde(default)]
    pub authored_date: Option<String>,
    #[serde(default)]
    pub committed_date: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub parent_ids: Vec<String>,
    #[serde(default)]
    pub stats: Option<CommitStats>,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// Line counts attached to a commit when stats are requested.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitStats {
    pub additions: u64,
    pub deletions: u64,
    pub total: u64,
}

/// The `GET …/repository/compare` payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comparison {
    #[serde(default)]
    pub commit: Option<Commit>,
    #[serde(default)]
    pub commits: Vec<Commit>,
    #[serde(default)]
    pub diffs: Vec<FileDiff>,
    #[serde(default)]
    pub compare_timeout: bool,
    #[serde(default)]
    pub compare_same_ref: bool,
    #[serde(default)]
    pub web_url: Option<String>,
}

/// One entry of `GET …/repository/tree`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeEntry {
    pub id: String,
    pub name: String,
    /// `tree` for directories, `blob` for files.
    #[serde(rename = "type")]
    pub entry_type: String,
    pub path: String,
    #[serde(default)]
    pub mode: Option<String>,
}

/// A file fetched via `GET …/repository/files/:path`.
///
/// `content` is base64-encoded; use [`crate::gitlab::GitLabClient::get_file`]
/// plus [`RepoFile::decoded_content`] rather than reading it directly.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepoFile {
    pub file_name: String,
    pub file_path: String,
    pub size: u64,
    pub encoding: String,
    pub content: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
    #[serde(default)]
    pub blob_id: Option<String>,
    pub commit_id: String,
    #[serde(default)]
    pub last_commit_id: Option<String>,
}

/// A note (comment) on a merge request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Note {
    pub id: u64,
    pub body: String,
    pub author: User,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// One file action inside a commit request.
///
/// `action` is `create`, `update`, `delete`, or `move`; paths are
/// repository-relative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommitAction {
    pub action: String,
    pub file_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub previous_path: Option<String>,
}

/// Request body for `POST …/repository/commits`.
#[derive(Debug, Clone, Serialize)]
pub struct NewCommit {
    pub branch: String,
    pub commit_message: String,
    pub actions: Vec<CommitAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub author_email: Option<String>,
}

/// Request body for `POST …/merge_requests`.
#[derive(Debug, Clone, Serialize)]
pub struct NewMergeRequest {
    pub source_branch: String,
    pub target_branch: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Request body for `POST …/repository/branches`.
#[derive(Debug, Clone, Serialize)]
pub struct NewBranch {
    pub branch: String,
    #[serde(rename = "ref")]
    pub git_ref: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_request_deserializes_from_api_payload() {
        let payload = r#"{
            "id": 9001,
            "iid": 42,
            "project_id": 7,
            "title": "Add retry to uploader",
            "description": "Fixes #123",
            "state": "opened",
            "author": {"id": 3, "username": "mwei", "name": "M. Wei"},
            "source_branch": "feature/retry",
            "target_branch": "main",
            "merge_status": "can_be_merged",
            "has_conflicts": false,
            "web_url": "https://gitlab.example.com/g/p/-/merge_requests/42",
            "labels": ["backend"],
            "upvotes": 0
        }"#;

        let mr: MergeRequest = serde_json::from_str(payload).unwrap();
        assert_eq!(mr.iid, 42);
        assert_eq!(mr.author.username, "mwei");
        assert!(mr.is_mergeable());
        assert!(!mr.draft);
        assert_eq!(mr.merged_at, None);
    }

    #[test]
    fn test_merge_request_without_merge_status_is_not_mergeable() {
        let payload = r#"{
            "id": 1, "iid": 1, "project_id": 1,
            "title": "t", "state": "opened",
            "author": {"id": 1, "username": "a", "name": "A"},
            "source_branch": "s", "target_branch": "main"
        }"#;
        let mr: MergeRequest = serde_json::from_str(payload).unwrap();
        assert!(!mr.is_mergeable());
    }

    #[test]
    fn test_changes_payload_flattens_the_merge_request() {
        let payload = r#"{
            "id": 1, "iid": 5, "project_id": 2,
            "title": "Change things", "state": "opened",
            "author": {"id": 1, "username": "a", "name": "A"},
            "source_branch": "s", "target_branch": "main",
            "changes_count": "2",
            "changes": [
                {"old_path": "a.rs", "new_path": "a.rs", "diff": "@@ -1 +1 @@", "new_file": false, "renamed_file": false, "deleted_file": false},
                {"old_path": "b.rs", "new_path": "c.rs", "diff": "", "new_file": false, "renamed_file": true, "deleted_file": false}
            ]
        }"#;

        let changes: MergeRequestChanges = serde_json::from_str(payload).unwrap();
        assert_eq!(changes.merge_request.iid, 5);
        assert_eq!(changes.changes.len(), 2);
        assert!(changes.changes[1].renamed_file);
    }

    #[test]
    fn test_tree_entry_maps_the_type_field() {
        let payload = r#"[
            {"id": "abc", "name": "src", "type": "tree", "path": "src", "mode": "040000"},
            {"id": "def", "name": "lib.rs", "type": "blob", "path": "src/lib.rs", "mode": "100644"}
        ]"#;
        let entries: Vec<TreeEntry> = serde_json::from_str(payload).unwrap();
        assert_eq!(entries[0].entry_type, "tree");
        assert_eq!(entries[1].path, "src/lib.rs");
    }

    #[test]
    fn test_new_branch_serializes_ref_keyword() {
        let body = NewBranch {
            branch: "feature/x".to_string(),
            git_ref: "main".to_string(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["ref"], "main");
        assert_eq!(json["branch"], "feature/x");
    }

    #[test]
    fn test_commit_action_omits_empty_fields() {
        let action = CommitAction {
            action: "create".to_string(),
            file_path: "docs/note.md".to_string(),
            content: Some("hello".to_string()),
            previous_path: None,
        };
        let json = serde_json::to_value(&action).unwrap();
        assert!(json.get("previous_path").is_none());
        assert_eq!(json["content"], "hello");
    }
}
