//! Thin async client for the GitLab v4 REST API.
//!
//! One method per endpoint the tools need, all returning typed payloads.
//! Authentication is a single private token sent as `PRIVATE-TOKEN`; the
//! review workflow constructs a second client around its own token.

pub mod types;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use types::{
    Branch, Commit, Comparison, MergeRequest, MergeRequestChanges, NewBranch, NewCommit,
    NewMergeRequest, Note, RepoFile, TreeEntry, User,
};

/// Errors from talking to GitLab.
#[derive(Debug, Error)]
pub enum GitLabError {
    /// Transport-level failure (connect, timeout, malformed response body).
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// GitLab answered with a non-success status. `message` carries the
    /// server's own error text so callers can relay it verbatim.
    #[error("HTTP {status}: {message}")]
    Api { status: u16, message: String },
    /// The response arrived but its content could not be interpreted.
    #[error("unexpected payload: {0}")]
    Decode(String),
}

impl GitLabError {
    /// The HTTP status of an API-level error, if that is what this is.
    pub fn status(&self) -> Option<u16> {
        match self {
            GitLabError::Api { status, .. } => Some(*status),
            _ => None,
        }
    }
}

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client bound to one GitLab instance and one private token.
#[derive(Debug, Clone)]
pub struct GitLabClient {
    http: reqwest::Client,
    base_url: String,
    token: String,
}

impl GitLabClient {
    /// Build a client for `base_url` (e.g. `https://gitlab.example.com`)
    /// authenticating with `token`.
    pub fn new(base_url: &str, token: &str) -> Result<Self, GitLabError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("forge-companion/", env!("CARGO_PKG_VERSION")))
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
        })
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}/api/v4/{}", self.base_url, path)
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, GitLabError> {
        let response = self
            .http
            .get(self.api_url(path))
            .header("PRIVATE-TOKEN", &self.token)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T, GitLabError> {
        let response = self
            .http
            .get(self.api_url(path))
            .header("PRIVATE-TOKEN", &self.token)
            .query(query)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GitLabError> {
        let response = self
            .http
            .post(self.api_url(path))
            .header("PRIVATE-TOKEN", &self.token)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn put<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GitLabError> {
        let response = self
            .http
            .put(self.api_url(path))
            .header("PRIVATE-TOKEN", &self.token)
            .json(body)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, GitLabError> {
        let status = response.status();
        if !status.is_success() {
            let message = Self::error_message(status, response).await;
            return Err(GitLabError::Api {
                status: status.as_u16(),
                message,
            });
        }
        Ok(response.json().await?)
    }

    /// Pull the human-readable message out of a GitLab error body.
    /// GitLab uses `message` or `error` keys depending on the endpoint.
    async fn error_message(status: StatusCode, response: reqwest::Response) -> String {
        let fallback = status
            .canonical_reason()
            .unwrap_or("request rejected")
            .to_string();
        let text = match response.text().await {
            Ok(t) if !t.is_empty() => t,
            _ => return fallback,
        };
        match serde_json::from_str::<Value>(&text) {
            Ok(body) => {
                let message = body.get("message").or_else(|| body.get("error"));
                match message {
                    Some(Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => text,
                }
            }
            Err(_) => text,
        }
    }

    // ─────────────────────────────────────────────────────────────
    // Merge requests
    // ─────────────────────────────────────────────────────────────

    pub async fn get_merge_request(
        &self,
        project_id: u64,
        mr_iid: u64,
    ) -> Result<MergeRequest, GitLabError> {
        self.get(&format!("projects/{project_id}/merge_requests/{mr_iid}"))
            .await
    }

    pub async fn get_merge_request_changes(
        &self,
        project_id: u64,
        mr_iid: u64,
    ) -> Result<MergeRequestChanges, GitLabError> {
        self.get(&format!(
            "projects/{project_id}/merge_requests/{mr_iid}/changes"
        ))
        .await
    }

    pub async fn create_merge_request(
        &self,
        project_id: u64,
        request: &NewMergeRequest,
    ) -> Result<MergeRequest, GitLabError> {
        self.post(&format!("projects/{project_id}/merge_requests"), request)
            .await
    }

    /// Approve an MR. The approval payload itself carries nothing the
    /// tools report, so only success or failure is surfaced.
    pub async fn approve_merge_request(
        &self,
        project_id: u64,
        mr_iid: u64,
    ) -> Result<(), GitLabError> {
        let _: Value = self
            .post(
                &format!("projects/{project_id}/merge_requests/{mr_iid}/approve"),
                &Value::Object(Default::default()),
            )
            .await?;
        Ok(())
    }

    /// Merge an already-approved MR. Returns the merged MR payload.
    pub async fn merge_merge_request(
        &self,
        project_id: u64,
        mr_iid: u64,
    ) -> Result<MergeRequest, GitLabError> {
        self.put(
            &format!("projects/{project_id}/merge_requests/{mr_iid}/merge"),
            &Value::Object(Default::default()),
        )
        .await
    }

    pub async fn create_merge_request_note(
        &self,
        project_id: u64,
        mr_iid: u64,
        body: &str,
    ) -> Result<Note, GitLabError> {
        self.post(
            &format!("projects/{project_id}/merge_requests/{mr_iid}/notes"),
            &serde_json::json!({ "body": body }),
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────
    // Branches and commits
    // ─────────────────────────────────────────────────────────────

    pub async fn get_branch(&self, project_id: u64, name: &str) -> Result<Branch, GitLabError> {
        self.get(&format!(
            "projects/{project_id}/repository/branches/{}",
            urlencoding::encode(name)
        ))
        .await
    }

    pub async fn create_branch(
        &self,
        project_id: u64,
        request: &NewBranch,
    ) -> Result<Branch, GitLabError> {
        self.post(&format!("projects/{project_id}/repository/branches"), request)
            .await
    }

    pub async fn list_branches(
        &self,
        project_id: u64,
        search: Option<&str>,
    ) -> Result<Vec<Branch>, GitLabError> {
        let mut query = vec![("per_page", "100".to_string())];
        if let Some(term) = search {
            query.push(("search", term.to_string()));
        }
        self.get_with_query(&format!("projects/{project_id}/repository/branches"), &query)
            .await
    }

    pub async fn create_commit(
        &self,
        project_id: u64,
        request: &NewCommit,
    ) -> Result<Commit, GitLabError> {
        self.post(&format!("projects/{project_id}/repository/commits"), request)
            .await
    }

    pub async fn get_commit(&self, project_id: u64, sha: &str) -> Result<Commit, GitLabError> {
        self.get_with_query(
            &format!(
                "projects/{project_id}/repository/commits/{}",
                urlencoding::encode(sha)
            ),
            &[("stats", "true".to_string())],
        )
        .await
    }

    pub async fn compare(
        &self,
        project_id: u64,
        from: &str,
        to: &str,
    ) -> Result<Comparison, GitLabError> {
        self.get_with_query(
            &format!("projects/{project_id}/repository/compare"),
            &[("from", from.to_string()), ("to", to.to_string())],
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────
    // Repository contents
    // ─────────────────────────────────────────────────────────────

    pub async fn repo_tree(
        &self,
        project_id: u64,
        git_ref: &str,
        recursive: bool,
        per_page: u32,
    ) -> Result<Vec<TreeEntry>, GitLabError> {
        self.get_with_query(
            &format!("projects/{project_id}/repository/tree"),
            &[
                ("ref", git_ref.to_string()),
                ("recursive", recursive.to_string()),
                ("per_page", per_page.to_string()),
            ],
        )
        .await
    }

    pub async fn get_file(
        &self,
        project_id: u64,
        file_path: &str,
        git_ref: &str,
    ) -> Result<RepoFile, GitLabError> {
        self.get_with_query(
            &format!(
                "projects/{project_id}/repository/files/{}",
                urlencoding::encode(file_path)
            ),
            &[("ref", git_ref.to_string())],
        )
        .await
    }

    // ─────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────

    /// The user the configured token authenticates as.
    pub async fn current_user(&self) -> Result<User, GitLabError> {
        self.get("user").await
    }
}

impl RepoFile {
    /// Decode the base64 `content` field into UTF-8 text.
    pub fn decoded_content(&self) -> Result<String, GitLabError> {
        if self.encoding != "base64" {
            return Ok(self.content.clone());
        }
        let compact: String = self.content.chars().filter(|c| !c.is_whitespace()).collect();
        let bytes = BASE64
            .decode(compact.as_bytes())
            .map_err(|e| GitLabError::Decode(format!("invalid base64 content: {e}")))?;
        String::from_utf8(bytes)
            .map_err(|e| GitLabError::Decode(format!("file content is not UTF-8: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_url_joins_without_doubled_slash() {
        let client = GitLabClient::new("https://gitlab.example.com/", "tok").unwrap();
        assert_eq!(
            client.api_url("projects/1/merge_requests/2"),
            "https://gitlab.example.com/api/v4/projects/1/merge_requests/2"
        );
    }

    #[test]
    fn test_api_error_reports_status() {
        let err = GitLabError::Api {
            status: 404,
            message: "404 Not found".to_string(),
        };
        assert_eq!(err.status(), Some(404));
        assert_eq!(err.to_string(), "HTTP 404: 404 Not found");
    }

    #[test]
    fn test_decoded_content_handles_base64() {
        let file = RepoFile {
            file_name: "hello.txt".to_string(),
            file_path: "docs/hello.txt".to_string(),
            size: 12,
            encoding: "base64".to_string(),
            content: "aGVsbG8gd29ybGQh".to_string(),
            git_ref: "main".to_string(),
            blob_id: None,
            commit_id: "abc".to_string(),
            last_commit_id: None,
        };
        assert_eq!(file.decoded_content().unwrap(), "hello world!");
    }

    #[test]
    fn test_decoded_content_passes_plain_text_through() {
        let file = RepoFile {
            file_name: "hello.txt".to_string(),
            file_path: "hello.txt".to_string(),
            size: 2,
            encoding: "text".to_string(),
            content: "hi".to_string(),
            git_ref: "main".to_string(),
            blob_id: None,
            commit_id: "abc".to_string(),
            last_commit_id: None,
        };
        assert_eq!(file.decoded_content().unwrap(), "hi");
    }

    #[test]
    fn test_decoded_content_rejects_garbage_base64() {
        let file = RepoFile {
            file_name: "x".to_string(),
            file_path: "x".to_string(),
            size: 1,
            encoding: "base64".to_string(),
            content: "!!!not-base64!!!".to_string(),
            git_ref: "main".to_string(),
            blob_id: None,
            commit_id: "abc".to_string(),
            last_commit_id: None,
        };
        assert!(matches!(
            file.decoded_content(),
            Err(GitLabError::Decode(_))
        ));
    }
}
