//! Configuration management for forge-companion.
//!
//! Configuration can be set via environment variables (a `.env` file is
//! loaded at startup):
//! - `GITLAB_URL` - Required. Base URL of the GitLab instance.
//! - `GITLAB_PRIVATE_TOKEN` - Required. Write token for the companion agent.
//! - `REVIEW_GITLAB_TOKEN` - Optional. Isolated token for the review agent.
//!   Falls back to the write token when unset.
//! - `LLM_MODEL` - Optional. Model name on the agent cards. Defaults to `gemini-2.5-pro`.
//! - `LLM_BASE_URL` - Optional. Model endpoint override.
//! - `LLM_API_KEY` - Optional. Model API key, passed through to the runner.
//! - `HOST` - Optional. Server host. Defaults to `0.0.0.0`.
//! - `PORT` - Optional. Server port. Defaults to `8080`.
//! - `ALLOWED_ORIGINS` - Optional. Comma-separated CORS origins. Defaults to `*`.
//! - `SESSION_BACKEND` - Optional. `memory` or `sqlite`. Defaults to `memory`.
//! - `SESSION_DB_PATH` - Optional. SQLite file path. Defaults to `forge-companion.db`.

use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

/// Forge access configuration.
#[derive(Debug, Clone)]
pub struct GitLabConfig {
    /// Base URL of the GitLab instance
    pub url: String,

    /// Write token (companion agent)
    pub private_token: String,

    /// Isolated review token (review agent), if configured
    pub review_token: Option<String>,
}

impl GitLabConfig {
    /// The token the review agent actually uses. Without a dedicated review
    /// token the write token is reused, which re-enables the forge's
    /// self-approval restriction.
    pub fn effective_review_token(&self) -> &str {
        self.review_token.as_deref().unwrap_or(&self.private_token)
    }

    /// Whether the review agent runs on its own credentials.
    pub fn has_isolated_review_token(&self) -> bool {
        match &self.review_token {
            Some(token) => token != &self.private_token,
            None => false,
        }
    }
}

/// Model record handed to the external agent runner via agent cards.
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Model identifier
    pub model: String,

    /// Endpoint override, if any
    pub base_url: Option<String>,

    /// API key, if the runner needs one
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            model: "gemini-2.5-pro".to_string(),
            base_url: None,
            api_key: None,
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// CORS origin allow-list; `*` allows any origin
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: vec!["*".to_string()],
        }
    }
}

/// Which session persistence backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionBackend {
    Memory,
    Sqlite,
}

/// Session persistence configuration.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub backend: SessionBackend,

    /// SQLite file path (ignored by the memory backend)
    pub db_path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::Memory,
            db_path: "forge-companion.db".to_string(),
        }
    }
}

/// Service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub gitlab: GitLabConfig,
    pub llm: LlmConfig,
    pub server: ServerConfig,
    pub session: SessionConfig,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingEnvVar` if `GITLAB_URL` or
    /// `GITLAB_PRIVATE_TOKEN` is not set, or `ConfigError::InvalidValue`
    /// for unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = std::env::var("GITLAB_URL")
            .map_err(|_| ConfigError::MissingEnvVar("GITLAB_URL".to_string()))?;
        Url::parse(&url)
            .map_err(|e| ConfigError::InvalidValue("GITLAB_URL".to_string(), e.to_string()))?;

        let private_token = std::env::var("GITLAB_PRIVATE_TOKEN")
            .map_err(|_| ConfigError::MissingEnvVar("GITLAB_PRIVATE_TOKEN".to_string()))?;

        let review_token = std::env::var("REVIEW_GITLAB_TOKEN").ok();

        let llm = LlmConfig {
            model: std::env::var("LLM_MODEL").unwrap_or_else(|_| "gemini-2.5-pro".to_string()),
            base_url: std::env::var("LLM_BASE_URL").ok(),
            api_key: std::env::var("LLM_API_KEY").ok(),
        };

        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());

        let port = std::env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse()
            .map_err(|e| ConfigError::InvalidValue("PORT".to_string(), format!("{}", e)))?;

        let allowed_origins = parse_origins(
            &std::env::var("ALLOWED_ORIGINS").unwrap_or_else(|_| "*".to_string()),
        );

        let backend = std::env::var("SESSION_BACKEND")
            .ok()
            .map(|v| {
                parse_session_backend(&v)
                    .map_err(|e| ConfigError::InvalidValue("SESSION_BACKEND".to_string(), e))
            })
            .transpose()?
            .unwrap_or(SessionBackend::Memory);

        let db_path = std::env::var("SESSION_DB_PATH")
            .unwrap_or_else(|_| "forge-companion.db".to_string());

        Ok(Self {
            gitlab: GitLabConfig {
                url,
                private_token,
                review_token,
            },
            llm,
            server: ServerConfig {
                host,
                port,
                allowed_origins,
            },
            session: SessionConfig { backend, db_path },
        })
    }

    /// Create a config with custom values (useful for testing).
    pub fn new(url: String, private_token: String) -> Self {
        Self {
            gitlab: GitLabConfig {
                url,
                private_token,
                review_token: None,
            },
            llm: LlmConfig::default(),
            server: ServerConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

fn parse_origins(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn parse_session_backend(value: &str) -> Result<SessionBackend, String> {
    match value.trim().to_lowercase().as_str() {
        "memory" => Ok(SessionBackend::Memory),
        "sqlite" => Ok(SessionBackend::Sqlite),
        other => Err(format!("expected 'memory' or 'sqlite', got: {}", other)),
    }
}

// ─────────────────────────────────────────────────────────────
// Environment validation (`--validate`)
// ─────────────────────────────────────────────────────────────

const REQUIRED_VARS: [&str; 2] = ["GITLAB_URL", "GITLAB_PRIVATE_TOKEN"];

const OPTIONAL_VARS: [&str; 6] = [
    "REVIEW_GITLAB_TOKEN",
    "LLM_MODEL",
    "LLM_BASE_URL",
    "LLM_API_KEY",
    "SESSION_BACKEND",
    "SESSION_DB_PATH",
];

const TOKEN_VARS: [&str; 3] = ["GITLAB_PRIVATE_TOKEN", "REVIEW_GITLAB_TOKEN", "LLM_API_KEY"];

/// Result of a `--validate` run: the printable report and whether every
/// required setting is present.
pub struct ValidationReport {
    pub lines: Vec<String>,
    pub ok: bool,
}

impl ValidationReport {
    pub fn render(&self) -> String {
        self.lines.join("\n")
    }
}

/// Check the environment and produce a configuration report.
/// Token values are masked down to their last four characters.
pub fn validate_environment() -> ValidationReport {
    let mut lines = Vec::new();
    let mut ok = true;

    lines.push("forge-companion configuration check".to_string());
    lines.push("=".repeat(50));

    lines.push("Required variables:".to_string());
    for var in REQUIRED_VARS {
        match std::env::var(var) {
            Ok(value) if !value.is_empty() => {
                lines.push(format!("  ✅ {}: {}", var, display_value(var, &value)));
            }
            _ => {
                lines.push(format!("  ❌ {}: not set", var));
                ok = false;
            }
        }
    }

    lines.push("Optional variables:".to_string());
    for var in OPTIONAL_VARS {
        match std::env::var(var) {
            Ok(value) if !value.is_empty() => {
                lines.push(format!("  ✅ {}: {}", var, display_value(var, &value)));
            }
            _ if var == "REVIEW_GITLAB_TOKEN" => {
                lines.push(format!(
                    "  ⚠️  {}: not set (the review agent will use the write token)",
                    var
                ));
            }
            _ => {
                lines.push(format!("  ⚠️  {}: not set (using the default)", var));
            }
        }
    }

    if let (Ok(write), Ok(review)) = (
        std::env::var("GITLAB_PRIVATE_TOKEN"),
        std::env::var("REVIEW_GITLAB_TOKEN"),
    ) {
        if !write.is_empty() && write == review {
            lines.push(
                "  ⚠️  REVIEW_GITLAB_TOKEN matches GITLAB_PRIVATE_TOKEN (a separate reviewer account is recommended)"
                    .to_string(),
            );
        }
    }

    lines.push("=".repeat(50));
    if ok {
        lines.push("✅ Configuration check passed".to_string());
    } else {
        lines.push("❌ Configuration check failed, set the missing variables and retry".to_string());
    }

    ValidationReport { lines, ok }
}

fn display_value(var: &str, value: &str) -> String {
    if TOKEN_VARS.contains(&var) {
        mask_token(value)
    } else {
        value.to_string()
    }
}

fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(10);
    }
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}...{}", "*".repeat(10), tail)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_token_keeps_only_the_tail() {
        assert_eq!(mask_token("glpat-abcdefgh1234"), "**********...1234");
        assert_eq!(mask_token("abc"), "**********");
    }

    #[test]
    fn test_parse_origins_splits_and_trims() {
        assert_eq!(parse_origins("*"), vec!["*"]);
        assert_eq!(
            parse_origins("https://a.example, https://b.example ,"),
            vec!["https://a.example", "https://b.example"]
        );
    }

    #[test]
    fn test_parse_session_backend_accepts_both_backends() {
        assert_eq!(parse_session_backend("memory").unwrap(), SessionBackend::Memory);
        assert_eq!(parse_session_backend("SQLite").unwrap(), SessionBackend::Sqlite);
        assert!(parse_session_backend("redis").is_err());
    }

    #[test]
    fn test_review_token_falls_back_to_the_write_token() {
        let mut config = Config::new(
            "https://gitlab.example.com".to_string(),
            "write-token".to_string(),
        );
        assert_eq!(config.gitlab.effective_review_token(), "write-token");
        assert!(!config.gitlab.has_isolated_review_token());

        config.gitlab.review_token = Some("review-token".to_string());
        assert_eq!(config.gitlab.effective_review_token(), "review-token");
        assert!(config.gitlab.has_isolated_review_token());

        config.gitlab.review_token = Some("write-token".to_string());
        assert!(!config.gitlab.has_isolated_review_token());
    }
}
