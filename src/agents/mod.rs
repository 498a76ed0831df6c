//! Agent personas: static prompt-plus-tools records served to the runner.
//!
//! A persona is configuration, not orchestration. Each one names its system
//! prompt, the tools it may call, its declarative sub-agents, and which of
//! the two credentials its calls ride on. Tool sequencing and review-workflow
//! rules are suggested by the prompt text only.

pub mod prompts;

use std::sync::Arc;

use serde_json::Value;
use tracing::{info, warn};

use crate::config::Config;
use crate::gitlab::{GitLabClient, GitLabError};
use crate::tools::{ToolDefinition, ToolRegistry};

/// Which token a persona's tool calls use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Credential {
    /// The primary write token.
    Writer,
    /// The isolated review token. Falls back to the write token when no
    /// review token is configured, which re-enables the forge's
    /// self-approval restriction.
    Reviewer,
}

/// A static persona record: prompt, bound tools, sub-agents, credential.
#[derive(Debug, Clone)]
pub struct AgentPersona {
    pub name: &'static str,
    pub description: &'static str,
    pub instruction: &'static str,
    pub tools: &'static [&'static str],
    pub sub_agents: &'static [&'static str],
    pub credential: Credential,
}

const COMPANION_TOOLS: &[&str] = &[
    "get_mr_info",
    "get_mr_change_files",
    "get_file_content",
    "post_comment_on_mr",
    "create_branch",
    "create_commit",
    "create_mr",
    "approve_mr",
    "merge_mr",
    "read_repo",
    "compare_branches",
    "get_commit_info",
    "list_branches",
    "check_mr_author",
];

const REVIEWER_TOOLS: &[&str] = &[
    "get_mr_info",
    "get_mr_change_files",
    "get_file_content",
    "post_comment_on_mr",
    "create_branch",
    "create_commit",
    "create_mr",
    "approve_mr",
    "merge_mr",
    "read_repo",
    "compare_branches",
    "get_commit_info",
    "list_branches",
];

const READER_TOOLS: &[&str] = &[
    "get_mr_info",
    "get_mr_change_files",
    "get_file_content",
    "read_repo",
    "compare_branches",
    "get_commit_info",
    "list_branches",
];

/// The built-in personas. `companion` is the root agent.
pub const PERSONAS: &[AgentPersona] = &[
    AgentPersona {
        name: "companion",
        description: "GitLab workflow automation assistant with a human-in-the-loop review process.",
        instruction: prompts::COMPANION_PROMPT,
        tools: COMPANION_TOOLS,
        sub_agents: &["mr_reviewer"],
        credential: Credential::Writer,
    },
    AgentPersona {
        name: "mr_reviewer",
        description: "Merge request reviewer on an isolated token. Approves or requests changes; never merges.",
        instruction: prompts::MR_REVIEWER_PROMPT,
        tools: REVIEWER_TOOLS,
        sub_agents: &[],
        credential: Credential::Reviewer,
    },
    AgentPersona {
        name: "code_reader",
        description: "Read-only repository explorer for structure, history, and code explanation.",
        instruction: prompts::CODE_READER_PROMPT,
        tools: READER_TOOLS,
        sub_agents: &[],
        credential: Credential::Writer,
    },
];

/// Look up a persona by name.
pub fn find_persona(name: &str) -> Option<&'static AgentPersona> {
    PERSONAS.iter().find(|p| p.name == name)
}

/// The personas plus the per-credential tool registries they call through.
pub struct AgentSet {
    writer_tools: ToolRegistry,
    reviewer_tools: ToolRegistry,
}

impl AgentSet {
    /// Build both registries from the configured tokens and verify that
    /// every persona's tool bindings resolve.
    pub fn new(config: &Config) -> Result<Self, GitLabError> {
        let writer = Arc::new(GitLabClient::new(
            &config.gitlab.url,
            &config.gitlab.private_token,
        )?);
        let reviewer = Arc::new(GitLabClient::new(
            &config.gitlab.url,
            config.gitlab.effective_review_token(),
        )?);

        let set = Self {
            writer_tools: ToolRegistry::forge_tools(writer),
            reviewer_tools: ToolRegistry::forge_tools(reviewer),
        };
        set.validate_bindings();
        info!(personas = PERSONAS.len(), "agent set initialized");
        Ok(set)
    }

    pub fn registry_for(&self, credential: Credential) -> &ToolRegistry {
        match credential {
            Credential::Writer => &self.writer_tools,
            Credential::Reviewer => &self.reviewer_tools,
        }
    }

    /// Tool cards for one persona, in the persona's binding order.
    pub fn tool_definitions(&self, persona: &AgentPersona) -> Vec<ToolDefinition> {
        let registry = self.registry_for(persona.credential);
        persona
            .tools
            .iter()
            .filter_map(|name| registry.get(name))
            .map(|tool| ToolDefinition {
                name: tool.name().to_string(),
                description: tool.description().to_string(),
                parameters: tool.parameters_schema(),
            })
            .collect()
    }

    /// Run one of the persona's tools through its credential's registry.
    /// The caller is expected to have checked the binding first.
    pub async fn invoke_tool(
        &self,
        persona: &AgentPersona,
        tool_name: &str,
        args: Value,
    ) -> Value {
        self.registry_for(persona.credential)
            .execute(tool_name, args)
            .await
    }

    fn validate_bindings(&self) {
        for persona in PERSONAS {
            let registry = self.registry_for(persona.credential);
            for tool_name in persona.tools {
                if registry.get(tool_name).is_none() {
                    warn!(
                        agent = persona.name,
                        tool = tool_name,
                        "persona references an unregistered tool"
                    );
                }
            }
            for sub_agent in persona.sub_agents {
                if find_persona(sub_agent).is_none() {
                    warn!(
                        agent = persona.name,
                        sub_agent, "persona references an unknown sub-agent"
                    );
                }
            }
        }
    }
}
