//! API request and response types.

use serde::Serialize;

use crate::agents::AgentPersona;
use crate::config::LlmConfig;

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

/// One row of the agent listing.
#[derive(Debug, Clone, Serialize)]
pub struct AgentSummary {
    /// Persona name
    pub name: String,

    /// Short description
    pub description: String,

    /// Model the persona runs on
    pub model: String,
}

/// Full agent card: everything a runner needs to instantiate the persona.
#[derive(Debug, Clone, Serialize)]
pub struct AgentCard {
    /// Persona name
    pub name: String,

    /// Short description
    pub description: String,

    /// Model the persona runs on
    pub model: String,

    /// Model endpoint override, when configured
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_base_url: Option<String>,

    /// System prompt
    pub instruction: String,

    /// Bound tool names, in binding order
    pub tools: Vec<String>,

    /// Declarative sub-agent names
    pub sub_agents: Vec<String>,
}

/// Response after creating a session.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedSession {
    /// Generated session id
    pub session_id: String,

    /// The stored document, timestamps included
    pub document: serde_json::Value,
}

impl AgentSummary {
    pub fn from_persona(persona: &AgentPersona, llm: &LlmConfig) -> Self {
        Self {
            name: persona.name.to_string(),
            description: persona.description.to_string(),
            model: llm.model.clone(),
        }
    }
}

impl AgentCard {
    pub fn from_persona(persona: &AgentPersona, llm: &LlmConfig) -> Self {
        Self {
            name: persona.name.to_string(),
            description: persona.description.to_string(),
            model: llm.model.clone(),
            model_base_url: llm.base_url.clone(),
            instruction: persona.instruction.to_string(),
            tools: persona.tools.iter().map(|t| t.to_string()).collect(),
            sub_agents: persona.sub_agents.iter().map(|s| s.to_string()).collect(),
        }
    }
}
