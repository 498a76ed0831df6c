//! # Forge Companion
//!
//! GitLab merge-request agent personas behind an HTTP API.
//!
//! This library provides:
//! - Three LLM agent personas (companion, MR reviewer, code reader) as
//!   static prompt-plus-tool-binding records
//! - GitLab REST tools for merge requests, branches, commits, and files,
//!   all returning uniform JSON result objects
//! - An HTTP API serving the agent catalog, per-persona tool invocation,
//!   and session persistence
//! - Pluggable session storage (in-memory or SQLite) with merge-on-write
//!   documents
//!
//! ## Architecture
//!
//! Personas are declarative: each pairs a system prompt with an ordered
//! list of tool names and a credential. Tool calls run through the
//! persona's own registry, so the reviewer persona reaches GitLab on an
//! isolated review token and can approve work the write token authored.
//! Tool failures never escape as errors; every call produces a JSON
//! object, with failures flattened to `{"error": "<message>"}` for the
//! model to read.
//!
//! ## Example
//!
//! ```rust,ignore
//! use forge_companion::{api, config::Config};
//!
//! let config = Config::from_env()?;
//! api::serve(config).await?;
//! ```

pub mod agents;
pub mod api;
pub mod config;
pub mod gitlab;
pub mod session;
pub mod sorting;
pub mod tools;

pub use config::Config;
