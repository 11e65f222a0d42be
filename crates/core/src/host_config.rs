// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single JSON argument a session host is spawned with.

use crate::channel_key::ChannelKey;
use crate::session_id::SessionIdentifier;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI-invocation contract for the agent binary.
///
/// The only wire-compatibility surface the core is stuck with: streaming
/// JSON in both directions, a turn cap, an allow-list of tools, optional
/// resume, optional system-prompt append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentCliParams {
    /// Path to the agent binary.
    pub binary: PathBuf,
    /// Tools the agent is permitted to use.
    #[serde(default)]
    pub allowed_tools: Vec<String>,
    /// Cap on agentic turns per invocation.
    pub max_turns: Option<u32>,
    /// Text appended to the agent's system prompt.
    pub system_prompt_append: Option<String>,
    /// Ambient environment variables explicitly allow-listed for forwarding
    /// into the agent's process, e.g. `CLAUDE_CONFIG_DIR`,
    /// `CLAUDE_CODE_OAUTH_TOKEN`. Never fabricated: a name here is only
    /// forwarded if it is actually set in the session host's own
    /// environment, and is otherwise stripped.
    #[serde(default)]
    pub env_forward: Vec<String>,
}

/// Configuration passed as the session host's one JSON argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionHostConfig {
    pub channel: ChannelKey,
    pub socket_path: PathBuf,
    pub pid_file: PathBuf,
    pub working_directory: PathBuf,
    pub agent: AgentCliParams,
    /// Directory stderr logs for this channel are appended to.
    pub logs_dir: PathBuf,
    /// Session identifier persisted from a previous daemon lifetime, if any.
    pub resume_session_id: Option<SessionIdentifier>,
}

#[cfg(test)]
#[path = "host_config_tests.rs"]
mod tests;
