// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon configuration, loaded from environment variables with file-based
//! defaults under the resolved state directory.

use std::path::PathBuf;

use relay_core::AgentCliParams;

use crate::env;
use crate::lifecycle::DaemonError;

/// Everything the composition root needs to construct a [`relay_channel_manager::ChannelManager`].
#[derive(Debug, Clone)]
pub struct DaemonConfig {
    /// Root state directory (e.g. `~/.local/state/relaymux`).
    pub state_dir: PathBuf,
    /// Directory session-host sockets and PID files live in.
    pub socket_dir: PathBuf,
    /// Directory per-channel agent stderr logs are appended to.
    pub logs_dir: PathBuf,
    /// Path to the persisted channel -> session-id map.
    pub session_record_path: PathBuf,
    /// Path to the daemon's own exclusive lock/PID file.
    pub lock_path: PathBuf,
    /// Path to the daemon's own log file.
    pub log_path: PathBuf,
    /// Working directory the agent subprocess is spawned in.
    pub working_directory: PathBuf,
    /// CLI-invocation contract passed through to every session host.
    pub agent: AgentCliParams,
    /// Path to the `relay-hostd` binary the channel manager spawns.
    pub host_binary: PathBuf,
}

impl DaemonConfig {
    /// Load configuration for the user-level daemon.
    ///
    /// One daemon serves every channel for a user; there is no project root
    /// to discover, unlike a per-repo tool.
    pub fn load() -> Result<Self, DaemonError> {
        let state_dir = env::state_dir()?;

        let agent_binary = std::env::var("RELAYMUX_AGENT_BINARY")
            .map_err(|_| DaemonError::MissingAgentBinary)
            .map(PathBuf::from)?;
        if !agent_binary.exists() {
            return Err(DaemonError::AgentBinaryNotFound(agent_binary));
        }

        let working_directory = match std::env::var("RELAYMUX_WORKING_DIR") {
            Ok(dir) => PathBuf::from(dir),
            Err(_) => std::env::current_dir().map_err(DaemonError::Io)?,
        };

        let allowed_tools = std::env::var("RELAYMUX_ALLOWED_TOOLS")
            .ok()
            .map(|raw| raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
            .unwrap_or_default();

        let max_turns = std::env::var("RELAYMUX_MAX_TURNS").ok().and_then(|s| s.parse().ok());

        let system_prompt_append = std::env::var("RELAYMUX_SYSTEM_PROMPT_APPEND").ok();

        let env_forward = std::env::var("RELAYMUX_AGENT_ENV_FORWARD")
            .ok()
            .map(|raw| raw.split(',').map(str::trim).filter(|s| !s.is_empty()).map(String::from).collect())
            .unwrap_or_default();

        let host_binary = match std::env::var("RELAYMUX_HOST_BINARY") {
            Ok(path) => PathBuf::from(path),
            Err(_) => default_host_binary()?,
        };

        Ok(Self::for_state_dir(
            state_dir,
            AgentCliParams {
                binary: agent_binary,
                allowed_tools,
                max_turns,
                system_prompt_append,
                env_forward,
            },
            working_directory,
            host_binary,
        ))
    }

    /// Derive the fixed path layout from a state directory directly, bypassing
    /// environment lookup. Used by `load` and by tests that need a config
    /// pointed at a tempdir without mutating process-wide env vars.
    pub fn for_state_dir(
        state_dir: PathBuf,
        agent: AgentCliParams,
        working_directory: PathBuf,
        host_binary: PathBuf,
    ) -> Self {
        Self {
            socket_dir: state_dir.join("sockets"),
            logs_dir: state_dir.join("logs"),
            session_record_path: state_dir.join("sessions.json"),
            lock_path: state_dir.join("daemon.pid"),
            log_path: state_dir.join("daemon.log"),
            working_directory,
            agent,
            host_binary,
            state_dir,
        }
    }
}

/// `relay-hostd` is expected to live next to the running `relaymuxd`
/// binary, the way a workspace's sibling `[[bin]]` targets install together.
fn default_host_binary() -> Result<PathBuf, DaemonError> {
    let exe = std::env::current_exe().map_err(DaemonError::Io)?;
    let dir = exe.parent().ok_or(DaemonError::NoStateDir)?;
    Ok(dir.join("relay-hostd"))
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
