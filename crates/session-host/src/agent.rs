// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent subprocess spawning, abstracted behind a trait so the forwarding
//! and state-machine logic in [`crate::host`] can be exercised without
//! forking a real agent binary — see `crates/adapters/src/agent/mod.rs` in
//! the teacher repo for the trait/fake split this mirrors, adapted here to
//! stream-based stdio instead of a tmux pane.

use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use async_trait::async_trait;
use relay_core::{AgentCliParams, SessionIdentifier};
use tokio::io::{AsyncBufRead, AsyncWrite, BufReader};
use tokio::process::Command;

use crate::error::HostError;

/// Ensures an agent subprocess is running and hands back its stdio, split
/// into trait objects so a test double can substitute in-memory pipes
/// (`tokio::io::duplex`) for a real child process.
#[async_trait]
pub trait AgentLauncher: Send + Sync {
    async fn spawn(&self, resume: Option<&SessionIdentifier>) -> Result<SpawnedAgent, HostError>;
}

/// One live agent subprocess's stdio and exit-control surface.
pub struct SpawnedAgent {
    pub stdin: Pin<Box<dyn AsyncWrite + Send>>,
    pub stdout: Pin<Box<dyn AsyncBufRead + Send>>,
    pub stderr: Pin<Box<dyn AsyncBufRead + Send>>,
    pub child: Box<dyn AgentChild>,
}

/// Exit-control surface of a spawned agent, separate from its stdio so the
/// host can hold it across an `.await` on `wait()` without also holding the
/// stdin/stdout handles.
#[async_trait]
pub trait AgentChild: Send {
    /// Wait for the process to exit, returning its exit code if the
    /// platform reports one.
    async fn wait(&mut self) -> std::io::Result<Option<i32>>;
    /// Best-effort kill. Never panics; a process that already exited is not
    /// an error here.
    async fn kill(&mut self);
}

/// Production launcher: spawns the real agent binary with streaming-JSON
/// stdio, piping all three standard streams.
pub struct ProcessAgentLauncher {
    pub agent: AgentCliParams,
    pub channel: String,
    pub working_directory: PathBuf,
}

impl ProcessAgentLauncher {
    pub fn new(agent: AgentCliParams, channel: String, working_directory: PathBuf) -> Self {
        Self {
            agent,
            channel,
            working_directory,
        }
    }

    /// Build the agent's argv from its CLI contract. Kept separate from
    /// `spawn` so the exact flag set is unit-testable without forking
    /// anything.
    fn build_args(&self, resume: Option<&SessionIdentifier>) -> Vec<String> {
        let mut args = vec![
            "--input-format".to_string(),
            "stream-json".to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--verbose".to_string(),
        ];
        if let Some(max_turns) = self.agent.max_turns {
            args.push("--max-turns".to_string());
            args.push(max_turns.to_string());
        }
        if !self.agent.allowed_tools.is_empty() {
            args.push("--allowedTools".to_string());
            args.push(self.agent.allowed_tools.join(","));
        }
        if let Some(append) = &self.agent.system_prompt_append {
            args.push("--append-system-prompt".to_string());
            args.push(append.clone());
        }
        if let Some(session_id) = resume {
            args.push("--resume".to_string());
            args.push(session_id.as_str().to_string());
        }
        args
    }

    /// Clears ambient credential variables unless the configuration
    /// explicitly allow-lists them for forwarding, and always sets the two
    /// marker variables establishing that the process is running under a
    /// session host rather than interactively.
    fn build_env(&self) -> Vec<(String, String)> {
        const AMBIENT_CREDENTIALS: &[&str] = &["CLAUDE_CONFIG_DIR", "CLAUDE_CODE_OAUTH_TOKEN"];

        let mut env = Vec::new();
        for name in AMBIENT_CREDENTIALS {
            if self.agent.env_forward.iter().any(|forwarded| forwarded == name) {
                if let Ok(value) = std::env::var(name) {
                    env.push((name.to_string(), value));
                }
            }
        }
        for name in &self.agent.env_forward {
            if AMBIENT_CREDENTIALS.contains(&name.as_str()) {
                continue;
            }
            if let Ok(value) = std::env::var(name) {
                env.push((name.clone(), value));
            }
        }
        env.push(("RELAYMUX_CHANNEL".to_string(), self.channel.clone()));
        env.push(("RELAYMUX_SESSION_HOST".to_string(), "1".to_string()));
        env
    }
}

#[async_trait]
impl AgentLauncher for ProcessAgentLauncher {
    async fn spawn(&self, resume: Option<&SessionIdentifier>) -> Result<SpawnedAgent, HostError> {
        let mut command = Command::new(&self.agent.binary);
        command
            .args(self.build_args(resume))
            .current_dir(&self.working_directory)
            .env_clear()
            .envs(std::env::vars().filter(|(k, _)| k == "PATH" || k == "HOME"))
            .envs(self.build_env())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = command.spawn().map_err(HostError::SpawnFailed)?;
        let stdin = child.stdin.take().ok_or(HostError::MissingPipe("stdin"))?;
        let stdout = child.stdout.take().ok_or(HostError::MissingPipe("stdout"))?;
        let stderr = child.stderr.take().ok_or(HostError::MissingPipe("stderr"))?;

        Ok(SpawnedAgent {
            stdin: Box::pin(stdin),
            stdout: Box::pin(BufReader::new(stdout)),
            stderr: Box::pin(BufReader::new(stderr)),
            child: Box::new(ProcessAgentChild { child }),
        })
    }
}

struct ProcessAgentChild {
    child: tokio::process::Child,
}

#[async_trait]
impl AgentChild for ProcessAgentChild {
    async fn wait(&mut self) -> std::io::Result<Option<i32>> {
        let status = self.child.wait().await?;
        Ok(status.code())
    }

    async fn kill(&mut self) {
        let _ = self.child.start_kill();
        let _ = self.child.wait().await;
    }
}

#[cfg(test)]
#[path = "agent_tests.rs"]
mod tests;
