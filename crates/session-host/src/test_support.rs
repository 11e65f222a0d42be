// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Test double for the agent-spawn boundary. Mirrors the teacher's
//! `Fake*Adapter` pattern (`crates/adapters/src/agent/mod.rs`) and the
//! sibling `FakeHostLauncher` in `relay-channel-manager`: a fake that
//! implements [`AgentLauncher`] over real in-memory pipes
//! (`tokio::io::duplex`) instead of forking a process, so tests drive the
//! "agent" directly.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use relay_core::SessionIdentifier;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::{mpsc, Notify};

use crate::agent::{AgentChild, AgentLauncher, SpawnedAgent};
use crate::error::HostError;

struct ExitSlot {
    code: Mutex<Option<Option<i32>>>,
    notify: Notify,
}

impl ExitSlot {
    fn new() -> Self {
        Self {
            code: Mutex::new(None),
            notify: Notify::new(),
        }
    }

    fn set(&self, code: Option<i32>) {
        let mut guard = self.code.lock().unwrap_or_else(|p| p.into_inner());
        if guard.is_none() {
            *guard = Some(code);
            self.notify.notify_waiters();
        }
    }
}

/// One spawned "agent": the other end of its stdin/stdout/stderr pipes, plus
/// the resume identifier it was spawned with, for the test to drive and
/// assert against.
pub struct FakeAgentHandle {
    pub resume: Option<SessionIdentifier>,
    stdin: BufReader<DuplexStream>,
    stdout: DuplexStream,
    stderr: DuplexStream,
    exit: Arc<ExitSlot>,
}

impl FakeAgentHandle {
    /// Write one line of fake agent stdout, as the host would see it.
    pub async fn send_stdout_line(&mut self, line: &str) {
        let mut out = line.to_string();
        out.push('\n');
        self.stdout.write_all(out.as_bytes()).await.unwrap_or(());
    }

    /// Write one line of fake agent stderr.
    pub async fn send_stderr_line(&mut self, line: &str) {
        let mut out = line.to_string();
        out.push('\n');
        self.stderr.write_all(out.as_bytes()).await.unwrap_or(());
    }

    /// Read the next line the host forwarded to this agent's stdin.
    pub async fn recv_stdin_line(&mut self) -> Option<String> {
        let mut line = String::new();
        match self.stdin.read_line(&mut line).await {
            Ok(0) => None,
            Ok(_) => Some(line.trim_end_matches('\n').to_string()),
            Err(_) => None,
        }
    }

    /// Simulate the agent process exiting with `code`.
    pub fn exit(&self, code: Option<i32>) {
        self.exit.set(code);
    }
}

struct FakeAgentChild {
    exit: Arc<ExitSlot>,
}

#[async_trait]
impl AgentChild for FakeAgentChild {
    async fn wait(&mut self) -> std::io::Result<Option<i32>> {
        loop {
            {
                let guard = self.exit.code.lock().unwrap_or_else(|p| p.into_inner());
                if let Some(code) = *guard {
                    return Ok(code);
                }
            }
            self.exit.notify.notified().await;
        }
    }

    async fn kill(&mut self) {
        self.exit.set(None);
    }
}

/// Hands out a [`FakeAgentHandle`] over this channel for every call to
/// [`AgentLauncher::spawn`], in order.
pub struct FakeAgentLauncher {
    handle_tx: mpsc::UnboundedSender<FakeAgentHandle>,
}

impl FakeAgentLauncher {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<FakeAgentHandle>) {
        let (handle_tx, handle_rx) = mpsc::unbounded_channel();
        (Self { handle_tx }, handle_rx)
    }
}

#[async_trait]
impl AgentLauncher for FakeAgentLauncher {
    async fn spawn(&self, resume: Option<&SessionIdentifier>) -> Result<SpawnedAgent, HostError> {
        let (stdin_host, stdin_test) = tokio::io::duplex(4096);
        let (stdout_test, stdout_host) = tokio::io::duplex(4096);
        let (stderr_test, stderr_host) = tokio::io::duplex(4096);
        let exit = Arc::new(ExitSlot::new());

        let handle = FakeAgentHandle {
            resume: resume.cloned(),
            stdin: BufReader::new(stdin_test),
            stdout: stdout_test,
            stderr: stderr_test,
            exit: Arc::clone(&exit),
        };
        // The test may have stopped listening (e.g. after asserting a
        // bounded number of respawns); a dropped receiver is not a spawn
        // failure.
        let _ = self.handle_tx.send(handle);

        Ok(SpawnedAgent {
            stdin: Box::pin(stdin_host),
            stdout: Box::pin(BufReader::new(stdout_host)),
            stderr: Box::pin(BufReader::new(stderr_host)),
            child: Box::new(FakeAgentChild { exit }),
        })
    }
}
