// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The session host: owns one agent subprocess and one local socket,
//! forwarding between them and respawning the agent across failures while
//! the single connected client comes and goes.
//!
//! State machine (spec.md §4.2): *spawning* → *ready* → (*dead, buffering*)
//! → *ready* …; terminal *terminating*. Modeled here as an explicit enum
//! guarded by a `tokio::sync::Mutex`, per the "event-driven callbacks →
//! explicit state" design note — not a generic callback register.

use std::collections::VecDeque;
use std::path::PathBuf;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex};

use relay_core::{ClientFrame, ResultPeek, SessionHostConfig, SessionIdentifier};
use tokio::io::{AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{Mutex as AsyncMutex, Notify};

use crate::agent::{AgentChild, AgentLauncher, SpawnedAgent};
use crate::error::HostError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum HostState {
    Spawning,
    Ready,
    Dead,
    Terminating,
}

/// Lines from the agent that are noise rather than signal: swallowed
/// instead of forwarded as `_stderr` events. Kept as a short, named
/// deny-list rather than a general filter language — extend here if a new
/// noisy pattern shows up in practice.
const NOISY_STDERR_PATTERNS: &[&str] = &["ExperimentalWarning", "DeprecationWarning"];

const STDERR_FRAME_LIMIT: usize = 500;

struct RunningAgent {
    stdin: Pin<Box<dyn AsyncWrite + Send>>,
    child: Arc<AsyncMutex<Box<dyn AgentChild>>>,
    stdout_task: tokio::task::JoinHandle<()>,
    stderr_task: tokio::task::JoinHandle<()>,
    exit_task: tokio::task::JoinHandle<()>,
}

impl Drop for RunningAgent {
    fn drop(&mut self) {
        self.stdout_task.abort();
        self.stderr_task.abort();
        self.exit_task.abort();
    }
}

struct Inner {
    state: HostState,
    agent: Option<RunningAgent>,
    last_session_identifier: Option<SessionIdentifier>,
    pending: VecDeque<ClientFrame>,
}

struct ClientSlot {
    generation: u64,
    writer: OwnedWriteHalf,
    reader_task: tokio::task::JoinHandle<()>,
}

/// One running session host. Constructed by [`Self::run`], which consumes
/// it for the lifetime of the process (or the test, for a fake launcher).
pub struct SessionHost {
    config: SessionHostConfig,
    launcher: Arc<dyn AgentLauncher>,
    inner: AsyncMutex<Inner>,
    client: AsyncMutex<Option<ClientSlot>>,
    client_generation: AtomicU64,
    stderr_log: StdMutex<std::fs::File>,
    terminate: Notify,
}

impl SessionHost {
    /// Delete any stale socket, bind, write the PID file, spawn the agent
    /// once, then serve connections until a termination signal arrives.
    pub async fn run(config: SessionHostConfig, launcher: Arc<dyn AgentLauncher>) -> Result<(), HostError> {
        let _ = std::fs::remove_file(&config.socket_path);
        if let Some(parent) = config.socket_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::create_dir_all(&config.logs_dir)?;
        write_pid_file(&config.pid_file, std::process::id())?;

        let listener = UnixListener::bind(&config.socket_path)?;

        let log_path = config.logs_dir.join(format!("{}.log", config.channel));
        let log_file = std::fs::OpenOptions::new().create(true).append(true).open(&log_path)?;

        let resume = config.resume_session_id.clone();
        let host = Arc::new(Self {
            config,
            launcher,
            inner: AsyncMutex::new(Inner {
                state: HostState::Spawning,
                agent: None,
                last_session_identifier: resume,
                pending: VecDeque::new(),
            }),
            client: AsyncMutex::new(None),
            client_generation: AtomicU64::new(0),
            stderr_log: StdMutex::new(log_file),
            terminate: Notify::new(),
        });

        host.spawn_agent().await;
        host.install_signal_handlers();
        host.accept_loop(listener).await;

        Ok(())
    }

    fn install_signal_handlers(self: &Arc<Self>) {
        let host = Arc::clone(self);
        tokio::spawn(async move {
            let mut sigterm = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(s) => s,
                Err(error) => {
                    tracing::error!(%error, "failed to install SIGTERM handler");
                    return;
                }
            };
            sigterm.recv().await;
            tracing::info!("received SIGTERM, shutting down");
            host.shutdown().await;
        });

        tokio::spawn(async move {
            let mut sigint = match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt()) {
                Ok(s) => s,
                Err(error) => {
                    tracing::error!(%error, "failed to install SIGINT handler");
                    return;
                }
            };
            loop {
                sigint.recv().await;
                tracing::debug!("ignoring SIGINT: interactive-interrupt is the daemon's business, not the host's");
            }
        });
    }

    async fn accept_loop(self: Arc<Self>, listener: UnixListener) {
        loop {
            tokio::select! {
                accepted = listener.accept() => {
                    match accepted {
                        Ok((stream, _)) => self.clone().attach_client(stream).await,
                        Err(error) => tracing::warn!(%error, "accept failed"),
                    }
                }
                _ = self.terminate.notified() => {
                    tracing::info!(channel = %self.config.channel, "session host terminating");
                    break;
                }
            }
        }
    }

    /// A new connection replaces (and destroys) any existing client
    /// connection without touching the agent — the mechanism by which a
    /// new daemon reattaches after a hot reload.
    async fn attach_client(self: Arc<Self>, stream: UnixStream) {
        let (read_half, write_half) = stream.into_split();
        let generation = self.client_generation.fetch_add(1, Ordering::SeqCst) + 1;

        let host = Arc::clone(&self);
        let reader_task = tokio::spawn(async move { host.run_client_reader(read_half, generation).await });

        let mut slot = self.client.lock().await;
        if let Some(old) = slot.take() {
            old.reader_task.abort();
        }
        *slot = Some(ClientSlot {
            generation,
            writer: write_half,
            reader_task,
        });
    }

    async fn run_client_reader(self: Arc<Self>, read_half: OwnedReadHalf, generation: u64) {
        let mut lines = BufReader::new(read_half).lines();
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match serde_json::from_str::<ClientFrame>(&line) {
                        Ok(frame) => self.handle_client_frame(frame).await,
                        Err(_) => tracing::debug!(%line, "unparsable client frame, discarding"),
                    }
                }
                Ok(None) | Err(_) => break,
            }
        }
        let mut slot = self.client.lock().await;
        if matches!(&*slot, Some(s) if s.generation == generation) {
            *slot = None;
        }
    }

    async fn handle_client_frame(self: &Arc<Self>, frame: ClientFrame) {
        if matches!(frame, ClientFrame::Interrupt) {
            // Forwarding interrupt to the agent is optional per spec.md §6;
            // there is no agent-level interrupt primitive over this stdio
            // protocol, so it is logged and otherwise a no-op.
            tracing::debug!(channel = %self.config.channel, "interrupt received, no forwarding primitive available");
            return;
        }

        let mut inner = self.inner.lock().await;
        match inner.state {
            HostState::Ready => {
                let wrote = if let Some(agent) = inner.agent.as_mut() {
                    write_frame(&mut agent.stdin, &frame).await.is_ok()
                } else {
                    false
                };
                if !wrote {
                    inner.pending.push_back(frame);
                    inner.state = HostState::Dead;
                }
            }
            HostState::Dead => {
                inner.pending.push_back(frame);
                inner.state = HostState::Spawning;
                drop(inner);
                self.clone().spawn_agent().await;
                return;
            }
            HostState::Spawning => {
                inner.pending.push_back(frame);
            }
            HostState::Terminating => {}
        }
    }

    /// Spawn (or respawn) the agent using the last-known resume identifier,
    /// then flush anything buffered while it was dead.
    async fn spawn_agent(self: &Arc<Self>) {
        let resume = {
            let inner = self.inner.lock().await;
            inner.last_session_identifier.clone()
        };

        let spawned = match self.launcher.spawn(resume.as_ref()).await {
            Ok(spawned) => spawned,
            Err(error) => {
                tracing::error!(%error, channel = %self.config.channel, "agent spawn failed");
                let mut inner = self.inner.lock().await;
                inner.state = HostState::Dead;
                drop(inner);
                let text = format!("[Session ended (spawn failed: {error}). Next message will start a fresh session with resume.]");
                self.write_to_client(relay_core::synthetic_result(true, &text)).await;
                return;
            }
        };

        let running = self.install_agent(spawned);

        let pending: Vec<ClientFrame> = {
            let mut inner = self.inner.lock().await;
            inner.agent = Some(running);
            inner.state = HostState::Ready;
            inner.pending.drain(..).collect()
        };

        for frame in pending {
            let mut inner = self.inner.lock().await;
            let wrote = if let Some(agent) = inner.agent.as_mut() {
                write_frame(&mut agent.stdin, &frame).await.is_ok()
            } else {
                false
            };
            if !wrote {
                inner.pending.push_front(frame);
                inner.state = HostState::Dead;
                break;
            }
        }
    }

    fn install_agent(self: &Arc<Self>, spawned: SpawnedAgent) -> RunningAgent {
        let child = Arc::new(AsyncMutex::new(spawned.child));

        let stdout_host = Arc::clone(self);
        let stdout_task = tokio::spawn(async move {
            let mut lines = spawned.stdout.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => stdout_host.forward_stdout_line(line).await,
                    Ok(None) => break,
                    Err(error) => {
                        tracing::warn!(%error, "error reading agent stdout");
                        break;
                    }
                }
            }
        });

        let stderr_host = Arc::clone(self);
        let stderr_task = tokio::spawn(async move {
            let mut lines = spawned.stderr.lines();
            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => stderr_host.forward_stderr_line(line).await,
                    Ok(None) => break,
                    Err(_) => break,
                }
            }
        });

        let exit_host = Arc::clone(self);
        let exit_child = Arc::clone(&child);
        let exit_task = tokio::spawn(async move {
            let code = exit_child.lock().await.wait().await.unwrap_or(None);
            exit_host.handle_agent_exit(code).await;
        });

        RunningAgent {
            stdin: spawned.stdin,
            child,
            stdout_task,
            stderr_task,
            exit_task,
        }
    }

    async fn handle_agent_exit(self: Arc<Self>, code: Option<i32>) {
        let mut inner = self.inner.lock().await;
        if inner.state == HostState::Terminating {
            return;
        }
        inner.agent = None;
        inner.state = HostState::Dead;
        drop(inner);

        tracing::info!(channel = %self.config.channel, ?code, "agent exited");
        let code_text = code.map(|c| c.to_string()).unwrap_or_else(|| "unknown".to_string());
        let text = format!(
            "[Session ended (exit code {code_text}). Next message will start a fresh session with resume.]"
        );
        self.write_to_client(relay_core::synthetic_result(true, &text)).await;
    }

    async fn forward_stdout_line(self: &Arc<Self>, line: String) {
        if let Some(peek) = ResultPeek::parse(&line) {
            if let Some(session_id) = &peek.session_id {
                let mut inner = self.inner.lock().await;
                inner.last_session_identifier = Some(SessionIdentifier::new(session_id.clone()));
            }
        }
        self.write_line_to_client(&line).await;
    }

    async fn forward_stderr_line(self: &Arc<Self>, line: String) {
        self.append_stderr_log(&line);
        if NOISY_STDERR_PATTERNS.iter().any(|pattern| line.contains(pattern)) {
            return;
        }
        let truncated = truncate_chars(&line, STDERR_FRAME_LIMIT);
        self.write_to_client(relay_core::stderr_frame(&truncated)).await;
    }

    fn append_stderr_log(&self, line: &str) {
        use std::io::Write;
        let mut file = self.stderr_log.lock().unwrap_or_else(|p| p.into_inner());
        let _ = writeln!(file, "{line}");
    }

    async fn write_to_client(&self, value: serde_json::Value) {
        self.write_line_to_client(&value.to_string()).await;
    }

    async fn write_line_to_client(&self, line: &str) {
        let mut slot = self.client.lock().await;
        if let Some(client) = slot.as_mut() {
            let mut out = line.to_string();
            out.push('\n');
            if client.writer.write_all(out.as_bytes()).await.is_err() {
                *slot = None;
            }
        }
    }

    /// Kill the agent, remove the socket and PID file, and stop the accept
    /// loop. Idempotent: a second call after termination is a no-op.
    async fn shutdown(self: &Arc<Self>) {
        let mut inner = self.inner.lock().await;
        if inner.state == HostState::Terminating {
            return;
        }
        inner.state = HostState::Terminating;
        if let Some(agent) = inner.agent.take() {
            agent.child.lock().await.kill().await;
        }
        drop(inner);

        let _ = std::fs::remove_file(&self.config.socket_path);
        let _ = std::fs::remove_file(&self.config.pid_file);
        self.terminate.notify_waiters();
    }
}

async fn write_frame(stdin: &mut Pin<Box<dyn AsyncWrite + Send>>, frame: &ClientFrame) -> std::io::Result<()> {
    let mut line = serde_json::to_string(frame)?;
    line.push('\n');
    stdin.write_all(line.as_bytes()).await
}

fn write_pid_file(path: &PathBuf, pid: u32) -> std::io::Result<()> {
    std::fs::write(path, format!("{pid}\n"))
}

fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
