// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! relay-channel-manager: multiplexes heterogeneous input channels onto
//! persistent, per-channel session-host processes.
//!
//! [`ChannelManager`] owns the map of live connections and is the only piece
//! of the daemon that cares about spawn races, socket reuse, queueing, and
//! coalescing. Everything else — what content means, what a channel is — is
//! shared vocabulary from `relay-core`.

mod config;
mod error;
mod host_launcher;
mod managed_channel;
mod push_registry;
mod session_record;

#[cfg(test)]
mod test_support;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use relay_core::{ChannelContext, ChannelKey, MessageContent, SendResult};
use tokio::net::UnixStream;
use tokio::sync::Mutex as AsyncMutex;

pub use config::ChannelManagerConfig;
pub use error::ChannelManagerError;
pub use host_launcher::{HostLauncher, ProcessHostLauncher};
pub use push_registry::{PushHandler, PushRegistry};

use managed_channel::ManagedChannel;
use session_record::SessionRecordStore;

/// Callback invoked with every streamed event the agent emits during a
/// turn, except the terminal `result` frame and the internal `_stderr`
/// frame, which the channel manager handles itself.
pub type OnEvent = Arc<dyn Fn(serde_json::Value) + Send + Sync>;

/// Multiplexes channel-keyed traffic onto per-channel session hosts.
pub struct ChannelManager {
    config: Arc<ChannelManagerConfig>,
    launcher: Arc<dyn HostLauncher>,
    channels: Arc<Mutex<HashMap<ChannelKey, Arc<ManagedChannel>>>>,
    spawn_locks: Mutex<HashMap<ChannelKey, Arc<AsyncMutex<()>>>>,
    session_records: Arc<SessionRecordStore>,
}

impl ChannelManager {
    pub fn new(config: ChannelManagerConfig, launcher: Arc<dyn HostLauncher>) -> Self {
        let session_records = Arc::new(SessionRecordStore::load(config.session_record_path.clone()));
        Self {
            config: Arc::new(config),
            launcher,
            channels: Arc::new(Mutex::new(HashMap::new())),
            spawn_locks: Mutex::new(HashMap::new()),
            session_records,
        }
    }

    /// Dispatch `content` to `channel`, connecting to or spawning its
    /// session host as needed. When `context` is present, its rendered
    /// header is prepended to the content before anything is queued.
    pub async fn send(
        &self,
        channel: ChannelKey,
        content: MessageContent,
        context: Option<ChannelContext>,
        on_event: Option<OnEvent>,
    ) -> Result<SendResult, ChannelManagerError> {
        let content = match &context {
            Some(ctx) => content.with_header(&ctx.render_header()),
            None => content,
        };
        let managed = self.get_or_connect(&channel).await?;
        managed.send(content, on_event).await
    }

    /// A reference to the push registry's companion store isn't held here —
    /// [`PushRegistry`] is constructed and owned independently by the
    /// composition root, deliberately off the dispatch path (§4.3).
    async fn get_or_connect(&self, channel: &ChannelKey) -> Result<Arc<ManagedChannel>, ChannelManagerError> {
        if let Some(existing) = self.channels.lock().get(channel).cloned() {
            return Ok(existing);
        }

        // Single-flight per channel: concurrent first-sends for the same
        // channel queue on this lock instead of racing separate spawns.
        let lock = {
            let mut spawn_locks = self.spawn_locks.lock();
            Arc::clone(
                spawn_locks
                    .entry(channel.clone())
                    .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
            )
        };
        let _guard = lock.lock().await;

        if let Some(existing) = self.channels.lock().get(channel).cloned() {
            return Ok(existing);
        }

        let result = self.connect_or_spawn(channel).await;
        self.spawn_locks.lock().remove(channel);
        let managed = result?;
        self.channels.lock().insert(channel.clone(), Arc::clone(&managed));
        Ok(managed)
    }

    async fn connect_or_spawn(&self, channel: &ChannelKey) -> Result<Arc<ManagedChannel>, ChannelManagerError> {
        let socket_path = relay_core::paths::socket_path(&self.config.socket_dir, &self.config.product, channel);

        if let Some(stream) = try_connect(&socket_path, self.config.connect_timeout).await {
            tracing::info!(%channel, "reusing existing session host");
            return Ok(self.attach(channel.clone(), stream));
        }

        // No listener at this path. It may be a stale file left behind by a
        // host that died without cleaning up; remove it before spawning so
        // the new host doesn't fail to bind.
        let _ = std::fs::remove_file(&socket_path);
        self.spawn_host(channel, &socket_path).await
    }

    async fn spawn_host(
        &self,
        channel: &ChannelKey,
        socket_path: &std::path::Path,
    ) -> Result<Arc<ManagedChannel>, ChannelManagerError> {
        let pid_file = relay_core::paths::pid_path(&self.config.socket_dir, &self.config.product, channel);
        let resume_session_id = self.session_records.get(channel);
        let host_config = relay_core::SessionHostConfig {
            channel: channel.clone(),
            socket_path: socket_path.to_path_buf(),
            pid_file,
            working_directory: self.config.working_directory.clone(),
            agent: self.config.agent.clone(),
            logs_dir: self.config.logs_dir.clone(),
            resume_session_id,
        };

        tracing::info!(%channel, socket = %socket_path.display(), "spawning session host");
        self.launcher.spawn(&host_config).await?;

        let deadline = Instant::now() + self.config.spawn_deadline;
        loop {
            if Instant::now() >= deadline {
                return Err(ChannelManagerError::HostUnreachable(format!(
                    "no session host listening on {} within {:?}",
                    socket_path.display(),
                    self.config.spawn_deadline
                )));
            }
            if let Some(stream) = try_connect(socket_path, self.config.poll_interval).await {
                return Ok(self.attach(channel.clone(), stream));
            }
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    fn attach(&self, channel: ChannelKey, stream: UnixStream) -> Arc<ManagedChannel> {
        let (read_half, write_half) = stream.into_split();
        ManagedChannel::attach(
            channel,
            read_half,
            write_half,
            Arc::clone(&self.channels),
            Arc::clone(&self.session_records),
        )
    }

    /// Close every live host connection without killing the hosts — used on
    /// hot reload, where the daemon process is about to re-exec itself but
    /// the agent subprocesses underneath should keep running.
    pub fn shutdown(&self) {
        let channels: Vec<_> = self.channels.lock().drain().map(|(_, v)| v).collect();
        for managed in channels {
            managed.disconnect_for_reload();
        }
    }

    /// [`Self::shutdown`], plus a termination signal to every session host
    /// this daemon has ever known about — both currently connected and
    /// merely recorded from a previous lifetime.
    pub fn shutdown_hosts(&self) {
        let mut known: std::collections::HashSet<ChannelKey> = self.channels.lock().keys().cloned().collect();
        known.extend(self.session_records.known_channels());

        self.shutdown();

        for channel in known {
            self.terminate_host(&channel);
        }
    }

    fn terminate_host(&self, channel: &ChannelKey) {
        let pid_path = relay_core::paths::pid_path(&self.config.socket_dir, &self.config.product, channel);
        let pid = match std::fs::read_to_string(&pid_path) {
            Ok(contents) => match contents.trim().parse::<i32>() {
                Ok(pid) => pid,
                Err(_) => {
                    tracing::warn!(%channel, path = %pid_path.display(), "pid file unreadable, skipping");
                    return;
                }
            },
            Err(_) => {
                tracing::debug!(%channel, "no pid file recorded, host likely not running");
                return;
            }
        };

        // Shell out to `kill` rather than calling libc directly — keeps the
        // crate free of `unsafe` (forbidden workspace-wide) the way the
        // teacher's cli/daemon_process.rs does it.
        let status = std::process::Command::new("kill")
            .args(["-TERM", &pid.to_string()])
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status();
        match status {
            Ok(s) if s.success() => tracing::info!(%channel, pid, "sent termination signal to session host"),
            _ => tracing::warn!(%channel, pid, "failed to signal session host"),
        }
    }
}

async fn try_connect(path: &std::path::Path, timeout: std::time::Duration) -> Option<UnixStream> {
    match tokio::time::timeout(timeout, UnixStream::connect(path)).await {
        Ok(Ok(stream)) => Some(stream),
        _ => None,
    }
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
