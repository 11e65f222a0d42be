// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: lock acquisition, wiring the channel manager
//! and push registry, and the three shutdown flavors the composition root
//! exposes to its signal handlers.

use std::fs::File;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use fs2::FileExt;
use relay_channel_manager::{ChannelManager, ChannelManagerConfig, ProcessHostLauncher, PushRegistry};
use thiserror::Error;
use tracing::info;

use crate::config::DaemonConfig;

/// Errors that can prevent the daemon from starting.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("RELAYMUX_AGENT_BINARY is not set")]
    MissingAgentBinary,
    #[error("agent binary {0} does not exist")]
    AgentBinaryNotFound(PathBuf),
    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// A running daemon instance: the lock that proves it's the only one, and
/// the two pieces of state every transport adapter would be linked against.
pub struct Daemon {
    pub config: DaemonConfig,
    // Held only to keep the exclusive lock alive; released on drop.
    #[allow(dead_code)]
    lock_file: File,
    pub manager: Arc<ChannelManager>,
    pub push_registry: Arc<PushRegistry>,
}

impl Daemon {
    /// Acquire the exclusive lock, wire up the channel manager and push
    /// registry, and return a ready-to-run daemon. Does not bind any socket
    /// or transport listener — see `relaymuxd`'s ambient-stack note in
    /// `SPEC_FULL.md` §4.4.
    pub fn startup(config: DaemonConfig) -> Result<Self, DaemonError> {
        std::fs::create_dir_all(&config.state_dir)?;
        std::fs::create_dir_all(&config.socket_dir)?;
        std::fs::create_dir_all(&config.logs_dir)?;

        // Acquire the lock file before truncating it, so a second daemon
        // attempting to start never wipes the running daemon's PID.
        let lock_file = std::fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&config.lock_path)?;
        lock_file.try_lock_exclusive().map_err(DaemonError::LockFailed)?;

        let mut lock_file = lock_file;
        lock_file.set_len(0)?;
        writeln!(lock_file, "{}", std::process::id())?;
        let lock_file = lock_file;

        let channel_config = ChannelManagerConfig::new(
            config.socket_dir.clone(),
            config.working_directory.clone(),
            config.agent.clone(),
            config.logs_dir.clone(),
            config.session_record_path.clone(),
        );
        let launcher = Arc::new(ProcessHostLauncher::new(config.host_binary.clone()));
        let manager = Arc::new(ChannelManager::new(channel_config, launcher));
        let push_registry = Arc::new(PushRegistry::new());

        info!(state_dir = %config.state_dir.display(), "daemon started");

        Ok(Self {
            config,
            lock_file,
            manager,
            push_registry,
        })
    }

    /// Hot-reload / graceful shutdown: disconnect from every session host
    /// without killing them, so the agent subprocesses outlive this process.
    pub fn disconnect(&self) {
        self.manager.shutdown();
    }

    /// Interactive-interrupt: disconnect and terminate every known session
    /// host, including ones this daemon lifetime never connected to.
    pub fn shutdown_hosts(&self) {
        self.manager.shutdown_hosts();
    }

    /// Remove the files this daemon instance owns. The lock itself releases
    /// when `self.lock_file` drops.
    pub fn cleanup(&self) {
        let _ = std::fs::remove_file(&self.config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
