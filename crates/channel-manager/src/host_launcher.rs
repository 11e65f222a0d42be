// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The process-spawn side effect, abstracted behind a trait so the dispatch
//! and reconnect logic in [`crate::ChannelManager`] can be exercised without
//! forking a real session-host binary — see `crates/adapters/src/agent/mod.rs`
//! in the teacher repo for the trait/fake split this mirrors.

use async_trait::async_trait;
use relay_core::SessionHostConfig;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

use crate::error::ChannelManagerError;

/// Ensures a session host process is running for a channel.
///
/// A launcher only needs to *start* the process; the caller polls the
/// socket path on its own schedule until it accepts a connection or the
/// spawn deadline elapses.
#[async_trait]
pub trait HostLauncher: Send + Sync {
    async fn spawn(&self, config: &SessionHostConfig) -> Result<(), ChannelManagerError>;
}

/// Production launcher: spawns the real session-host binary, detached from
/// the daemon's process group and with its standard streams closed.
pub struct ProcessHostLauncher {
    pub host_binary: PathBuf,
}

impl ProcessHostLauncher {
    pub fn new(host_binary: PathBuf) -> Self {
        Self { host_binary }
    }
}

#[async_trait]
impl HostLauncher for ProcessHostLauncher {
    async fn spawn(&self, config: &SessionHostConfig) -> Result<(), ChannelManagerError> {
        let arg = serde_json::to_string(config)
            .map_err(|e| ChannelManagerError::HostUnreachable(e.to_string()))?;

        // process_group(0) puts the host in a new process group so it
        // outlives a daemon restart and never receives signals meant for
        // the daemon's own group. This is the safe-code equivalent of the
        // teacher's tmux-detach trick, chosen because `unsafe_code` is
        // forbidden workspace-wide and a libc::setsid pre_exec would need it.
        Command::new(&self.host_binary)
            .arg(arg)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .process_group(0)
            .spawn()
            .map_err(|e| ChannelManagerError::HostUnreachable(format!("spawn failed: {e}")))?;
        Ok(())
    }
}
