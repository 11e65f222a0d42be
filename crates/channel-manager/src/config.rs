// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunables for spawn timing and filesystem layout.

use relay_core::AgentCliParams;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration a [`crate::ChannelManager`] is constructed with.
#[derive(Debug, Clone)]
pub struct ChannelManagerConfig {
    /// Directory socket and PID files live in.
    pub socket_dir: PathBuf,
    /// Short tag embedded in socket/PID filenames (`relay-<channel>.sock`).
    pub product: String,
    /// Working directory new session hosts are spawned with.
    pub working_directory: PathBuf,
    /// Agent CLI invocation contract, shared by every channel.
    pub agent: AgentCliParams,
    /// Directory session hosts append their stderr logs to.
    pub logs_dir: PathBuf,
    /// Path the channel/session identifier map is persisted to.
    pub session_record_path: PathBuf,
    /// Maximum time to wait for a freshly spawned host to start listening.
    pub spawn_deadline: Duration,
    /// Timeout for a single connect attempt against a socket that may
    /// already have a listener (the "reuse an existing host" path).
    pub connect_timeout: Duration,
    /// Interval between connect attempts while waiting out `spawn_deadline`.
    pub poll_interval: Duration,
}

impl ChannelManagerConfig {
    pub fn new(
        socket_dir: PathBuf,
        working_directory: PathBuf,
        agent: AgentCliParams,
        logs_dir: PathBuf,
        session_record_path: PathBuf,
    ) -> Self {
        Self {
            socket_dir,
            product: "relay".to_string(),
            working_directory,
            agent,
            logs_dir,
            session_record_path,
            spawn_deadline: Duration::from_secs(10),
            connect_timeout: Duration::from_secs(3),
            poll_interval: Duration::from_millis(200),
        }
    }
}
