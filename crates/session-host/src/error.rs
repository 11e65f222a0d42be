// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors the session host can encounter. Nothing here is surfaced to the
//! socket client directly — a failed agent spawn becomes a synthetic
//! `result` line the same way an agent exit does.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to parse session host config: {0}")]
    InvalidConfig(#[from] serde_json::Error),
    #[error("failed to spawn agent: {0}")]
    SpawnFailed(std::io::Error),
    #[error("agent process has no {0} pipe")]
    MissingPipe(&'static str),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
