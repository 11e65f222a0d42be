// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Errors surfaced to callers of [`crate::ChannelManager::send`].
//!
//! Everything the core recovers from locally (stale sockets, races to spawn,
//! a killed host) never reaches this type — see `spec.md` §7.

use relay_core::ChannelKeyError;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum ChannelManagerError {
    /// Spawn timed out or the socket connect failed terminally. The caller
    /// may retry; no automatic retry happens inside the core.
    #[error("no session host reachable: {0}")]
    HostUnreachable(String),

    /// The host socket closed while a message was queued or in flight. The
    /// managed channel has been torn down; the next send reconnects or
    /// respawns transparently.
    #[error("channel disconnected")]
    ChannelDisconnected,

    /// The channel key itself was invalid.
    #[error("invalid channel key: {0}")]
    InvalidChannel(#[from] ChannelKeyError),
}
