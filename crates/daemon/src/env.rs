// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;

use crate::lifecycle::DaemonError;

/// Resolve the state directory: `RELAYMUX_STATE_DIR` > `XDG_STATE_HOME/relaymux` >
/// `~/.local/state/relaymux`.
pub fn state_dir() -> Result<PathBuf, DaemonError> {
    if let Ok(dir) = std::env::var("RELAYMUX_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("relaymux"));
    }
    let home = std::env::var("HOME").map_err(|_| DaemonError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/relaymux"))
}
