// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Socket and PID file naming convention, shared by the process that spawns
//! a session host and the host itself so the two never disagree about where
//! to listen.

use crate::channel_key::ChannelKey;
use std::path::{Path, PathBuf};

/// `<dir>/<product>-<channel>.sock`
pub fn socket_path(dir: &Path, product: &str, channel: &ChannelKey) -> PathBuf {
    dir.join(format!("{product}-{channel}.sock"))
}

/// `<dir>/<product>-<channel>.pid`
pub fn pid_path(dir: &Path, product: &str, channel: &ChannelKey) -> PathBuf {
    dir.join(format!("{product}-{channel}.pid"))
}

#[cfg(test)]
#[path = "paths_tests.rs"]
mod tests;
