// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Non-blocking file logging setup for `relay-hostd`, matching
//! `relay-daemon`'s own (same crates, same shape) so the two processes'
//! logs read the same way.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::error::HostError;

/// Install a `tracing` subscriber that writes to `log_path` through a
/// non-blocking writer, filtered by `RUST_LOG` (default `info`).
///
/// The returned guard must be held for the lifetime of the process —
/// dropping it early stops the background flush thread and truncates
/// in-flight logs.
pub fn setup_logging(log_path: &std::path::Path) -> Result<tracing_appender::non_blocking::WorkerGuard, HostError> {
    if let Some(parent) = log_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let file_name = log_path
        .file_name()
        .ok_or_else(|| HostError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, "log path has no file name")))?;
    let dir = log_path
        .parent()
        .ok_or_else(|| HostError::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, "log path has no parent directory")))?;
    let file_appender = tracing_appender::rolling::never(dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(non_blocking))
        .init();

    Ok(guard)
}
