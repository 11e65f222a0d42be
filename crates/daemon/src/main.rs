// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `relaymuxd`: the daemon binary. Loads configuration, wires up the
//! channel manager and push registry, and owns the process lifetime. It
//! does not itself speak any transport protocol — a real adapter links
//! against the library crate and is handed the constructed `ChannelManager`
//! and `PushRegistry` the way this binary's signal handlers are.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::os::unix::process::CommandExt;
use std::sync::Arc;
use std::time::Duration;

use relay_daemon::lifecycle::{Daemon, DaemonError};
use relay_daemon::{logging, DaemonConfig};
use tokio::signal::unix::{signal, SignalKind};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = DaemonConfig::load()?;
    let _log_guard = logging::setup_logging(&config.log_path)?;

    info!("starting relaymuxd");

    let daemon = match Daemon::startup(config) {
        Ok(daemon) => daemon,
        Err(DaemonError::LockFailed(_)) => {
            eprintln!("relaymuxd is already running");
            std::process::exit(1);
        }
        Err(e) => {
            error!("failed to start daemon: {e}");
            return Err(e.into());
        }
    };
    let daemon = Arc::new(daemon);

    let mut sighup = signal(SignalKind::hangup())?;
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;

    info!(state_dir = %daemon.config.state_dir.display(), "daemon ready");
    println!("READY");

    loop {
        tokio::select! {
            _ = sighup.recv() => {
                // Hot-reload and hangup-restart are the same signal: disconnect
                // from every host without killing it, then re-exec so the
                // session hosts' sockets outlive this process incarnation.
                info!("received SIGHUP, disconnecting and re-executing");
                daemon.disconnect();
                let reload = async { respawn_self() };
                match tokio::time::timeout(Duration::from_secs(5), reload).await {
                    Ok(Ok(())) => info!("re-exec spawned, exiting"),
                    Ok(Err(e)) => error!("re-exec failed, exiting anyway: {e}"),
                    Err(_) => error!("re-exec timed out after 5s, exiting anyway"),
                }
                break;
            }
            _ = sigint.recv() => {
                info!("received SIGINT, shutting down and terminating hosts");
                daemon.shutdown_hosts();
                break;
            }
            _ = sigterm.recv() => {
                info!("received SIGTERM, disconnecting gracefully");
                daemon.disconnect();
                break;
            }
        }
    }

    daemon.cleanup();
    info!("relaymuxd stopped");
    Ok(())
}

/// Re-exec the current binary as a detached child with the same argv,
/// mirroring the SIGHUP-restart contract: the child outlives this process
/// and the parent simply exits once it's spawned.
fn respawn_self() -> std::io::Result<()> {
    let exe = std::env::current_exe()?;
    let args: Vec<_> = std::env::args().skip(1).collect();
    std::process::Command::new(exe)
        .args(args)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::inherit())
        .stderr(std::process::Stdio::inherit())
        .process_group(0)
        .spawn()?;
    Ok(())
}
