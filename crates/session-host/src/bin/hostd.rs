// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `relay-hostd`: one detached session host process. Spawned by
//! `relay-channel-manager` with a single JSON argument (a
//! `relay_core::SessionHostConfig`) and no stdio of its own — everything it
//! needs arrives over its socket once the channel manager connects.

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

use std::sync::Arc;

use relay_core::SessionHostConfig;
use relay_session_host::{logging, HostError, ProcessAgentLauncher, SessionHost};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let raw_config = std::env::args().nth(1).ok_or(HostError::Io(std::io::Error::new(
        std::io::ErrorKind::InvalidInput,
        "usage: relay-hostd <session-host-config-json>",
    )))?;
    let config: SessionHostConfig = serde_json::from_str(&raw_config)?;

    let log_path = config.logs_dir.join(format!("{}-host.log", config.channel));
    let _log_guard = logging::setup_logging(&log_path)?;

    info!(channel = %config.channel, "starting relay-hostd");

    let launcher = Arc::new(ProcessAgentLauncher::new(
        config.agent.clone(),
        config.channel.as_str().to_string(),
        config.working_directory.clone(),
    ));

    if let Err(error) = SessionHost::run(config, launcher).await {
        error!(%error, "session host exited with error");
        return Err(error.into());
    }

    info!("relay-hostd stopped");
    Ok(())
}
