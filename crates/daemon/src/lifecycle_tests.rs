// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use relay_core::AgentCliParams;
use std::path::PathBuf;

fn test_config(dir: &std::path::Path) -> DaemonConfig {
    DaemonConfig::for_state_dir(
        dir.to_path_buf(),
        AgentCliParams {
            binary: PathBuf::from("/usr/bin/true"),
            allowed_tools: vec![],
            max_turns: None,
            system_prompt_append: None,
            env_forward: vec![],
        },
        dir.to_path_buf(),
        dir.join("relay-hostd"),
    )
}

#[test]
fn startup_creates_directories_and_writes_the_pid_file() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    let daemon = Daemon::startup(config).unwrap();
    assert!(daemon.config.socket_dir.is_dir());
    assert!(daemon.config.logs_dir.is_dir());
    let pid = std::fs::read_to_string(&daemon.config.lock_path).unwrap();
    assert_eq!(pid.trim(), std::process::id().to_string());
}

#[test]
fn second_startup_fails_while_the_first_still_holds_the_lock() {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(dir.path());

    std::fs::create_dir_all(&config.state_dir).unwrap();
    let held_lock = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)
        .unwrap();
    held_lock.try_lock_exclusive().unwrap();

    let result = Daemon::startup(test_config(dir.path()));
    assert!(matches!(result, Err(DaemonError::LockFailed(_))));
}

#[test]
fn cleanup_removes_the_lock_file() {
    let dir = tempfile::tempdir().unwrap();
    let daemon = Daemon::startup(test_config(dir.path())).unwrap();
    let lock_path = daemon.config.lock_path.clone();
    daemon.cleanup();
    assert!(!lock_path.exists());
}

/// Demonstrates the wiring contract a transport adapter would be linked
/// against: register a push handler against the daemon's own registry and
/// route a message through it. Not a transport implementation, just proof
/// the composition root hands out a usable `Arc<PushRegistry>`.
mod smoke {
    use super::*;
    use async_trait::async_trait;
    use relay_channel_manager::PushHandler;
    use std::sync::Mutex as StdMutex;

    struct RecordingHandler {
        deliveries: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl PushHandler for RecordingHandler {
        async fn send(&self, channel: &str, text: &str, _media: Option<&str>) -> bool {
            self.deliveries.lock().unwrap().push(format!("{channel}:{text}"));
            true
        }
    }

    #[tokio::test]
    async fn push_registry_handed_out_by_startup_routes_to_a_registered_adapter() {
        let dir = tempfile::tempdir().unwrap();
        let daemon = Daemon::startup(test_config(dir.path())).unwrap();

        let handler = Arc::new(RecordingHandler {
            deliveries: StdMutex::new(Vec::new()),
        });
        daemon.push_registry.register("tg-", handler.clone());

        let delivered = daemon.push_registry.send("tg-42", "ping", None).await;
        assert!(delivered);
        assert_eq!(handler.deliveries.lock().unwrap().as_slice(), ["tg-42:ping"]);

        let missed = daemon.push_registry.send("http-1", "ping", None).await;
        assert!(!missed);
    }
}
