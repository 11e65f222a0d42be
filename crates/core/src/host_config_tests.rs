// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

fn sample() -> SessionHostConfig {
    SessionHostConfig {
        channel: ChannelKey::new("tg-42").unwrap(),
        socket_path: PathBuf::from("/tmp/relay-tg-42.sock"),
        pid_file: PathBuf::from("/tmp/relay-tg-42.pid"),
        working_directory: PathBuf::from("/work"),
        agent: AgentCliParams {
            binary: PathBuf::from("/usr/bin/claude"),
            allowed_tools: vec!["bash".to_string()],
            max_turns: Some(50),
            system_prompt_append: None,
            env_forward: vec!["CLAUDE_CONFIG_DIR".to_string()],
        },
        logs_dir: PathBuf::from("/tmp/relay/logs"),
        resume_session_id: Some(SessionIdentifier::new("sess-1")),
    }
}

#[test]
fn round_trips_as_single_json_argument() {
    let config = sample();
    let json = serde_json::to_string(&config).unwrap();
    let back: SessionHostConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.channel, config.channel);
    assert_eq!(back.resume_session_id, config.resume_session_id);
    assert_eq!(back.agent.max_turns, Some(50));
}

#[test]
fn resume_session_id_defaults_absent_on_first_ever_send() {
    let mut config = sample();
    config.resume_session_id = None;
    let json = serde_json::to_string(&config).unwrap();
    let back: SessionHostConfig = serde_json::from_str(&json).unwrap();
    assert_eq!(back.resume_session_id, None);
}
