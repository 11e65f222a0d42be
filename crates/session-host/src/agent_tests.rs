// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::path::PathBuf;

fn launcher(agent: AgentCliParams) -> ProcessAgentLauncher {
    ProcessAgentLauncher::new(agent, "tg-42".to_string(), PathBuf::from("/work"))
}

fn base_agent() -> AgentCliParams {
    AgentCliParams {
        binary: PathBuf::from("/usr/bin/claude"),
        allowed_tools: vec![],
        max_turns: None,
        system_prompt_append: None,
        env_forward: vec![],
    }
}

#[test]
fn build_args_always_requests_streaming_json_both_ways() {
    let launcher = launcher(base_agent());
    let args = launcher.build_args(None);
    assert!(args.windows(2).any(|w| w == ["--input-format", "stream-json"]));
    assert!(args.windows(2).any(|w| w == ["--output-format", "stream-json"]));
    assert!(args.contains(&"--verbose".to_string()));
    assert!(!args.contains(&"--resume".to_string()));
}

#[test]
fn build_args_includes_resume_flag_only_when_known() {
    let launcher = launcher(base_agent());
    let session_id = SessionIdentifier::new("sess-123");
    let args = launcher.build_args(Some(&session_id));
    let idx = args.iter().position(|a| a == "--resume").unwrap();
    assert_eq!(args[idx + 1], "sess-123");
}

#[test]
fn build_args_joins_allowed_tools_and_forwards_turn_cap() {
    let mut agent = base_agent();
    agent.allowed_tools = vec!["bash".to_string(), "read".to_string()];
    agent.max_turns = Some(12);
    let launcher = launcher(agent);
    let args = launcher.build_args(None);

    let tools_idx = args.iter().position(|a| a == "--allowedTools").unwrap();
    assert_eq!(args[tools_idx + 1], "bash,read");
    let turns_idx = args.iter().position(|a| a == "--max-turns").unwrap();
    assert_eq!(args[turns_idx + 1], "12");
}

#[test]
fn build_env_always_sets_the_two_marker_variables() {
    let launcher = launcher(base_agent());
    let env = launcher.build_env();
    assert!(env.contains(&("RELAYMUX_CHANNEL".to_string(), "tg-42".to_string())));
    assert!(env.contains(&("RELAYMUX_SESSION_HOST".to_string(), "1".to_string())));
}

#[test]
fn build_env_never_forwards_ambient_credentials_unless_allow_listed() {
    std::env::set_var("CLAUDE_CONFIG_DIR", "/home/test/.claude-alt");
    let launcher = launcher(base_agent());
    let env = launcher.build_env();
    assert!(!env.iter().any(|(k, _)| k == "CLAUDE_CONFIG_DIR"));

    let mut agent = base_agent();
    agent.env_forward = vec!["CLAUDE_CONFIG_DIR".to_string()];
    let launcher = launcher(agent);
    let env = launcher.build_env();
    assert!(env.contains(&("CLAUDE_CONFIG_DIR".to_string(), "/home/test/.claude-alt".to_string())));
    std::env::remove_var("CLAUDE_CONFIG_DIR");
}
