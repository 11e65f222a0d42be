// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent's own resumable session identifier.
//!
//! Opaque to the core: captured verbatim from a `result` frame's
//! `session_id` field and handed back verbatim as the agent's resume flag.

crate::define_id! {
    /// Token returned by the agent in every completion, usable to resume the
    /// same conversational context after the agent subprocess dies.
    pub struct SessionIdentifier;
}

#[cfg(test)]
#[path = "session_id_tests.rs"]
mod tests;
