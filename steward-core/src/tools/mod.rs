// steward-core/src/tools/mod.rs

//! Reusable building blocks for tool handlers.
//!
//! **Important:** These functions do *not* sandbox paths or confirm anything
//! with the user. Register tools built on them with
//! [`crate::ToolSpec::requiring_approval`] where that matters.

pub mod fs;
pub mod shell;

/// Represents the structured output of an executed external command.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandOutput {
    /// The exit status code of the command, `-1` if killed by a signal.
    pub status: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.status == 0
    }
}
