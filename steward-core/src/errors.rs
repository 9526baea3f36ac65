// steward-core/src/errors.rs
use thiserror::Error;

/// Errors that escape the agent.
///
/// Tool lookup, argument, handler and approval failures never show up here:
/// they are turned into tool-result messages and the loop continues.
#[derive(Error, Debug)]
pub enum AgentError {
    /// Configuration loading or validation failed, or the agent was built with
    /// an inconsistent tool set.
    #[error("Configuration Error: {0}")]
    Config(String),

    /// The completion provider call failed. Not retried.
    #[error("Provider Error: {0}")]
    Provider(#[source] anyhow::Error),
}

impl AgentError {
    pub fn config(msg: impl Into<String>) -> Self {
        AgentError::Config(msg.into())
    }
}
