// steward-core/src/lib.rs

#![doc = include_str!("../../README.md")]

pub mod agent;
pub mod api;
pub mod approval;
pub mod config;
pub mod errors;
pub mod providers;
pub mod registry;
pub mod tools;
pub mod utils;


pub use agent::{Agent, AgentBuilder, AgentPhase, AgentState, DEFAULT_MAX_ITERATIONS, DEFAULT_SYSTEM_PROMPT};
pub use approval::{ApprovalGate, AutoApprove, DenyAll};
pub use config::{AgentConfig, ModelConfig, ProviderInstanceConfig};
pub use errors::AgentError;
pub use models::chat::{ChatMessage, ToolCall, ToolFunction};
pub use models::tools::{
    SchemaViolation, ToolDefinition, ToolInput, ToolParameter, ToolParameterType,
    ToolParametersDefinition,
};
pub use providers::{Provider, ProviderRegistry};
pub use registry::{handler_fn, FnHandler, ToolHandler, ToolRegistry, ToolSpec};

pub use async_trait::async_trait;

/// Text returned when a run ends because the iteration limit was hit.
pub const MAX_ITERATIONS_MESSAGE: &str = "Error: Maximum iterations reached";

/// How an [`Agent::run`] ended.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RunOutcome {
    /// The model answered without requesting tools.
    Completed(String),
    /// The model was still requesting tools when the iteration limit ran out.
    MaxIterationsReached,
}

impl RunOutcome {
    /// The text to show the user for this outcome.
    pub fn text(&self) -> &str {
        match self {
            RunOutcome::Completed(text) => text,
            RunOutcome::MaxIterationsReached => MAX_ITERATIONS_MESSAGE,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RunOutcome::Completed(_))
    }
}

/// Represents the final output of an [`Agent::run`] execution.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct AgentOutput {
    pub outcome: RunOutcome,
    /// Every tool call handled during the run, in execution order.
    pub applied_tool_results: Vec<ToolExecutionResult>,
    /// Number of completion requests made during the run.
    pub iterations: usize,
}

impl AgentOutput {
    pub fn text(&self) -> &str {
        self.outcome.text()
    }
}

/// Details the execution result of a single tool call within an [`AgentOutput`].
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ToolExecutionResult {
    /// The ID the model gave to this call.
    pub tool_call_id: String,
    pub tool_name: String,
    /// Decoded arguments, or the raw argument string when it was not valid JSON.
    pub input: serde_json::Value,
    /// The text sent back to the model as the tool result.
    pub output: String,
    pub status: ToolExecutionStatus,
}

#[derive(Debug, Clone, Copy, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub enum ToolExecutionStatus {
    /// The handler ran and returned output.
    Success,
    /// Bad arguments, or the handler returned an error.
    Failure,
    /// No tool with the requested name is registered.
    NotFound,
    /// The approval gate refused the call; the handler was not invoked.
    Denied,
}

pub mod models {
    pub mod chat;
    pub mod tools;
}
