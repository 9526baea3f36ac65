// steward-core/src/agent.rs
use serde_json::Value as JsonValue;
use std::any::Any;
use std::sync::Arc;
use tracing::{debug, error, info, trace, warn};

use crate::approval::{ApprovalGate, DenyAll};
use crate::errors::AgentError;
use crate::models::chat::{ChatMessage, ToolCall};
use crate::models::tools::ToolInput;
use crate::providers::Provider;
use crate::registry::{ToolRegistry, ToolSpec};
use crate::{AgentOutput, RunOutcome, ToolExecutionResult, ToolExecutionStatus};

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";
pub const DEFAULT_MAX_ITERATIONS: usize = 10;

const CANCELLED_MESSAGE: &str = "Tool execution cancelled by user";

/// Where the agent is in its request/response cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgentPhase {
    AwaitingUserInput,
    AwaitingCompletion,
    ExecutingTools,
    /// The last run ended with a final answer.
    Done,
    /// The last run hit the iteration limit.
    Exhausted,
}

/// The conversation owned by one agent.
#[derive(Debug, Clone)]
pub struct AgentState {
    messages: Vec<ChatMessage>,
    iteration_count: usize,
}

impl AgentState {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            messages: vec![ChatMessage::system(system_prompt)],
            iteration_count: 0,
        }
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn iteration_count(&self) -> usize {
        self.iteration_count
    }

    fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
    }

    /// Drops everything after the seed system message.
    fn reset(&mut self) {
        self.messages.truncate(1);
        self.iteration_count = 0;
    }
}

pub struct AgentBuilder {
    provider: Arc<dyn Provider>,
    system_prompt: Option<String>,
    tools: Vec<ToolSpec>,
    max_iterations: usize,
    approval: Box<dyn ApprovalGate>,
}

impl AgentBuilder {
    pub fn new(provider: Arc<dyn Provider>) -> Self {
        Self {
            provider,
            system_prompt: None,
            tools: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            approval: Box::new(DenyAll),
        }
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    pub fn tool(mut self, spec: ToolSpec) -> Self {
        self.tools.push(spec);
        self
    }

    pub fn tools(mut self, specs: impl IntoIterator<Item = ToolSpec>) -> Self {
        self.tools.extend(specs);
        self
    }

    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Replaces the default gate, which denies every call that needs approval.
    pub fn approval_gate(mut self, gate: impl ApprovalGate + 'static) -> Self {
        self.approval = Box::new(gate);
        self
    }

    pub fn build(self) -> Result<Agent, AgentError> {
        if self.max_iterations == 0 {
            return Err(AgentError::config("max_iterations must be at least 1"));
        }
        let tools = ToolRegistry::new(self.tools)?;
        let system_prompt = self
            .system_prompt
            .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string());

        info!(
            provider = %self.provider.name(),
            tool_count = tools.len(),
            max_iterations = self.max_iterations,
            "Initializing agent."
        );

        Ok(Agent {
            provider: self.provider,
            tools,
            approval: self.approval,
            max_iterations: self.max_iterations,
            state: AgentState::new(system_prompt),
            phase: AgentPhase::AwaitingUserInput,
        })
    }
}

/// Drives a conversation with a completion provider, executing the tools it
/// asks for until it produces a final answer.
pub struct Agent {
    provider: Arc<dyn Provider>,
    tools: ToolRegistry,
    approval: Box<dyn ApprovalGate>,
    max_iterations: usize,
    state: AgentState,
    phase: AgentPhase,
}

impl Agent {
    /// An agent with the default system prompt, iteration limit and approval gate.
    pub fn new(provider: Arc<dyn Provider>, tools: Vec<ToolSpec>) -> Result<Self, AgentError> {
        AgentBuilder::new(provider).tools(tools).build()
    }

    pub fn builder(provider: Arc<dyn Provider>) -> AgentBuilder {
        AgentBuilder::new(provider)
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn messages(&self) -> &[ChatMessage] {
        self.state.messages()
    }

    pub fn phase(&self) -> AgentPhase {
        self.phase
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    fn set_phase(&mut self, phase: AgentPhase) {
        if self.phase != phase {
            trace!(from = ?self.phase, to = ?phase, "Agent phase change.");
            self.phase = phase;
        }
    }

    /// Clears the conversation back to the system message.
    pub fn reset(&mut self) {
        debug!(
            discarded = self.state.messages.len().saturating_sub(1),
            "Resetting conversation."
        );
        self.state.reset();
        self.set_phase(AgentPhase::AwaitingUserInput);
    }

    /// Adds `user_prompt` to the conversation and runs the tool loop.
    ///
    /// Tool failures of any kind are reported back to the model and do not end
    /// the run. Only a provider failure returns `Err`; the user message stays in
    /// the conversation in that case.
    pub async fn run(&mut self, user_prompt: &str) -> Result<AgentOutput, AgentError> {
        info!(
            num_messages = self.state.messages.len(),
            max_iterations = self.max_iterations,
            "Starting agent run."
        );

        self.state.iteration_count = 0;
        self.state.push(ChatMessage::user(user_prompt));

        let definitions = self.tools.definitions();
        let tools = if definitions.is_empty() {
            None
        } else {
            Some(definitions.as_slice())
        };
        let mut applied_tool_results: Vec<ToolExecutionResult> = Vec::new();

        while self.state.iteration_count < self.max_iterations {
            self.state.iteration_count += 1;
            let iteration = self.state.iteration_count;
            self.set_phase(AgentPhase::AwaitingCompletion);

            info!(iteration, "Starting agent iteration {}.", iteration);
            debug!(
                provider = %self.provider.name(),
                num_messages = self.state.messages.len(),
                num_tools = definitions.len(),
                "Requesting completion."
            );
            trace!(payload = %serde_json::to_string_pretty(&self.state.messages).unwrap_or_else(|e| format!("Serialization error: {}", e)), "Messages sent to provider");

            let response = match self.provider.get_completion(&self.state.messages, tools).await {
                Ok(response) => response,
                Err(e) => {
                    error!(iteration, error = ?e, "Completion request failed.");
                    self.set_phase(AgentPhase::AwaitingUserInput);
                    return Err(AgentError::Provider(e));
                }
            };
            trace!(response = %serde_json::to_string_pretty(&response).unwrap_or_else(|e| format!("Serialization error: {}", e)), "Provider response");

            let (content, tool_calls) = match response {
                ChatMessage::Assistant {
                    content,
                    tool_calls,
                } => (content, tool_calls),
                other => {
                    warn!(
                        role = other.role(),
                        "Provider returned a non-assistant message; using its content as the answer."
                    );
                    (other.content().map(str::to_string), Vec::new())
                }
            };

            if tool_calls.is_empty() {
                info!(iteration, "Received final response (no tool calls requested).");
                // A final assistant message needs content on the wire, even if empty.
                let answer = content.unwrap_or_default();
                self.state.push(ChatMessage::assistant(answer.clone()));
                self.set_phase(AgentPhase::Done);
                return Ok(AgentOutput {
                    outcome: RunOutcome::Completed(answer),
                    applied_tool_results,
                    iterations: iteration,
                });
            }

            info!(
                iteration,
                count = tool_calls.len(),
                "Model requested {} tool call(s).",
                tool_calls.len()
            );
            self.state
                .push(ChatMessage::assistant_tool_calls(content, tool_calls.clone()));
            self.set_phase(AgentPhase::ExecutingTools);

            for tool_call in &tool_calls {
                let result = self.execute_tool_call(tool_call).await;
                self.state
                    .push(ChatMessage::tool_result(&tool_call.id, &result.output));
                applied_tool_results.push(result);
            }
            debug!(
                count = tool_calls.len(),
                "Added {} tool result(s) to the conversation.",
                tool_calls.len()
            );
        }

        warn!(
            limit = self.max_iterations,
            "Agent reached maximum iteration limit."
        );
        self.set_phase(AgentPhase::Exhausted);
        Ok(AgentOutput {
            outcome: RunOutcome::MaxIterationsReached,
            applied_tool_results,
            iterations: self.state.iteration_count,
        })
    }

    async fn execute_tool_call(&self, tool_call: &ToolCall) -> ToolExecutionResult {
        let tool_name = tool_call.function.name.as_str();
        debug!(tool_call_id = %tool_call.id, tool_name = %tool_name, "Processing request for tool '{}'.", tool_name);
        trace!(arguments = %tool_call.function.arguments, "Raw arguments for '{}'", tool_name);

        let report = |input: JsonValue, output: String, status: ToolExecutionStatus| {
            ToolExecutionResult {
                tool_call_id: tool_call.id.clone(),
                tool_name: tool_name.to_string(),
                input,
                output,
                status,
            }
        };

        let Some(spec) = self.tools.get(tool_name) else {
            warn!(tool_call_id = %tool_call.id, tool_name = %tool_name, "Model requested an unknown tool.");
            return report(
                raw_input(tool_call),
                format!("Error: Tool '{}' not found", tool_name),
                ToolExecutionStatus::NotFound,
            );
        };

        let mut arguments = match tool_call.parse_arguments() {
            Ok(arguments) => arguments,
            Err(e) => {
                warn!(tool_call_id = %tool_call.id, tool_name = %tool_name, error = %e, "Failed to decode arguments for tool '{}'.", tool_name);
                return report(
                    raw_input(tool_call),
                    format!("Error: Invalid arguments for tool '{}': {}", tool_name, e),
                    ToolExecutionStatus::Failure,
                );
            }
        };

        if let Err(violation) = spec.parameters.validate(&arguments) {
            warn!(tool_call_id = %tool_call.id, tool_name = %tool_name, error = %violation, "Arguments for tool '{}' violate its schema.", tool_name);
            return report(
                JsonValue::Object(arguments),
                format!("Error: Invalid arguments for tool '{}': {}", tool_name, violation),
                ToolExecutionStatus::Failure,
            );
        }

        spec.parameters.normalize(&mut arguments);
        let input = ToolInput::new(arguments);

        if spec.requires_approval && !self.approval.approve(tool_name, &input) {
            info!(tool_call_id = %tool_call.id, tool_name = %tool_name, "Execution of tool '{}' was not approved.", tool_name);
            return report(
                input.to_json(),
                CANCELLED_MESSAGE.to_string(),
                ToolExecutionStatus::Denied,
            );
        }

        debug!(tool_call_id = %tool_call.id, tool_name = %tool_name, "Executing tool: '{}'", tool_name);
        let recorded_input = input.to_json();
        // A panicking handler fails only this call.
        let handler = Arc::clone(&spec.handler);
        match tokio::spawn(async move { handler.call(input).await }).await {
            Err(join_error) => {
                let reason = if join_error.is_panic() {
                    panic_message(join_error.into_panic())
                } else {
                    join_error.to_string()
                };
                error!(tool_call_id = %tool_call.id, tool_name = %tool_name, reason = %reason, "Tool '{}' panicked.", tool_name);
                report(
                    recorded_input,
                    format!("Error: Tool '{}' panicked: {}", tool_name, reason),
                    ToolExecutionStatus::Failure,
                )
            }
            Ok(Ok(output)) => {
                info!(tool_call_id = %tool_call.id, tool_name = %tool_name, "Tool '{}' executed successfully.", tool_name);
                trace!(tool_call_id = %tool_call.id, output = %output, "Output from tool '{}'", tool_name);
                report(recorded_input, output, ToolExecutionStatus::Success)
            }
            Ok(Err(e)) => {
                error!(tool_call_id = %tool_call.id, tool_name = %tool_name, error = ?e, "Execution failed for tool '{}'.", tool_name);
                report(
                    recorded_input,
                    format!("Error: {:#}", e),
                    ToolExecutionStatus::Failure,
                )
            }
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

/// Best-effort record of the arguments the model sent.
fn raw_input(tool_call: &ToolCall) -> JsonValue {
    serde_json::from_str(&tool_call.function.arguments)
        .unwrap_or_else(|_| JsonValue::String(tool_call.function.arguments.clone()))
}
