// steward-cli/src/tools/shell.rs
use anyhow::Result;
use std::path::PathBuf;
use std::time::Duration;
use tracing::debug;

use steward_core::tools::shell::{run_bash_command, DEFAULT_COMMAND_TIMEOUT};
use steward_core::{async_trait, ToolHandler, ToolInput, ToolParameter, ToolParametersDefinition, ToolSpec};

pub struct BashCommand {
    working_dir: PathBuf,
    timeout: Duration,
}

#[async_trait]
impl ToolHandler for BashCommand {
    async fn call(&self, input: ToolInput) -> Result<String> {
        let command: String = input.required("command")?;
        debug!(command = %command, working_dir = ?self.working_dir, "Running bash_command tool");
        run_bash_command(&command, Some(&self.working_dir), self.timeout).await
    }
}

pub fn bash_command_tool(working_dir: PathBuf) -> ToolSpec {
    ToolSpec::new(
        "bash_command",
        "Execute a bash command (e.g., 'ls -la', 'ps aux | grep python')",
        ToolParametersDefinition::new().property(
            "command",
            ToolParameter::string("The bash command to execute"),
            true,
        ),
        BashCommand {
            working_dir,
            timeout: DEFAULT_COMMAND_TIMEOUT,
        },
    )
    .requiring_approval()
}
