// steward-cli/src/approval.rs
use colored::*;
use dialoguer::{theme::ColorfulTheme, Confirm};
use indicatif::ProgressBar;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};

use steward_core::{ApprovalGate, ToolInput};

/// The spinner currently on screen, if any. Prompts are drawn with it
/// suspended so the two do not overwrite each other.
pub type SpinnerSlot = Arc<Mutex<Option<ProgressBar>>>;

/// Asks on the terminal before a sensitive tool runs. Defaults to "no".
pub struct ConsoleApproval {
    spinner: SpinnerSlot,
}

impl ConsoleApproval {
    pub fn new(spinner: SpinnerSlot) -> Self {
        Self { spinner }
    }

    fn ask(tool_name: &str, arguments: &ToolInput) -> dialoguer::Result<bool> {
        let pretty_args = serde_json::to_string_pretty(&arguments.to_json())
            .unwrap_or_else(|_| arguments.to_json().to_string());
        println!("\n{}", "[APPROVAL REQUIRED]".yellow().bold());
        println!("{} {}", "Tool:".bold(), tool_name.cyan());
        println!("{} {}", "Args:".bold(), pretty_args);
        Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt("Approve?")
            .default(false)
            .interact()
    }
}

impl ApprovalGate for ConsoleApproval {
    fn approve(&self, tool_name: &str, arguments: &ToolInput) -> bool {
        let answer = match self.spinner.lock().ok().and_then(|slot| slot.clone()) {
            Some(spinner) => spinner.suspend(|| Self::ask(tool_name, arguments)),
            None => Self::ask(tool_name, arguments),
        };
        match answer {
            Ok(approved) => {
                info!(tool_name = %tool_name, approved, "Approval decision.");
                approved
            }
            Err(e) => {
                warn!(tool_name = %tool_name, error = %e, "Could not read approval; denying.");
                false
            }
        }
    }
}
