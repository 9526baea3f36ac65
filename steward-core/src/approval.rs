// steward-core/src/approval.rs

//! Yes/no decision sources consulted before running tools flagged
//! `requires_approval`.

use crate::models::tools::ToolInput;

/// Decides whether a sensitive tool call may run.
///
/// Called synchronously from the agent loop; blocking on a human is fine.
pub trait ApprovalGate: Send + Sync {
    fn approve(&self, tool_name: &str, arguments: &ToolInput) -> bool;
}

impl<F> ApprovalGate for F
where
    F: Fn(&str, &ToolInput) -> bool + Send + Sync,
{
    fn approve(&self, tool_name: &str, arguments: &ToolInput) -> bool {
        self(tool_name, arguments)
    }
}

/// Approves everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoApprove;

impl ApprovalGate for AutoApprove {
    fn approve(&self, _tool_name: &str, _arguments: &ToolInput) -> bool {
        true
    }
}

/// Denies everything. The agent's default gate.
#[derive(Debug, Clone, Copy, Default)]
pub struct DenyAll;

impl ApprovalGate for DenyAll {
    fn approve(&self, _tool_name: &str, _arguments: &ToolInput) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_is_a_gate() {
        let only_reads = |name: &str, _: &ToolInput| name.starts_with("read_");
        let input = ToolInput::default();
        assert!(only_reads.approve("read_file", &input));
        assert!(!only_reads.approve("bash_command", &input));
        assert!(AutoApprove.approve("anything", &input));
        assert!(!DenyAll.approve("anything", &input));
    }
}
