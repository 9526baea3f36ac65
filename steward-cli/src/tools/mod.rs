// steward-cli/src/tools/mod.rs

//! The tool set the interactive assistant registers with its agent.

use std::path::PathBuf;

use steward_core::ToolSpec;

pub mod calculator;
pub mod file;
pub mod search;
pub mod shell;
pub mod weather;

/// Every tool, in the order the model sees them. Only `bash_command`
/// requires approval.
pub fn build_tool_set(working_dir: PathBuf) -> Vec<ToolSpec> {
    vec![
        shell::bash_command_tool(working_dir),
        file::read_file_tool(),
        weather::get_weather_tool(),
        calculator::calculator_tool(),
        search::search_database_tool(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use steward_core::ToolRegistry;

    #[test]
    fn test_tool_set_registers_cleanly() {
        let registry = ToolRegistry::new(build_tool_set(PathBuf::from("."))).unwrap();
        assert_eq!(
            registry.names().collect::<Vec<_>>(),
            vec!["bash_command", "read_file", "get_weather", "calculator", "search_database"]
        );
        let needing_approval: Vec<&str> = registry
            .names()
            .filter(|name| registry.get(name).is_some_and(|spec| spec.requires_approval))
            .collect();
        assert_eq!(needing_approval, vec!["bash_command"]);
    }
}
