// steward-cli/src/tools/file.rs
use anyhow::Result;

use steward_core::tools::fs::read_file;
use steward_core::{async_trait, ToolHandler, ToolInput, ToolParameter, ToolParametersDefinition, ToolSpec};

pub struct ReadFile;

#[async_trait]
impl ToolHandler for ReadFile {
    async fn call(&self, input: ToolInput) -> Result<String> {
        let filepath: String = input.required("filepath")?;
        read_file(&filepath).await
    }
}

pub fn read_file_tool() -> ToolSpec {
    ToolSpec::new(
        "read_file",
        "Read the contents of a text file",
        ToolParametersDefinition::new().property(
            "filepath",
            ToolParameter::string("Path to the file"),
            true,
        ),
        ReadFile,
    )
}
