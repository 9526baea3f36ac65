// steward-cli/src/tools/search.rs
use anyhow::Result;
use serde::Deserialize;

use steward_core::{handler_fn, ToolInput, ToolParameter, ToolParametersDefinition, ToolSpec};

const MOCK_RESULT_LIMIT: u32 = 3;

fn default_max_results() -> u32 {
    5
}

#[derive(Deserialize)]
struct SearchParams {
    query: String,
    #[serde(default = "default_max_results")]
    max_results: u32,
    #[serde(default)]
    category: Option<String>,
}

/// Mock database search: at most three synthetic hits.
pub fn search_database(query: &str, max_results: u32, category: Option<&str>) -> String {
    let suffix = category.map(|c| format!(" in {}", c)).unwrap_or_default();
    (1..=max_results.min(MOCK_RESULT_LIMIT))
        .map(|i| format!("Result {}: {}{}", i, query, suffix))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn search_database_tool() -> ToolSpec {
    ToolSpec::new(
        "search_database",
        "Search the database for relevant information. Can filter by category.",
        ToolParametersDefinition::new()
            .property("query", ToolParameter::string("The search query"), true)
            .property(
                "max_results",
                ToolParameter::integer("Maximum number of results to return")
                    .with_range(Some(1.0), Some(20.0)),
                false,
            )
            .property(
                "category",
                ToolParameter::string("Optional category filter"),
                false,
            ),
        handler_fn(|input: ToolInput| -> Result<String> {
            let params: SearchParams = input.parse()?;
            Ok(search_database(
                &params.query,
                params.max_results,
                params.category.as_deref(),
            ))
        }),
    )
}
