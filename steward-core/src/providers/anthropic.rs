// steward-core/src/providers/anthropic.rs
use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tracing::{error, trace};

use super::Provider;
use crate::api;
use crate::config::ModelConfig;
use crate::models::chat::{ChatMessage, ToolCall};
use crate::models::tools::ToolDefinition;

pub const DEFAULT_ANTHROPIC_ENDPOINT: &str = "https://api.anthropic.com/v1/messages";
pub const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: u32 = 4096;

#[derive(Deserialize, Debug)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text {
        text: String,
    },
    ToolUse {
        id: String,
        name: String,
        #[serde(default)]
        input: Value,
    },
    #[serde(other)]
    Other,
}

/// Client for the Anthropic Messages API.
///
/// The conversation is kept in the chat-completions shape and translated on
/// every request.
#[derive(Clone)]
pub struct AnthropicProvider {
    config: ModelConfig,
    http_client: Client,
    api_key: String,
}

impl AnthropicProvider {
    pub fn new(config: ModelConfig, http_client: Client, api_key: String) -> Self {
        Self {
            config,
            http_client,
            api_key,
        }
    }

    fn endpoint(&self) -> &str {
        self.config
            .endpoint
            .as_deref()
            .unwrap_or(DEFAULT_ANTHROPIC_ENDPOINT)
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<Value> {
        let (system, converted) = convert_messages(messages);

        let mut request_map = Map::new();
        request_map.insert("model".to_string(), json!(self.config.model_name));
        request_map.insert("max_tokens".to_string(), json!(DEFAULT_MAX_TOKENS));
        if let Some(system) = system {
            request_map.insert("system".to_string(), json!(system));
        }
        request_map.insert("messages".to_string(), Value::Array(converted));

        if let Some(tool_definitions) = tools.filter(|t| !t.is_empty()) {
            let tools_json: Vec<Value> = tool_definitions
                .iter()
                .map(|tool_def| {
                    json!({
                        "name": tool_def.name,
                        "description": tool_def.description,
                        "input_schema": tool_def.parameters,
                    })
                })
                .collect();
            request_map.insert("tools".to_string(), Value::Array(tools_json));
        }

        api::merge_parameters(&mut request_map, self.config.parameters.as_ref())?;
        Ok(Value::Object(request_map))
    }
}

/// Splits out the system prompt and rewrites the rest into Messages API turns.
///
/// Tool results answering the same assistant turn are folded into a single
/// `user` message, since the API requires strict user/assistant alternation.
fn convert_messages(messages: &[ChatMessage]) -> (Option<String>, Vec<Value>) {
    let mut system_parts: Vec<&str> = Vec::new();
    let mut converted: Vec<Value> = Vec::new();

    for message in messages {
        match message {
            ChatMessage::System { content } => system_parts.push(content),
            ChatMessage::User { content } => {
                converted.push(json!({ "role": "user", "content": content }));
            }
            ChatMessage::Assistant {
                content,
                tool_calls,
            } => {
                let mut blocks: Vec<Value> = Vec::new();
                if let Some(text) = content.as_deref().filter(|t| !t.is_empty()) {
                    blocks.push(json!({ "type": "text", "text": text }));
                }
                for call in tool_calls {
                    blocks.push(json!({
                        "type": "tool_use",
                        "id": call.id,
                        "name": call.function.name,
                        "input": call.parse_arguments().unwrap_or_default(),
                    }));
                }
                if !blocks.is_empty() {
                    converted.push(json!({ "role": "assistant", "content": blocks }));
                }
            }
            ChatMessage::Tool {
                tool_call_id,
                content,
            } => {
                let block = json!({
                    "type": "tool_result",
                    "tool_use_id": tool_call_id,
                    "content": content,
                });
                let previous_results = converted
                    .last_mut()
                    .filter(|last| last["role"] == "user")
                    .and_then(|last| last["content"].as_array_mut());
                match previous_results {
                    Some(blocks) => blocks.push(block),
                    None => converted.push(json!({ "role": "user", "content": [block] })),
                }
            }
        }
    }

    let system = if system_parts.is_empty() {
        None
    } else {
        Some(system_parts.join("\n\n"))
    };
    (system, converted)
}

fn parse_response(response: MessagesResponse) -> ChatMessage {
    let mut text_parts: Vec<String> = Vec::new();
    let mut tool_calls: Vec<ToolCall> = Vec::new();
    for block in response.content {
        match block {
            ContentBlock::Text { text } => text_parts.push(text),
            ContentBlock::ToolUse { id, name, input } => {
                let input = if input.is_null() { json!({}) } else { input };
                tool_calls.push(ToolCall::new(id, name, &input));
            }
            ContentBlock::Other => {}
        }
    }
    let content = if text_parts.is_empty() {
        None
    } else {
        Some(text_parts.concat())
    };
    ChatMessage::assistant_tool_calls(content, tool_calls)
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.config.model_name
    }

    async fn get_completion(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ChatMessage> {
        let body = self.build_request(messages, tools)?;
        let headers = [
            ("x-api-key", self.api_key.as_str()),
            ("anthropic-version", ANTHROPIC_VERSION),
        ];

        let response_value = api::post_json(&self.http_client, self.endpoint(), &headers, &body)
            .await
            .map_err(|e| {
                error!(error = %e, model = %self.config.model_name, "Anthropic request failed");
                e
            })?;

        let response: MessagesResponse = serde_json::from_value(response_value)
            .context("Failed to deserialize Anthropic messages response")?;
        let message = parse_response(response);
        trace!(message = ?message, "Anthropic response converted");
        Ok(message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::tools::{ToolParameter, ToolParametersDefinition};
    use httpmock::prelude::*;

    fn provider(endpoint: Option<String>, parameters: Option<toml::Value>) -> AnthropicProvider {
        AnthropicProvider::new(
            ModelConfig {
                model_name: "claude-3-5-sonnet-latest".to_string(),
                parameters,
                endpoint,
            },
            Client::new(),
            "ak-test".to_string(),
        )
    }

    #[test]
    fn test_convert_messages_groups_tool_results() {
        let messages = vec![
            ChatMessage::system("Be brief."),
            ChatMessage::user("Weather in Paris and Tokyo?"),
            ChatMessage::assistant_tool_calls(
                Some("Checking.".to_string()),
                vec![
                    ToolCall::new("toolu_1", "get_weather", &json!({ "location": "Paris" })),
                    ToolCall::new("toolu_2", "get_weather", &json!({ "location": "Tokyo" })),
                ],
            ),
            ChatMessage::tool_result("toolu_1", "Paris: 18°C"),
            ChatMessage::tool_result("toolu_2", "Tokyo: 24°C"),
            ChatMessage::assistant("Both are mild."),
        ];

        let (system, converted) = convert_messages(&messages);
        assert_eq!(system.as_deref(), Some("Be brief."));
        assert_eq!(
            Value::Array(converted),
            json!([
                { "role": "user", "content": "Weather in Paris and Tokyo?" },
                { "role": "assistant", "content": [
                    { "type": "text", "text": "Checking." },
                    { "type": "tool_use", "id": "toolu_1", "name": "get_weather", "input": { "location": "Paris" } },
                    { "type": "tool_use", "id": "toolu_2", "name": "get_weather", "input": { "location": "Tokyo" } }
                ]},
                { "role": "user", "content": [
                    { "type": "tool_result", "tool_use_id": "toolu_1", "content": "Paris: 18°C" },
                    { "type": "tool_result", "tool_use_id": "toolu_2", "content": "Tokyo: 24°C" }
                ]},
                { "role": "assistant", "content": [ { "type": "text", "text": "Both are mild." } ] }
            ])
        );
    }

    #[test]
    fn test_build_request_defaults_and_overrides() {
        let tools = vec![ToolDefinition {
            name: "calculator".to_string(),
            description: "Do arithmetic".to_string(),
            parameters: ToolParametersDefinition::new().property("a", ToolParameter::number("a"), true),
        }];

        let body = provider(None, None)
            .build_request(&[ChatMessage::user("2+2")], Some(&tools))
            .unwrap();
        assert_eq!(body["max_tokens"], json!(4096));
        assert!(body.get("system").is_none());
        assert_eq!(body["tools"][0]["name"], json!("calculator"));
        assert_eq!(body["tools"][0]["input_schema"]["type"], json!("object"));

        let mut params = toml::value::Table::new();
        params.insert("max_tokens".to_string(), toml::Value::Integer(256));
        let body = provider(None, Some(toml::Value::Table(params)))
            .build_request(&[ChatMessage::user("2+2")], None)
            .unwrap();
        assert_eq!(body["max_tokens"], json!(256));
        assert!(body.get("tools").is_none());
    }

    #[tokio::test]
    async fn test_get_completion_parses_blocks() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/messages")
                    .header("x-api-key", "ak-test")
                    .header("anthropic-version", ANTHROPIC_VERSION);
                then.status(200).json_body(json!({
                    "id": "msg_1",
                    "type": "message",
                    "role": "assistant",
                    "content": [
                        { "type": "text", "text": "Let me check." },
                        { "type": "tool_use", "id": "toolu_9", "name": "get_weather", "input": { "location": "London" } }
                    ],
                    "stop_reason": "tool_use"
                }));
            })
            .await;

        let message = provider(Some(server.url("/v1/messages")), None)
            .get_completion(&[ChatMessage::user("London?")], None)
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(message.content(), Some("Let me check."));
        assert_eq!(
            message.tool_calls(),
            &[ToolCall::new("toolu_9", "get_weather", &json!({ "location": "London" }))]
        );
    }
}
