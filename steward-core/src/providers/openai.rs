// steward-core/src/providers/openai.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, to_value, Map, Value};
use tracing::{error, trace};

use super::Provider;
use crate::api;
use crate::config::ModelConfig;
use crate::models::chat::ChatMessage;
use crate::models::tools::ToolDefinition;

pub const DEFAULT_OPENAI_ENDPOINT: &str = "https://api.openai.com/v1/chat/completions";

#[derive(Deserialize, Debug)]
struct ApiResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
struct Choice {
    message: ChatMessage,
}

/// Chat-completions client. Also works against OpenAI-compatible servers
/// (LiteLLM, Ollama, OpenRouter) by pointing `endpoint` at them.
#[derive(Clone)]
pub struct OpenAIProvider {
    config: ModelConfig,
    http_client: Client,
    api_key: String,
}

impl OpenAIProvider {
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
            .unwrap_or(DEFAULT_OPENAI_ENDPOINT)
    }

    fn build_request(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<Value> {
        let mut request_map = Map::new();
        request_map.insert("model".to_string(), json!(self.config.model_name));
        request_map.insert("messages".to_string(), to_value(messages)?);

        if let Some(tool_definitions) = tools.filter(|t| !t.is_empty()) {
            let tools_json: Vec<Value> = tool_definitions
                .iter()
                .map(|tool_def| {
                    json!({
                        "type": "function",
                        "function": tool_def
                    })
                })
                .collect();
            request_map.insert("tools".to_string(), Value::Array(tools_json));
            request_map.insert("tool_choice".to_string(), json!("auto"));
        }

        api::merge_parameters(&mut request_map, self.config.parameters.as_ref())?;
        Ok(Value::Object(request_map))
    }
}

#[async_trait]
impl Provider for OpenAIProvider {
    fn name(&self) -> &str {
        &self.config.model_name
    }

    async fn get_completion(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ChatMessage> {
        let body = self.build_request(messages, tools)?;
        let auth = format!("Bearer {}", self.api_key);
        let headers: Vec<(&str, &str)> = if self.api_key.is_empty() {
            Vec::new()
        } else {
            vec![("Authorization", auth.as_str())]
        };

        let response_value = api::post_json(&self.http_client, self.endpoint(), &headers, &body)
            .await
            .map_err(|e| {
                error!(error = %e, model = %self.config.model_name, "OpenAI request failed");
                e
            })?;

        let api_response: ApiResponse = serde_json::from_value(response_value)
            .context("Failed to deserialize chat completion response")?;
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("API response contained no choices"))?;
        trace!(message = ?choice.message, "Chat completion choice");
        Ok(choice.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::chat::ToolCall;
    use crate::models::tools::{ToolParameter, ToolParametersDefinition};
    use httpmock::prelude::*;

    fn weather_tool() -> ToolDefinition {
        ToolDefinition {
            name: "get_weather".to_string(),
            description: "Get the current weather for a location".to_string(),
            parameters: ToolParametersDefinition::new().property(
                "location",
                ToolParameter::string("The city name"),
                true,
            ),
        }
    }

    fn provider(endpoint: String, api_key: &str, parameters: Option<toml::Value>) -> OpenAIProvider {
        OpenAIProvider::new(
            ModelConfig {
                model_name: "gpt-4o-mini".to_string(),
                parameters,
                endpoint: Some(endpoint),
            },
            Client::new(),
            api_key.to_string(),
        )
    }

    #[test]
    fn test_build_request_with_tools_and_parameters() {
        let mut params = toml::value::Table::new();
        params.insert("temperature".to_string(), toml::Value::Float(0.25));
        let provider = provider(
            "http://fake.endpoint/v1".to_string(),
            "",
            Some(toml::Value::Table(params)),
        );
        let messages = vec![ChatMessage::system("sys"), ChatMessage::user("Hi")];
        let tools = vec![weather_tool()];

        let body = provider.build_request(&messages, Some(&tools)).unwrap();
        assert_eq!(body["model"], json!("gpt-4o-mini"));
        assert_eq!(body["messages"], json!(messages));
        assert_eq!(body["tools"][0]["type"], json!("function"));
        assert_eq!(body["tools"][0]["function"]["name"], json!("get_weather"));
        assert_eq!(body["tool_choice"], json!("auto"));
        assert_eq!(body["temperature"], json!(0.25));
    }

    #[test]
    fn test_build_request_without_tools() {
        let provider = provider("http://fake.endpoint/v1".to_string(), "", None);
        let body = provider
            .build_request(&[ChatMessage::user("Hi")], None)
            .unwrap();
        assert!(body.get("tools").is_none());
        assert!(body.get("tool_choice").is_none());
    }

    #[tokio::test]
    async fn test_get_completion_parses_tool_calls() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/chat/completions")
                    .header("Authorization", "Bearer sk-test");
                then.status(200).json_body(json!({
                    "id": "chatcmpl-1",
                    "choices": [{
                        "index": 0,
                        "message": {
                            "role": "assistant",
                            "content": null,
                            "tool_calls": [{
                                "id": "call_1",
                                "type": "function",
                                "function": { "name": "get_weather", "arguments": "{\"location\":\"Paris\"}" }
                            }]
                        },
                        "finish_reason": "tool_calls"
                    }]
                }));
            })
            .await;

        let provider = provider(server.url("/v1/chat/completions"), "sk-test", None);
        let tools = vec![weather_tool()];
        let message = provider
            .get_completion(&[ChatMessage::user("Weather in Paris?")], Some(&tools))
            .await
            .unwrap();
        mock.assert_async().await;

        assert_eq!(
            message.tool_calls(),
            &[ToolCall::new("call_1", "get_weather", &json!({ "location": "Paris" }))]
        );
        assert_eq!(message.content(), None);
    }

    #[tokio::test]
    async fn test_get_completion_errors() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/empty");
                then.status(200).json_body(json!({ "id": "x", "choices": [] }));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/denied");
                then.status(401).body("invalid api key");
            })
            .await;

        let empty = provider(server.url("/empty"), "", None)
            .get_completion(&[ChatMessage::user("Hi")], None)
            .await
            .unwrap_err();
        assert!(empty.to_string().contains("no choices"));

        let denied = provider(server.url("/denied"), "", None)
            .get_completion(&[ChatMessage::user("Hi")], None)
            .await
            .unwrap_err();
        assert!(denied.to_string().contains("401"));
    }
}
