// steward-core/src/api.rs

//! HTTP plumbing shared by the completion providers.

use anyhow::{anyhow, Context, Result};
use reqwest::Client;
use serde_json::{to_value, Map, Value};
use tracing::debug;

/// POSTs `body` as JSON and returns the decoded JSON response.
///
/// Non-2xx responses become an error carrying the status and body text.
/// Failures are not retried.
pub async fn post_json(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
    body: &Value,
) -> Result<Value> {
    debug!(
        "Request URL: {}\nRequest JSON: {}",
        url,
        serde_json::to_string_pretty(body)?
    );

    let mut request = client
        .post(url)
        .header("Content-Type", "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }

    let response = request
        .json(body)
        .send()
        .await
        .with_context(|| format!("Failed to send request to {}", url))?;

    let status = response.status();
    if !status.is_success() {
        let error_text = response
            .text()
            .await
            .context("Failed to read API error response body")?;
        debug!("API request failed. Status: {}, Body: {}", status, error_text);
        return Err(anyhow!("API error: {} - {}", status, error_text));
    }

    let response_value: Value = response
        .json()
        .await
        .context("Failed to read API response body as JSON")?;
    if !response_value.is_object() {
        return Err(anyhow!(
            "API response was not a JSON object: {}",
            response_value
        ));
    }
    debug!(
        "API response: {}",
        serde_json::to_string_pretty(&response_value)?
    );
    Ok(response_value)
}

/// Copies configured model parameters into the top level of a request body.
///
/// Later keys win, so parameters can override defaults already in `body`.
pub fn merge_parameters(body: &mut Map<String, Value>, parameters: Option<&toml::Value>) -> Result<()> {
    let Some(table) = parameters.and_then(toml::Value::as_table) else {
        return Ok(());
    };
    for (key, value) in table {
        let json_value = to_value(value.clone())
            .with_context(|| format!("Failed to convert TOML parameter '{}' to JSON", key))?;
        body.insert(key.clone(), json_value);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn test_merge_parameters_overrides_and_converts() {
        let mut body = Map::new();
        body.insert("max_tokens".to_string(), json!(4096));

        let mut params = toml::value::Table::new();
        params.insert("temperature".to_string(), toml::Value::Float(0.5));
        params.insert("max_tokens".to_string(), toml::Value::Integer(100));
        merge_parameters(&mut body, Some(&toml::Value::Table(params))).unwrap();

        assert_eq!(body["temperature"], json!(0.5));
        assert_eq!(body["max_tokens"], json!(100));

        merge_parameters(&mut body, None).unwrap();
        assert_eq!(body.len(), 2);
    }

    #[tokio::test]
    async fn test_post_json_sends_headers_and_body() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/echo")
                    .header("x-test", "yes")
                    .json_body(json!({ "ping": true }));
                then.status(200).json_body(json!({ "pong": true }));
            })
            .await;

        let client = Client::new();
        let value = post_json(
            &client,
            &server.url("/echo"),
            &[("x-test", "yes")],
            &json!({ "ping": true }),
        )
        .await
        .unwrap();
        mock.assert_async().await;
        assert_eq!(value, json!({ "pong": true }));
    }

    #[tokio::test]
    async fn test_post_json_reports_status_without_retrying() {
        let server = MockServer::start_async().await;
        let mock = server
            .mock_async(|when, then| {
                when.method(POST).path("/fail");
                then.status(500).body("Server error");
            })
            .await;

        let client = Client::new();
        let result = post_json(&client, &server.url("/fail"), &[], &json!({})).await;
        assert_eq!(mock.hits(), 1);
        let message = result.unwrap_err().to_string();
        assert!(message.contains("API error: 500"), "{}", message);
        assert!(message.contains("Server error"), "{}", message);
    }
}
