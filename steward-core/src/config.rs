// steward-core/src/config.rs

//! Handles configuration structures and parsing for the agent library.

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use url::Url;

use crate::agent::DEFAULT_SYSTEM_PROMPT;

/// Provider types [`crate::providers::build_provider`] knows how to build.
pub const SUPPORTED_PROVIDER_TYPES: &[&str] = &["openai", "anthropic"];

#[derive(Deserialize, Debug, Clone)]
pub struct AgentConfig {
    #[serde(default)]
    pub system_prompt: Option<String>,
    pub default_provider: String,
    #[serde(default)]
    pub max_iterations: Option<usize>,
    #[serde(default)]
    pub providers: HashMap<String, ProviderInstanceConfig>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ProviderInstanceConfig {
    // `type` in TOML
    #[serde(rename = "type")]
    pub provider_type: String,
    #[serde(default)]
    pub api_key_env_var: String,
    pub model_config: ModelConfig,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ModelConfig {
    pub model_name: String,
    #[serde(default)]
    pub parameters: Option<toml::Value>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

impl AgentConfig {
    pub fn from_toml_str(config_toml_content: &str) -> Result<AgentConfig> {
        let config: AgentConfig = match toml::from_str(config_toml_content) {
            Ok(cfg) => cfg,
            Err(e) => {
                tracing::error!(error = %e, "Failed to parse TOML content");
                return Err(anyhow!(e))
                    .context("Failed to parse configuration TOML content. Check TOML syntax.");
            }
        };

        if let Some(prompt) = &config.system_prompt {
            if prompt.trim().is_empty() {
                return Err(anyhow!("'system_prompt' in config content is empty."));
            }
        }
        if config.default_provider.trim().is_empty() {
            return Err(anyhow!("'default_provider' key in config content is empty."));
        }
        if !config.providers.contains_key(&config.default_provider) {
            return Err(anyhow!(
                "Default provider '{}' not found in [providers] map.",
                config.default_provider
            ));
        }
        if config.max_iterations == Some(0) {
            return Err(anyhow!("'max_iterations' must be at least 1."));
        }

        for (key, provider) in &config.providers {
            if provider.provider_type.trim().is_empty() {
                return Err(anyhow!("Provider '{}' is missing 'type' (provider_type).", key));
            }
            if !SUPPORTED_PROVIDER_TYPES.contains(&provider.provider_type.as_str()) {
                return Err(anyhow!(
                    "Provider '{}' has unsupported type '{}'. Expected one of: {}.",
                    key,
                    provider.provider_type,
                    SUPPORTED_PROVIDER_TYPES.join(", ")
                ));
            }
            if provider.model_config.model_name.trim().is_empty() {
                return Err(anyhow!("Provider '{}' is missing 'model_config.model_name'.", key));
            }
            if let Some(endpoint) = &provider.model_config.endpoint {
                if endpoint.trim().is_empty() {
                    return Err(anyhow!("Provider '{}' has an empty 'model_config.endpoint'.", key));
                }
                Url::parse(endpoint).with_context(|| {
                    format!(
                        "Invalid URL format for endpoint ('{}') in provider '{}'.",
                        endpoint, key
                    )
                })?;
            }
            if let Some(params) = &provider.model_config.parameters {
                if !params.is_table() {
                    return Err(anyhow!(
                        "Provider '{}' has invalid 'model_config.parameters'. Expected a TOML table.",
                        key
                    ));
                }
            }
        }

        tracing::info!("Successfully parsed and validated agent configuration.");
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<AgentConfig> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        Self::from_toml_str(&content)
            .with_context(|| format!("Failed to parse or validate config file: {:?}", path))
    }

    /// Single OpenAI provider reading its key from `OPENAI_API_KEY`.
    pub fn openai_default() -> AgentConfig {
        let mut providers = HashMap::new();
        providers.insert(
            "openai".to_string(),
            ProviderInstanceConfig {
                provider_type: "openai".to_string(),
                api_key_env_var: "OPENAI_API_KEY".to_string(),
                model_config: ModelConfig {
                    model_name: "gpt-4o-mini".to_string(),
                    parameters: None,
                    endpoint: None,
                },
            },
        );
        AgentConfig {
            system_prompt: None,
            default_provider: "openai".to_string(),
            max_iterations: None,
            providers,
        }
    }

    pub fn system_prompt(&self) -> &str {
        self.system_prompt.as_deref().unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    pub fn provider(&self, id: &str) -> Result<&ProviderInstanceConfig> {
        self.providers
            .get(id)
            .ok_or_else(|| anyhow!("Provider '{}' is not configured.", id))
    }
}
