// steward-core/src/providers/mod.rs
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::config::{AgentConfig, ProviderInstanceConfig};
use crate::models::chat::ChatMessage;
use crate::models::tools::ToolDefinition;

pub mod anthropic;
pub mod openai;

pub use anthropic::AnthropicProvider;
pub use openai::OpenAIProvider;

/// A language model that turns a conversation into the next assistant message.
#[async_trait]
pub trait Provider: Send + Sync {
    /// `tools` is `None` when the agent has no tools registered.
    async fn get_completion(
        &self,
        messages: &[ChatMessage],
        tools: Option<&[ToolDefinition]>,
    ) -> Result<ChatMessage>;

    fn name(&self) -> &str;
}

pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn Provider>>,
    default_provider: String,
}

impl ProviderRegistry {
    pub fn new(default_provider: String) -> Self {
        Self {
            providers: HashMap::new(),
            default_provider,
        }
    }

    /// Builds every provider listed in `config`.
    pub fn from_config(config: &AgentConfig, http_client: &Client) -> Result<Self> {
        let mut registry = Self::new(config.default_provider.clone());
        for (id, provider_conf) in &config.providers {
            let provider = build_provider(id, provider_conf, http_client.clone())?;
            registry.register(id.clone(), provider);
        }
        Ok(registry)
    }

    pub fn register(&mut self, id: String, provider: Arc<dyn Provider>) {
        debug!(provider_id = %id, model = %provider.name(), "Registering provider.");
        self.providers.insert(id, provider);
    }

    pub fn get(&self, id: &str) -> Result<Arc<dyn Provider>> {
        self.providers
            .get(id)
            .cloned()
            .ok_or_else(|| anyhow!("Provider not found: {}", id))
    }

    pub fn default(&self) -> Result<Arc<dyn Provider>> {
        self.get(&self.default_provider)
    }

    pub fn default_provider_id(&self) -> &str {
        &self.default_provider
    }

    pub fn ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.providers.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Creates the provider described by one `[providers.<id>]` table.
///
/// A missing API key variable only logs a warning; the request will then be
/// sent without credentials, which local OpenAI-compatible servers accept.
pub fn build_provider(
    id: &str,
    provider_conf: &ProviderInstanceConfig,
    http_client: Client,
) -> Result<Arc<dyn Provider>> {
    let api_key = if provider_conf.api_key_env_var.is_empty() {
        String::new()
    } else {
        match std::env::var(&provider_conf.api_key_env_var) {
            Ok(key) => key,
            Err(e) => {
                warn!(provider_id = %id, env_var = %provider_conf.api_key_env_var, error = %e, "API key environment variable not set or invalid");
                String::new()
            }
        }
    };

    let model_config = provider_conf.model_config.clone();
    let provider: Arc<dyn Provider> = match provider_conf.provider_type.as_str() {
        "openai" => Arc::new(OpenAIProvider::new(model_config, http_client, api_key)),
        "anthropic" => Arc::new(AnthropicProvider::new(model_config, http_client, api_key)),
        other => {
            return Err(anyhow!("Unsupported provider type: {}", other))
                .with_context(|| format!("Failed to build provider '{}'", id))
        }
    };
    Ok(provider)
}
