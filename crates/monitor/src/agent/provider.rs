//! LLM Provider Abstraction
//!
//! Provides a unified interface for different LLM providers using Rig.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use rig::completion::Prompt;
use rig::providers::{anthropic, openai};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key: Option<String>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-3-5-sonnet".to_string(),
            api_key: None,
        }
    }
}

/// Trait for LLM providers that can handle a preamble plus a prompt
#[async_trait::async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send a prompt to the LLM and get the free-text response
    async fn complete(&self, preamble: &str, prompt: &str) -> Result<String>;
}

/// Anthropic Claude provider using Rig
pub struct AnthropicProvider {
    client: anthropic::Client,
    model: String,
}

impl AnthropicProvider {
    pub fn new(api_key: Option<String>, model: &str) -> Result<Self> {
        let client = if let Some(key) = api_key {
            anthropic::Client::new(
                &key,
                "https://api.anthropic.com",
                None,
                anthropic::ANTHROPIC_VERSION_LATEST,
            )
        } else {
            // Reads ANTHROPIC_API_KEY
            anthropic::Client::from_env()
        };

        Ok(Self {
            client,
            model: model.to_string(),
        })
    }

    /// Map model name to Rig's model constant
    fn get_model_id(&self) -> &'static str {
        match self.model.as_str() {
            "claude-3-5-sonnet" | "claude-3-5-sonnet-20241022" => anthropic::CLAUDE_3_5_SONNET,
            "claude-3-7-sonnet" => anthropic::CLAUDE_3_7_SONNET,
            "claude-3-haiku" | "claude-3-haiku-20240307" => anthropic::CLAUDE_3_HAIKU,
            "claude-3-opus" | "claude-3-opus-20240229" => anthropic::CLAUDE_3_OPUS,
            _ => anthropic::CLAUDE_3_5_SONNET,
        }
    }
}

#[async_trait::async_trait]
impl LlmProvider for AnthropicProvider {
    async fn complete(&self, preamble: &str, prompt: &str) -> Result<String> {
        let agent = self
            .client
            .agent(self.get_model_id())
            .preamble(preamble)
            .build();

        let response = agent
            .prompt(prompt)
            .await
            .map_err(|e| anyhow::anyhow!("Anthropic API error: {:?}", e))?;

        Ok(response)
    }
}

/// OpenAI provider using Rig
pub struct OpenAiProvider {
    client: openai::Client,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<String>, model: &str) -> Result<Self> {
        let client = if let Some(key) = api_key {
            openai::Client::new(&key)
        } else {
            // Reads OPENAI_API_KEY
            openai::Client::from_env()
        };

        Ok(Self {
            client,
            model: model.to_string(),
        })
    }
}

#[async_trait::async_trait]
impl LlmProvider for OpenAiProvider {
    async fn complete(&self, preamble: &str, prompt: &str) -> Result<String> {
        let agent = self.client.agent(&self.model).preamble(preamble).build();

        let response = agent
            .prompt(prompt)
            .await
            .map_err(|e| anyhow::anyhow!("OpenAI API error: {:?}", e))?;

        Ok(response)
    }
}

/// Mock provider for testing
pub struct MockProvider;

#[async_trait::async_trait]
impl LlmProvider for MockProvider {
    async fn complete(&self, _preamble: &str, prompt: &str) -> Result<String> {
        if prompt.contains("crash loop") {
            Ok("The pod is crash looping after a bad rollout.\n\n\
                Run kubectl rollout restart deployment/pod-a to fix this."
                .to_string())
        } else if prompt.contains("ImagePullBackOff") {
            Ok("The image tag does not exist in the registry. \
                Check the deployment manifest; no command can fix this remotely."
                .to_string())
        } else {
            Ok("Logs look healthy. No action needed.".to_string())
        }
    }
}

/// Create a provider from configuration
pub fn create_provider(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    match config.provider.as_str() {
        "anthropic" | "claude" => {
            let provider = AnthropicProvider::new(config.api_key.clone(), &config.model)?;
            Ok(Arc::new(provider))
        }
        "openai" => {
            let provider = OpenAiProvider::new(config.api_key.clone(), &config.model)?;
            Ok(Arc::new(provider))
        }
        "mock" => Ok(Arc::new(MockProvider)),
        other => Err(anyhow::anyhow!("Unknown LLM provider: {}", other)),
    }
}
