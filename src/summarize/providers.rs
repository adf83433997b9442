//! Concrete completion providers.
//!
//! Deepseek exposes an OpenAI-compatible API, so both providers share the
//! same client machinery and differ only in credential, model, and endpoint.

use super::CompletionProvider;
use crate::error::{Result, YouLearnError};
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
    CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;

const DEEPSEEK_API_BASE: &str = "https://api.deepseek.com/v1";

/// OpenAI chat-completion provider.
pub struct OpenAiProvider {
    api_key: Option<String>,
    model: String,
}

impl OpenAiProvider {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self { api_key, model }
    }
}

#[async_trait]
impl CompletionProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "OpenAI"
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(YouLearnError::CredentialMissing("OpenAI"))?;
        let config = OpenAIConfig::new().with_api_key(key);
        run_completion(config, &self.model, system, user, max_tokens, temperature).await
    }
}

/// Deepseek chat-completion provider (OpenAI wire protocol, different base).
pub struct DeepseekProvider {
    api_key: Option<String>,
    model: String,
}

impl DeepseekProvider {
    pub fn new(api_key: Option<String>, model: String) -> Self {
        Self { api_key, model }
    }
}

#[async_trait]
impl CompletionProvider for DeepseekProvider {
    fn name(&self) -> &'static str {
        "Deepseek"
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(
        &self,
        system: &str,
        user: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .ok_or(YouLearnError::CredentialMissing("Deepseek"))?;
        let config = OpenAIConfig::new()
            .with_api_key(key)
            .with_api_base(DEEPSEEK_API_BASE);
        run_completion(config, &self.model, system, user, max_tokens, temperature).await
    }
}

async fn run_completion(
    config: OpenAIConfig,
    model: &str,
    system: &str,
    user: &str,
    max_tokens: u32,
    temperature: f32,
) -> Result<String> {
    let client = Client::with_config(config);

    let request = CreateChatCompletionRequestArgs::default()
        .model(model)
        .messages([
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| YouLearnError::Summarization(format!("request build: {}", e)))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| YouLearnError::Summarization(format!("request build: {}", e)))?
                .into(),
        ])
        .max_tokens(max_tokens)
        .temperature(temperature)
        .build()
        .map_err(|e| YouLearnError::Summarization(format!("request build: {}", e)))?;

    let response = client
        .chat()
        .create(request)
        .await
        .map_err(|e| YouLearnError::Summarization(format!("completion API error: {}", e)))?;

    response
        .choices
        .first()
        .and_then(|choice| choice.message.content.clone())
        .ok_or_else(|| YouLearnError::Summarization("completion returned no content".into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_presence() {
        assert!(!OpenAiProvider::new(None, "gpt-4o-mini".into()).has_credential());
        assert!(OpenAiProvider::new(Some("sk-test".into()), "gpt-4o-mini".into())
            .has_credential());
        assert!(!DeepseekProvider::new(None, "deepseek-chat".into()).has_credential());
    }

    #[tokio::test]
    async fn test_complete_without_credential_fails_fast() {
        let provider = DeepseekProvider::new(None, "deepseek-chat".into());
        let result = provider.complete("sys", "user", 10, 0.5).await;
        assert!(matches!(
            result,
            Err(YouLearnError::CredentialMissing("Deepseek"))
        ));
    }
}
