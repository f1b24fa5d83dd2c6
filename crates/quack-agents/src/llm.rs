use std::sync::Arc;

use async_trait::async_trait;

use crate::error::AgentError;

/// A hosted model that can answer a prompt with a single JSON value.
///
/// Everything above this trait is provider-agnostic; swapping providers means
/// adding another implementation, not reshaping call sites.
#[async_trait]
pub trait LanguageModelClient: Send + Sync {
    /// Default model id used when a caller has no preference.
    fn default_model(&self) -> &str;

    async fn complete_json(
        &self,
        prompt: &str,
        model: &str,
    ) -> Result<serde_json::Value, AgentError>;
}

/// A client bound to one model id.
///
/// Serves call sites written against a "pick a model, generate content, read
/// the text" flow. The text is always the completion re-encoded as JSON.
#[derive(Clone)]
pub struct ModelHandle {
    client: Arc<dyn LanguageModelClient>,
    model: String,
}

impl ModelHandle {
    pub fn new(client: Arc<dyn LanguageModelClient>, model: impl Into<String>) -> Self {
        Self {
            client,
            model: model.into(),
        }
    }

    /// Bind to the client's default model.
    pub fn with_default_model(client: Arc<dyn LanguageModelClient>) -> Self {
        let model = client.default_model().to_string();
        Self::new(client, model)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub async fn generate_json(&self, prompt: &str) -> Result<serde_json::Value, AgentError> {
        self.client.complete_json(prompt, &self.model).await
    }

    pub async fn generate_content(&self, prompt: &str) -> Result<String, AgentError> {
        let value = self.generate_json(prompt).await?;
        Ok(serde_json::to_string(&value)?)
    }
}
