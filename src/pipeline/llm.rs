//! Model interaction: send a composed prompt, return the raw reply.
//!
//! This module is intentionally thin. Prompt wording lives in
//! [`crate::prompts`] and output checks live in
//! [`crate::pipeline::validate`]; nothing here looks inside the reply.
//!
//! ## Provider Resolution
//!
//! Each artifact kind may use a different model, so the provider is resolved
//! per model and cached. From most to least specific:
//!
//! 1. **Pre-built provider** (`config.provider`), used as-is.
//! 2. **Named provider** (`config.provider_name`) created with the model.
//! 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`).
//! 4. **OpenAI key** (`OPENAI_API_KEY`) with the requested model.
//! 5. **Full auto-detection** (`ProviderFactory::from_env`).

use crate::config::GenerationConfig;
use crate::error::StudyGenError;
use crate::prompts::Prompt;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider, ProviderFactory};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Instant;
use tracing::{debug, info};

/// Sends a prompt to a model and returns its raw text output.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &Prompt, model: &str) -> Result<String, StudyGenError>;
}

/// [`TextGenerator`] backed by an `edgequake-llm` provider.
pub struct LlmGenerator {
    config: GenerationConfig,
    options: CompletionOptions,
    providers: Mutex<HashMap<String, Arc<dyn LLMProvider>>>,
}

impl LlmGenerator {
    pub fn new(config: &GenerationConfig) -> Self {
        Self {
            options: build_options(config),
            config: config.clone(),
            providers: Mutex::new(HashMap::new()),
        }
    }

    /// Resolve (or reuse) the provider that serves `model`.
    pub fn provider_for(&self, model: &str) -> Result<Arc<dyn LLMProvider>, StudyGenError> {
        if let Some(provider) = &self.config.provider {
            return Ok(Arc::clone(provider));
        }

        let mut cache = self.providers.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(provider) = cache.get(model) {
            return Ok(Arc::clone(provider));
        }
        let provider = resolve_provider(&self.config, model)?;
        cache.insert(model.to_string(), Arc::clone(&provider));
        Ok(provider)
    }

    /// Name of the model that actually answers requests for `model`.
    ///
    /// Differs from `model` when a pre-built provider or the
    /// `EDGEQUAKE_MODEL` environment pair pins the model.
    pub fn served_model(&self, model: &str) -> Result<String, StudyGenError> {
        Ok(self.provider_for(model)?.model().to_string())
    }
}

#[async_trait]
impl TextGenerator for LlmGenerator {
    async fn generate(&self, prompt: &Prompt, model: &str) -> Result<String, StudyGenError> {
        let provider = self.provider_for(model)?;
        let served = provider.model();
        if served != model {
            info!("Model '{}' requested, provider '{}' serves '{}'", model, provider.name(), served);
        }
        let messages = vec![ChatMessage::user(prompt.as_str())];

        let start = Instant::now();
        let response = provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| StudyGenError::Generation {
                model: served.to_string(),
                message: e.to_string(),
            })?;

        debug!(
            "Model {}: {} input tokens, {} output tokens, {:?}",
            served,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the generation config.
fn build_options(config: &GenerationConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, StudyGenError> {
    info!("Using provider '{}' with model '{}'", provider_name, model);
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        StudyGenError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn resolve_provider(
    config: &GenerationConfig,
    model: &str,
) -> Result<Arc<dyn LLMProvider>, StudyGenError> {
    if let Some(ref name) = config.provider_name {
        return create_provider(name, model);
    }

    if let (Ok(prov), Ok(env_model)) = (
        std::env::var("EDGEQUAKE_LLM_PROVIDER"),
        std::env::var("EDGEQUAKE_MODEL"),
    ) {
        if !prov.is_empty() && !env_model.is_empty() {
            let pinned = config.model.as_deref().unwrap_or(&env_model);
            if pinned != model {
                info!(
                    "EDGEQUAKE_MODEL pins '{}'; requested model '{}' is not used",
                    pinned, model
                );
            }
            return create_provider(&prov, pinned);
        }
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_provider("openai", model);
        }
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| StudyGenError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, ANTHROPIC_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_options_defaults() {
        let config = GenerationConfig::default();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.2));
        assert_eq!(opts.max_tokens, Some(8192));
    }

    #[test]
    fn build_options_follow_config() {
        let config = GenerationConfig::builder()
            .temperature(0.7)
            .max_tokens(1000)
            .build()
            .unwrap();
        let opts = build_options(&config);
        assert_eq!(opts.temperature, Some(0.7));
        assert_eq!(opts.max_tokens, Some(1000));
    }

    #[tokio::test]
    async fn prebuilt_provider_reports_the_model_it_serves() {
        let mock = edgequake_llm::MockProvider::new();
        mock.add_response("[]").await;
        let config = GenerationConfig::builder()
            .provider(Arc::new(mock))
            .build()
            .unwrap();
        let generator = LlmGenerator::new(&config);

        assert_eq!(generator.served_model("gpt-5").unwrap(), "mock-model");

        let prompt = crate::prompts::PromptBuilder::new(crate::ArtifactKind::Flashcards)
            .source_text("Cats purr.")
            .build();
        assert_eq!(generator.generate(&prompt, "gpt-5").await.unwrap(), "[]");
    }
}
