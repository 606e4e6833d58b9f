//! Configuration for artifact generation.
//!
//! All pipeline behaviour is controlled through [`GenerationConfig`], built
//! via its [`GenerationConfigBuilder`]. The config is cloned into every
//! request; nothing in it is mutated after `build()`.

use crate::artifact::ArtifactKind;
use crate::error::StudyGenError;
use edgequake_llm::LLMProvider;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Configuration for the extraction → generation → validation pipeline.
///
/// # Example
/// ```rust
/// use pdf2study::GenerationConfig;
///
/// let config = GenerationConfig::builder()
///     .model("gpt-4.1-mini")
///     .download_timeout_secs(30)
///     .build()
///     .unwrap();
/// assert_eq!(config.download_timeout_secs, 30);
/// ```
#[derive(Clone)]
pub struct GenerationConfig {
    /// Model identifier used for every artifact kind.
    ///
    /// When `None`, each kind uses [`ArtifactKind::default_model`] unless
    /// `EDGEQUAKE_MODEL` is set.
    pub model: Option<String>,

    /// LLM provider name (e.g. "openai", "anthropic", "ollama").
    /// If None along with `provider`, the provider is detected from the environment.
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature. Default: 0.2.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 8192.
    ///
    /// A ten-question quiz with five answers each is roughly 2 000 tokens;
    /// flashcard sets for long documents need considerably more.
    pub max_tokens: usize,

    /// Timeout for downloading the source file, in seconds. Default: 120.
    pub download_timeout_secs: u64,

    /// Timeout for a single model call, in seconds. Default: 180.
    pub api_timeout_secs: u64,

    /// Largest file the downloader accepts, in bytes. Default: 50 MiB.
    pub max_download_bytes: u64,

    /// Longest accepted custom prompt, in characters. Default: 200.
    pub max_custom_prompt_chars: usize,

    /// Extra generation attempts after the model returns output that fails
    /// validation. Default: 0 (malformed output is terminal).
    pub regenerate_attempts: u32,

    /// Explicit pdfium shared library. If None, `PDFIUM_LIB_PATH` and then the
    /// system library are tried.
    pub pdfium_library_path: Option<PathBuf>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.2,
            max_tokens: 8192,
            download_timeout_secs: 120,
            api_timeout_secs: 180,
            max_download_bytes: 50 * 1024 * 1024,
            max_custom_prompt_chars: 200,
            regenerate_attempts: 0,
            pdfium_library_path: None,
        }
    }
}

impl fmt::Debug for GenerationConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GenerationConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("download_timeout_secs", &self.download_timeout_secs)
            .field("api_timeout_secs", &self.api_timeout_secs)
            .field("max_download_bytes", &self.max_download_bytes)
            .field("max_custom_prompt_chars", &self.max_custom_prompt_chars)
            .field("regenerate_attempts", &self.regenerate_attempts)
            .field("pdfium_library_path", &self.pdfium_library_path)
            .finish()
    }
}

impl GenerationConfig {
    /// Create a new builder for `GenerationConfig`.
    pub fn builder() -> GenerationConfigBuilder {
        GenerationConfigBuilder {
            config: Self::default(),
        }
    }

    /// Model identifier for `kind`: explicit override, else the kind's default.
    pub fn model_for(&self, kind: ArtifactKind) -> String {
        self.model
            .clone()
            .unwrap_or_else(|| kind.default_model().to_string())
    }

    pub fn download_timeout(&self) -> Duration {
        Duration::from_secs(self.download_timeout_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

/// Builder for [`GenerationConfig`].
#[derive(Debug)]
pub struct GenerationConfigBuilder {
    config: GenerationConfig,
}

impl GenerationConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn download_timeout_secs(mut self, secs: u64) -> Self {
        self.config.download_timeout_secs = secs;
        self
    }

    pub fn api_timeout_secs(mut self, secs: u64) -> Self {
        self.config.api_timeout_secs = secs;
        self
    }

    pub fn max_download_bytes(mut self, bytes: u64) -> Self {
        self.config.max_download_bytes = bytes;
        self
    }

    pub fn max_custom_prompt_chars(mut self, n: usize) -> Self {
        self.config.max_custom_prompt_chars = n;
        self
    }

    pub fn regenerate_attempts(mut self, n: u32) -> Self {
        self.config.regenerate_attempts = n;
        self
    }

    pub fn pdfium_library_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.pdfium_library_path = Some(path.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<GenerationConfig, StudyGenError> {
        let c = &self.config;
        if c.download_timeout_secs == 0 {
            return Err(StudyGenError::InvalidConfig(
                "Download timeout must be ≥ 1s".into(),
            ));
        }
        if c.api_timeout_secs == 0 {
            return Err(StudyGenError::InvalidConfig(
                "API timeout must be ≥ 1s".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(StudyGenError::InvalidConfig(
                "max_tokens must be ≥ 1".into(),
            ));
        }
        if c.max_download_bytes == 0 {
            return Err(StudyGenError::InvalidConfig(
                "max_download_bytes must be ≥ 1".into(),
            ));
        }
        if let Some(model) = &c.model {
            if model.trim().is_empty() {
                return Err(StudyGenError::InvalidConfig(
                    "model must not be empty".into(),
                ));
            }
        }
        Ok(self.config)
    }
}
