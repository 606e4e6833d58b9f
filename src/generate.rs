//! Artifact generation entry points.
//!
//! [`ArtifactGenerator`] runs one request through the whole pipeline:
//!
//! ```text
//! request check ──▶ extract ──▶ compose ──▶ generate ──▶ validate
//! ```
//!
//! The first failure ends the request; its [`StudyGenError::stage`] says
//! where it happened. The three artifact kinds share this single code path
//! and differ only in the schema and rule blocks picked by
//! [`crate::prompts`] and the checks picked by [`crate::pipeline::validate`].

use crate::artifact::{ArtifactKind, ArtifactResult, Flashcard, Mindmap, Quiz};
use crate::config::GenerationConfig;
use crate::error::StudyGenError;
use crate::pipeline::extract::TextExtractor;
use crate::pipeline::input::{validate_url, BlobFetcher, HttpBlobFetcher};
use crate::pipeline::llm::{LlmGenerator, TextGenerator};
use crate::pipeline::pdf::{PageTextExtractor, PdfiumTextExtractor};
use crate::pipeline::validate::validate;
use crate::prompts::{compose, GenerationRequest, Prompt};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// One call to an artifact endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactRequest {
    pub kind: ArtifactKind,
    pub file_download_url: String,
    pub custom_prompt: Option<String>,
}

impl ArtifactRequest {
    pub fn new(kind: ArtifactKind, file_download_url: impl Into<String>) -> Self {
        Self {
            kind,
            file_download_url: file_download_url.into(),
            custom_prompt: None,
        }
    }

    pub fn with_custom_prompt(mut self, custom_prompt: impl Into<String>) -> Self {
        self.custom_prompt = Some(custom_prompt.into());
        self
    }

    /// Check the request before any I/O and return the effective custom
    /// prompt (`None` when absent or blank).
    pub fn check(&self, max_custom_prompt_chars: usize) -> Result<Option<&str>, StudyGenError> {
        validate_url(&self.file_download_url)?;

        let custom = self
            .custom_prompt
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let Some(custom) = custom else {
            return Ok(None);
        };
        if !self.kind.supports_custom_prompt() {
            return Err(StudyGenError::InvalidRequest(format!(
                "customPrompt is not supported for {}",
                self.kind
            )));
        }
        let len = custom.chars().count();
        if len > max_custom_prompt_chars {
            return Err(StudyGenError::InvalidRequest(format!(
                "customPrompt is {len} characters, limit is {max_custom_prompt_chars}"
            )));
        }
        Ok(Some(custom))
    }
}

/// Runs the extraction → composition → generation → validation pipeline.
///
/// Cheap to share behind an `Arc`; no state is mutated per request.
pub struct ArtifactGenerator {
    extractor: TextExtractor,
    generator: Arc<dyn TextGenerator>,
    config: GenerationConfig,
}

impl ArtifactGenerator {
    /// Build a generator from explicit collaborators.
    pub fn new(
        fetcher: Arc<dyn BlobFetcher>,
        pages: Arc<dyn PageTextExtractor>,
        generator: Arc<dyn TextGenerator>,
        config: GenerationConfig,
    ) -> Self {
        Self {
            extractor: TextExtractor::new(fetcher, pages, config.download_timeout()),
            generator,
            config,
        }
    }

    /// Build a generator backed by reqwest, pdfium and `edgequake-llm`.
    ///
    /// The LLM provider is resolved lazily on the first generation call.
    pub fn from_config(config: GenerationConfig) -> Result<Self, StudyGenError> {
        let fetcher = HttpBlobFetcher::new(config.download_timeout_secs, config.max_download_bytes)?;
        let pages = PdfiumTextExtractor::new(config.pdfium_library_path.clone());
        let generator = LlmGenerator::new(&config);
        Ok(Self::new(
            Arc::new(fetcher),
            Arc::new(pages),
            Arc::new(generator),
            config,
        ))
    }

    pub fn config(&self) -> &GenerationConfig {
        &self.config
    }

    /// Produce a validated artifact for `request`.
    pub async fn generate(&self, request: &ArtifactRequest) -> Result<ArtifactResult, StudyGenError> {
        let total_start = Instant::now();
        let kind = request.kind;
        let custom = request.check(self.config.max_custom_prompt_chars)?;
        info!("Generating {} from {}", kind, request.file_download_url);

        // ── Step 1: Extract ──────────────────────────────────────────────
        let text = self.extractor.extract(&request.file_download_url).await?;
        if text.is_empty() {
            warn!("No extractable text in {}", request.file_download_url);
        }

        // ── Step 2: Compose ──────────────────────────────────────────────
        let generation_request = GenerationRequest::new(kind, text, custom.map(String::from));
        let prompt = compose(&generation_request);
        debug!(
            "Composed {} prompt: {} bytes, {} sections",
            kind,
            prompt.len(),
            prompt.sections().len()
        );

        // ── Steps 3 + 4: Generate and validate ───────────────────────────
        let model = self.config.model_for(kind);
        let mut attempt = 0;
        let result = loop {
            let raw = self.call_model(&prompt, &model).await?;
            match validate(&raw, kind) {
                Ok(result) => break result,
                Err(e @ StudyGenError::MalformedOutput { .. })
                    if attempt < self.config.regenerate_attempts =>
                {
                    attempt += 1;
                    warn!(
                        "Regenerating {} ({}/{}): {}",
                        kind, attempt, self.config.regenerate_attempts, e
                    );
                }
                Err(e) => return Err(e),
            }
        };

        info!(
            "Generated {} in {}ms",
            kind,
            total_start.elapsed().as_millis()
        );
        Ok(result)
    }

    async fn call_model(&self, prompt: &Prompt, model: &str) -> Result<String, StudyGenError> {
        let start = Instant::now();
        let raw = tokio::time::timeout(
            self.config.api_timeout(),
            self.generator.generate(prompt, model),
        )
        .await
        .map_err(|_| StudyGenError::GenerationTimeout {
            model: model.to_string(),
            secs: self.config.api_timeout_secs,
        })??;
        info!(
            "Reply of {} chars in {}ms (requested model {})",
            raw.len(),
            start.elapsed().as_millis(),
            model
        );
        Ok(raw)
    }

    pub async fn flashcards(
        &self,
        file_download_url: &str,
        custom_prompt: Option<&str>,
    ) -> Result<Vec<Flashcard>, StudyGenError> {
        let mut request = ArtifactRequest::new(ArtifactKind::Flashcards, file_download_url);
        request.custom_prompt = custom_prompt.map(String::from);
        self.generate(&request)
            .await?
            .into_flashcards()
            .ok_or_else(|| StudyGenError::Internal("validator returned the wrong kind".into()))
    }

    pub async fn mindmap(
        &self,
        file_download_url: &str,
        custom_prompt: Option<&str>,
    ) -> Result<Mindmap, StudyGenError> {
        let mut request = ArtifactRequest::new(ArtifactKind::Mindmap, file_download_url);
        request.custom_prompt = custom_prompt.map(String::from);
        self.generate(&request)
            .await?
            .into_mindmap()
            .ok_or_else(|| StudyGenError::Internal("validator returned the wrong kind".into()))
    }

    pub async fn quiz(&self, file_download_url: &str) -> Result<Quiz, StudyGenError> {
        let request = ArtifactRequest::new(ArtifactKind::Quiz, file_download_url);
        self.generate(&request)
            .await?
            .into_quiz()
            .ok_or_else(|| StudyGenError::Internal("validator returned the wrong kind".into()))
    }

    /// Synchronous wrapper around [`ArtifactGenerator::generate`].
    ///
    /// Creates a temporary tokio runtime internally; do not call from inside
    /// an async context.
    pub fn generate_blocking(&self, request: &ArtifactRequest) -> Result<ArtifactResult, StudyGenError> {
        tokio::runtime::Runtime::new()
            .map_err(|e| StudyGenError::Internal(format!("Failed to create tokio runtime: {}", e)))?
            .block_on(self.generate(request))
    }
}
