//! # pdf2study
//!
//! Turn a PDF into study material (flashcards, a mindmap or a quiz) with an
//! LLM, and refuse to return anything that does not match the artifact
//! schema.
//!
//! ## Pipeline Overview
//!
//! ```text
//! fileDownloadUrl
//!  │
//!  ├─ 1. Extract   download, read page text via pdfium, normalise
//!  ├─ 2. Compose   schema + rules + precedence clause + fenced custom prompt + source text
//!  ├─ 3. Generate  one model call through edgequake-llm (timeout-bound)
//!  └─ 4. Validate  JSON parse + structural checks → ArtifactResult
//! ```
//!
//! Every stage fails fast with a [`StudyGenError`] whose
//! [`stage`](StudyGenError::stage) and [`kind`](StudyGenError::kind) tell
//! bad input apart from an upstream outage or a model that drifted from the
//! schema.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdf2study::{ArtifactGenerator, GenerationConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY / ANTHROPIC_API_KEY / GEMINI_API_KEY
//!     let generator = ArtifactGenerator::from_config(GenerationConfig::default())?;
//!     let cards = generator
//!         .flashcards("https://example.com/lecture.pdf", Some("focus on definitions"))
//!         .await?;
//!     println!("{}", serde_json::to_string_pretty(&cards)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `pdf2study` binary (clap + anyhow + tracing-subscriber) |
//! | `server` | on      | Enables [`server`]: the axum router with one endpoint per artifact kind |
//!
//! Disable both when using only the library:
//! ```toml
//! pdf2study = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod artifact;
pub mod config;
pub mod error;
pub mod generate;
pub mod pipeline;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use artifact::{
    ArtifactKind, ArtifactResult, Difficulty, Flashcard, Mindmap, MindmapEdge, MindmapNode, Quiz,
    QuizAnswer, QuizQuestion,
};
pub use config::{GenerationConfig, GenerationConfigBuilder};
pub use error::{ErrorKind, Stage, StudyGenError};
pub use generate::{ArtifactGenerator, ArtifactRequest};
pub use pipeline::extract::TextExtractor;
pub use pipeline::input::{BlobFetcher, HttpBlobFetcher, SourceDocument};
pub use pipeline::llm::{LlmGenerator, TextGenerator};
pub use pipeline::pdf::{PageTextExtractor, PdfiumTextExtractor};
pub use pipeline::text::{clean_text, ExtractedText};
pub use pipeline::validate::validate;
pub use prompts::{compose, GenerationRequest, Prompt, PromptBuilder};
