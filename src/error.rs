//! Error types for the pdf2study library.
//!
//! Every failure is fatal for the request that produced it: the pipeline is a
//! single linear chain (extract → compose → generate → validate) and each
//! stage depends on the previous one's output, so there is nothing useful to
//! continue with once a stage fails.
//!
//! Callers need to tell three situations apart:
//!
//! * **bad input**: the request or the downloaded file was unusable
//!   ([`ErrorKind::InvalidRequest`], [`ErrorKind::DownloadError`],
//!   [`ErrorKind::ParseError`]);
//! * **upstream outage**: the model provider failed or timed out
//!   ([`ErrorKind::GenerationError`]);
//! * **model drift**: the model answered, but not with the schema we asked
//!   for ([`ErrorKind::MalformedOutputError`]).
//!
//! [`StudyGenError::kind`], [`StudyGenError::stage`] and
//! [`StudyGenError::status_code`] expose exactly that classification.

use crate::artifact::ArtifactKind;
use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// All errors returned by the pdf2study library.
#[derive(Debug, Error)]
pub enum StudyGenError {
    // ── Request errors ────────────────────────────────────────────────────
    /// The request was rejected before any work was done.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    // ── Download errors ───────────────────────────────────────────────────
    /// The blob store did not return the file.
    ///
    /// `status` is `Some` when the server answered with a non-success code and
    /// `None` for transport failures (DNS, TLS, connection reset, …).
    #[error("Failed to download '{url}': {reason}")]
    DownloadFailed {
        url: String,
        status: Option<u16>,
        reason: String,
    },

    /// Download exceeded the configured timeout.
    #[error("Download timed out after {secs}s for '{url}'")]
    DownloadTimeout { url: String, secs: u64 },

    // ── Document errors ───────────────────────────────────────────────────
    /// The payload could not be read as a PDF document.
    #[error("Document could not be parsed: {detail}")]
    Parse { detail: String },

    // ── Generation errors ─────────────────────────────────────────────────
    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    /// Transport or provider-side failure while generating.
    #[error("Generation failed with model '{model}': {message}")]
    Generation { model: String, message: String },

    /// The model call did not return within the configured timeout.
    #[error("Generation timed out after {secs}s with model '{model}'")]
    GenerationTimeout { model: String, secs: u64 },

    // ── Validation errors ─────────────────────────────────────────────────
    /// Model output is not JSON or does not match the artifact schema.
    #[error("Model output is not a valid {kind}: {}", .violations.join("; "))]
    MalformedOutput {
        kind: ArtifactKind,
        violations: Vec<String>,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Could not bind to a pdfium library.
    #[error(
        "Failed to bind to pdfium library: {0}\n\
Install pdfium system-wide or set PDFIUM_LIB_PATH=/path/to/libpdfium."
    )]
    PdfiumUnavailable(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error (temp file I/O, task join failure, …).
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failure taxonomy exposed to callers and in HTTP error bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidRequest,
    DownloadError,
    ParseError,
    GenerationError,
    MalformedOutputError,
    ConfigurationError,
    InternalError,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::InvalidRequest => "InvalidRequest",
            ErrorKind::DownloadError => "DownloadError",
            ErrorKind::ParseError => "ParseError",
            ErrorKind::GenerationError => "GenerationError",
            ErrorKind::MalformedOutputError => "MalformedOutputError",
            ErrorKind::ConfigurationError => "ConfigurationError",
            ErrorKind::InternalError => "InternalError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The pipeline stage an error originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Request validation, before any I/O.
    Request,
    /// Download + PDF parsing + text cleanup.
    Extraction,
    /// Model invocation.
    Generation,
    /// JSON parsing and schema checks.
    Validation,
    /// Provider resolution, configuration, runtime plumbing.
    Setup,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Stage::Request => "request",
            Stage::Extraction => "extraction",
            Stage::Generation => "generation",
            Stage::Validation => "validation",
            Stage::Setup => "setup",
        };
        f.write_str(s)
    }
}

impl StudyGenError {
    /// Taxonomy name of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            StudyGenError::InvalidRequest(_) => ErrorKind::InvalidRequest,
            StudyGenError::DownloadFailed { .. } | StudyGenError::DownloadTimeout { .. } => {
                ErrorKind::DownloadError
            }
            StudyGenError::Parse { .. } => ErrorKind::ParseError,
            StudyGenError::Generation { .. } | StudyGenError::GenerationTimeout { .. } => {
                ErrorKind::GenerationError
            }
            StudyGenError::MalformedOutput { .. } => ErrorKind::MalformedOutputError,
            StudyGenError::ProviderNotConfigured { .. }
            | StudyGenError::InvalidConfig(_)
            | StudyGenError::PdfiumUnavailable(_) => ErrorKind::ConfigurationError,
            StudyGenError::Internal(_) => ErrorKind::InternalError,
        }
    }

    /// Stage of the pipeline that produced this error.
    pub fn stage(&self) -> Stage {
        match self {
            StudyGenError::InvalidRequest(_) => Stage::Request,
            StudyGenError::DownloadFailed { .. }
            | StudyGenError::DownloadTimeout { .. }
            | StudyGenError::Parse { .. } => Stage::Extraction,
            StudyGenError::Generation { .. } | StudyGenError::GenerationTimeout { .. } => {
                Stage::Generation
            }
            StudyGenError::MalformedOutput { .. } => Stage::Validation,
            StudyGenError::ProviderNotConfigured { .. }
            | StudyGenError::InvalidConfig(_)
            | StudyGenError::PdfiumUnavailable(_)
            | StudyGenError::Internal(_) => Stage::Setup,
        }
    }

    /// HTTP status code an endpoint should answer with.
    ///
    /// 4xx for problems with the caller's input, 5xx for upstream or
    /// model-side failures.
    pub fn status_code(&self) -> u16 {
        match self {
            StudyGenError::InvalidRequest(_)
            | StudyGenError::DownloadFailed { .. }
            | StudyGenError::DownloadTimeout { .. } => 400,
            StudyGenError::Parse { .. } => 422,
            StudyGenError::Generation { .. } | StudyGenError::MalformedOutput { .. } => 502,
            StudyGenError::GenerationTimeout { .. } => 504,
            StudyGenError::ProviderNotConfigured { .. }
            | StudyGenError::InvalidConfig(_)
            | StudyGenError::PdfiumUnavailable(_)
            | StudyGenError::Internal(_) => 500,
        }
    }

    /// Message safe to show to an end user.
    ///
    /// Provider errors and internal details are replaced with a generic
    /// sentence; they are logged server-side instead.
    pub fn public_message(&self) -> String {
        match self {
            StudyGenError::InvalidRequest(_) | StudyGenError::DownloadTimeout { .. } => {
                self.to_string()
            }
            StudyGenError::MalformedOutput { kind, violations } => format!(
                "Model output did not match the {kind} schema ({} violation{})",
                violations.len(),
                if violations.len() == 1 { "" } else { "s" }
            ),
            StudyGenError::DownloadFailed { status: Some(code), .. } => {
                format!("Failed to download file (HTTP {code})")
            }
            StudyGenError::DownloadFailed { status: None, .. } => {
                "Failed to download file".to_string()
            }
            StudyGenError::Parse { .. } => {
                "The downloaded file could not be read as a PDF document".to_string()
            }
            StudyGenError::Generation { .. } => "The model provider failed to respond".to_string(),
            StudyGenError::GenerationTimeout { secs, .. } => {
                format!("The model provider did not respond within {secs}s")
            }
            StudyGenError::ProviderNotConfigured { .. }
            | StudyGenError::InvalidConfig(_)
            | StudyGenError::PdfiumUnavailable(_)
            | StudyGenError::Internal(_) => "The service is not configured correctly".to_string(),
        }
    }
}
