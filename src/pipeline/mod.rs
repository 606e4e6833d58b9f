//! Pipeline stages for PDF-to-artifact generation.
//!
//! Each submodule implements one step. The network- and pdfium-facing steps
//! sit behind traits ([`input::BlobFetcher`], [`pdf::PageTextExtractor`],
//! [`llm::TextGenerator`]) so tests can substitute fakes.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ pdf ──▶ text ──▶ (prompts) ──▶ llm ──▶ validate
//! (fetch)  (pdfium) (clean)   (compose)    (model)  (schema)
//! ```
//!
//! 1. [`input`]    download bytes from the blob store
//! 2. [`pdf`]      read each page's text layer from a scoped temp file;
//!    runs in `spawn_blocking` because pdfium is not async-safe
//! 3. [`text`]     join pages and normalise (NFC, whitespace, page markers)
//! 4. [`extract`]  steps 1–3 behind one call
//! 5. [`llm`]      send the composed prompt; the only stage talking to a model
//! 6. [`validate`] parse JSON and enforce the artifact schema

pub mod extract;
pub mod input;
pub mod llm;
pub mod pdf;
pub mod text;
pub mod validate;
