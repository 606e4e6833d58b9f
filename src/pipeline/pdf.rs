//! Page text extraction via pdfium.
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which keeps
//! thread-local state and blocks while parsing. Everything here is
//! synchronous; callers run it inside `tokio::task::spawn_blocking`.

use crate::error::StudyGenError;
use pdfium_render::prelude::*;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Reads the text layer of every page of a PDF file.
///
/// `None` marks a page without extractable text (scanned image, blank page).
pub trait PageTextExtractor: Send + Sync {
    fn page_texts(&self, pdf_path: &Path) -> Result<Vec<Option<String>>, StudyGenError>;
}

/// [`PageTextExtractor`] backed by a pdfium shared library.
#[derive(Debug, Clone, Default)]
pub struct PdfiumTextExtractor {
    library_path: Option<PathBuf>,
}

impl PdfiumTextExtractor {
    pub fn new(library_path: Option<PathBuf>) -> Self {
        Self { library_path }
    }

    /// Bind to pdfium: explicit path, then `PDFIUM_LIB_PATH`, then the system
    /// library.
    fn bind(&self) -> Result<Pdfium, StudyGenError> {
        let explicit = self
            .library_path
            .clone()
            .or_else(|| std::env::var_os("PDFIUM_LIB_PATH").map(PathBuf::from));

        let bindings = match explicit {
            Some(path) => {
                debug!("Binding pdfium from {}", path.display());
                Pdfium::bind_to_library(&path).map_err(|e| {
                    StudyGenError::PdfiumUnavailable(format!("{}: {}", path.display(), e))
                })?
            }
            None => Pdfium::bind_to_system_library()
                .map_err(|e| StudyGenError::PdfiumUnavailable(e.to_string()))?,
        };
        Ok(Pdfium::new(bindings))
    }
}

impl PageTextExtractor for PdfiumTextExtractor {
    fn page_texts(&self, pdf_path: &Path) -> Result<Vec<Option<String>>, StudyGenError> {
        let pdfium = self.bind()?;

        let document = pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| {
                let err_str = format!("{:?}", e);
                if err_str.to_ascii_lowercase().contains("password") {
                    StudyGenError::Parse {
                        detail: "document is password protected".into(),
                    }
                } else {
                    StudyGenError::Parse { detail: err_str }
                }
            })?;

        let pages = document.pages();
        info!("PDF loaded: {} pages", pages.len());

        let mut texts = Vec::with_capacity(pages.len() as usize);
        for (idx, page) in pages.iter().enumerate() {
            match page.text() {
                Ok(text) => {
                    let content = text.all();
                    if content.trim().is_empty() {
                        debug!("Page {}: no text layer", idx + 1);
                        texts.push(None);
                    } else {
                        texts.push(Some(content));
                    }
                }
                Err(e) => {
                    warn!("Page {}: text extraction failed: {:?}", idx + 1, e);
                    texts.push(None);
                }
            }
        }

        Ok(texts)
    }
}
