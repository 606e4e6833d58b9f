//! Text extraction: URL in, [`ExtractedText`] out.
//!
//! pdfium needs a file-system path, so the downloaded bytes are written to a
//! `NamedTempFile` that lives only for the duration of the parse. The temp
//! file is removed when it drops, on success and on every error path.

use crate::error::StudyGenError;
use crate::pipeline::input::{validate_url, BlobFetcher};
use crate::pipeline::pdf::PageTextExtractor;
use crate::pipeline::text::ExtractedText;
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

const PDF_MAGIC: &[u8] = b"%PDF";

/// Downloads a PDF and returns its normalised text.
#[derive(Clone)]
pub struct TextExtractor {
    fetcher: Arc<dyn BlobFetcher>,
    pages: Arc<dyn PageTextExtractor>,
    download_timeout: Duration,
}

impl TextExtractor {
    pub fn new(
        fetcher: Arc<dyn BlobFetcher>,
        pages: Arc<dyn PageTextExtractor>,
        download_timeout: Duration,
    ) -> Self {
        Self {
            fetcher,
            pages,
            download_timeout,
        }
    }

    /// Fetch `url`, read every page's text layer and clean the result.
    ///
    /// A document without any text layer yields an empty [`ExtractedText`],
    /// not an error.
    pub async fn extract(&self, url: &str) -> Result<ExtractedText, StudyGenError> {
        let url = validate_url(url)?;
        let url = url.as_str();

        let document = tokio::time::timeout(self.download_timeout, self.fetcher.fetch(url))
            .await
            .map_err(|_| StudyGenError::DownloadTimeout {
                url: url.to_string(),
                secs: self.download_timeout.as_secs(),
            })??;

        check_pdf_magic(&document.bytes)?;

        let pages = Arc::clone(&self.pages);
        let bytes = document.bytes;
        let page_texts = tokio::task::spawn_blocking(move || parse_via_temp_file(&bytes, &*pages))
            .await
            .map_err(|e| StudyGenError::Internal(format!("PDF parse task panicked: {e}")))??;

        let text = ExtractedText::from_pages(&page_texts);
        info!(
            "Extracted {} chars from {} pages ({} with text)",
            text.len(),
            page_texts.len(),
            page_texts.iter().filter(|p| p.is_some()).count()
        );
        Ok(text)
    }
}

/// Reject payloads that are not PDF documents before handing them to pdfium.
fn check_pdf_magic(bytes: &[u8]) -> Result<(), StudyGenError> {
    if bytes.starts_with(PDF_MAGIC) {
        return Ok(());
    }
    let head: String = bytes
        .iter()
        .take(4)
        .map(|b| format!("{b:02x}"))
        .collect::<Vec<_>>()
        .join(" ");
    Err(StudyGenError::Parse {
        detail: format!("not a PDF file (leading bytes: [{head}])"),
    })
}

fn parse_via_temp_file(
    bytes: &[u8],
    pages: &dyn PageTextExtractor,
) -> Result<Vec<Option<String>>, StudyGenError> {
    let mut file = tempfile::Builder::new()
        .prefix("pdf2study-")
        .suffix(".pdf")
        .tempfile()
        .map_err(|e| StudyGenError::Internal(format!("Failed to create temp file: {e}")))?;
    file.write_all(bytes)
        .and_then(|_| file.flush())
        .map_err(|e| StudyGenError::Internal(format!("Failed to write temp file: {e}")))?;

    debug!("Parsing {} bytes from {}", bytes.len(), file.path().display());
    pages.page_texts(file.path())
}
