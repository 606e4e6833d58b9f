//! Source download: fetch the PDF bytes from the blob store.
//!
//! The downloader only moves bytes. Checking that they are a PDF and writing
//! them somewhere pdfium can open happens in [`crate::pipeline::extract`], so
//! the fetcher can be swapped for a fake in tests.

use crate::error::StudyGenError;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::Url;
use std::time::Duration;
use tracing::{debug, info};

/// Bytes downloaded from a source URL.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    pub url: String,
    pub bytes: Vec<u8>,
}

/// Something that can fetch a file by URL.
#[async_trait]
pub trait BlobFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<SourceDocument, StudyGenError>;
}

/// Check if the input string looks like a URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Parse `input` as an absolute http(s) URL.
pub fn validate_url(input: &str) -> Result<Url, StudyGenError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(StudyGenError::InvalidRequest(
            "fileDownloadUrl is required".into(),
        ));
    }
    if !is_url(trimmed) {
        return Err(StudyGenError::InvalidRequest(format!(
            "fileDownloadUrl must be an http or https URL, got '{trimmed}'"
        )));
    }
    Url::parse(trimmed).map_err(|e| {
        StudyGenError::InvalidRequest(format!("fileDownloadUrl '{trimmed}' is not a valid URL: {e}"))
    })
}

/// [`BlobFetcher`] backed by a shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpBlobFetcher {
    client: reqwest::Client,
    timeout_secs: u64,
    max_bytes: u64,
}

impl HttpBlobFetcher {
    pub fn new(timeout_secs: u64, max_bytes: u64) -> Result<Self, StudyGenError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| StudyGenError::Internal(format!("Failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            timeout_secs,
            max_bytes,
        })
    }

    fn map_send_error(&self, url: &str, e: reqwest::Error) -> StudyGenError {
        if e.is_timeout() {
            StudyGenError::DownloadTimeout {
                url: url.to_string(),
                secs: self.timeout_secs,
            }
        } else {
            StudyGenError::DownloadFailed {
                url: url.to_string(),
                status: e.status().map(|s| s.as_u16()),
                reason: e.to_string(),
            }
        }
    }
}

#[async_trait]
impl BlobFetcher for HttpBlobFetcher {
    async fn fetch(&self, url: &str) -> Result<SourceDocument, StudyGenError> {
        info!("Downloading source document from: {}", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.map_send_error(url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(StudyGenError::DownloadFailed {
                url: url.to_string(),
                status: Some(status.as_u16()),
                reason: format!("HTTP {status}"),
            });
        }

        if let Some(len) = response.content_length() {
            if len > self.max_bytes {
                return Err(too_large(url, self.max_bytes));
            }
        }

        let mut bytes = Vec::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| self.map_send_error(url, e))?;
            if (bytes.len() + chunk.len()) as u64 > self.max_bytes {
                return Err(too_large(url, self.max_bytes));
            }
            bytes.extend_from_slice(&chunk);
        }

        debug!("Downloaded {} bytes from {}", bytes.len(), url);
        Ok(SourceDocument {
            url: url.to_string(),
            bytes,
        })
    }
}

fn too_large(url: &str, max_bytes: u64) -> StudyGenError {
    StudyGenError::DownloadFailed {
        url: url.to_string(),
        status: None,
        reason: format!("file exceeds the {max_bytes} byte limit"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/doc.pdf"));
        assert!(is_url("http://example.com/doc.pdf"));
        assert!(!is_url("/tmp/doc.pdf"));
        assert!(!is_url("ftp://example.com/doc.pdf"));
    }

    #[test]
    fn test_validate_url_rejects_non_http() {
        for bad in ["", "   ", "file:///etc/passwd", "ftp://host/x.pdf", "doc.pdf"] {
            let err = validate_url(bad).unwrap_err();
            assert!(matches!(err, StudyGenError::InvalidRequest(_)), "{bad:?}");
        }
        assert_eq!(
            validate_url(" https://blob.test/a.pdf ").unwrap().as_str(),
            "https://blob.test/a.pdf"
        );
    }

    #[tokio::test]
    async fn fetch_returns_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/doc.pdf"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(b"%PDF-1.7 body".to_vec()))
            .mount(&server)
            .await;

        let fetcher = HttpBlobFetcher::new(5, 1024).unwrap();
        let url = format!("{}/doc.pdf", server.uri());
        let doc = fetcher.fetch(&url).await.unwrap();
        assert_eq!(doc.bytes, b"%PDF-1.7 body");
        assert_eq!(doc.url, url);
    }

    #[tokio::test]
    async fn fetch_maps_404_to_download_failed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let fetcher = HttpBlobFetcher::new(5, 1024).unwrap();
        let err = fetcher
            .fetch(&format!("{}/missing.pdf", server.uri()))
            .await
            .unwrap_err();
        match err {
            StudyGenError::DownloadFailed { status, .. } => assert_eq!(status, Some(404)),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_enforces_size_limit() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'x'; 4096]))
            .mount(&server)
            .await;

        let fetcher = HttpBlobFetcher::new(5, 1024).unwrap();
        let err = fetcher
            .fetch(&format!("{}/big.pdf", server.uri()))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("byte limit"), "got: {err}");
    }

    #[tokio::test]
    async fn fetch_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
            .mount(&server)
            .await;

        let fetcher = HttpBlobFetcher::new(1, 1024).unwrap();
        let err = fetcher
            .fetch(&format!("{}/slow.pdf", server.uri()))
            .await
            .unwrap_err();
        assert!(
            matches!(err, StudyGenError::DownloadTimeout { secs: 1, .. }),
            "unexpected error: {err:?}"
        );
    }
}
