//! Shared fakes for the integration tests.
//!
//! The blob store is a real `wiremock` server hit by the real
//! `HttpBlobFetcher`; pdfium and the model are replaced by fakes so the
//! tests need neither a pdfium library nor an API key.

#![allow(dead_code)]

use async_trait::async_trait;
use pdf2study::{
    ArtifactGenerator, GenerationConfig, HttpBlobFetcher, PageTextExtractor, Prompt,
    StudyGenError, TextGenerator,
};
use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const FAKE_PDF: &[u8] = b"%PDF-1.7\n% fake body, parsed by StaticPages\n%%EOF\n";

pub const CATS_FLASHCARDS: &str =
    r#"[{"title":"Cats","front":"What are cats?","back":"Mammals","difficulty":0}]"#;

/// Returns the same page texts for every document.
pub struct StaticPages(pub Vec<Option<String>>);

impl StaticPages {
    pub fn cats() -> Self {
        StaticPages(vec![
            Some("Cats are   mammals .\nPage 1".to_string()),
            None,
            Some("Cats purr .\nPage 2".to_string()),
        ])
    }
}

impl PageTextExtractor for StaticPages {
    fn page_texts(&self, _pdf_path: &Path) -> Result<Vec<Option<String>>, StudyGenError> {
        Ok(self.0.clone())
    }
}

/// Replays scripted replies and records every prompt it receives.
#[derive(Default)]
pub struct ScriptedGenerator {
    replies: Mutex<VecDeque<Result<String, StudyGenError>>>,
    prompts: Mutex<Vec<String>>,
    models: Mutex<Vec<String>>,
    calls: AtomicUsize,
    delay: Option<Duration>,
}

impl ScriptedGenerator {
    pub fn replying(replies: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.iter().map(|r| Ok(r.to_string())).collect()),
            ..Default::default()
        })
    }

    pub fn failing(err: StudyGenError) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Err(err)])),
            ..Default::default()
        })
    }

    pub fn slow(delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(VecDeque::from([Ok("[]".to_string())])),
            delay: Some(delay),
            ..Default::default()
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> String {
        self.prompts
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("generator was never called")
    }

    pub fn models(&self) -> Vec<String> {
        self.models.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &Prompt, model: &str) -> Result<String, StudyGenError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.as_str().to_string());
        self.models.lock().unwrap().push(model.to_string());
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let next = self.replies.lock().unwrap().pop_front();
        next.unwrap_or_else(|| {
            Err(StudyGenError::Generation {
                model: model.to_string(),
                message: "script exhausted".into(),
            })
        })
    }
}

/// Blob store serving `FAKE_PDF` at `/docs/cats.pdf` and 404 elsewhere.
pub async fn blob_store() -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/docs/cats.pdf"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(FAKE_PDF.to_vec()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/docs/missing.pdf"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    server
}

pub fn test_config() -> GenerationConfig {
    GenerationConfig::builder()
        .download_timeout_secs(5)
        .api_timeout_secs(5)
        .build()
        .expect("valid test config")
}

pub fn generator_with(
    pages: StaticPages,
    model: Arc<ScriptedGenerator>,
    config: GenerationConfig,
) -> ArtifactGenerator {
    let fetcher = HttpBlobFetcher::new(config.download_timeout_secs, config.max_download_bytes)
        .expect("http client");
    ArtifactGenerator::new(Arc::new(fetcher), Arc::new(pages), model, config)
}
