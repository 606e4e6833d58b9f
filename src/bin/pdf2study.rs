//! CLI binary for pdf2study.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `GenerationConfig`, prints the artifact JSON to stdout, or serves the
//! HTTP endpoints.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use pdf2study::{ArtifactGenerator, ArtifactKind, ArtifactRequest, ArtifactResult, GenerationConfig};
use std::io::{self, Write};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Flashcards from a lecture PDF (stdout)
  pdf2study flashcards https://example.com/lecture.pdf

  # Mindmap with a custom focus, written to a file
  pdf2study mindmap https://example.com/paper.pdf \
      --custom-prompt "focus on the methodology" -o mindmap.json

  # Quiz with a specific model
  pdf2study --model gpt-4.1-mini --provider openai quiz https://example.com/notes.pdf

  # Serve the HTTP endpoints
  pdf2study serve --addr 0.0.0.0:8080

DEFAULT MODELS:
  flashcards   gpt-5
  mindmap      gpt-5-nano-2025-08-07
  quiz         gpt-5-nano-2025-08-07
  (--model overrides all three)

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  GEMINI_API_KEY          Google Gemini API key
  EDGEQUAKE_LLM_PROVIDER  Provider used when --provider is not given
  EDGEQUAKE_MODEL         Model paired with EDGEQUAKE_LLM_PROVIDER
  PDFIUM_LIB_PATH         Path to libpdfium; otherwise the system library is used
  RUST_LOG                Log filter (overrides --verbose / --quiet)
"#;

/// Generate flashcards, mindmaps and quizzes from PDF documents with LLMs.
#[derive(Parser, Debug)]
#[command(
    name = "pdf2study",
    version,
    about = "Generate flashcards, mindmaps and quizzes from PDF documents with LLMs",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Generate a flashcard set.
    Flashcards(GenerateArgs),
    /// Generate a mindmap.
    Mindmap(GenerateArgs),
    /// Generate a multiple-choice quiz.
    Quiz(QuizArgs),
    /// Serve the generate endpoints over HTTP.
    Serve(ServeArgs),
}

#[derive(Args, Debug)]
struct GenerateArgs {
    /// HTTP/HTTPS URL of the source PDF.
    url: String,

    /// Extra guidance for tone or focus (max 200 characters).
    #[arg(long, env = "PDF2STUDY_CUSTOM_PROMPT")]
    custom_prompt: Option<String>,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct QuizArgs {
    /// HTTP/HTTPS URL of the source PDF.
    url: String,

    #[command(flatten)]
    output: OutputArgs,
}

#[derive(Args, Debug)]
struct OutputArgs {
    /// Write JSON to this file instead of stdout.
    #[arg(short, long, env = "PDF2STUDY_OUTPUT")]
    output: Option<PathBuf>,

    /// Print compact JSON instead of pretty-printed.
    #[arg(long, env = "PDF2STUDY_COMPACT")]
    compact: bool,
}

#[derive(Args, Debug)]
struct ServeArgs {
    /// Address to listen on.
    #[arg(long, env = "PDF2STUDY_ADDR", default_value = "127.0.0.1:8080")]
    addr: SocketAddr,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// LLM model ID used for every artifact kind.
    #[arg(long, global = true, env = "PDF2STUDY_MODEL")]
    model: Option<String>,

    /// LLM provider: openai, anthropic, gemini, ollama, azure.
    #[arg(long, global = true, env = "PDF2STUDY_PROVIDER")]
    provider: Option<String>,

    /// Max LLM output tokens.
    #[arg(long, global = true, env = "PDF2STUDY_MAX_TOKENS", default_value_t = 8192)]
    max_tokens: usize,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "PDF2STUDY_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// HTTP download timeout in seconds.
    #[arg(long, global = true, env = "PDF2STUDY_DOWNLOAD_TIMEOUT", default_value_t = 120)]
    download_timeout: u64,

    /// LLM call timeout in seconds.
    #[arg(long, global = true, env = "PDF2STUDY_API_TIMEOUT", default_value_t = 180)]
    api_timeout: u64,

    /// Largest accepted PDF, in MiB.
    #[arg(long, global = true, env = "PDF2STUDY_MAX_DOWNLOAD_MB", default_value_t = 50)]
    max_download_mb: u64,

    /// Extra generation attempts when the model output fails validation.
    #[arg(long, global = true, env = "PDF2STUDY_REGENERATE_ATTEMPTS", default_value_t = 0)]
    regenerate_attempts: u32,

    /// Path to the pdfium shared library.
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "PDF2STUDY_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "PDF2STUDY_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    let filter = if cli.global.verbose {
        "debug"
    } else if cli.global.quiet {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(&cli.global)?;
    let generator =
        ArtifactGenerator::from_config(config).context("Failed to initialise generator")?;

    let (request, output) = match cli.command {
        Command::Serve(args) => {
            pdf2study::server::serve(args.addr, Arc::new(generator))
                .await
                .context("Server failed")?;
            return Ok(());
        }
        Command::Flashcards(args) => (
            request_for(ArtifactKind::Flashcards, args.url, args.custom_prompt),
            args.output,
        ),
        Command::Mindmap(args) => (
            request_for(ArtifactKind::Mindmap, args.url, args.custom_prompt),
            args.output,
        ),
        Command::Quiz(args) => (request_for(ArtifactKind::Quiz, args.url, None), args.output),
    };

    // ── Run generation ───────────────────────────────────────────────────
    let start = Instant::now();
    let result = generator.generate(&request).await.with_context(|| {
        format!("Failed to generate {} from {}", request.kind, request.file_download_url)
    })?;

    let json = if output.compact {
        serde_json::to_string(&result)
    } else {
        serde_json::to_string_pretty(&result)
    }
    .context("Failed to serialise artifact")?;

    if let Some(ref path) = output.output {
        tokio::fs::write(path, format!("{json}\n"))
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
    } else {
        let stdout = io::stdout();
        let mut handle = stdout.lock();
        writeln!(handle, "{json}").context("Failed to write to stdout")?;
    }

    if !cli.global.quiet {
        eprintln!(
            "{} {}  {}",
            green("✔"),
            bold(&summary(&result)),
            dim(&format!("{}ms", start.elapsed().as_millis())),
        );
    }

    Ok(())
}

fn request_for(kind: ArtifactKind, url: String, custom_prompt: Option<String>) -> ArtifactRequest {
    ArtifactRequest {
        kind,
        file_download_url: url,
        custom_prompt,
    }
}

/// One-line description of what was generated.
fn summary(result: &ArtifactResult) -> String {
    match result {
        ArtifactResult::Flashcards(cards) => format!("{} flashcards", cards.len()),
        ArtifactResult::Mindmap(map) => format!(
            "mindmap \"{}\" ({} nodes, {} edges)",
            map.title,
            map.nodes.len(),
            map.edges.len()
        ),
        ArtifactResult::Quiz(quiz) => {
            format!("quiz \"{}\" ({} questions)", quiz.title, quiz.questions.len())
        }
    }
}

/// Map CLI args to `GenerationConfig`.
fn build_config(args: &GlobalArgs) -> Result<GenerationConfig> {
    let mut builder = GenerationConfig::builder()
        .max_tokens(args.max_tokens)
        .temperature(args.temperature)
        .download_timeout_secs(args.download_timeout)
        .api_timeout_secs(args.api_timeout)
        .max_download_bytes(args.max_download_mb.saturating_mul(1024 * 1024))
        .regenerate_attempts(args.regenerate_attempts);

    if let Some(ref model) = args.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = args.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(ref path) = args.pdfium_lib {
        builder = builder.pdfium_library_path(path.clone());
    }

    builder.build().context("Invalid configuration")
}
