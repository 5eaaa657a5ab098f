//! CLI binary for pdftoc.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `ExtractionConfig`, drives one extraction, and prints a preview.
//!
//! The process always exits 0: failures are reported as printed messages,
//! not as a non-zero status. This tool is built for interactive use.

use anyhow::{Context, Result};
use clap::Parser;
use indicatif::{ProgressBar, ProgressStyle};
use pdftoc::{
    default_output_path, extract_table_of_contents, inspect, output, ExtractionConfig,
    ExtractionProgressCallback, ProgressCallback,
};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
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
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Terminal progress: a bar over the render loop, then a spinner while the
/// single model request is in flight.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    /// Create a callback whose progress-bar length is set dynamically by
    /// `on_render_start` (called once the page count is known).
    fn new_dynamic() -> Arc<Self> {
        let bar = ProgressBar::new(0);

        bar.set_style(spinner_style());
        bar.set_prefix("Preparing");
        bar.set_message("Opening PDF…");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self { bar })
    }
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"])
}

impl ExtractionProgressCallback for CliProgress {
    fn on_render_start(&self, pages_to_process: usize) {
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}/{len} pages",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        self.bar.set_length(pages_to_process as u64);
        self.bar.set_style(style);
        self.bar.set_prefix("Rendering");
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Converting {pages_to_process} pages to images…"))
        ));
    }

    fn on_page_rendered(&self, page_num: usize, total: usize) {
        self.bar
            .println(format!("  {} Processed page {page_num}/{total}", green("✓")));
        self.bar.inc(1);
    }

    fn on_request_start(&self, image_count: usize) {
        self.bar.set_style(spinner_style());
        self.bar.set_prefix("Extracting");
        self.bar.set_message(format!(
            "sent {image_count} page images, waiting for the model…"
        ));
    }

    fn on_request_complete(&self, reply_len: usize) {
        self.bar.finish_and_clear();
        eprintln!(
            "{} model replied with {} bytes",
            green("✔"),
            bold(&reply_len.to_string())
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Extract to the default location (toc/<name>_toc.txt)
  pdftoc ruling.pdf

  # Explicit output file
  pdftoc ruling.pdf extracted/ruling.txt

  # Interactive: prompts for the path
  pdftoc

  # Scan more leading pages, use a stronger model
  pdftoc --max-pages 30 --model gpt-4.1 bundle.pdf

  # Inspect PDF metadata (no API key needed)
  pdftoc --inspect-only ruling.pdf

  # Structured JSON result instead of the text preview
  pdftoc --json ruling.pdf

ENVIRONMENT VARIABLES:
  OPENAI_API_KEY          OpenAI API key (required unless another provider
                          is configured)
  PDFTOC_MODEL            Override model ID
  PDFTOC_PROVIDER         Override provider (openai, anthropic, gemini, …)
  PDFIUM_LIB_PATH         Path to an existing libpdfium — skips auto-download

SETUP:
  1. Set API key:   export OPENAI_API_KEY=sk-...
  2. Extract:       pdftoc ruling.pdf

  PDFium (~30 MB) is downloaded automatically on first run and cached.
  No manual library setup is required.
"#;

/// Extract the table of contents from a PDF using a vision language model.
#[derive(Parser, Debug)]
#[command(
    name = "pdftoc",
    version,
    about = "Extract the table of contents from a PDF using a vision language model",
    long_about = "Extract the table of contents from a PDF by rendering its leading pages as \
images and submitting them, in one request, to a vision-capable language model. The reply is \
saved verbatim inside a ``` fence.",
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Local PDF file path. Prompted for interactively when omitted.
    input: Option<String>,

    /// Output text file. Defaults to toc/<input-stem>_toc.txt.
    output: Option<PathBuf>,

    /// Maximum number of leading pages to rasterise.
    #[arg(long, env = "PDFTOC_MAX_PAGES", default_value_t = 20)]
    max_pages: usize,

    /// Zoom factor for rasterisation (1.0–4.0).
    #[arg(long, env = "PDFTOC_ZOOM", default_value_t = 2.0)]
    zoom: f32,

    /// Model ID (e.g. gpt-4.1-mini, gpt-4.1).
    #[arg(long, env = "PDFTOC_MODEL")]
    model: Option<String>,

    /// Provider: openai, anthropic, gemini, ollama, azure.
    /// Auto-detected from API-key env vars if not set.
    #[arg(long, env = "PDFTOC_PROVIDER")]
    provider: Option<String>,

    /// Max model output tokens.
    #[arg(long, env = "PDFTOC_MAX_TOKENS", default_value_t = 20_000)]
    max_tokens: usize,

    /// Model temperature (0.0–2.0).
    #[arg(long, env = "PDFTOC_TEMPERATURE", default_value_t = 0.1)]
    temperature: f32,

    /// Path to a text file containing a custom system prompt.
    #[arg(long, env = "PDFTOC_SYSTEM_PROMPT")]
    system_prompt: Option<PathBuf>,

    /// Output the structured result as JSON instead of the text preview.
    #[arg(long, env = "PDFTOC_JSON")]
    json: bool,

    /// Disable the progress bar.
    #[arg(long, env = "PDFTOC_NO_PROGRESS")]
    no_progress: bool,

    /// Print PDF metadata only, no extraction.
    #[arg(long)]
    inspect_only: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "PDFTOC_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, env = "PDFTOC_QUIET")]
    quiet: bool,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar provides all the feedback that matters to the user.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    // Failures never change the exit status; they are reported as one
    // printed line from the single boundary below.
    if let Err(e) = run(cli, show_progress).await {
        println!("Error extracting Table of Contents: {e:#}");
    }
}

async fn run(cli: Cli, show_progress: bool) -> Result<()> {
    if !cli.quiet && !cli.json {
        print_banner();
    }

    // ── Ensure the PDFium engine is available ────────────────────────────
    // On the very first run the library (~30 MB) is downloaded and cached;
    // subsequent startups skip this block entirely (path check only).
    // block_in_place keeps the blocking download off the async executor's
    // hot path without requiring a 'static closure.
    if !pdfium_auto::is_pdfium_cached() {
        let quiet = cli.quiet;
        tokio::task::block_in_place(|| ensure_pdfium(quiet))?;
    }

    // ── Resolve the input path ───────────────────────────────────────────
    let input = match cli.input {
        Some(ref path) => path.clone(),
        None => prompt_for_path()?,
    };

    if !std::path::Path::new(&input).exists() {
        println!("Error: File not found: {input}");
        return Ok(());
    }

    // ── Inspect-only mode ────────────────────────────────────────────────
    if cli.inspect_only {
        let meta = inspect(&input).await.context("Failed to inspect PDF")?;

        if cli.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&meta).context("Failed to serialise metadata")?
            );
        } else {
            println!("File:         {input}");
            if let Some(ref t) = meta.title {
                println!("Title:        {t}");
            }
            if let Some(ref a) = meta.author {
                println!("Author:       {a}");
            }
            if let Some(ref s) = meta.subject {
                println!("Subject:      {s}");
            }
            println!("Pages:        {}", meta.page_count);
            println!("PDF Version:  {}", meta.pdf_version);
            if let Some(ref p) = meta.producer {
                println!("Producer:     {p}");
            }
            if let Some(ref c) = meta.creator {
                println!("Creator:      {c}");
            }
        }
        return Ok(());
    }

    // ── Compute the output path ──────────────────────────────────────────
    let output_path = cli
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(std::path::Path::new(&input)));

    if !cli.quiet && !cli.json {
        println!("Extracting Table of Contents from: {input}");
        println!("Output will be saved to: {}", output_path.display());
    }

    // ── Build config and run ─────────────────────────────────────────────
    let progress: Option<ProgressCallback> = if show_progress {
        Some(CliProgress::new_dynamic() as Arc<dyn ExtractionProgressCallback>)
    } else {
        None
    };

    let config = build_config(&cli, progress).await?;
    let result = extract_table_of_contents(&input, &output_path, &config)
        .await
        .context("Extraction failed")?;

    // ── Report ───────────────────────────────────────────────────────────
    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&result).context("Failed to serialise output")?
        );
        return Ok(());
    }

    if !cli.quiet {
        println!("\nExtraction Complete!");
        println!("Table of Contents saved to: {}", result.output_path.display());

        println!("\nPreview of extracted Table of Contents:");
        println!("{}", "-".repeat(80));
        println!("{}", output::preview(&result.toc, 10));
        println!("{}", "-".repeat(80));

        eprintln!(
            "   {}",
            dim(&format!(
                "{}/{} pages rendered in {}ms, model {}ms, {}ms total",
                result.stats.pages_rendered,
                result.stats.total_pages,
                result.stats.render_duration_ms,
                result.stats.model_duration_ms,
                result.stats.total_duration_ms
            ))
        );
    }

    Ok(())
}

fn print_banner() {
    println!("{}", "=".repeat(80));
    println!("{:=^80}", " PDF Table of Contents Extractor ");
    println!("{}", "=".repeat(80));
}

/// Read the input path interactively when no positional argument was given.
fn prompt_for_path() -> Result<String> {
    print!("Enter path to PDF file: ");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}

/// Download the pdfium library to the cache, with a progress bar unless quiet.
fn ensure_pdfium(quiet: bool) -> Result<()> {
    if quiet {
        pdfium_auto::ensure_pdfium_library(None).context("Failed to download PDFium engine")?;
        return Ok(());
    }

    let dl_bar = ProgressBar::new(0);
    dl_bar.set_style(
        ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {bytes}/{total_bytes}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    dl_bar.set_prefix("PDF engine");
    dl_bar.set_message("Connecting…");
    dl_bar.enable_steady_tick(Duration::from_millis(80));

    let bar = dl_bar.clone();
    let on_progress = move |downloaded: u64, total: Option<u64>| {
        if let Some(t) = total {
            if bar.length().unwrap_or(0) != t {
                bar.set_length(t);
            }
        }
        bar.set_position(downloaded);
    };
    pdfium_auto::ensure_pdfium_library(Some(&on_progress))
        .context("Failed to download PDFium engine")?;

    dl_bar.finish_with_message("ready ✓");
    Ok(())
}

/// Map CLI args to `ExtractionConfig`.
async fn build_config(cli: &Cli, progress: Option<ProgressCallback>) -> Result<ExtractionConfig> {
    let system_prompt = if let Some(ref path) = cli.system_prompt {
        Some(
            tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read system prompt from {path:?}"))?,
        )
    } else {
        None
    };

    let mut builder = ExtractionConfig::builder()
        .max_pages(cli.max_pages)
        .zoom(cli.zoom)
        .max_tokens(cli.max_tokens)
        .temperature(cli.temperature);

    if let Some(ref model) = cli.model {
        builder = builder.model(model.clone());
    }
    if let Some(ref provider) = cli.provider {
        builder = builder.provider_name(provider.clone());
    }
    if let Some(prompt) = system_prompt {
        builder = builder.system_prompt(prompt);
    }
    if let Some(cb) = progress {
        builder = builder.progress(cb);
    }

    builder.build().context("Invalid configuration")
}
