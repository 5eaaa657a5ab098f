//! The extraction client: one straight line from PDF path to saved TOC.
//!
//! ## Order of operations
//!
//! Validate input → ensure the output directory → resolve the vision model →
//! rasterise → one model call → fence → atomic write. Model resolution comes
//! before rendering on purpose: a missing API key must fail fast, before any
//! page has been rasterised.
//!
//! The model call is reached through the [`VisionModel`] capability trait,
//! so tests drive the full pipeline with a stub and no network.

use crate::config::ExtractionConfig;
use crate::error::TocError;
use crate::model::{ProviderModel, VisionModel};
use crate::output::{wrap_fenced, DocumentMetadata, ExtractionOutput, ExtractionStats};
use crate::pipeline::{input, render};
use crate::prompts::{DEFAULT_SYSTEM_PROMPT, TOC_INSTRUCTION};
use edgequake_llm::ProviderFactory;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Extract the table of contents from a PDF and save it to `output_path`.
///
/// This is the primary entry point for the library.
///
/// # Arguments
/// * `input`       — Local file path to a PDF
/// * `output_path` — Where the fenced text is written (parent directories
///   are created as needed; an existing file is overwritten)
/// * `config`      — Extraction configuration
///
/// # Returns
/// The unwrapped reply text plus run statistics. The file on disk contains
/// the same text wrapped in a three-backtick fence, even when it is empty.
///
/// # Errors
/// Any failure aborts the run: bad input path, unconfigured provider,
/// rasterisation failure, model call failure, or output write failure.
pub async fn extract_table_of_contents(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, TocError> {
    let total_start = Instant::now();
    let input_str = input_str.as_ref();
    let output_path = output_path.as_ref().to_path_buf();
    info!("Starting TOC extraction: {}", input_str);

    // ── Step 1: Validate input ───────────────────────────────────────────
    let pdf_path = input::resolve_input(input_str)?;

    // ── Step 2: Ensure the output directory exists ───────────────────────
    ensure_parent_dir(&output_path).await?;

    // ── Step 3: Resolve the vision model (fails before any rendering) ───
    let vision = resolve_vision(config)?;

    // ── Step 4: Rasterise and encode the leading pages ───────────────────
    let render_start = Instant::now();
    let rendered = render::render_pages(&pdf_path, config, config.progress.clone()).await?;
    let render_duration_ms = render_start.elapsed().as_millis() as u64;
    let image_count = rendered.images.len();
    info!(
        "Rendered {} of {} pages in {}ms",
        image_count, rendered.total_pages, render_duration_ms
    );

    // ── Step 5: One request, reply taken verbatim ────────────────────────
    if let Some(ref cb) = config.progress {
        cb.on_request_start(image_count);
    }
    let model_start = Instant::now();
    let toc = vision.submit(TOC_INSTRUCTION, rendered.images).await?;
    let model_duration_ms = model_start.elapsed().as_millis() as u64;
    if let Some(ref cb) = config.progress {
        cb.on_request_complete(toc.len());
    }
    info!("Model replied with {} bytes in {}ms", toc.len(), model_duration_ms);

    // ── Step 6: Fence and persist ────────────────────────────────────────
    write_fenced_file(&output_path, &toc).await?;
    info!("Table of contents saved to {}", output_path.display());

    let stats = ExtractionStats {
        total_pages: rendered.total_pages,
        pages_rendered: image_count,
        render_duration_ms,
        model_duration_ms,
        total_duration_ms: total_start.elapsed().as_millis() as u64,
    };

    Ok(ExtractionOutput {
        toc,
        output_path,
        stats,
    })
}

/// Synchronous wrapper around [`extract_table_of_contents`].
///
/// Creates a temporary tokio runtime internally.
pub fn extract_sync(
    input_str: impl AsRef<str>,
    output_path: impl AsRef<Path>,
    config: &ExtractionConfig,
) -> Result<ExtractionOutput, TocError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| TocError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(extract_table_of_contents(input_str, output_path, config))
}

/// Read PDF metadata without contacting the model.
///
/// Does not require an API key.
pub async fn inspect(input_str: impl AsRef<str>) -> Result<DocumentMetadata, TocError> {
    let pdf_path = input::resolve_input(input_str.as_ref())?;
    render::extract_metadata(&pdf_path).await
}

/// Compute the default output path for a given input PDF.
///
/// `foo/bar.pdf` → `toc/bar_toc.txt`. The directory is created later by the
/// extraction step, not here; this function is pure.
pub fn default_output_path(input: &Path) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string());
    PathBuf::from("toc").join(format!("{stem}_toc.txt"))
}

// ── Internal helpers ─────────────────────────────────────────────────────

/// Resolve the vision model, from most-specific to least-specific.
///
/// 1. **Pre-built model** (`config.vision`) — the caller constructed it
///    entirely; used as-is. This is the test seam.
/// 2. **Named provider** (`config.provider_name`) — resolved through the
///    provider factory, which reads the matching API key from the
///    environment.
/// 3. **`OPENAI_API_KEY` present** — the expected configuration for this
///    tool; resolves the "openai" provider explicitly.
/// 4. **Full auto-detection** — the factory scans all known API-key
///    variables and picks the first available provider.
fn resolve_vision(config: &ExtractionConfig) -> Result<Arc<dyn VisionModel>, TocError> {
    if let Some(ref vision) = config.vision {
        return Ok(Arc::clone(vision));
    }

    if let Some(ref name) = config.provider_name {
        return create_vision_model(name, config);
    }

    if let Ok(openai_key) = std::env::var("OPENAI_API_KEY") {
        if !openai_key.is_empty() {
            return create_vision_model("openai", config);
        }
    }

    let (provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| TocError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No vision provider could be auto-detected from environment.\n\
                Set OPENAI_API_KEY, or configure a provider explicitly.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(Arc::new(ProviderModel::new(
        provider,
        system_prompt(config),
        config.temperature,
        config.max_tokens,
    )))
}

/// Instantiate a named provider and wrap it as a [`VisionModel`].
fn create_vision_model(
    provider_name: &str,
    config: &ExtractionConfig,
) -> Result<Arc<dyn VisionModel>, TocError> {
    let provider = ProviderFactory::create_llm_provider(provider_name, config.model_id())
        .map_err(|e| TocError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        })?;

    Ok(Arc::new(ProviderModel::new(
        provider,
        system_prompt(config),
        config.temperature,
        config.max_tokens,
    )))
}

fn system_prompt(config: &ExtractionConfig) -> String {
    config
        .system_prompt
        .clone()
        .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string())
}

async fn ensure_parent_dir(path: &Path) -> Result<(), TocError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| TocError::OutputWriteFailed {
                    path: path.to_path_buf(),
                    source: e,
                })?;
        }
    }
    Ok(())
}

/// Write the fenced reply to `path`, overwriting any existing content.
///
/// Uses atomic write (temp file + rename) to prevent partial files.
async fn write_fenced_file(path: &Path, toc: &str) -> Result<(), TocError> {
    ensure_parent_dir(path).await?;

    let fenced = wrap_fenced(toc);
    let tmp_path = path.with_extension("txt.tmp");
    tokio::fs::write(&tmp_path, &fenced)
        .await
        .map_err(|e| TocError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    tokio::fs::rename(&tmp_path, path)
        .await
        .map_err(|e| TocError::OutputWriteFailed {
            path: path.to_path_buf(),
            source: e,
        })?;

    Ok(())
}
