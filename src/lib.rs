//! # pdftoc
//!
//! Extract the table of contents from a PDF using a vision language model.
//!
//! ## Why this crate?
//!
//! TOC pages in scanned and court-issued documents are rarely tagged as PDF
//! outlines, and text extraction garbles the dotted leaders and page-number
//! columns that carry the structure. Instead this crate rasterises the leading
//! pages into PNGs and lets a vision model read them as a human would,
//! transcribing the index exactly as printed.
//!
//! ## Pipeline Overview
//!
//! ```text
//! PDF
//!  │
//!  ├─ 1. Input    validate the local file (exists, readable, %PDF magic)
//!  ├─ 2. Render   rasterise the first pages via pdfium (CPU-bound, spawn_blocking)
//!  ├─ 3. Encode   PNG → base64 ImageData, one per page, in page order
//!  ├─ 4. Model    one multimodal request: instruction + all page images
//!  └─ 5. Output   reply wrapped in a ``` fence, written atomically to disk
//! ```
//!
//! One document, one request. Pages are not processed individually; the model
//! sees every candidate page at once so it can stitch a TOC that spans page
//! boundaries.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use pdftoc::{extract_table_of_contents, ExtractionConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Provider auto-detected from OPENAI_API_KEY
//!     let config = ExtractionConfig::default();
//!     let output = extract_table_of_contents("ruling.pdf", "toc/ruling_toc.txt", &config).await?;
//!     println!("{}", output.toc);
//!     eprintln!("pages: {}, {}ms", output.stats.pages_rendered, output.stats.total_duration_ms);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature   | Default | Description |
//! |-----------|---------|-------------|
//! | `cli`     | on      | Enables the `pdftoc` binary (clap + anyhow + tracing-subscriber) |
//! | `bundled` | off     | Embed the pdfium shared library at compile time |
//!
//! Disable `cli` when using only the library:
//! ```toml
//! pdftoc = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod extract;
pub mod model;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod prompts;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{ExtractionConfig, ExtractionConfigBuilder};
pub use error::TocError;
pub use extract::{default_output_path, extract_sync, extract_table_of_contents, inspect};
pub use model::VisionModel;
pub use output::{wrap_fenced, DocumentMetadata, ExtractionOutput, ExtractionStats};
pub use progress::{ExtractionProgressCallback, NoopProgressCallback, ProgressCallback};
