//! PDF rasterisation: render the leading pages to encoded images via pdfium.
//!
//! ## Why spawn_blocking?
//!
//! The `pdfium-render` crate wraps the pdfium C++ library, which uses
//! thread-local state internally and is not safe to call from async contexts.
//! `tokio::task::spawn_blocking` moves the work onto a dedicated thread pool
//! thread designed for blocking operations, preventing the Tokio worker
//! threads from stalling during CPU-heavy rendering.
//!
//! ## Resource lifetime
//!
//! The document handle lives inside the blocking closure and is dropped on
//! every exit path, including mid-loop rasterisation failures. Nothing
//! outside this module ever holds the handle.

use crate::config::ExtractionConfig;
use crate::error::TocError;
use crate::model::ImageData;
use crate::output::DocumentMetadata;
use crate::pipeline::encode;
use crate::progress::ProgressCallback;
use pdfium_render::prelude::*;
use std::path::Path;
use tracing::{debug, info};

/// Pages rasterised from a document, plus the true page count.
pub struct RenderedPages {
    /// Encoded page images, in page order. Length is
    /// `min(max_pages, total_pages)`.
    pub images: Vec<ImageData>,
    /// Pages in the source document, before bounding.
    pub total_pages: usize,
}

/// Rasterise and encode the first `min(config.max_pages, page_count)` pages.
///
/// This runs inside `spawn_blocking` since pdfium operations are CPU-bound.
/// One progress event fires per page, in page order.
pub async fn render_pages(
    pdf_path: &Path,
    config: &ExtractionConfig,
    progress: Option<ProgressCallback>,
) -> Result<RenderedPages, TocError> {
    let path = pdf_path.to_path_buf();
    let max_pages = config.max_pages;
    let zoom = config.zoom;

    tokio::task::spawn_blocking(move || {
        render_pages_blocking(&path, max_pages, zoom, progress)
    })
    .await
    .map_err(|e| TocError::Internal(format!("Render task panicked: {}", e)))?
}

/// Blocking implementation of page rendering.
fn render_pages_blocking(
    pdf_path: &Path,
    max_pages: usize,
    zoom: f32,
    progress: Option<ProgressCallback>,
) -> Result<RenderedPages, TocError> {
    let pdfium = bind_pdfium()?;

    let document =
        pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| TocError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

    let pages = document.pages();
    let total_pages = pages.len() as usize;
    let pages_to_process = max_pages.min(total_pages);
    info!(
        "PDF loaded: {} pages, rasterising the first {}",
        total_pages, pages_to_process
    );

    if let Some(ref cb) = progress {
        cb.on_render_start(pages_to_process);
    }

    let render_config = PdfRenderConfig::new().scale_page_by_factor(zoom);

    let mut images = Vec::with_capacity(pages_to_process);

    for idx in 0..pages_to_process {
        let page = pages
            .get(idx as u16)
            .map_err(|e| TocError::RasterisationFailed {
                page: idx + 1,
                detail: format!("{:?}", e),
            })?;

        let bitmap =
            page.render_with_config(&render_config)
                .map_err(|e| TocError::RasterisationFailed {
                    page: idx + 1,
                    detail: format!("{:?}", e),
                })?;

        let image = bitmap.as_image();
        debug!(
            "Rendered page {} → {}x{} px",
            idx + 1,
            image.width(),
            image.height()
        );

        let encoded = encode::encode_page(&image).map_err(|e| TocError::RasterisationFailed {
            page: idx + 1,
            detail: format!("Image encoding failed: {}", e),
        })?;
        images.push(encoded);

        if let Some(ref cb) = progress {
            cb.on_page_rendered(idx + 1, pages_to_process);
        }
    }

    Ok(RenderedPages {
        images,
        total_pages,
    })
}

/// Extract document metadata from a PDF without rendering pages.
pub async fn extract_metadata(pdf_path: &Path) -> Result<DocumentMetadata, TocError> {
    let path = pdf_path.to_path_buf();

    tokio::task::spawn_blocking(move || extract_metadata_blocking(&path))
        .await
        .map_err(|e| TocError::Internal(format!("Metadata task panicked: {}", e)))?
}

/// Blocking implementation of metadata extraction.
fn extract_metadata_blocking(pdf_path: &Path) -> Result<DocumentMetadata, TocError> {
    let pdfium = bind_pdfium()?;

    let document =
        pdfium
            .load_pdf_from_file(pdf_path, None)
            .map_err(|e| TocError::CorruptPdf {
                path: pdf_path.to_path_buf(),
                detail: format!("{:?}", e),
            })?;

    let metadata = document.metadata();
    let pages = document.pages();

    let get_meta = |tag: PdfDocumentMetadataTagType| -> Option<String> {
        metadata.get(tag).and_then(|t| {
            let v = t.value().to_string();
            if v.is_empty() {
                None
            } else {
                Some(v)
            }
        })
    };

    Ok(DocumentMetadata {
        title: get_meta(PdfDocumentMetadataTagType::Title),
        author: get_meta(PdfDocumentMetadataTagType::Author),
        subject: get_meta(PdfDocumentMetadataTagType::Subject),
        creator: get_meta(PdfDocumentMetadataTagType::Creator),
        producer: get_meta(PdfDocumentMetadataTagType::Producer),
        page_count: pages.len() as usize,
        pdf_version: format!("{:?}", document.version()),
    })
}

/// Bind to the pdfium library, downloading it to the cache on first use.
fn bind_pdfium() -> Result<Pdfium, TocError> {
    pdfium_auto::bind_pdfium_silent().map_err(|e| TocError::PdfiumBindingFailed(e.to_string()))
}
