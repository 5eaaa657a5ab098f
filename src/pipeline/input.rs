//! Input validation: check the user-supplied path before pdfium sees it.
//!
//! pdfium's error for a non-PDF file is an opaque load failure, so we verify
//! the `%PDF` magic bytes up front and give the caller a precise error
//! instead of a pdfium diagnostic.

use crate::error::TocError;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Validate a local PDF path: existence, readability, magic bytes.
///
/// Returns the path unchanged on success so callers can hand it straight to
/// the renderer.
pub fn resolve_input(path_str: &str) -> Result<PathBuf, TocError> {
    let path = PathBuf::from(path_str);

    if !path.exists() {
        return Err(TocError::FileNotFound { path });
    }

    // Check read permission by attempting to open
    match std::fs::File::open(&path) {
        Ok(mut f) => {
            use std::io::Read;
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(TocError::NotAPdf { path, magic });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(TocError::PermissionDenied { path });
        }
        Err(_) => {
            return Err(TocError::FileNotFound { path });
        }
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(path)
}

/// True when `path` looks like a PDF by magic bytes alone.
pub fn has_pdf_magic(path: &Path) -> bool {
    use std::io::Read;
    let mut magic = [0u8; 4];
    std::fs::File::open(path)
        .and_then(|mut f| f.read_exact(&mut magic))
        .map(|_| &magic == b"%PDF")
        .unwrap_or(false)
}
