//! Output types: extraction result, run statistics, document metadata, and
//! the text helpers the CLI uses to persist and preview a reply.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Result of one extraction run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    /// The model's reply, verbatim and unwrapped.
    pub toc: String,

    /// Where the fenced text was written.
    pub output_path: PathBuf,

    /// Timing and page-count statistics for the run.
    pub stats: ExtractionStats,
}

/// Statistics for one extraction run.
///
/// Durations are wall-clock per phase; the render and model phases are the
/// only two that take meaningful time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    /// Pages in the source document.
    pub total_pages: usize,

    /// Pages actually rasterised and attached to the request
    /// (`min(max_pages, total_pages)`).
    pub pages_rendered: usize,

    /// Wall-clock time spent rasterising and encoding, in milliseconds.
    pub render_duration_ms: u64,

    /// Wall-clock time spent waiting on the model, in milliseconds.
    pub model_duration_ms: u64,

    /// End-to-end wall-clock time, in milliseconds.
    pub total_duration_ms: u64,
}

/// Document metadata, read without contacting the model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentMetadata {
    pub title: Option<String>,
    pub author: Option<String>,
    pub subject: Option<String>,
    pub creator: Option<String>,
    pub producer: Option<String>,
    pub page_count: usize,
    pub pdf_version: String,
}

/// Wrap reply text between three-backtick fence lines.
///
/// The saved file always has this shape, even for an empty reply: a fence
/// line, the text verbatim, a fence line.
pub fn wrap_fenced(text: &str) -> String {
    format!("```\n{text}\n```")
}

/// Format the first `max_lines` lines of `text` for console display.
///
/// When more lines exist, appends `...` and a count of what was not shown.
pub fn preview(text: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    if lines.len() <= max_lines {
        return text.to_string();
    }
    let mut out: Vec<String> = lines[..max_lines].iter().map(|s| s.to_string()).collect();
    out.push("...".to_string());
    out.push(format!("[{} more lines not shown]", lines.len() - max_lines));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fence_wraps_text() {
        assert_eq!(wrap_fenced("Page 1\nPage 2"), "```\nPage 1\nPage 2\n```");
    }

    #[test]
    fn fence_wraps_empty_reply() {
        // The output file must carry the fence lines even for an empty reply.
        assert_eq!(wrap_fenced(""), "```\n\n```");
    }

    #[test]
    fn preview_short_text_is_verbatim() {
        let text = "Page 1\nPage 2";
        assert_eq!(preview(text, 10), text);
    }

    #[test]
    fn preview_exactly_at_limit_has_no_suffix() {
        let text = (1..=10).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        assert_eq!(preview(&text, 10), text);
    }

    #[test]
    fn preview_truncates_and_counts_remainder() {
        let text = (1..=13).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n");
        let p = preview(&text, 10);
        assert!(p.contains("line 10"));
        assert!(!p.contains("line 11"));
        assert!(p.ends_with("[3 more lines not shown]"));
        assert!(p.contains("\n...\n"));
    }

    #[test]
    fn stats_serialise_round_trip() {
        let stats = ExtractionStats {
            total_pages: 40,
            pages_rendered: 20,
            render_duration_ms: 1200,
            model_duration_ms: 9000,
            total_duration_ms: 10300,
        };
        let json = serde_json::to_string(&stats).unwrap();
        let back: ExtractionStats = serde_json::from_str(&json).unwrap();
        assert_eq!(back.pages_rendered, 20);
        assert_eq!(back.total_pages, 40);
    }
}
