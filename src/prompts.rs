//! Prompts for vision-based TOC extraction.
//!
//! Centralising the prompt text here serves two purposes:
//!
//! 1. **Single source of truth** — tightening the transcription rules or the
//!    expected entry format means editing exactly one place.
//!
//! 2. **Testability** — unit tests can inspect the prompts directly without
//!    a live model, so a wording regression is caught at review time.
//!
//! Callers can override the system prompt via
//! [`crate::config::ExtractionConfig::system_prompt`]; the instruction block
//! sent with the images is fixed.

/// Default system prompt framing the model as a strict transcriber.
///
/// Used when `ExtractionConfig::system_prompt` is `None`.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a specialized legal document analyzer tasked \
with extracting ONLY the actual Table of Contents from legal and judicial documents. Extract \
EXACTLY what is visible in the images without fabrication or inference. If you see a Table of \
Contents with case numbers, lawsuit details, and page numbers, extract it PRECISELY as it appears.";

/// Instruction text sent as the single text block of the user message,
/// ahead of the ordered page images.
///
/// The format line describes the exact entry shape found in the target
/// documents: case number, parties, a dotted leader, and the page number.
pub const TOC_INSTRUCTION: &str = "Extract the Table of Contents from this PDF document. The TOC follows this specific format:

[Case Number] Juicio nº [Case ID] a instancia de [Plaintiff] contra [Defendant] .................. Página [Page Number]

Requirements:
1. Extract ONLY what is actually visible in the image
2. Maintain exact case numbers, party names, and page numbers
3. Preserve section headers like 'Juzgado de lo Social Número X de Santa Cruz de Tenerife'
4. Keep dotted leader lines (..........) connecting entries to page numbers

Format using monospace to preserve the original layout. Include ONLY real content from the images.";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_prompt_forbids_fabrication() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains("without fabrication"));
    }

    #[test]
    fn instruction_describes_entry_shape() {
        assert!(TOC_INSTRUCTION.contains("Case Number"));
        assert!(TOC_INSTRUCTION.contains("dotted leader"));
        assert!(TOC_INSTRUCTION.contains("Página"));
    }
}
