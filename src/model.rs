//! Vision model access: the capability trait and its provider-backed impl.
//!
//! The remote call is the one opaque external dependency in the pipeline, so
//! it sits behind [`VisionModel`] — a single `submit` operation taking the
//! instruction text and the ordered page images and returning the model's raw
//! reply. Production code wires in [`ProviderModel`]; tests inject a stub via
//! [`crate::config::ExtractionConfig::vision`] and never touch the network.
//!
//! There is deliberately no retry, timeout, or response validation here: the
//! reply is taken verbatim from the first choice, and any transport or
//! authentication failure propagates unmodified.

use crate::error::TocError;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use tracing::debug;

pub use edgequake_llm::ImageData;

/// Capability interface for the one outbound model call.
///
/// `submit` sends one multimodal request — the fixed instruction plus the
/// ordered page images — and returns the reply text.
#[async_trait]
pub trait VisionModel: Send + Sync {
    async fn submit(&self, instruction: &str, images: Vec<ImageData>) -> Result<String, TocError>;
}

/// [`VisionModel`] backed by an `edgequake-llm` provider.
///
/// ## Message Layout
///
/// The request contains (in order):
/// 1. **System message** — the transcription-rules prompt
/// 2. **User message** — the instruction text block with every page image
///    attached at high detail
///
/// All images travel in one user turn so the model sees the whole candidate
/// range at once and can follow a TOC across page boundaries.
pub struct ProviderModel {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    temperature: f32,
    max_tokens: usize,
}

impl ProviderModel {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        system_prompt: impl Into<String>,
        temperature: f32,
        max_tokens: usize,
    ) -> Self {
        Self {
            provider,
            system_prompt: system_prompt.into(),
            temperature,
            max_tokens,
        }
    }
}

#[async_trait]
impl VisionModel for ProviderModel {
    async fn submit(&self, instruction: &str, images: Vec<ImageData>) -> Result<String, TocError> {
        let image_count = images.len();
        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user_with_images(instruction, images),
        ];

        let options = CompletionOptions {
            temperature: Some(self.temperature),
            max_tokens: Some(self.max_tokens),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| TocError::ModelCallFailed {
                message: format!("{e}"),
            })?;

        debug!(
            "Model reply: {} images in, {} prompt tokens, {} completion tokens",
            image_count, response.prompt_tokens, response.completion_tokens
        );

        Ok(response.content)
    }
}
