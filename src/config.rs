//! Configuration for a TOC extraction run.
//!
//! All behaviour is controlled through [`ExtractionConfig`], built via its
//! [`ExtractionConfigBuilder`]. Keeping every knob in one struct means the
//! whole run is described by one value: trivial to log, to share with the
//! blocking render task, and to construct in tests with a stubbed model.

use crate::error::TocError;
use crate::model::VisionModel;
use crate::progress::ProgressCallback;
use std::fmt;
use std::sync::Arc;

/// Model identifier used when the caller does not choose one.
pub const DEFAULT_MODEL: &str = "gpt-4.1-mini";

/// Configuration for a TOC extraction.
///
/// Built via [`ExtractionConfig::builder()`] or using
/// [`ExtractionConfig::default()`].
///
/// # Example
/// ```rust
/// use pdftoc::ExtractionConfig;
///
/// let config = ExtractionConfig::builder()
///     .max_pages(10)
///     .model("gpt-4.1-mini")
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct ExtractionConfig {
    /// Upper bound on the number of leading pages rasterised. Default: 20.
    ///
    /// A TOC almost always sits in the first few pages; bounding the render
    /// keeps memory flat and the single request below API payload limits.
    /// The effective count is `min(max_pages, document page count)`.
    pub max_pages: usize,

    /// Zoom factor applied in both axes when rasterising. Range: 1.0–4.0. Default: 2.0.
    ///
    /// 2× doubles the pixel density of the rendered page, which is what makes
    /// small dotted leaders and footnote-sized page numbers legible to the
    /// model. Higher zoom grows payloads quadratically for little gain.
    pub zoom: f32,

    /// Model identifier, e.g. "gpt-4.1-mini". If None, [`DEFAULT_MODEL`] is used.
    pub model: Option<String>,

    /// Provider name (e.g. "openai"). If None, the provider factory
    /// auto-detects from API-key environment variables.
    pub provider_name: Option<String>,

    /// Pre-constructed vision model. Takes precedence over `provider_name`.
    ///
    /// This is the substitution seam: tests inject a stub here so the whole
    /// pipeline runs without a network or an API key.
    pub vision: Option<Arc<dyn VisionModel>>,

    /// Sampling temperature for the completion. Default: 0.1.
    ///
    /// Transcription work wants the model deterministic and faithful to what
    /// is printed on the page, not creative.
    pub temperature: f32,

    /// Maximum tokens the model may generate. Default: 20 000.
    ///
    /// A long judicial index can run to hundreds of entries; a generous
    /// ceiling avoids truncating the list mid-column.
    pub max_tokens: usize,

    /// Custom system prompt. If None, the built-in default is used.
    pub system_prompt: Option<String>,

    /// Progress callback for render and request events. Default: none.
    pub progress: Option<ProgressCallback>,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_pages: 20,
            zoom: 2.0,
            model: None,
            provider_name: None,
            vision: None,
            temperature: 0.1,
            max_tokens: 20_000,
            system_prompt: None,
            progress: None,
        }
    }
}

impl fmt::Debug for ExtractionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExtractionConfig")
            .field("max_pages", &self.max_pages)
            .field("zoom", &self.zoom)
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("vision", &self.vision.as_ref().map(|_| "<dyn VisionModel>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("system_prompt", &self.system_prompt.as_ref().map(|_| "<custom>"))
            .finish()
    }
}

impl ExtractionConfig {
    /// Create a new builder for `ExtractionConfig`.
    pub fn builder() -> ExtractionConfigBuilder {
        ExtractionConfigBuilder {
            config: Self::default(),
        }
    }

    /// The model identifier that will be sent with the request.
    pub fn model_id(&self) -> &str {
        self.model.as_deref().unwrap_or(DEFAULT_MODEL)
    }
}

/// Builder for [`ExtractionConfig`].
#[derive(Debug)]
pub struct ExtractionConfigBuilder {
    config: ExtractionConfig,
}

impl ExtractionConfigBuilder {
    pub fn max_pages(mut self, n: usize) -> Self {
        self.config.max_pages = n.max(1);
        self
    }

    pub fn zoom(mut self, z: f32) -> Self {
        self.config.zoom = z.clamp(1.0, 4.0);
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn vision(mut self, model: Arc<dyn VisionModel>) -> Self {
        self.config.vision = Some(model);
        self
    }

    pub fn temperature(mut self, t: f32) -> Self {
        self.config.temperature = t.clamp(0.0, 2.0);
        self
    }

    pub fn max_tokens(mut self, n: usize) -> Self {
        self.config.max_tokens = n;
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = Some(prompt.into());
        self
    }

    pub fn progress(mut self, cb: ProgressCallback) -> Self {
        self.config.progress = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractionConfig, TocError> {
        let c = &self.config;
        if c.max_pages == 0 {
            return Err(TocError::InvalidConfig("max_pages must be ≥ 1".into()));
        }
        if c.max_tokens == 0 {
            return Err(TocError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        if !(1.0..=4.0).contains(&c.zoom) {
            return Err(TocError::InvalidConfig(format!(
                "zoom must be 1.0–4.0, got {}",
                c.zoom
            )));
        }
        Ok(self.config)
    }
}
