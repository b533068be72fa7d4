//! Configuration types for note generation and PDF rendering.
//!
//! All behaviour is controlled through [`NotesConfig`], built via its
//! [`NotesConfigBuilder`]. The same config drives the local pipeline, the
//! HTTP server and the download client, so a CLI run and a server run with
//! the same flags produce the same layout.

use crate::error::NotesError;
use edgequake_llm::LLMProvider;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Per-file upload ceiling: 5 MB.
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

/// Base URL of the notes API used by the download client.
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";

/// Model used when only `GEMINI_API_KEY` is available.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";

/// Configuration for one notes pipeline.
///
/// # Example
/// ```rust
/// use smart_notes::{NotesConfig, PageSize};
///
/// let config = NotesConfig::builder()
///     .model("gemini-2.0-flash")
///     .page_size(PageSize::Letter)
///     .build()
///     .unwrap();
/// ```
#[derive(Clone)]
pub struct NotesConfig {
    /// LLM model identifier. If None, uses the provider default.
    pub model: Option<String>,

    /// LLM provider name (e.g. "gemini", "openai", "ollama").
    pub provider_name: Option<String>,

    /// Pre-constructed LLM provider. Takes precedence over `provider_name`.
    pub provider: Option<Arc<dyn LLMProvider>>,

    /// Sampling temperature for note generation. Default: 0.3.
    pub temperature: f32,

    /// Maximum tokens the LLM may generate for the notes. Default: 4096.
    pub max_tokens: usize,

    /// Custom OCR transcription prompt. If None, uses the built-in one.
    pub ocr_prompt: Option<String>,

    /// Custom note-generation prompt. If None, uses the built-in one.
    pub notes_prompt: Option<String>,

    /// Per-file upload ceiling in bytes. Default: 5 MB.
    pub max_upload_bytes: usize,

    /// Page geometry for the layout engine. Default: A4.
    pub geometry: PageGeometry,

    /// Base URL of the notes API for the download client.
    pub api_base_url: String,

    /// Optional timeout for outbound HTTP calls. Default: none.
    ///
    /// Without it a hung upstream call blocks that one operation until the
    /// peer gives up.
    pub request_timeout_secs: Option<u64>,
}

impl Default for NotesConfig {
    fn default() -> Self {
        Self {
            model: None,
            provider_name: None,
            provider: None,
            temperature: 0.3,
            max_tokens: 4096,
            ocr_prompt: None,
            notes_prompt: None,
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            geometry: PageGeometry::default(),
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            request_timeout_secs: None,
        }
    }
}

impl fmt::Debug for NotesConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NotesConfig")
            .field("model", &self.model)
            .field("provider_name", &self.provider_name)
            .field("provider", &self.provider.as_ref().map(|_| "<dyn LLMProvider>"))
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("geometry", &self.geometry)
            .field("api_base_url", &self.api_base_url)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl NotesConfig {
    /// Create a new builder for `NotesConfig`.
    pub fn builder() -> NotesConfigBuilder {
        NotesConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`NotesConfig`].
#[derive(Debug)]
pub struct NotesConfigBuilder {
    config: NotesConfig,
}

impl NotesConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = Some(model.into());
        self
    }

    pub fn provider_name(mut self, name: impl Into<String>) -> Self {
        self.config.provider_name = Some(name.into());
        self
    }

    pub fn provider(mut self, provider: Arc<dyn LLMProvider>) -> Self {
        self.config.provider = Some(provider);
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

    pub fn ocr_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.ocr_prompt = Some(prompt.into());
        self
    }

    pub fn notes_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.notes_prompt = Some(prompt.into());
        self
    }

    pub fn max_upload_bytes(mut self, n: usize) -> Self {
        self.config.max_upload_bytes = n;
        self
    }

    pub fn geometry(mut self, geometry: PageGeometry) -> Self {
        self.config.geometry = geometry;
        self
    }

    pub fn page_size(mut self, size: PageSize) -> Self {
        let (width, height) = size.dimensions();
        self.config.geometry.width = width;
        self.config.geometry.height = height;
        self
    }

    pub fn api_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_base_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn request_timeout_secs(mut self, secs: u64) -> Self {
        self.config.request_timeout_secs = Some(secs);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<NotesConfig, NotesError> {
        let c = &self.config;
        if c.max_upload_bytes == 0 {
            return Err(NotesError::InvalidConfig(
                "Upload ceiling must be > 0 bytes".into(),
            ));
        }
        if c.max_tokens == 0 {
            return Err(NotesError::InvalidConfig("max_tokens must be ≥ 1".into()));
        }
        c.geometry.validate()?;
        if !(c.api_base_url.starts_with("http://") || c.api_base_url.starts_with("https://")) {
            return Err(NotesError::InvalidConfig(format!(
                "API base URL must be http(s), got '{}'",
                c.api_base_url
            )));
        }
        Ok(self.config)
    }
}

// ── Page geometry ────────────────────────────────────────────────────────

/// Named page sizes, in PDF points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PageSize {
    /// 595.28 × 841.89 pt (default).
    #[default]
    A4,
    /// 612 × 792 pt.
    Letter,
}

impl PageSize {
    pub fn dimensions(self) -> (f32, f32) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
        }
    }
}

/// Fixed page geometry for one render.
///
/// `margin` applies on all four sides. Lines are never placed below
/// `height - bottom_reserve`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageGeometry {
    pub width: f32,
    pub height: f32,
    pub margin: f32,
    pub bottom_reserve: f32,
}

impl Default for PageGeometry {
    fn default() -> Self {
        let (width, height) = PageSize::A4.dimensions();
        Self {
            width,
            height,
            margin: 40.0,
            bottom_reserve: 60.0,
        }
    }
}

impl PageGeometry {
    /// Default margins on a custom page size.
    pub fn with_size(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    pub fn content_width(&self) -> f32 {
        self.width - 2.0 * self.margin
    }

    /// Lowest y (measured from the top) a line may extend to.
    pub fn bottom_limit(&self) -> f32 {
        self.height - self.bottom_reserve
    }

    pub fn validate(&self) -> Result<(), NotesError> {
        if self.content_width() <= 0.0 {
            return Err(NotesError::InvalidConfig(format!(
                "Page width {} leaves no room inside {}pt margins",
                self.width, self.margin
            )));
        }
        if self.bottom_limit() <= self.margin {
            return Err(NotesError::InvalidConfig(format!(
                "Page height {} leaves no room between the top margin and the bottom reserve",
                self.height
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_upload_rules() {
        let c = NotesConfig::default();
        assert_eq!(c.max_upload_bytes, 5 * 1024 * 1024);
        assert_eq!(c.request_timeout_secs, None);
        assert_eq!(c.geometry.margin, 40.0);
        assert_eq!(c.geometry.bottom_reserve, 60.0);
    }

    #[test]
    fn content_width_subtracts_both_margins() {
        let g = PageGeometry::with_size(600.0, 800.0);
        assert_eq!(g.content_width(), 520.0);
        assert_eq!(g.bottom_limit(), 740.0);
    }

    #[test]
    fn builder_rejects_degenerate_page() {
        let err = NotesConfig::builder()
            .geometry(PageGeometry::with_size(60.0, 800.0))
            .build()
            .unwrap_err();
        assert!(matches!(err, NotesError::InvalidConfig(_)));
    }

    #[test]
    fn builder_trims_trailing_slash() {
        let c = NotesConfig::builder()
            .api_base_url("https://notes.example.com/")
            .build()
            .unwrap();
        assert_eq!(c.api_base_url, "https://notes.example.com");
    }

    #[test]
    fn builder_rejects_non_http_url() {
        assert!(NotesConfig::builder()
            .api_base_url("ftp://example.com")
            .build()
            .is_err());
    }

    #[test]
    fn page_size_letter() {
        let c = NotesConfig::builder()
            .page_size(PageSize::Letter)
            .build()
            .unwrap();
        assert_eq!(c.geometry.width, 612.0);
        assert_eq!(c.geometry.height, 792.0);
        assert_eq!(c.geometry.margin, 40.0);
    }
}
