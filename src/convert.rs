//! Notes generation entry points.
//!
//! [`NotesPipeline`] owns the two collaborators and the config; the server
//! keeps one in its state and the CLI builds one per run. The free functions
//! are shorthands for one-off calls.

use crate::config::{NotesConfig, DEFAULT_GEMINI_MODEL};
use crate::delivery::render_notes;
use crate::error::NotesError;
use crate::pipeline::input::{require_submission, validate, ImageUpload};
use crate::pipeline::notes::{LlmNoteGenerator, NoteGenerator};
use crate::pipeline::ocr::{TextExtractor, VisionTextExtractor};
use crate::pipeline::postprocess::clean_notes_html;
use crate::progress::{NoopProgressCallback, NotesProgressCallback, Stage};
use chrono::NaiveDate;
use edgequake_llm::{LLMProvider, ProviderFactory};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};

/// OCR + note generation + rendering with fixed collaborators.
#[derive(Clone)]
pub struct NotesPipeline {
    extractor: Arc<dyn TextExtractor>,
    generator: Arc<dyn NoteGenerator>,
    config: NotesConfig,
}

impl std::fmt::Debug for NotesPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotesPipeline")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NotesPipeline {
    pub fn new(
        extractor: Arc<dyn TextExtractor>,
        generator: Arc<dyn NoteGenerator>,
        config: NotesConfig,
    ) -> Self {
        Self {
            extractor,
            generator,
            config,
        }
    }

    /// Build the LLM-backed collaborators for `config`.
    pub fn from_config(config: NotesConfig) -> Result<Self, NotesError> {
        let provider = resolve_provider(&config)?;
        let mut extractor = VisionTextExtractor::new(Arc::clone(&provider));
        if let Some(ref prompt) = config.ocr_prompt {
            extractor = extractor.with_prompt(prompt.as_str());
        }
        let generator = LlmNoteGenerator::new(provider, &config);
        Ok(Self::new(Arc::new(extractor), Arc::new(generator), config))
    }

    pub fn config(&self) -> &NotesConfig {
        &self.config
    }

    /// Check the upload and topic without touching any collaborator.
    pub fn validate(&self, upload: &ImageUpload, topic: &str) -> Result<(), NotesError> {
        require_submission(std::slice::from_ref(upload), topic)?;
        validate(upload, self.config.max_upload_bytes)?;
        Ok(())
    }

    /// Image + topic → cleaned HTML notes.
    pub async fn notes(
        &self,
        upload: &ImageUpload,
        topic: &str,
        progress: &dyn NotesProgressCallback,
    ) -> Result<String, NotesError> {
        self.validate(upload, topic)?;
        generate_notes_with_progress(
            self.extractor.as_ref(),
            self.generator.as_ref(),
            upload,
            topic,
            progress,
        )
        .await
    }

    /// Image + topic → PDF bytes, laid out with the configured geometry.
    pub async fn pdf(
        &self,
        upload: &ImageUpload,
        topic: &str,
        generated_on: NaiveDate,
        progress: &dyn NotesProgressCallback,
    ) -> Result<Vec<u8>, NotesError> {
        let html = self.notes(upload, topic, progress).await?;

        progress.on_stage_start(Stage::Layout);
        let rendered = report(
            progress,
            Stage::Layout,
            render_notes(&html, topic, generated_on, &self.config.geometry),
            |r| r.page_count(),
        )?;

        progress.on_stage_start(Stage::Pdf);
        report(progress, Stage::Pdf, rendered.to_pdf_bytes(), Vec::len)
    }
}

/// Generate HTML notes for one image.
///
/// This is the primary entry point for the library.
///
/// # Example
/// ```rust,no_run
/// use smart_notes::{generate_notes, ImageUpload, NotesConfig};
///
/// # #[tokio::main]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let upload = ImageUpload::from_path("lecture.png").await?;
/// let html = generate_notes(&upload, "Cell Biology", &NotesConfig::default()).await?;
/// println!("{html}");
/// # Ok(())
/// # }
/// ```
pub async fn generate_notes(
    upload: &ImageUpload,
    topic: &str,
    config: &NotesConfig,
) -> Result<String, NotesError> {
    NotesPipeline::from_config(config.clone())?
        .notes(upload, topic, &NoopProgressCallback)
        .await
}

/// Generate a notes PDF for one image, stamped with `generated_on`.
pub async fn generate_pdf(
    upload: &ImageUpload,
    topic: &str,
    config: &NotesConfig,
    generated_on: NaiveDate,
) -> Result<Vec<u8>, NotesError> {
    NotesPipeline::from_config(config.clone())?
        .pdf(upload, topic, generated_on, &NoopProgressCallback)
        .await
}

/// Synchronous wrapper around [`generate_notes`].
///
/// Creates a temporary tokio runtime internally.
pub fn generate_notes_sync(
    upload: &ImageUpload,
    topic: &str,
    config: &NotesConfig,
) -> Result<String, NotesError> {
    tokio::runtime::Runtime::new()
        .map_err(|e| NotesError::Internal(format!("Failed to create tokio runtime: {}", e)))?
        .block_on(generate_notes(upload, topic, config))
}

/// OCR → note generation → cleanup, reporting each stage to `progress`.
///
/// Does not validate; callers check the upload first.
pub async fn generate_notes_with_progress(
    extractor: &dyn TextExtractor,
    generator: &dyn NoteGenerator,
    upload: &ImageUpload,
    topic: &str,
    progress: &dyn NotesProgressCallback,
) -> Result<String, NotesError> {
    let start = Instant::now();
    info!("Generating notes on '{}' from {}", topic.trim(), upload.name);

    progress.on_stage_start(Stage::Ocr);
    let text = report(
        progress,
        Stage::Ocr,
        extractor.extract_text(upload).await,
        String::len,
    )?;
    debug!("Extracted {} chars from {}", text.len(), upload.name);

    progress.on_stage_start(Stage::Notes);
    let raw = generator.generate(topic.trim(), &text).await;
    let html = report(progress, Stage::Notes, raw.map(|h| clean_notes_html(&h)), String::len)?;

    info!(
        "Notes on '{}' ready: {} bytes in {:?}",
        topic.trim(),
        html.len(),
        start.elapsed()
    );
    Ok(html)
}

/// Forward a stage outcome to the callback and pass it through.
fn report<T>(
    progress: &dyn NotesProgressCallback,
    stage: Stage,
    result: Result<T, NotesError>,
    size: impl FnOnce(&T) -> usize,
) -> Result<T, NotesError> {
    match &result {
        Ok(value) => progress.on_stage_complete(stage, size(value)),
        Err(e) => progress.on_stage_error(stage, &e.to_string()),
    }
    result
}

// ── Provider resolution ──────────────────────────────────────────────────

fn create_provider(provider_name: &str, model: &str) -> Result<Arc<dyn LLMProvider>, NotesError> {
    ProviderFactory::create_llm_provider(provider_name, model).map_err(|e| {
        NotesError::ProviderNotConfigured {
            provider: provider_name.to_string(),
            hint: format!("{e}"),
        }
    })
}

fn non_empty_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Resolve the LLM provider, from most-specific to least-specific.
///
/// 1. **Pre-built provider** (`config.provider`), used as-is.
/// 2. **Named provider + model** (`config.provider_name`); the factory reads
///    that provider's API key from the environment.
/// 3. **Environment pair** (`EDGEQUAKE_LLM_PROVIDER` + `EDGEQUAKE_MODEL`),
///    both set.
/// 4. **Gemini** when `GEMINI_API_KEY` is set, with `config.model` or
///    `gemini-2.0-flash`.
/// 5. **Full auto-detection** (`ProviderFactory::from_env`).
pub fn resolve_provider(config: &NotesConfig) -> Result<Arc<dyn LLMProvider>, NotesError> {
    if let Some(ref provider) = config.provider {
        return Ok(Arc::clone(provider));
    }

    if let Some(ref name) = config.provider_name {
        let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
        return create_provider(name, model);
    }

    if let (Some(prov), Some(model)) = (
        non_empty_env("EDGEQUAKE_LLM_PROVIDER"),
        non_empty_env("EDGEQUAKE_MODEL"),
    ) {
        return create_provider(&prov, &model);
    }

    if non_empty_env("GEMINI_API_KEY").is_some() {
        let model = config.model.as_deref().unwrap_or(DEFAULT_GEMINI_MODEL);
        return create_provider("gemini", model);
    }

    let (llm_provider, _embedding) =
        ProviderFactory::from_env().map_err(|e| NotesError::ProviderNotConfigured {
            provider: "auto".to_string(),
            hint: format!(
                "No LLM provider could be auto-detected from environment.\n\
                Set GEMINI_API_KEY, OPENAI_API_KEY, or configure a provider.\n\
                Error: {}",
                e
            ),
        })?;

    Ok(llm_provider)
}
