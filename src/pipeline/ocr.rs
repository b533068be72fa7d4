//! Text extraction: uploaded image → raw text.
//!
//! The extractor is a trait so the server and tests can swap the backend.
//! The default [`VisionTextExtractor`] sends the image to a vision-capable
//! LLM with a transcription prompt. There is no retry: a failed call fails
//! the submission and the user decides whether to try again.

use crate::error::NotesError;
use crate::pipeline::encode::encode_upload;
use crate::pipeline::input::ImageUpload;
use crate::prompts::DEFAULT_OCR_PROMPT;
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Given an image, return the text it contains.
#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Extract text from one validated upload.
    ///
    /// Implementations return [`NotesError::NoTextExtracted`] rather than an
    /// empty string when nothing readable was found.
    async fn extract_text(&self, image: &ImageUpload) -> Result<String, NotesError>;
}

/// OCR through a vision LLM.
pub struct VisionTextExtractor {
    provider: Arc<dyn LLMProvider>,
    prompt: String,
}

impl VisionTextExtractor {
    pub fn new(provider: Arc<dyn LLMProvider>) -> Self {
        Self {
            provider,
            prompt: DEFAULT_OCR_PROMPT.to_string(),
        }
    }

    pub fn with_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.prompt = prompt.into();
        self
    }
}

#[async_trait]
impl TextExtractor for VisionTextExtractor {
    async fn extract_text(&self, image: &ImageUpload) -> Result<String, NotesError> {
        let start = Instant::now();
        let image_data = encode_upload(image)?;

        let messages = vec![
            ChatMessage::system(self.prompt.as_str()),
            ChatMessage::user_with_images("", vec![image_data]),
        ];
        // Transcription should be literal, not creative.
        let options = CompletionOptions {
            temperature: Some(0.0),
            ..Default::default()
        };

        let response = self
            .provider
            .chat(&messages, Some(&options))
            .await
            .map_err(|e| {
                warn!("OCR call for '{}' failed: {}", image.name, e);
                NotesError::OcrFailed(e.to_string())
            })?;

        debug!(
            "OCR '{}': {} input tokens, {} output tokens, {:?}",
            image.name,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        normalise_extracted(&response.content).ok_or(NotesError::NoTextExtracted)
    }
}

/// Collapse the transcription to single-spaced text; `None` if empty.
pub fn normalise_extracted(raw: &str) -> Option<String> {
    let text = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
