//! Note generation: extracted text + topic → HTML study notes.
//!
//! Like OCR this is a collaborator behind a trait. The default
//! [`LlmNoteGenerator`] sends one chat completion and returns the raw
//! response; cleanup happens in [`crate::pipeline::postprocess`] so the
//! prompt can stay focused on content.

use crate::config::NotesConfig;
use crate::error::NotesError;
use crate::prompts::{notes_request, DEFAULT_NOTES_PROMPT};
use async_trait::async_trait;
use edgequake_llm::{ChatMessage, CompletionOptions, LLMProvider};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Given extracted text and a topic, return an HTML notes document.
#[async_trait]
pub trait NoteGenerator: Send + Sync {
    async fn generate(&self, topic: &str, extracted_text: &str) -> Result<String, NotesError>;
}

/// Note generation through a chat LLM.
pub struct LlmNoteGenerator {
    provider: Arc<dyn LLMProvider>,
    system_prompt: String,
    options: CompletionOptions,
}

impl LlmNoteGenerator {
    pub fn new(provider: Arc<dyn LLMProvider>, config: &NotesConfig) -> Self {
        Self {
            provider,
            system_prompt: config
                .notes_prompt
                .clone()
                .unwrap_or_else(|| DEFAULT_NOTES_PROMPT.to_string()),
            options: build_options(config),
        }
    }
}

#[async_trait]
impl NoteGenerator for LlmNoteGenerator {
    async fn generate(&self, topic: &str, extracted_text: &str) -> Result<String, NotesError> {
        let start = Instant::now();
        let messages = vec![
            ChatMessage::system(self.system_prompt.as_str()),
            ChatMessage::user(notes_request(topic, extracted_text)),
        ];

        let response = self
            .provider
            .chat(&messages, Some(&self.options))
            .await
            .map_err(|e| {
                warn!("Note generation for '{}' failed: {}", topic, e);
                NotesError::GenerationFailed(e.to_string())
            })?;

        debug!(
            "Notes '{}': {} input tokens, {} output tokens, {:?}",
            topic,
            response.prompt_tokens,
            response.completion_tokens,
            start.elapsed()
        );

        if response.content.trim().is_empty() {
            return Err(NotesError::GenerationFailed(
                "model returned an empty response".into(),
            ));
        }
        Ok(response.content)
    }
}

/// Build `CompletionOptions` from the notes config.
fn build_options(config: &NotesConfig) -> CompletionOptions {
    CompletionOptions {
        temperature: Some(config.temperature),
        max_tokens: Some(config.max_tokens),
        ..Default::default()
    }
}
