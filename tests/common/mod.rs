//! Shared collaborators and helpers for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use smart_notes::{ImageUpload, NoteGenerator, NotesConfig, NotesError, NotesPipeline, TextExtractor};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Once};
use tracing_subscriber::EnvFilter;

pub const BOUNDARY: &str = "smart-notes-test-boundary";

pub const NOTES_HTML: &str = "```html\n<h1>Cell Biology</h1>\n<p>Cells are the basic unit of life.</p>\n\
<ul><li>nucleus</li><li>mitochondria</li></ul>\n<ol><li>prophase</li><li>metaphase</li></ol>\n```";

/// OCR stand-in that counts calls and returns fixed text (or fails when empty).
pub struct CountingExtractor {
    pub text: &'static str,
    pub calls: AtomicUsize,
}

impl CountingExtractor {
    pub fn new(text: &'static str) -> Arc<Self> {
        Arc::new(Self {
            text,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TextExtractor for CountingExtractor {
    async fn extract_text(&self, _image: &ImageUpload) -> Result<String, NotesError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.text.is_empty() {
            Err(NotesError::NoTextExtracted)
        } else {
            Ok(self.text.to_string())
        }
    }
}

/// Note generator stand-in returning canned markup.
pub struct CannedGenerator(pub &'static str);

#[async_trait]
impl NoteGenerator for CannedGenerator {
    async fn generate(&self, _topic: &str, _text: &str) -> Result<String, NotesError> {
        Ok(self.0.to_string())
    }
}

/// Route library logs through the test harness; `RUST_LOG=smart_notes=debug` shows them.
pub fn init_tracing() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
            )
            .with_test_writer()
            .try_init();
    });
}

pub fn pipeline(extractor: Arc<CountingExtractor>, html: &'static str) -> NotesPipeline {
    init_tracing();
    NotesPipeline::new(extractor, Arc::new(CannedGenerator(html)), NotesConfig::default())
}

pub fn png(name: &str, size: usize) -> ImageUpload {
    ImageUpload::new(name, "image/png", vec![0x89; size])
}

/// Hand-built multipart body with optional `topic` and `file` fields.
pub fn multipart_body(topic: Option<&str>, file: Option<(&str, &str, &[u8])>) -> Vec<u8> {
    let mut body = Vec::new();
    if let Some(topic) = topic {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"topic\"\r\n\r\n{topic}\r\n"
            )
            .as_bytes(),
        );
    }
    if let Some((name, mime, bytes)) = file {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
                 Content-Type: {mime}\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    body
}
