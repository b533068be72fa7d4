//! Error types for the smart-notes library.
//!
//! Two distinct error types reflect two distinct failure modes:
//!
//! * [`NotesError`] — **Fatal** for one user action: the submit, preview or
//!   download cannot proceed (no topic, OCR failed, upstream API error, nothing
//!   to render). Returned as `Err(NotesError)` from the top-level entry points.
//!
//! * [`UploadError`] — **Non-fatal**: a single file in a batch was rejected
//!   (wrong type, too large) but the remaining files are still accepted.
//!   Collected by [`crate::pipeline::input::validate_batch`] so callers can
//!   report each rejected file individually.
//!
//! Neither type is ever shown raw to an end user; [`NotesError::user_message`]
//! maps every variant to the short text of the error taxonomy.

use std::path::PathBuf;
use thiserror::Error;

/// The user action an error is reported against.
///
/// Used only to pick the generic message; the variant itself carries detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Submitting an image + topic for note generation.
    GenerateNotes,
    /// Rendering locally-held notes into a preview PDF.
    Preview,
    /// Downloading the server-rendered PDF.
    Download,
}

/// All fatal errors returned by the smart-notes library.
///
/// Per-file validation failures use [`UploadError`] and are collected rather
/// than propagated, unless every file of a submission was rejected.
#[derive(Debug, Error)]
pub enum NotesError {
    // ── Input errors ──────────────────────────────────────────────────────
    /// No image or no topic was supplied; submission is blocked entirely.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// A single upload failed validation and nothing else was submitted.
    #[error(transparent)]
    Validation(#[from] UploadError),

    /// An image file could not be read from disk.
    #[error("Failed to read image '{path}': {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Collaborator errors ───────────────────────────────────────────────
    /// The text-extraction collaborator failed.
    #[error("OCR extraction failed: {0}")]
    OcrFailed(String),

    /// OCR succeeded but returned nothing usable.
    #[error("No text could be extracted from the image.")]
    NoTextExtracted,

    /// The note-generation collaborator failed.
    #[error("Note generation failed: {0}")]
    GenerationFailed(String),

    /// The configured provider is not initialised (missing API key etc.).
    #[error("LLM provider '{provider}' is not configured.\n{hint}")]
    ProviderNotConfigured { provider: String, hint: String },

    // ── Transport errors ──────────────────────────────────────────────────
    /// The notes API answered with a non-success status.
    ///
    /// `message` is the server-provided `error` string when the body had one.
    #[error("Notes API returned HTTP {status}{}", message_suffix(.message))]
    Upstream { status: u16, message: Option<String> },

    /// The request never produced a response (connection refused, DNS, …).
    #[error("Request to '{url}' failed: {reason}")]
    Transport { url: String, reason: String },

    // ── Rendering errors ──────────────────────────────────────────────────
    /// Parsing produced no blocks; there is nothing to lay out.
    #[error("No content to render")]
    NoContent,

    /// Layout or PDF serialisation failed.
    #[error("Rendering failed: {0}")]
    RenderFailed(String),

    // ── I/O errors ────────────────────────────────────────────────────────
    /// Could not create or write an output file.
    #[error("Failed to write output file '{path}': {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // ── Config errors ─────────────────────────────────────────────────────
    /// Builder validation failed.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // ── Catch-all ─────────────────────────────────────────────────────────
    /// Unexpected internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl NotesError {
    /// Short, user-facing text for this error.
    ///
    /// Validation and missing-input errors keep their own wording since it
    /// tells the user what to fix. Everything else collapses to the generic
    /// message for `action`, followed by the server-provided string if one
    /// was returned.
    pub fn user_message(&self, action: Action) -> String {
        let generic = match action {
            Action::GenerateNotes => "Failed to generate notes",
            Action::Preview => "Failed to generate PDF",
            Action::Download => "Failed to download PDF",
        };
        match self {
            NotesError::MissingInput(what) => what.clone(),
            NotesError::Validation(e) => e.to_string(),
            NotesError::NoContent => format!("{generic}: no content to render"),
            NotesError::Upstream {
                message: Some(m), ..
            } => format!("{generic}: {m}"),
            _ => generic.to_string(),
        }
    }

    /// HTTP status the server answers with for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            NotesError::MissingInput(_) | NotesError::Validation(_) => 400,
            NotesError::NoContent => 422,
            NotesError::Upstream { status, .. } => *status,
            _ => 500,
        }
    }
}

fn message_suffix(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(": {m}"))
        .unwrap_or_default()
}

/// A non-fatal validation error for a single uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Error, serde::Serialize, serde::Deserialize)]
pub enum UploadError {
    /// The file is not a JPEG, JPG or PNG image.
    #[error("{name}: unsupported file type '{mime_type}'. Only JPEG, JPG, and PNG are allowed.")]
    UnsupportedType { name: String, mime_type: String },

    /// The file exceeds the per-file size ceiling.
    #[error("{name}: file size {size} bytes exceeds the {max} byte limit.")]
    TooLarge { name: String, size: usize, max: usize },
}
