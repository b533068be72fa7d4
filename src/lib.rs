//! # smart-notes
//!
//! Turn a photo of lecture notes, a whiteboard or a textbook page into a
//! formatted study-notes PDF.
//!
//! ## Pipeline Overview
//!
//! ```text
//! image + topic
//!  │
//!  ├─ 1. Input    validate type (JPEG/PNG) and size (≤ 5 MB) before any network I/O
//!  ├─ 2. OCR      vision LLM transcribes the image          (TextExtractor)
//!  ├─ 3. Notes    chat LLM writes h1–h3 / p / ul / ol HTML  (NoteGenerator)
//!  ├─ 4. Clean    fences, entities, void tags → normalised markup
//!  ├─ 5. Parse    HTML → ordered ContentBlocks
//!  ├─ 6. Layout   paginated, wrapped, positioned text runs (PageDocument)
//!  └─ 7. PDF      pdf-writer + base-14 Helvetica
//! ```
//!
//! Steps 1–3 run behind the two collaborator traits; steps 4–7 are pure and
//! deterministic, so the same notes, topic and date always give the same
//! bytes.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use chrono::NaiveDate;
//! use smart_notes::{render_notes, PageGeometry};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let html = "<h1>Cells</h1><p>The basic unit of life.</p><ul><li>nucleus</li></ul>";
//! let day = NaiveDate::from_ymd_opt(2026, 10, 17).unwrap();
//! let rendered = render_notes(html, "Biology", day, &PageGeometry::default())?;
//! let preview = rendered.preview()?; // deleted when `preview` is dropped
//! preview.open()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature  | Default | Description |
//! |----------|---------|-------------|
//! | `cli`    | on      | Enables the `smart-notes` binary (clap + anyhow + tracing-subscriber) |
//! | `server` | on      | Enables the axum HTTP API in [`server`] |
//!
//! Disable both when using only the library:
//! ```toml
//! smart-notes = { version = "0.3", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod client;
pub mod config;
pub mod convert;
pub mod delivery;
pub mod document;
pub mod error;
pub mod layout;
pub mod pipeline;
pub mod progress;
pub mod prompts;
#[cfg(feature = "server")]
pub mod server;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use client::NotesClient;
pub use config::{NotesConfig, NotesConfigBuilder, PageGeometry, PageSize};
pub use convert::{
    generate_notes, generate_notes_sync, generate_notes_with_progress, generate_pdf,
    resolve_provider, NotesPipeline,
};
pub use delivery::{pdf_file_name, render_notes, write_pdf_atomic, PreviewHandle, RenderedNotes};
pub use document::{ContentBlock, FontWeight, Page, PageDocument, RunRole, TextRun};
pub use error::{Action, NotesError, UploadError};
pub use layout::{LayoutCursor, LayoutEngine, TitleBlock};
pub use pipeline::input::{
    accept_clipboard_items, validate, validate_batch, BatchValidation, ClipboardItem, ImageUpload,
};
pub use pipeline::notes::{LlmNoteGenerator, NoteGenerator};
pub use pipeline::ocr::{TextExtractor, VisionTextExtractor};
pub use pipeline::parse::parse_notes;
pub use pipeline::render::{render_pdf, PdfMetadata};
pub use progress::{NoopProgressCallback, NotesProgressCallback, ProgressCallback, Stage};
