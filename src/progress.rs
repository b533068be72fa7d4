//! Progress-callback trait for pipeline stage events.
//!
//! Inject an [`Arc<dyn NotesProgressCallback>`] into
//! [`crate::convert::generate_notes_with_progress`] to receive events as the
//! pipeline moves through OCR, note generation and rendering.
//!
//! # Example
//!
//! ```rust
//! use smart_notes::{NotesProgressCallback, Stage};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: Arc<AtomicUsize>,
//! }
//!
//! impl NotesProgressCallback for CountingCallback {
//!     fn on_stage_complete(&self, stage: Stage, output_len: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{stage} done ({output_len} bytes)");
//!     }
//! }
//! ```

use std::fmt;
use std::sync::Arc;

/// One step of the notes pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Text extraction from the uploaded image.
    Ocr,
    /// LLM note generation from extracted text.
    Notes,
    /// HTML parse + paginated layout.
    Layout,
    /// PDF serialisation.
    Pdf,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Ocr => "Extracting text",
            Stage::Notes => "Generating notes",
            Stage::Layout => "Laying out pages",
            Stage::Pdf => "Writing PDF",
        })
    }
}

/// Called by the pipeline as it enters and leaves each stage.
///
/// Implementations must be `Send + Sync` because the server drives the
/// pipeline from tokio worker threads. All methods have default no-op
/// implementations so callers only override what they care about.
pub trait NotesProgressCallback: Send + Sync {
    /// Called just before a stage starts.
    fn on_stage_start(&self, stage: Stage) {
        let _ = stage;
    }

    /// Called when a stage succeeds.
    ///
    /// `output_len` is the byte length of what the stage produced (text,
    /// HTML, or PDF bytes) or the page count for [`Stage::Layout`].
    fn on_stage_complete(&self, stage: Stage, output_len: usize) {
        let _ = (stage, output_len);
    }

    /// Called when a stage fails. The pipeline stops after this.
    fn on_stage_error(&self, stage: Stage, error: &str) {
        let _ = (stage, error);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl NotesProgressCallback for NoopProgressCallback {}

/// Convenience alias for the shared callback type.
pub type ProgressCallback = Arc<dyn NotesProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingCallback {
        events: Mutex<Vec<String>>,
    }

    impl NotesProgressCallback for RecordingCallback {
        fn on_stage_start(&self, stage: Stage) {
            self.events.lock().unwrap().push(format!("start {stage:?}"));
        }

        fn on_stage_complete(&self, stage: Stage, output_len: usize) {
            self.events
                .lock()
                .unwrap()
                .push(format!("done {stage:?} {output_len}"));
        }

        fn on_stage_error(&self, stage: Stage, error: &str) {
            self.events
                .lock()
                .unwrap()
                .push(format!("error {stage:?} {error}"));
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_stage_start(Stage::Ocr);
        cb.on_stage_complete(Stage::Ocr, 42);
        cb.on_stage_error(Stage::Notes, "boom");
    }

    #[test]
    fn recording_callback_receives_events_in_order() {
        let cb = RecordingCallback::default();
        cb.on_stage_start(Stage::Ocr);
        cb.on_stage_complete(Stage::Ocr, 10);
        cb.on_stage_start(Stage::Notes);
        cb.on_stage_error(Stage::Notes, "timeout");

        let events = cb.events.lock().unwrap();
        assert_eq!(
            *events,
            vec!["start Ocr", "done Ocr 10", "start Notes", "error Notes timeout"]
        );
    }

    #[test]
    fn stage_display_is_human_readable() {
        assert_eq!(Stage::Layout.to_string(), "Laying out pages");
    }

    #[test]
    fn arc_dyn_callback_works() {
        let cb: ProgressCallback = Arc::new(NoopProgressCallback);
        cb.on_stage_start(Stage::Pdf);
        cb.on_stage_complete(Stage::Pdf, 1024);
    }
}
