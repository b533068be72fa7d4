//! Pipeline stages for image-to-notes-to-PDF generation.
//!
//! Each submodule implements exactly one transformation step, so each is
//! testable on its own and the two LLM-backed stages can be swapped behind
//! their traits.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ encode ──▶ ocr ──▶ notes ──▶ postprocess ──▶ parse ──▶ (layout) ──▶ render
//! (upload)  (base64)  (VLM)   (LLM)     (cleanup)       (blocks)              (PDF bytes)
//! ```
//!
//! 1. [`input`]  — accept or reject uploads (type, size) before any network I/O
//! 2. [`encode`] — decode, cap dimensions, PNG-encode and base64-wrap the image
//! 3. [`ocr`]    — [`ocr::TextExtractor`]: image → raw text
//! 4. [`notes`]  — [`notes::NoteGenerator`]: raw text + topic → HTML notes
//! 5. [`postprocess`] — deterministic cleanup so the HTML parses as a tree
//! 6. [`parse`]  — HTML → ordered [`crate::document::ContentBlock`]s
//! 7. [`render`] — laid-out [`crate::document::PageDocument`] → PDF bytes

pub mod encode;
pub mod input;
pub mod notes;
pub mod ocr;
pub mod parse;
pub mod postprocess;
pub mod render;
