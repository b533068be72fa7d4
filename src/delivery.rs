//! Delivery: turn notes HTML into something the user can look at or keep.
//!
//! Both variants come from one layout computation:
//!
//! ```text
//! html ─▶ clean ─▶ parse ─▶ layout ─▶ RenderedNotes ─┬─▶ preview()     transient file, deleted on drop
//!                                                    └─▶ to_pdf_bytes() bytes for saving / serving
//! ```
//!
//! The download path proper (re-submitting the image to the server) lives in
//! [`crate::client`]; the server answers it with [`RenderedNotes::to_pdf_bytes`]
//! so local previews and server downloads share one layout engine.

use crate::config::PageGeometry;
use crate::document::{ContentBlock, PageDocument};
use crate::error::NotesError;
use crate::layout::{LayoutEngine, TitleBlock};
use crate::pipeline::parse::parse_notes;
use crate::pipeline::postprocess::clean_notes_html;
use crate::pipeline::render::{render_pdf, PdfMetadata};
use chrono::NaiveDate;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

/// A laid-out notes document, ready to preview or serialise.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderedNotes {
    pub topic: String,
    pub blocks: Vec<ContentBlock>,
    pub document: PageDocument,
    pub metadata: PdfMetadata,
}

/// Parse and lay out `html` under `topic`, dated `generated_on`.
///
/// # Errors
/// - [`NotesError::MissingInput`] if the topic is blank.
/// - [`NotesError::NoContent`] if the markup yields no blocks.
pub fn render_notes(
    html: &str,
    topic: &str,
    generated_on: NaiveDate,
    geometry: &PageGeometry,
) -> Result<RenderedNotes, NotesError> {
    let topic = topic.trim();
    if topic.is_empty() {
        return Err(NotesError::MissingInput("Please enter a topic.".into()));
    }

    let blocks = parse_notes(&clean_notes_html(html));
    if blocks.is_empty() {
        return Err(NotesError::NoContent);
    }

    let document = LayoutEngine::new(*geometry).render(&blocks, &TitleBlock::new(topic, generated_on));
    info!(
        "Rendered notes on '{}': {} blocks, {} pages",
        topic,
        blocks.len(),
        document.page_count()
    );

    Ok(RenderedNotes {
        topic: topic.to_string(),
        blocks,
        document,
        metadata: PdfMetadata::for_notes(topic, generated_on),
    })
}

impl RenderedNotes {
    pub fn page_count(&self) -> usize {
        self.document.page_count()
    }

    /// `<topic-slug>-notes.pdf`
    pub fn file_name(&self) -> String {
        pdf_file_name(&self.topic)
    }

    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>, NotesError> {
        render_pdf(&self.document, &self.metadata)
    }

    /// Write the PDF to a transient file for on-screen viewing.
    ///
    /// The file lives exactly as long as the returned handle.
    pub fn preview(&self) -> Result<PreviewHandle, NotesError> {
        let bytes = self.to_pdf_bytes()?;
        let mut file = tempfile::Builder::new()
            .prefix("smart-notes-")
            .suffix(".pdf")
            .tempfile()
            .map_err(|e| NotesError::Internal(format!("tempfile: {e}")))?;
        file.write_all(&bytes)
            .and_then(|_| file.flush())
            .map_err(|e| NotesError::Internal(format!("tempfile write: {e}")))?;
        debug!("Preview written to {}", file.path().display());
        Ok(PreviewHandle { file })
    }

    /// Save the PDF to `path` atomically.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), NotesError> {
        write_pdf_atomic(path.as_ref(), &self.to_pdf_bytes()?).await
    }
}

/// A rendered PDF on disk for viewing. Dropping the handle deletes the file.
#[derive(Debug)]
pub struct PreviewHandle {
    file: NamedTempFile,
}

impl PreviewHandle {
    pub fn path(&self) -> &Path {
        self.file.path()
    }

    /// Open the preview in the platform's default PDF viewer.
    ///
    /// The viewer is spawned and not waited on; keep the handle alive until
    /// the user is done looking.
    pub fn open(&self) -> Result<(), NotesError> {
        let path = self.path();
        #[cfg(target_os = "macos")]
        let spawned = std::process::Command::new("open").arg(path).spawn();
        #[cfg(target_os = "windows")]
        let spawned = std::process::Command::new("cmd")
            .args(["/C", "start", ""])
            .arg(path)
            .spawn();
        #[cfg(not(any(target_os = "macos", target_os = "windows")))]
        let spawned = std::process::Command::new("xdg-open").arg(path).spawn();

        spawned.map(|_| ()).map_err(|e| {
            warn!("Could not open viewer for {}: {}", path.display(), e);
            NotesError::Internal(format!("failed to open viewer: {e}"))
        })
    }

    /// Keep the file instead of deleting it; returns its final path.
    pub fn persist(self, path: impl AsRef<Path>) -> Result<PathBuf, NotesError> {
        let path = path.as_ref().to_path_buf();
        self.file
            .persist(&path)
            .map_err(|e| NotesError::OutputWriteFailed {
                path: path.clone(),
                source: e.error,
            })?;
        Ok(path)
    }
}

/// File name for a topic's notes: trimmed, lower-cased, whitespace runs
/// replaced by a single `-`, suffixed `-notes.pdf`.
///
/// Quotes, backslashes, path separators and control characters are dropped,
/// so the name is safe both on disk and inside a quoted
/// `Content-Disposition` filename.
pub fn pdf_file_name(topic: &str) -> String {
    let cleaned: String = topic
        .chars()
        .filter(|c| c.is_whitespace() || !(c.is_control() || matches!(c, '"' | '\\' | '/')))
        .collect();
    let slug = cleaned
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-");
    format!("{slug}-notes.pdf")
}

/// Write `bytes` to `path` via a sibling temp file and a rename, so a failed
/// write never leaves a partial PDF behind.
pub async fn write_pdf_atomic(path: &Path, bytes: &[u8]) -> Result<(), NotesError> {
    let write_err = |source| NotesError::OutputWriteFailed {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }

    let tmp_path = path.with_extension("pdf.tmp");
    if let Err(e) = tokio::fs::write(&tmp_path, bytes).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    if let Err(e) = tokio::fs::rename(&tmp_path, path).await {
        let _ = tokio::fs::remove_file(&tmp_path).await;
        return Err(write_err(e));
    }
    debug!("Saved {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    const NOTES: &str = "<h1>Topic</h1><p>short text</p><ul><li>a</li><li>b</li></ul>";

    #[test]
    fn slug_collapses_whitespace_and_lowercases() {
        assert_eq!(pdf_file_name("  Cell   Biology "), "cell-biology-notes.pdf");
        assert_eq!(pdf_file_name("Physics"), "physics-notes.pdf");
        assert_eq!(pdf_file_name("World\tWar  II"), "world-war-ii-notes.pdf");
    }

    #[test]
    fn slug_drops_quotes_and_separators() {
        assert_eq!(pdf_file_name("The \"Cell\" Theory"), "the-cell-theory-notes.pdf");
        assert_eq!(pdf_file_name("I/O \\ Devices"), "io-devices-notes.pdf");
    }

    #[test]
    fn render_notes_builds_single_page_document() {
        let rendered = render_notes(NOTES, " Biology ", day(), &PageGeometry::default()).unwrap();
        assert_eq!(rendered.topic, "Biology");
        assert_eq!(rendered.blocks.len(), 3);
        assert_eq!(rendered.page_count(), 1);
        assert_eq!(rendered.document.block_groups(), vec![0, 1, 2]);
        assert_eq!(rendered.file_name(), "biology-notes.pdf");
        assert_eq!(rendered.metadata.title, "Biology Notes");
    }

    #[test]
    fn empty_markup_is_no_content() {
        let err = render_notes("", "Biology", day(), &PageGeometry::default()).unwrap_err();
        assert!(matches!(err, NotesError::NoContent));
        let err = render_notes("<p>broken", "Biology", day(), &PageGeometry::default()).unwrap_err();
        assert!(matches!(err, NotesError::NoContent));
    }

    #[test]
    fn blank_topic_is_missing_input() {
        let err = render_notes(NOTES, "  ", day(), &PageGeometry::default()).unwrap_err();
        assert!(matches!(err, NotesError::MissingInput(_)));
    }

    #[test]
    fn raw_model_output_is_cleaned_before_parsing() {
        let html = "```html\n<h2>Waves</h2>\n<p>crest&nbsp;&amp; trough<br>amplitude</p>\n```";
        let rendered = render_notes(html, "Physics", day(), &PageGeometry::default()).unwrap();
        assert_eq!(rendered.blocks[0], ContentBlock::heading(2, "Waves"));
        assert_eq!(rendered.blocks.len(), 2);
    }

    #[test]
    fn preview_file_is_removed_on_drop() {
        let rendered = render_notes(NOTES, "Biology", day(), &PageGeometry::default()).unwrap();
        let handle = rendered.preview().unwrap();
        let path = handle.path().to_path_buf();
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("pdf"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));

        drop(handle);
        assert!(!path.exists());
    }

    #[test]
    fn preview_and_download_bytes_match_for_same_inputs() {
        let a = render_notes(NOTES, "Biology", day(), &PageGeometry::default()).unwrap();
        let b = render_notes(NOTES, "Biology", day(), &PageGeometry::default()).unwrap();
        let preview = a.preview().unwrap();
        assert_eq!(std::fs::read(preview.path()).unwrap(), b.to_pdf_bytes().unwrap());
    }

    #[tokio::test]
    async fn atomic_write_creates_parents_and_leaves_no_temp() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("biology-notes.pdf");
        write_pdf_atomic(&path, b"%PDF-1.7 test").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-1.7 test");
        assert!(!path.with_extension("pdf.tmp").exists());
    }

    #[tokio::test]
    async fn failed_write_leaves_nothing_behind() {
        let dir = tempfile::tempdir().unwrap();
        // The target is an existing directory, so the rename fails.
        let path = dir.path().join("taken.pdf");
        std::fs::create_dir(&path).unwrap();
        std::fs::write(path.join("keep"), b"x").unwrap();

        let err = write_pdf_atomic(&path, b"%PDF").await.unwrap_err();
        assert!(matches!(err, NotesError::OutputWriteFailed { .. }));
        assert!(!path.with_extension("pdf.tmp").exists());
    }
}
