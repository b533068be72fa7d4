//! PDF serialisation: [`PageDocument`] → PDF bytes.
//!
//! Text is drawn with the two base-14 Helvetica faces, which every viewer
//! ships, so nothing is embedded and the layout metrics in
//! [`crate::layout::metrics`] match what is drawn. Strings are encoded as
//! WinAnsi; anything outside it is drawn as `?`.
//!
//! Layout coordinates run top-down from the page's top edge; PDF user space
//! runs bottom-up, so every baseline is flipped against the page height.

use crate::document::{FontWeight, PageDocument};
use crate::error::NotesError;
use crate::layout::metrics::win_ansi_byte;
use chrono::{Datelike, NaiveDate};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use pdf_writer::{Content, Date, Filter, Name, Pdf, Rect, Ref, Str, TextStr};
use std::io::Write;
use tracing::debug;

const REGULAR_FONT: Name<'static> = Name(b"F1");
const BOLD_FONT: Name<'static> = Name(b"F2");

/// Document information dictionary entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfMetadata {
    pub title: String,
    pub author: String,
    pub subject: String,
    pub keywords: String,
    pub creator: String,
    pub producer: String,
    pub created: Option<NaiveDate>,
}

impl PdfMetadata {
    /// Metadata stamped on every generated notes PDF.
    pub fn for_notes(topic: &str, created: NaiveDate) -> Self {
        Self {
            title: format!("{} Notes", topic.trim()),
            author: "Smart Notes".to_string(),
            subject: "Generated Notes".to_string(),
            keywords: "study notes, generated, smart notes".to_string(),
            creator: "Smart Notes".to_string(),
            producer: format!("smart-notes {}", env!("CARGO_PKG_VERSION")),
            created: Some(created),
        }
    }
}

/// Serialise `doc` into a complete PDF file.
pub fn render_pdf(doc: &PageDocument, meta: &PdfMetadata) -> Result<Vec<u8>, NotesError> {
    if doc.pages.is_empty() {
        return Err(NotesError::RenderFailed("document has no pages".into()));
    }

    let mut pdf = Pdf::new();
    let mut next_id = 1;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let regular_id = alloc();
    let bold_id = alloc();
    let info_id = alloc();
    let page_ids: Vec<Ref> = doc.pages.iter().map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = doc.pages.iter().map(|_| alloc()).collect();

    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(page_ids.len() as i32);

    pdf.type1_font(regular_id)
        .base_font(Name(b"Helvetica"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));
    pdf.type1_font(bold_id)
        .base_font(Name(b"Helvetica-Bold"))
        .encoding_predefined(Name(b"WinAnsiEncoding"));

    for (i, page) in doc.pages.iter().enumerate() {
        let mut content = Content::new();
        for run in &page.runs {
            let font = match run.weight {
                FontWeight::Normal => REGULAR_FONT,
                FontWeight::Bold => BOLD_FONT,
            };
            let encoded = encode_win_ansi(&run.text);
            content
                .begin_text()
                .set_font(font, run.size)
                .next_line(run.x, doc.height - run.y)
                .show(Str(&encoded))
                .end_text();
        }
        let raw = content.finish();
        let compressed = deflate(raw.as_slice())?;
        pdf.stream(content_ids[i], &compressed)
            .filter(Filter::FlateDecode);

        let mut page_writer = pdf.page(page_ids[i]);
        page_writer
            .media_box(Rect::new(0.0, 0.0, doc.width, doc.height))
            .parent(pages_id)
            .contents(content_ids[i]);
        page_writer
            .resources()
            .fonts()
            .pair(REGULAR_FONT, regular_id)
            .pair(BOLD_FONT, bold_id);
    }

    {
        let mut info = pdf.document_info(info_id);
        info.title(TextStr(&meta.title))
            .author(TextStr(&meta.author))
            .subject(TextStr(&meta.subject))
            .keywords(TextStr(&meta.keywords))
            .creator(TextStr(&meta.creator))
            .producer(TextStr(&meta.producer));
        if let Some(day) = meta.created {
            info.creation_date(pdf_date(day));
        }
    }

    let bytes = pdf.finish();
    debug!("Wrote {} page PDF, {} bytes", doc.page_count(), bytes.len());
    Ok(bytes)
}

fn deflate(raw: &[u8]) -> Result<Vec<u8>, NotesError> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(raw)
        .map_err(|e| NotesError::RenderFailed(format!("compress content stream: {e}")))?;
    encoder
        .finish()
        .map_err(|e| NotesError::RenderFailed(format!("compress content stream: {e}")))
}

fn pdf_date(day: NaiveDate) -> Date {
    Date::new(day.year().clamp(0, 9999) as u16)
        .month(day.month() as u8)
        .day(day.day() as u8)
}

/// Encode text as WinAnsi (Windows-1252), replacing unmappable chars with `?`.
pub fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PageGeometry;
    use crate::document::ContentBlock;
    use crate::layout::{LayoutEngine, TitleBlock};

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
    }

    fn page_objects(bytes: &[u8]) -> usize {
        let needle = b"/Type /Page";
        bytes
            .windows(needle.len() + 1)
            .filter(|w| &w[..needle.len()] == needle && w[needle.len()] != b's')
            .count()
    }

    fn render(blocks: &[ContentBlock]) -> (PageDocument, Vec<u8>) {
        let doc = LayoutEngine::new(PageGeometry::default())
            .render(blocks, &TitleBlock::new("Physics", date()));
        let bytes = render_pdf(&doc, &PdfMetadata::for_notes("Physics", date())).unwrap();
        (doc, bytes)
    }

    #[test]
    fn output_is_a_pdf_with_one_page_object_per_page() {
        let items: Vec<String> = (0..150).map(|i| format!("law {i}")).collect();
        let (doc, bytes) = render(&[ContentBlock::numbered(items)]);
        assert!(bytes.starts_with(b"%PDF"));
        assert!(doc.page_count() > 1);
        assert_eq!(page_objects(&bytes), doc.page_count());
    }

    #[test]
    fn info_dictionary_is_written() {
        let (_, bytes) = render(&[ContentBlock::paragraph("x")]);
        let text = String::from_utf8_lossy(&bytes);
        for key in ["/Title", "/Author", "/Subject", "/Keywords", "/Creator", "/Producer"] {
            assert!(text.contains(key), "missing {key}");
        }
        assert!(text.contains("/Helvetica-Bold"));
        assert!(text.contains("/WinAnsiEncoding"));
    }

    #[test]
    fn same_document_gives_identical_bytes() {
        let blocks = [ContentBlock::heading(1, "Motion"), ContentBlock::paragraph("F = ma")];
        assert_eq!(render(&blocks).1, render(&blocks).1);
    }

    #[test]
    fn empty_document_is_rejected() {
        let doc = PageDocument {
            width: 100.0,
            height: 100.0,
            pages: vec![],
        };
        let err = render_pdf(&doc, &PdfMetadata::for_notes("x", date())).unwrap_err();
        assert!(matches!(err, NotesError::RenderFailed(_)));
    }

    #[test]
    fn win_ansi_mapping() {
        assert_eq!(encode_win_ansi("Az~"), b"Az~".to_vec());
        assert_eq!(encode_win_ansi("\u{2022} caf\u{e9}"), vec![0x95, b' ', b'c', b'a', b'f', 0xE9]);
        assert_eq!(encode_win_ansi("\u{2014}\u{20AC}"), vec![0x97, 0x80]);
        assert_eq!(encode_win_ansi("\u{4e2d}\u{1F600}"), b"??".to_vec());
    }

    #[test]
    fn metadata_for_notes() {
        let meta = PdfMetadata::for_notes("  Cell Biology ", date());
        assert_eq!(meta.title, "Cell Biology Notes");
        assert_eq!(meta.subject, "Generated Notes");
        assert!(meta.producer.starts_with("smart-notes "));
    }
}
