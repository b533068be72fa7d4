//! Paginated layout: ordered [`ContentBlock`]s → [`PageDocument`].
//!
//! One call to [`LayoutEngine::render`] is one pass. The pass owns a
//! [`LayoutCursor`] that starts at (top margin, page 0), is threaded through
//! every step, and is dropped with the pass; nothing survives between
//! renders, so the same input always produces the same document.
//!
//! ## Page breaks
//!
//! ```text
//!   y = margin ─┬─ title / date (first page only)
//!               │  block ── fits? ── yes ─▶ place all lines
//!               │            └── no ──▶ new page, then place
//!               │  list item ─ fits? ─ (same, per item)
//!   height-60 ──┴─ nothing is placed below this line
//! ```
//!
//! A non-list block is never split unless it is taller than a whole fresh
//! page, in which case it flows line by line instead of being cut off.

pub mod metrics;
pub mod wrap;

use crate::config::PageGeometry;
use crate::document::{ContentBlock, FontWeight, Page, PageDocument, RunRole, TextRun};
use chrono::NaiveDate;
use metrics::font_name;
use tracing::debug;
use wrap::wrap_text;

/// Bullet glyph for unordered lists.
pub const BULLET: &str = "\u{2022}";

/// Text indent of bullet-list items from the left margin.
pub const BULLET_INDENT: f32 = 15.0;

/// Text indent of numbered-list items from the left margin.
pub const NUMBER_INDENT: f32 = 20.0;

/// Extra space after the last item of a list.
pub const LIST_TRAILING_SPACE: f32 = 5.0;

/// Font and vertical rhythm for one kind of line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineStyle {
    pub size: f32,
    pub weight: FontWeight,
    pub line_height: f32,
    pub spacing_after: f32,
}

impl LineStyle {
    const fn new(size: f32, weight: FontWeight, line_height: f32, spacing_after: f32) -> Self {
        Self {
            size,
            weight,
            line_height,
            spacing_after,
        }
    }
}

pub const TITLE_STYLE: LineStyle = LineStyle::new(16.0, FontWeight::Bold, 20.0, 0.0);
pub const DATE_STYLE: LineStyle = LineStyle::new(10.0, FontWeight::Normal, 14.0, 10.0);
pub const H1_STYLE: LineStyle = LineStyle::new(18.0, FontWeight::Bold, 20.0, 10.0);
pub const H2_STYLE: LineStyle = LineStyle::new(16.0, FontWeight::Bold, 18.0, 8.0);
pub const H3_STYLE: LineStyle = LineStyle::new(14.0, FontWeight::Bold, 16.0, 6.0);
pub const PARAGRAPH_STYLE: LineStyle = LineStyle::new(11.0, FontWeight::Normal, 14.0, 10.0);
pub const LIST_ITEM_STYLE: LineStyle = LineStyle::new(11.0, FontWeight::Normal, 14.0, 5.0);

fn heading_style(level: u8) -> LineStyle {
    match level {
        1 => H1_STYLE,
        2 => H2_STYLE,
        _ => H3_STYLE,
    }
}

/// The fixed header printed once at the top of the first page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TitleBlock {
    pub topic: String,
    pub generated_on: NaiveDate,
}

impl TitleBlock {
    pub fn new(topic: impl Into<String>, generated_on: NaiveDate) -> Self {
        Self {
            topic: topic.into(),
            generated_on,
        }
    }

    /// `"<topic> Notes"`
    pub fn title(&self) -> String {
        format!("{} Notes", self.topic.trim())
    }

    pub fn date_line(&self) -> String {
        format!("Generated on {}", self.generated_on.format("%B %-d, %Y"))
    }
}

/// Write position of a render pass: vertical offset from the top edge and
/// the index of the page being filled.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutCursor {
    pub y: f32,
    pub page: usize,
}

impl LayoutCursor {
    pub fn at_top(geometry: &PageGeometry) -> Self {
        Self {
            y: geometry.margin,
            page: 0,
        }
    }
}

/// Lays out notes under a fixed page geometry.
#[derive(Debug, Clone)]
pub struct LayoutEngine {
    geometry: PageGeometry,
}

impl LayoutEngine {
    pub fn new(geometry: PageGeometry) -> Self {
        Self { geometry }
    }

    pub fn geometry(&self) -> &PageGeometry {
        &self.geometry
    }

    /// Render `blocks` under `title` into a paginated document.
    pub fn render(&self, blocks: &[ContentBlock], title: &TitleBlock) -> PageDocument {
        let mut pass = RenderPass::new(&self.geometry);

        pass.text_block(&title.title(), TITLE_STYLE, RunRole::Title, None);
        pass.text_block(&title.date_line(), DATE_STYLE, RunRole::Date, None);

        for (idx, block) in blocks.iter().enumerate() {
            match block {
                ContentBlock::Heading { level, text } => {
                    pass.text_block(text, heading_style(*level), RunRole::Heading, Some(idx));
                }
                ContentBlock::Paragraph { text } => {
                    pass.text_block(text, PARAGRAPH_STYLE, RunRole::Paragraph, Some(idx));
                }
                ContentBlock::BulletList { items } => {
                    pass.list(items, ListKind::Bullet, idx);
                }
                ContentBlock::NumberedList { items } => {
                    pass.list(items, ListKind::Numbered, idx);
                }
            }
        }

        let doc = PageDocument {
            width: self.geometry.width,
            height: self.geometry.height,
            pages: pass.finish(),
        };
        debug!(
            "Laid out {} blocks on {} pages",
            blocks.len(),
            doc.page_count()
        );
        doc
    }
}

#[derive(Debug, Clone, Copy)]
enum ListKind {
    Bullet,
    Numbered,
}

impl ListKind {
    fn indent(self) -> f32 {
        match self {
            ListKind::Bullet => BULLET_INDENT,
            ListKind::Numbered => NUMBER_INDENT,
        }
    }

    fn marker(self, index: usize) -> String {
        match self {
            ListKind::Bullet => BULLET.to_string(),
            ListKind::Numbered => format!("{}.", index + 1),
        }
    }
}

/// Single-owner state of one render: the cursor plus the pages filled so far.
struct RenderPass<'g> {
    geometry: &'g PageGeometry,
    cursor: LayoutCursor,
    pages: Vec<Page>,
}

impl<'g> RenderPass<'g> {
    fn new(geometry: &'g PageGeometry) -> Self {
        Self {
            geometry,
            cursor: LayoutCursor::at_top(geometry),
            pages: vec![Page::default()],
        }
    }

    fn at_page_top(&self) -> bool {
        self.cursor.y <= self.geometry.margin
    }

    fn new_page(&mut self) {
        self.pages.push(Page::default());
        self.cursor = LayoutCursor {
            y: self.geometry.margin,
            page: self.cursor.page + 1,
        };
    }

    /// Start a new page unless `height` more fits on this one.
    ///
    /// Never breaks at the top of a page: content taller than a page has
    /// to start somewhere.
    fn ensure_room(&mut self, height: f32) {
        if self.cursor.y + height > self.geometry.bottom_limit() && !self.at_page_top() {
            self.new_page();
        }
    }

    fn place(&mut self, text: &str, x: f32, style: LineStyle, role: RunRole, block: Option<usize>) {
        let run = TextRun {
            text: text.to_string(),
            x,
            y: self.cursor.y + style.size,
            font: font_name(style.weight).to_string(),
            size: style.size,
            weight: style.weight,
            role,
            block,
        };
        self.pages[self.cursor.page].runs.push(run);
    }

    fn line(&mut self, text: &str, x: f32, style: LineStyle, role: RunRole, block: Option<usize>) {
        self.ensure_room(style.line_height);
        self.place(text, x, style, role, block);
        self.cursor.y += style.line_height;
    }

    /// Heading, paragraph, title or date: kept whole on one page if it can be.
    fn text_block(&mut self, text: &str, style: LineStyle, role: RunRole, block: Option<usize>) {
        let width = self.geometry.content_width();
        let mut lines = wrap_text(text, style.weight, style.size, width);
        if lines.is_empty() {
            // Empty element: one blank run keeps its place in the group order.
            lines.push(String::new());
        }
        self.ensure_room(lines.len() as f32 * style.line_height);

        let x = self.geometry.margin;
        for line in &lines {
            self.line(line, x, style, role, block);
        }
        self.cursor.y += style.spacing_after;
    }

    /// Flat list; the page-break check runs per item.
    fn list(&mut self, items: &[String], kind: ListKind, block: usize) {
        let style = LIST_ITEM_STYLE;
        let margin = self.geometry.margin;
        let indent = kind.indent();
        let width = self.geometry.content_width() - indent;

        if items.is_empty() {
            self.ensure_room(style.line_height);
            self.place("", margin + indent, style, RunRole::ListItem, Some(block));
        }
        for (i, item) in items.iter().enumerate() {
            let lines = wrap_text(item, style.weight, style.size, width);
            self.ensure_room(lines.len().max(1) as f32 * style.line_height);

            self.place(&kind.marker(i), margin, style, RunRole::ListMarker, Some(block));
            if lines.is_empty() {
                self.cursor.y += style.line_height;
            }
            for line in &lines {
                self.line(line, margin + indent, style, RunRole::ListItem, Some(block));
            }
            self.cursor.y += style.spacing_after;
        }
        self.cursor.y += LIST_TRAILING_SPACE;
    }

    fn finish(self) -> Vec<Page> {
        self.pages
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::metrics::text_width;

    fn title() -> TitleBlock {
        TitleBlock::new("Biology", NaiveDate::from_ymd_opt(2026, 10, 17).unwrap())
    }

    fn engine() -> LayoutEngine {
        LayoutEngine::new(PageGeometry::default())
    }

    #[test]
    fn title_block_only_on_first_page() {
        let items: Vec<String> = (0..200).map(|i| format!("item {i}")).collect();
        let doc = engine().render(&[ContentBlock::bullets(items)], &title());
        assert!(doc.page_count() > 1);

        let first = &doc.pages[0].runs;
        assert_eq!(first[0].text, "Biology Notes");
        assert_eq!(first[0].role, RunRole::Title);
        assert_eq!(first[0].weight, FontWeight::Bold);
        assert_eq!(first[0].size, 16.0);
        assert_eq!(first[1].text, "Generated on October 17, 2026");
        assert_eq!(first[1].size, 10.0);

        for page in &doc.pages[1..] {
            assert!(page
                .runs
                .iter()
                .all(|r| r.role != RunRole::Title && r.role != RunRole::Date));
        }
    }

    #[test]
    fn small_document_is_one_page_with_groups_in_order() {
        let blocks = vec![
            ContentBlock::heading(1, "Topic"),
            ContentBlock::paragraph("short text"),
            ContentBlock::bullets(["a", "b"]),
        ];
        let doc = engine().render(&blocks, &title());
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.block_groups(), vec![0, 1, 2]);
    }

    #[test]
    fn empty_blocks_still_form_groups() {
        let blocks = vec![
            ContentBlock::paragraph(""),
            ContentBlock::heading(2, ""),
            ContentBlock::BulletList { items: vec![] },
            ContentBlock::paragraph("after"),
        ];
        let doc = engine().render(&blocks, &title());
        assert_eq!(doc.block_groups(), vec![0, 1, 2, 3]);
        let limit = PageGeometry::default().bottom_limit();
        assert!(doc.runs().all(|(_, r)| r.y <= limit));
    }

    #[test]
    fn nothing_is_placed_below_the_bottom_limit() {
        let g = PageGeometry::default();
        let blocks: Vec<ContentBlock> = (0..120)
            .map(|i| ContentBlock::paragraph(format!("Paragraph {i} with a few words in it.")))
            .collect();
        let doc = engine().render(&blocks, &title());
        for (_, run) in doc.runs() {
            assert!(run.y <= g.bottom_limit(), "{} at {}", run.text, run.y);
            assert!(run.y >= g.margin);
        }
    }

    #[test]
    fn block_that_does_not_fit_moves_whole_to_next_page() {
        // Fill most of the first page with single-line paragraphs.
        let mut blocks: Vec<ContentBlock> = (0..29)
            .map(|i| ContentBlock::paragraph(format!("filler {i}")))
            .collect();
        let long = "word ".repeat(300);
        blocks.push(ContentBlock::paragraph(long));
        let doc = engine().render(&blocks, &title());

        let pages_of_last: Vec<usize> = doc
            .runs()
            .filter(|(_, r)| r.block == Some(29))
            .map(|(p, _)| p)
            .collect();
        assert!(!pages_of_last.is_empty());
        assert!(pages_of_last.iter().all(|&p| p == pages_of_last[0]));
        assert_eq!(pages_of_last[0], 1);
    }

    #[test]
    fn oversized_block_flows_across_pages_without_loss() {
        let text = "lorem ipsum dolor sit amet ".repeat(800);
        let blocks = vec![ContentBlock::paragraph(text.clone())];
        let doc = engine().render(&blocks, &title());
        assert!(doc.page_count() > 1);

        let placed: Vec<&str> = doc
            .runs()
            .filter(|(_, r)| r.block == Some(0))
            .map(|(_, r)| r.text.as_str())
            .collect();
        assert_eq!(placed.join(" "), text.trim_end());
    }

    #[test]
    fn numbered_list_indices_are_contiguous_across_pages() {
        let items: Vec<String> = (0..120).map(|i| format!("step {i}")).collect();
        let doc = engine().render(&[ContentBlock::numbered(items)], &title());
        assert!(doc.page_count() > 1);

        let markers: Vec<String> = doc
            .runs()
            .filter(|(_, r)| r.role == RunRole::ListMarker)
            .map(|(_, r)| r.text.clone())
            .collect();
        let expected: Vec<String> = (1..=120).map(|i| format!("{i}.")).collect();
        assert_eq!(markers, expected);
    }

    #[test]
    fn numbering_restarts_per_list() {
        let blocks = vec![
            ContentBlock::numbered(["a", "b"]),
            ContentBlock::paragraph("between"),
            ContentBlock::numbered(["c"]),
        ];
        let doc = engine().render(&blocks, &title());
        let markers: Vec<&str> = doc
            .runs()
            .filter(|(_, r)| r.role == RunRole::ListMarker)
            .map(|(_, r)| r.text.as_str())
            .collect();
        assert_eq!(markers, vec!["1.", "2.", "1."]);
    }

    #[test]
    fn list_item_text_is_indented_and_wrapped() {
        let g = PageGeometry::default();
        let item = "a long bullet point that keeps going well past the right edge of the page so \
                    it has to wrap at least once "
            .repeat(2);
        let doc = engine().render(
            &[
                ContentBlock::bullets([item.as_str()]),
                ContentBlock::numbered([item.as_str()]),
            ],
            &title(),
        );

        let bullet_lines: Vec<&TextRun> = doc
            .runs()
            .filter(|(_, r)| r.block == Some(0) && r.role == RunRole::ListItem)
            .map(|(_, r)| r)
            .collect();
        assert!(bullet_lines.len() >= 2);
        for r in &bullet_lines {
            assert_eq!(r.x, g.margin + BULLET_INDENT);
            assert!(text_width(&r.text, r.weight, r.size) <= g.content_width() - BULLET_INDENT);
        }

        let numbered_x: Vec<f32> = doc
            .runs()
            .filter(|(_, r)| r.block == Some(1) && r.role == RunRole::ListItem)
            .map(|(_, r)| r.x)
            .collect();
        assert!(numbered_x.iter().all(|&x| x == g.margin + NUMBER_INDENT));

        let bullet = doc
            .runs()
            .find(|(_, r)| r.role == RunRole::ListMarker)
            .map(|(_, r)| r)
            .unwrap();
        assert_eq!(bullet.text, BULLET);
        assert_eq!(bullet.x, g.margin);
    }

    #[test]
    fn rendering_is_deterministic() {
        let blocks = vec![
            ContentBlock::heading(2, "Cells"),
            ContentBlock::paragraph("Cells are the basic unit of life. ".repeat(40)),
            ContentBlock::numbered((0..60).map(|i| format!("fact {i}"))),
        ];
        let e = engine();
        assert_eq!(e.render(&blocks, &title()), e.render(&blocks, &title()));
    }

    #[test]
    fn heading_styles_follow_level() {
        let blocks = vec![
            ContentBlock::heading(1, "One"),
            ContentBlock::heading(2, "Two"),
            ContentBlock::heading(3, "Three"),
        ];
        let doc = engine().render(&blocks, &title());
        let sizes: Vec<f32> = doc
            .runs()
            .filter(|(_, r)| r.role == RunRole::Heading)
            .map(|(_, r)| r.size)
            .collect();
        assert_eq!(sizes, vec![18.0, 16.0, 14.0]);

        // H1 starts after title (20) + date (14 + 10).
        let h1 = doc.runs().find(|(_, r)| r.text == "One").unwrap().1;
        assert_eq!(h1.y, 40.0 + 20.0 + 24.0 + 18.0);
    }

    #[test]
    fn empty_document_still_has_title_page() {
        let doc = engine().render(&[], &title());
        assert_eq!(doc.page_count(), 1);
        assert_eq!(doc.pages[0].runs.len(), 2);
    }
}
