//! Data model shared by the parser, the layout engine and the PDF writer.
//!
//! ```text
//! HTML ──parse──▶ Vec<ContentBlock> ──layout──▶ PageDocument ──render──▶ PDF bytes
//! ```
//!
//! Everything here is plain data: blocks are immutable once parsed and a
//! [`PageDocument`] is immutable once the layout pass that built it returns.

use serde::{Deserialize, Serialize};

/// One semantic unit of notes content, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// `h1`–`h3`. `level` is always 1, 2 or 3.
    Heading { level: u8, text: String },
    /// `p`, and any unrecognised tag flattened to its text.
    Paragraph { text: String },
    /// `ul` items, flat.
    BulletList { items: Vec<String> },
    /// `ol` items, flat; numbered 1..K at layout time.
    NumberedList { items: Vec<String> },
}

impl ContentBlock {
    /// Heading constructor that clamps the level into 1..=3.
    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        ContentBlock::Heading {
            level: level.clamp(1, 3),
            text: text.into(),
        }
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        ContentBlock::Paragraph { text: text.into() }
    }

    pub fn bullets<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ContentBlock::BulletList {
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    pub fn numbered<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ContentBlock::NumberedList {
            items: items.into_iter().map(Into::into).collect(),
        }
    }

    /// Short tag name used in logs and JSON dumps.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentBlock::Heading { .. } => "heading",
            ContentBlock::Paragraph { .. } => "paragraph",
            ContentBlock::BulletList { .. } => "bullet_list",
            ContentBlock::NumberedList { .. } => "numbered_list",
        }
    }
}

/// Font weight of a text run. Both map to base-14 Helvetica faces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontWeight {
    #[default]
    Normal,
    Bold,
}

/// What a run is, so consumers can group runs without re-deriving it from
/// font sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunRole {
    Title,
    Date,
    Heading,
    Paragraph,
    ListMarker,
    ListItem,
}

/// A single line of text placed on a page.
///
/// `y` is the baseline measured **down** from the top edge of the page, the
/// same direction the layout cursor moves. The PDF writer flips it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub font: String,
    pub size: f32,
    pub weight: FontWeight,
    pub role: RunRole,
    /// Index of the source [`ContentBlock`]; `None` for the title block.
    pub block: Option<usize>,
}

/// One page of positioned runs, in paint order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    pub runs: Vec<TextRun>,
}

/// The paginated, positioned-text result of a layout pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageDocument {
    pub width: f32,
    pub height: f32,
    pub pages: Vec<Page>,
}

impl PageDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// All runs in document order, paired with their 0-based page index.
    pub fn runs(&self) -> impl Iterator<Item = (usize, &TextRun)> {
        self.pages
            .iter()
            .enumerate()
            .flat_map(|(i, p)| p.runs.iter().map(move |r| (i, r)))
    }

    /// Distinct source-block indices in the order they first appear.
    ///
    /// The title block (`block == None`) is not a group.
    pub fn block_groups(&self) -> Vec<usize> {
        let mut groups: Vec<usize> = Vec::new();
        for (_, run) in self.runs() {
            if let Some(b) = run.block {
                if groups.last() != Some(&b) {
                    groups.push(b);
                }
            }
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(block: Option<usize>) -> TextRun {
        TextRun {
            text: "x".into(),
            x: 40.0,
            y: 40.0,
            font: "Helvetica".into(),
            size: 11.0,
            weight: FontWeight::Normal,
            role: RunRole::Paragraph,
            block,
        }
    }

    #[test]
    fn heading_level_is_clamped() {
        assert_eq!(
            ContentBlock::heading(7, "Deep"),
            ContentBlock::Heading {
                level: 3,
                text: "Deep".into()
            }
        );
        assert_eq!(
            ContentBlock::heading(0, "Top"),
            ContentBlock::Heading {
                level: 1,
                text: "Top".into()
            }
        );
    }

    #[test]
    fn block_groups_skip_title_and_merge_runs() {
        let doc = PageDocument {
            width: 595.0,
            height: 842.0,
            pages: vec![
                Page {
                    runs: vec![run(None), run(Some(0)), run(Some(0)), run(Some(1))],
                },
                Page {
                    runs: vec![run(Some(1)), run(Some(2))],
                },
            ],
        };
        assert_eq!(doc.block_groups(), vec![0, 1, 2]);
        assert_eq!(doc.runs().count(), 6);
    }

    #[test]
    fn blocks_serialise_with_type_tag() {
        let json = serde_json::to_string(&ContentBlock::bullets(["a", "b"])).unwrap();
        assert_eq!(json, r#"{"type":"bullet_list","items":["a","b"]}"#);
    }
}
