//! HTML note parser: notes markup → ordered [`ContentBlock`]s.
//!
//! Only the element children of the body are considered, each mapped by tag
//! name. The markup goes through an HTML5 tree builder (`scraper`, on top of
//! html5ever), so omitted end tags, upper-case tag names and unquoted
//! attributes parse the way a browser would parse them.
//!
//! Parsing never fails the pipeline. Markup that yields no top-level elements
//! gives an empty sequence, which callers report as "no content to render".

use crate::document::ContentBlock;
use scraper::{ElementRef, Html, Node};
use tracing::{debug, warn};

/// Parse notes markup into blocks, one per top-level element, in order.
pub fn parse_notes(html: &str) -> Vec<ContentBlock> {
    let doc = Html::parse_document(html);
    if !doc.errors.is_empty() {
        debug!("Notes markup had {} recoverable parse errors", doc.errors.len());
    }

    let body = find_body(&doc);
    let blocks: Vec<ContentBlock> = body
        .children()
        .filter_map(ElementRef::wrap)
        .map(classify)
        .collect();

    if blocks.is_empty() && !html.trim().is_empty() {
        warn!("Notes markup has no top-level elements, nothing to render");
    }
    debug!("Parsed {} content blocks", blocks.len());
    blocks
}

/// The `<body>` element; html5ever always synthesises one for fragments.
fn find_body(doc: &Html) -> ElementRef<'_> {
    let root = doc.root_element();
    root.children()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "body")
        .unwrap_or(root)
}

fn classify(el: ElementRef<'_>) -> ContentBlock {
    match el.value().name() {
        "h1" => ContentBlock::heading(1, flatten_text(el)),
        "h2" => ContentBlock::heading(2, flatten_text(el)),
        "h3" => ContentBlock::heading(3, flatten_text(el)),
        "ul" => ContentBlock::BulletList {
            items: list_items(el),
        },
        "ol" => ContentBlock::NumberedList {
            items: list_items(el),
        },
        // `p` and anything unrecognised
        _ => ContentBlock::paragraph(flatten_text(el)),
    }
}

fn list_items(el: ElementRef<'_>) -> Vec<String> {
    el.children()
        .filter_map(ElementRef::wrap)
        .map(flatten_text)
        .collect()
}

/// All descendant text, whitespace-collapsed and trimmed.
///
/// `<br>` counts as a space so `a<br>b` reads "a b".
fn flatten_text(el: ElementRef<'_>) -> String {
    let mut raw = String::new();
    for node in el.descendants() {
        match node.value() {
            Node::Text(text) => raw.push_str(text),
            Node::Element(e) if e.name() == "br" => raw.push(' '),
            _ => {}
        }
    }
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
