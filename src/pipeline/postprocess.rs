//! Post-processing: deterministic cleanup of LLM-generated HTML notes.
//!
//! Models are told to return a bare HTML fragment, yet they regularly wrap it
//! in ```` ```html ```` fences, emit `<br>` without a closing slash, or use
//! named entities that only some consumers know, like `&nbsp;`. The cleaned
//! string is what `/generate-notes` returns, so it is normalised to markup
//! any HTML or XML consumer reads the same way, and to characters the
//! WinAnsi-encoded PDF can draw.
//!
//! ## Rule Order
//!
//! Fences are stripped before anything else so the fence markers never reach
//! the markup rules; entities are rewritten before stray ampersands are
//! escaped so `&nbsp;` does not become `&amp;nbsp;`.

use once_cell::sync::Lazy;
use regex::Regex;

/// Apply all post-processing rules to the raw LLM output.
///
/// Rules (applied in order):
/// 1. Strip outer code fences
/// 2. Normalise line endings (CRLF → LF)
/// 3. Strip invisible Unicode (zero-width spaces, BOM, soft hyphens, etc.)
/// 4. Remove `<!DOCTYPE>` declarations and HTML comments
/// 5. Self-close void elements (`<br>` → `<br/>`)
/// 6. Rewrite HTML named entities to numeric references
/// 7. Escape ampersands that do not start an entity
/// 8. Trim surrounding whitespace
pub fn clean_notes_html(input: &str) -> String {
    let s = strip_code_fences(input);
    let s = normalise_line_endings(&s);
    let s = remove_invisible_chars(&s);
    let s = remove_declarations(&s);
    let s = self_close_void_elements(&s);
    let s = rewrite_named_entities(&s);
    let s = escape_stray_ampersands(&s);
    s.trim().to_string()
}

// ── Rule 1: Strip outer code fences ──────────────────────────────────────────

static RE_OUTER_FENCES: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)^```[A-Za-z]*\s*\n(.*)\n```\s*$").unwrap());

fn strip_code_fences(input: &str) -> String {
    if let Some(caps) = RE_OUTER_FENCES.captures(input.trim()) {
        caps[1].to_string()
    } else {
        input.to_string()
    }
}

// ── Rule 2: Normalise line endings ───────────────────────────────────────────

fn normalise_line_endings(input: &str) -> String {
    input.replace("\r\n", "\n").replace('\r', "\n")
}

// ── Rule 3: Remove invisible Unicode characters ─────────────────────────────

fn remove_invisible_chars(input: &str) -> String {
    input.replace(
        [
            '\u{200B}', '\u{FEFF}', '\u{00AD}', '\u{200C}', '\u{200D}', '\u{2060}',
        ],
        "",
    )
}

// ── Rule 4: Remove declarations and comments ────────────────────────────────

static RE_DECLARATIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<!DOCTYPE[^>]*>|<!--.*?-->|<\?xml[^>]*\?>").unwrap());

fn remove_declarations(input: &str) -> String {
    RE_DECLARATIONS.replace_all(input, "").to_string()
}

// ── Rule 5: Self-close void elements ────────────────────────────────────────

static RE_VOID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<(br|hr|img|meta|link|input|wbr|col|source)(\s[^<>]*)?>").unwrap()
});

fn self_close_void_elements(input: &str) -> String {
    RE_VOID
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let attrs = caps.get(2).map(|m| m.as_str()).unwrap_or("");
            if attrs.trim_end().ends_with('/') {
                caps[0].to_string()
            } else {
                format!("<{}{}/>", &caps[1], attrs)
            }
        })
        .to_string()
}

// ── Rule 6: Rewrite named entities ──────────────────────────────────────────

static RE_NAMED_ENTITY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"&([A-Za-z][A-Za-z0-9]*);").unwrap());

fn named_entity_codepoint(name: &str) -> Option<u32> {
    Some(match name {
        "nbsp" => 160,
        "copy" => 169,
        "reg" => 174,
        "deg" => 176,
        "plusmn" => 177,
        "middot" => 183,
        "times" => 215,
        "divide" => 247,
        "ndash" => 0x2013,
        "mdash" => 0x2014,
        "lsquo" => 0x2018,
        "rsquo" => 0x2019,
        "ldquo" => 0x201C,
        "rdquo" => 0x201D,
        "bull" => 0x2022,
        "hellip" => 0x2026,
        "trade" => 0x2122,
        _ => return None,
    })
}

/// ASCII spellings for symbols the PDF fonts cannot draw.
fn ascii_entity(name: &str) -> Option<&'static str> {
    Some(match name {
        "larr" => "&lt;-",
        "rarr" => "-&gt;",
        "harr" => "&lt;-&gt;",
        "rArr" => "=&gt;",
        "le" => "&lt;=",
        "ge" => "&gt;=",
        "ne" => "!=",
        _ => return None,
    })
}

fn rewrite_named_entities(input: &str) -> String {
    RE_NAMED_ENTITY
        .replace_all(input, |caps: &regex::Captures<'_>| {
            let name = &caps[1];
            match name {
                "amp" | "lt" | "gt" | "quot" | "apos" => caps[0].to_string(),
                _ => match (named_entity_codepoint(name), ascii_entity(name)) {
                    (Some(cp), _) => format!("&#{cp};"),
                    (None, Some(ascii)) => ascii.to_string(),
                    // Unknown entity: keep it as literal text.
                    (None, None) => format!("&amp;{name};"),
                },
            }
        })
        .to_string()
}

// ── Rule 7: Escape stray ampersands ─────────────────────────────────────────

static RE_ENTITY_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^&(?:[A-Za-z][A-Za-z0-9]*|#[0-9]+|#[xX][0-9A-Fa-f]+);").unwrap());

fn escape_stray_ampersands(input: &str) -> String {
    let mut out = String::with_capacity(input.len() + 16);
    for (i, ch) in input.char_indices() {
        if ch == '&' && !RE_ENTITY_PREFIX.is_match(&input[i..]) {
            out.push_str("&amp;");
        } else {
            out.push(ch);
        }
    }
    out
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_fences() {
        let input = "```html\n<h1>Hello</h1>\n<p>World</p>\n```";
        assert_eq!(strip_code_fences(input), "<h1>Hello</h1>\n<p>World</p>");
    }

    #[test]
    fn test_strip_fences_no_lang() {
        let input = "```\n<p>x</p>\n```";
        assert_eq!(strip_code_fences(input), "<p>x</p>");
    }

    #[test]
    fn test_no_fences_passthrough() {
        assert_eq!(strip_code_fences("<p>x</p>"), "<p>x</p>");
    }

    #[test]
    fn test_remove_declarations() {
        let input = "<!DOCTYPE html><!-- generated -->\n<p>x</p>";
        assert_eq!(remove_declarations(input), "\n<p>x</p>");
    }

    #[test]
    fn test_self_close_void() {
        assert_eq!(self_close_void_elements("a<br>b"), "a<br/>b");
        assert_eq!(self_close_void_elements("a<BR class=\"x\">b"), "a<BR class=\"x\"/>b");
        assert_eq!(self_close_void_elements("a<br />b"), "a<br />b");
        assert_eq!(self_close_void_elements("a<br/>b"), "a<br/>b");
    }

    #[test]
    fn test_void_regex_ignores_longer_tags() {
        // `<bridge>` is not `<br>`
        assert_eq!(self_close_void_elements("<bridge>x</bridge>"), "<bridge>x</bridge>");
    }

    #[test]
    fn test_named_entities() {
        assert_eq!(rewrite_named_entities("a&nbsp;b"), "a&#160;b");
        assert_eq!(rewrite_named_entities("x &amp; y"), "x &amp; y");
        assert_eq!(rewrite_named_entities("&bogus;"), "&amp;bogus;");
    }

    #[test]
    fn test_arrow_entities_become_ascii() {
        assert_eq!(rewrite_named_entities("ADP &rarr; ATP"), "ADP -&gt; ATP");
        assert_eq!(rewrite_named_entities("x &le; 3 &ne; y"), "x &lt;= 3 != y");
    }

    #[test]
    fn test_escape_stray_ampersands() {
        assert_eq!(
            escape_stray_ampersands("R&D &amp; Q&#65; &#x41;"),
            "R&amp;D &amp; Q&#65; &#x41;"
        );
    }

    #[test]
    fn test_remove_invisible() {
        let input = "hello\u{200B}world\u{FEFF}";
        assert_eq!(remove_invisible_chars(input), "helloworld");
    }

    #[test]
    fn test_clean_full_pipeline() {
        let input = "```html\r\n<h1>Cells&nbsp;101</h1>\r\n<p>Salt & pepper<br>line</p>\r\n```";
        let result = clean_notes_html(input);
        assert_eq!(
            result,
            "<h1>Cells&#160;101</h1>\n<p>Salt &amp; pepper<br/>line</p>"
        );
    }
}
