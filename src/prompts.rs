//! Prompts for the two LLM collaborators.
//!
//! Centralising every prompt here keeps the wording in one place and lets
//! unit tests inspect it without spinning up a provider.
//!
//! Callers can override either prompt via
//! [`crate::config::NotesConfig::ocr_prompt`] and
//! [`crate::config::NotesConfig::notes_prompt`]; the constants here are used
//! only when no override is provided.

/// System prompt for transcribing an uploaded image to plain text.
pub const DEFAULT_OCR_PROMPT: &str = r#"You are an OCR engine. Transcribe every piece of readable text in the image.

Rules:
- Output ONLY the transcribed text, in natural reading order
- Join the lines of one paragraph with single spaces
- Do NOT describe the image, add commentary, or use Markdown
- If the image contains no readable text, output nothing"#;

/// System prompt for turning extracted text into HTML study notes.
///
/// The allowed tag set is exactly what [`crate::pipeline::parse`] maps to
/// content blocks; anything else degrades to a paragraph.
pub const DEFAULT_NOTES_PROMPT: &str = r#"You are a helpful academic assistant. Generate clean, concise, and well-organized study notes.

Follow these rules precisely:

1. STRUCTURE
   - Clear headings and subheadings with a logical, easy-to-read structure
   - Use <h1> for the main title, <h2> for sections, <h3> for subsections
   - Use <p> for prose, <ul><li> for bullet points, <ol><li> for steps

2. ALLOWED MARKUP
   - Output ONLY top-level <h1>, <h2>, <h3>, <p>, <ul> and <ol> elements
   - <li> may appear only directly inside <ul> or <ol>; do NOT nest lists
   - No inline styling, no <html>, <head>, <body>, <div>, <br> or <table>

3. OUTPUT FORMAT
   - Output ONLY the HTML fragment
   - Do NOT wrap it in ```html fences
   - No comments, debugging text, or extraneous symbols"#;

/// Build the user message for note generation.
pub fn notes_request(topic: &str, extracted_text: &str) -> String {
    format!(
        "A student is studying the topic: \"{}\".\n\nExtracted notes:\n\"\"\"{}\"\"\"",
        topic.trim(),
        extracted_text.trim()
    )
}
