//! Cleanup of raw text fields from exported dumps.

/// Trim and collapse every whitespace run (newlines included) to one space
pub fn clean_text(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Clean question content.
///
/// Strips one leading `["` and one trailing `"]` left over from JSON-array
/// quoting and turns literal `\n` sequences into line breaks. Line structure
/// is kept, so whitespace is only trimmed at the ends.
pub fn clean_content(text: &str) -> String {
    let text = text.trim();
    let text = text.strip_prefix("[\"").unwrap_or(text);
    let text = text.strip_suffix("\"]").unwrap_or(text);

    text.replace("\\n", "\n").trim().to_string()
}
