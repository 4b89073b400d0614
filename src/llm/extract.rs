//! Pulling structured blocks out of free-form model output.
//!
//! Grammar: the first "```" opens a block; an optional language tag runs to
//! the end of that line; the block ends at the next "```" (or at end of
//! input if there is none). Without an opening fence, the whole text is the
//! block.

const FENCE: &str = "```";

/// Return the first fenced block in `text`, or the whole (trimmed) text when
/// there is no fence.
pub fn extract_block(text: &str) -> &str {
    let trimmed = text.trim();

    let Some(open) = trimmed.find(FENCE) else {
        return trimmed;
    };

    let after_open = &trimmed[open + FENCE.len()..];

    // Skip a language tag like `json` only if it sits on the fence line.
    let body = match after_open.find('\n') {
        Some(nl) if is_language_tag(&after_open[..nl]) => &after_open[nl + 1..],
        _ => after_open,
    };

    match body.find(FENCE) {
        Some(close) => body[..close].trim(),
        None => body.trim(),
    }
}

/// Return the span from the first `{` to the last `}`, if any.
pub fn extract_object_span(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

fn is_language_tag(line: &str) -> bool {
    let tag = line.trim();
    tag.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}
