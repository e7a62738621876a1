use crate::domain::{Comment, ConfirmedFinding};

const MASK: char = '*';
const VISIBLE_PREFIX: usize = 2;
const MAX_MASK: usize = 8;
const REDACTED: &str = "[redacted]";

/// Keeps the first two characters and masks up to eight more.
///
/// Fragments of two characters or fewer are masked entirely. A preview that
/// would still contain the fragment falls back to a full mask, or to
/// [`REDACTED`] for fragments made only of mask characters.
pub fn blur(fragment: &str) -> String {
    let len = fragment.chars().count();
    let full_mask = MASK.to_string().repeat(len);
    if len <= VISIBLE_PREFIX {
        return if fragment.is_empty() || !full_mask.contains(fragment) {
            full_mask
        } else {
            REDACTED.to_string()
        };
    }

    let mut preview: String = fragment.chars().take(VISIBLE_PREFIX).collect();
    let masked = MAX_MASK.min(len - VISIBLE_PREFIX);
    preview.extend(std::iter::repeat_n(MASK, masked));
    if !preview.contains(fragment) {
        preview
    } else if !full_mask.contains(fragment) {
        full_mask
    } else {
        REDACTED.to_string()
    }
}

pub fn render_comment(confirmed: &ConfirmedFinding) -> Comment {
    let finding = &confirmed.finding;
    let preview = blur(&finding.quote);

    let title = format!("Detected {}", finding.detector);
    let body = format!(
        "Potentially sensitive data detected: `{preview}`\n\n\
         Detector: {} (likelihood {})\n\n\
         Remove it from this change, or add an exclusion if it is expected.",
        finding.detector, finding.likelihood
    );

    Comment {
        title,
        body: scrub(body, &finding.quote, &preview),
        path: confirmed.path.clone(),
        line: confirmed.line,
    }
}

/// Replaces any verbatim occurrence of the fragment that slipped into rendered text.
fn scrub(text: String, fragment: &str, preview: &str) -> String {
    if fragment.is_empty() || !text.contains(fragment) {
        return text;
    }
    let mut text = text.replace(fragment, preview);
    // Replacement can join neighbours into a new occurrence; removal always shrinks.
    while text.contains(fragment) {
        text = text.replace(fragment, "");
    }
    text
}

pub fn render_comments(confirmed: &[ConfirmedFinding]) -> Vec<Comment> {
    confirmed.iter().map(render_comment).collect()
}
