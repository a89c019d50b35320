//! Handover summary extraction.
//!
//! A handover is the first one or two sentences of the `**Clinical summary:**` field, short
//! enough for a clinician-to-clinician note.

use crate::constants::{CLINICAL_SUMMARY_LABEL, HANDOVER_SENTENCE_LIMIT};
use regex::Regex;
use std::sync::LazyLock;

static CLINICAL_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\*\*{}:\*\*",
        regex::escape(CLINICAL_SUMMARY_LABEL)
    ))
    .expect("valid regex")
});

static SENTENCE_END: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[.!?]\s+").expect("valid regex"));

/// Extracts up to two sentences of the clinical summary from a summary block.
///
/// Returns an empty string when the label is absent or has no text after it.
pub fn extract_handover(summary_block: &str) -> String {
    let Some(label) = CLINICAL_SUMMARY.find(summary_block) else {
        return String::new();
    };
    let rest = summary_block[label.end()..].trim();

    sentences(rest)
        .take(HANDOVER_SENTENCE_LIMIT)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Splits text into sentences; terminal punctuation stays with its sentence.
fn sentences(text: &str) -> impl Iterator<Item = &str> {
    let mut start = 0;
    let mut ends = SENTENCE_END.find_iter(text).map(|m| m.start() + 1);

    std::iter::from_fn(move || {
        if start >= text.len() {
            return None;
        }
        let end = ends.next().unwrap_or(text.len());
        let sentence = text[start..end].trim();
        start = end;
        Some(sentence)
    })
    .filter(|s| !s.is_empty())
}
