//! Section splitting for normalized consultation documents.
//!
//! The document is sliced at the first occurrence of each canonical heading. Searches are
//! literal and case-sensitive; `normalize` has already written the headings back in their
//! canonical form.

use crate::constants::{EMAIL_HEADING, NEXT_STEPS_HEADING, SUMMARY_HEADING};
use serde::Serialize;

/// The three regions of a consultation document.
///
/// Each block starts with its own heading and is trimmed. A block is empty when a bounding
/// heading is missing, or when its end heading occurs before its start heading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SectionSet {
    pub summary: String,
    pub next_steps: String,
    pub email: String,
}

impl SectionSet {
    /// Whether every block is empty.
    pub fn is_empty(&self) -> bool {
        self.summary.is_empty() && self.next_steps.is_empty() && self.email.is_empty()
    }
}

/// Splits a normalized document into its summary, next-steps and email blocks.
pub fn split(doc: &str) -> SectionSet {
    let summary_at = doc.find(SUMMARY_HEADING);
    let next_steps_at = doc.find(NEXT_STEPS_HEADING);
    let email_at = doc.find(EMAIL_HEADING);

    for (heading, at) in [
        (SUMMARY_HEADING, summary_at),
        (NEXT_STEPS_HEADING, next_steps_at),
        (EMAIL_HEADING, email_at),
    ] {
        if at.is_none() {
            tracing::debug!(heading, "section heading not found");
        }
    }

    SectionSet {
        summary: region(doc, summary_at, next_steps_at),
        next_steps: region(doc, next_steps_at, email_at),
        email: region(doc, email_at, Some(doc.len())),
    }
}

fn region(doc: &str, start: Option<usize>, end: Option<usize>) -> String {
    match (start, end) {
        (Some(start), Some(end)) if start <= end => doc[start..end].trim().to_string(),
        (Some(start), Some(end)) => {
            tracing::debug!(start, end, "section headings out of order");
            String::new()
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document() -> String {
        format!(
            "{SUMMARY_HEADING}\n\n**Clinical summary:** Stable.\n\n\
             {NEXT_STEPS_HEADING}\n\n1. Order CBC\n\n\
             {EMAIL_HEADING}\n\nDear Ana,\n\nAll good."
        )
    }

    #[test]
    fn test_split_empty_document() {
        let sections = split("");
        assert_eq!(sections, SectionSet::default());
        assert!(sections.is_empty());
    }

    #[test]
    fn test_split_orders_blocks() {
        let doc = document();
        let sections = split(&doc);

        assert!(sections.summary.starts_with(SUMMARY_HEADING));
        assert!(sections.summary.ends_with("Stable."));
        assert_eq!(sections.next_steps, format!("{NEXT_STEPS_HEADING}\n\n1. Order CBC"));
        assert!(sections.email.starts_with(EMAIL_HEADING));
        assert!(sections.email.ends_with("All good."));

        let s = doc.find(&sections.summary).unwrap();
        let n = doc.find(&sections.next_steps).unwrap();
        let e = doc.find(&sections.email).unwrap();
        assert!(s + sections.summary.len() <= n);
        assert!(n + sections.next_steps.len() <= e);
    }

    #[test]
    fn test_missing_heading_empties_dependent_blocks() {
        let doc = format!("{SUMMARY_HEADING}\n\nStable.\n\n{EMAIL_HEADING}\n\nDear Ana,");
        let sections = split(&doc);
        assert_eq!(sections.summary, "");
        assert_eq!(sections.next_steps, "");
        assert_eq!(sections.email, format!("{EMAIL_HEADING}\n\nDear Ana,"));
    }

    #[test]
    fn test_out_of_order_headings_do_not_panic() {
        let doc = format!("{NEXT_STEPS_HEADING}\n\n1. A\n\n{SUMMARY_HEADING}\n\nStable.");
        let sections = split(&doc);
        assert_eq!(sections.summary, "");
        assert_eq!(sections.next_steps, "");
        assert_eq!(sections.email, "");
    }

    #[test]
    fn test_first_occurrence_wins() {
        let doc = format!("{EMAIL_HEADING}\n\nfirst\n\n{EMAIL_HEADING}\n\nsecond");
        let sections = split(&doc);
        assert!(sections.email.contains("first"));
        assert!(sections.email.contains("second"));
    }

    #[test]
    fn test_heading_search_is_case_sensitive() {
        let sections = split("### next steps for the doctor\n\n1. A");
        assert_eq!(sections.next_steps, "");
    }
}
