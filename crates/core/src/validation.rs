//! Input validation utilities.
//!
//! Checks applied to visit fields before they are embedded into model prompts.

use crate::constants::MAX_NOTES_CHARS;
use crate::{ScribeError, ScribeResult};
use chrono::NaiveDate;

/// Validates that a visit date is an ISO calendar date (`YYYY-MM-DD`).
///
/// # Errors
///
/// Returns `ScribeError::InvalidInput` if the date does not parse.
pub fn validate_visit_date(date: &str) -> ScribeResult<NaiveDate> {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d").map_err(|e| {
        ScribeError::InvalidInput(format!(
            "date of visit must be YYYY-MM-DD (got '{}'): {}",
            date, e
        ))
    })
}

/// Validates that raw consultation notes fit within the prompt budget.
///
/// Length is counted in characters, not bytes, so accented names and symbols are not
/// penalised.
///
/// # Errors
///
/// Returns `ScribeError::InvalidInput` if the notes are longer than `MAX_NOTES_CHARS`.
pub fn validate_notes_length(notes: &str) -> ScribeResult<()> {
    let count = notes.chars().count();
    if count > MAX_NOTES_CHARS {
        return Err(ScribeError::InvalidInput(format!(
            "notes exceed maximum length of {} characters ({} given)",
            MAX_NOTES_CHARS, count
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visit_date_accepts_iso() {
        let date = validate_visit_date(" 2025-10-31 ").unwrap();
        assert_eq!(date.to_string(), "2025-10-31");
    }

    #[test]
    fn test_visit_date_rejects_other_formats() {
        assert!(validate_visit_date("31/10/2025").is_err());
        assert!(validate_visit_date("2025-02-30").is_err());
        assert!(validate_visit_date("").is_err());
    }

    #[test]
    fn test_notes_length_boundary() {
        let at_limit = "é".repeat(MAX_NOTES_CHARS);
        assert!(validate_notes_length(&at_limit).is_ok());

        let over = "a".repeat(MAX_NOTES_CHARS + 1);
        assert!(matches!(
            validate_notes_length(&over),
            Err(ScribeError::InvalidInput(_))
        ));
    }
}
