//! Constants used throughout the scribe core crate.
//!
//! Literal markers the model is instructed to emit. The normalizer writes these back in their
//! canonical form, and the splitter and extractors search for them verbatim.

/// End-of-document marker sent by the transport.
pub const SENTINEL: &str = "[DONE]";

/// Heading that opens the doctor-facing visit summary.
pub const SUMMARY_HEADING: &str = "### Summary of visit for the doctor's records";

/// Heading that opens the doctor's follow-up task list.
pub const NEXT_STEPS_HEADING: &str = "### Next steps for the doctor";

/// Heading that opens the patient email draft.
pub const EMAIL_HEADING: &str = "### Draft of email to patient in patient-friendly language";

/// All section headings, in document order.
pub const SECTION_HEADINGS: [&str; 3] = [SUMMARY_HEADING, NEXT_STEPS_HEADING, EMAIL_HEADING];

/// Emphasized field labels expected inside the summary section, in template order.
pub const FIELD_LABELS: [&str; 7] = [
    "Patient name",
    "Date of visit",
    "Chief complaint / reason for visit",
    "Exam / key findings",
    "Assessment / impression",
    "Plan today",
    "Clinical summary",
];

/// Field label whose text feeds the handover summary.
pub const CLINICAL_SUMMARY_LABEL: &str = "Clinical summary";

/// Maximum number of sentences kept in a handover summary.
pub const HANDOVER_SENTENCE_LIMIT: usize = 2;

/// Default REST bind address when none is configured.
pub const DEFAULT_REST_ADDR: &str = "0.0.0.0:3000";

/// Default request body cap for the REST API.
pub const DEFAULT_MAX_BODY_BYTES: usize = 256 * 1024;

/// Hard ceiling for a configured request body cap.
pub const MAX_BODY_BYTES_CEILING: usize = 8 * 1024 * 1024;

/// Maximum length, in characters, of the raw notes accepted for prompt construction.
pub const MAX_NOTES_CHARS: usize = 20_000;
