//! Patient email extraction.
//!
//! Turns the email block of a normalized document into recipient, subject and body fields,
//! repairing a greeting that bled into the subject line and falling back to a greeting and
//! subject built from the visit context when the model left them out.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

static TO_EMPHASIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*To:\*\*[ \t]*([^\n]*)").expect("valid regex"));
static TO_PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*To:[ \t]*([^\n]*)").expect("valid regex"));
static SUBJECT_EMPHASIZED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*\*Subject:\*\*[ \t]*([^\n]*)").expect("valid regex"));
static SUBJECT_PLAIN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Subject:[ \t]*([^\n]*)").expect("valid regex"));
static GREETING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Dear [^,\n]+,").expect("valid regex"));
static TO_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*(?:\*\*)?To:").expect("valid regex"));

/// Structured fields of the patient email draft.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParsedEmail {
    pub has_email: bool,
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Parses an email block.
///
/// `patient_name` feeds the greeting fallback and `visit_date` the subject fallback; blank
/// values are treated as absent. An empty block yields `ParsedEmail::default()` without
/// applying any fallback.
pub fn parse_email(
    block: &str,
    patient_name: Option<&str>,
    visit_date: Option<&str>,
) -> ParsedEmail {
    let block = block.trim();
    if block.is_empty() {
        return ParsedEmail::default();
    }
    let block = strip_heading_line(block);

    let to = extract_recipient(block);
    let (subject, mut body) = match extract_subject(block) {
        Some((subject, body)) => (subject, body),
        None => (String::new(), body_without_recipient(block)),
    };

    if let Some(name) = non_blank(patient_name) {
        if !body.contains("Dear ") {
            tracing::debug!("greeting missing; using patient name");
            body = if body.is_empty() {
                format!("Dear {},", name)
            } else {
                format!("Dear {},\n\n{}", name, body)
            };
        }
    }

    let subject = match non_blank(visit_date) {
        Some(date) if subject.is_empty() => {
            tracing::debug!("subject missing; using visit date");
            format!("Follow-up from your visit on {}", date)
        }
        _ => subject,
    };

    ParsedEmail {
        has_email: !to.is_empty() || !subject.is_empty() || !body.is_empty(),
        to,
        subject,
        body,
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn strip_heading_line(block: &str) -> &str {
    if !block.starts_with("###") {
        return block;
    }
    match block.split_once('\n') {
        Some((_, rest)) => rest.trim(),
        None => "",
    }
}

fn extract_recipient(block: &str) -> String {
    let Some(caps) = TO_EMPHASIZED
        .captures(block)
        .or_else(|| TO_PLAIN.captures(block))
    else {
        return String::new();
    };
    let mut value = caps.get(1).map_or("", |m| m.as_str());
    // A subject glued onto the recipient line belongs to the subject.
    for marker in ["**Subject:", "Subject:"] {
        if let Some(at) = value.find(marker) {
            value = &value[..at];
        }
    }
    value
        .trim()
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim()
        .to_string()
}

/// Subject and tentative body, or `None` when the block has no subject line.
fn extract_subject(block: &str) -> Option<(String, String)> {
    let caps = SUBJECT_EMPHASIZED
        .captures(block)
        .or_else(|| SUBJECT_PLAIN.captures(block))?;
    let line = caps.get(1).map_or("", |m| m.as_str());
    let after = caps.get(0).map_or("", |m| &block[m.end()..]).trim();

    let Some(greeting) = GREETING.find(line) else {
        return Some((line.trim().to_string(), after.to_string()));
    };

    let subject = line[..greeting.start()].trim().to_string();
    let mut body = line[greeting.start()..].trim().to_string();
    if !after.is_empty() {
        body.push_str("\n\n");
        body.push_str(after);
    }
    Some((subject, body))
}

fn body_without_recipient(block: &str) -> String {
    block
        .lines()
        .filter(|line| !TO_LINE.is_match(line))
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}
