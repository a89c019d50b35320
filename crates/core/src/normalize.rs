//! Canonicalising normaliser for generated consultation documents.
//!
//! Model output follows the three-section template only approximately: headings arrive glued
//! to body text, field labels lose their emphasis across line breaks, greetings bleed into
//! subjects and numbered lists collapse onto one line. `normalize` repairs these defects with
//! an ordered cascade of rewrite rules. Order matters: later rules assume earlier repairs have
//! already happened (list repair, for instance, locates its span by the canonical headings
//! written back by heading isolation).
//!
//! Every rule is idempotent on its own. A later rule can still expose work for an earlier one
//! (dropping a `---` line leaves the next line's indentation behind a greeting), so `normalize`
//! repeats the cascade until a pass changes nothing:
//! `normalize(normalize(t)) == normalize(t)`.

use crate::constants::{
    EMAIL_HEADING, FIELD_LABELS, NEXT_STEPS_HEADING, SECTION_HEADINGS, SENTINEL,
};
use regex::{Captures, NoExpand, Regex};
use serde::Serialize;
use std::sync::LazyLock;

/// Canonical markdown produced by `normalize`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct NormalizedDocument(String);

impl NormalizedDocument {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NormalizedDocument {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for NormalizedDocument {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// What a matched pattern is replaced with.
pub enum Replacement {
    /// Inserted verbatim, `$` included.
    Literal(String),
    /// Expanded with capture groups (`${1}`).
    Template(&'static str),
    /// Computed from the captures.
    With(fn(&Captures<'_>) -> String),
}

/// The rewrite a rule performs.
pub enum Rewrite {
    /// Replace every match of `pattern`.
    Replace {
        pattern: Regex,
        replacement: Replacement,
    },
    /// Apply `rules` only to the span starting at the first `start` marker and running to the
    /// next `end` marker (or end of text). Whitespace separating the span from `end` is left
    /// outside the span; a trailing newline produced by `rules` counts toward it.
    Within {
        start: &'static str,
        end: Option<&'static str>,
        rules: Vec<RewriteRule>,
    },
    /// Whole-text transformation.
    Map(fn(&str) -> String),
}

/// A named step of the normalisation cascade.
pub struct RewriteRule {
    name: &'static str,
    rewrite: Rewrite,
}

impl RewriteRule {
    /// Builds a pattern rule.
    ///
    /// Patterns are compiled from constants at first use; an invalid one is a programming
    /// error.
    pub fn replace(name: &'static str, pattern: &str, replacement: Replacement) -> Self {
        Self {
            name,
            rewrite: Rewrite::Replace {
                pattern: Regex::new(pattern).expect("valid regex"),
                replacement,
            },
        }
    }

    pub fn within(
        name: &'static str,
        start: &'static str,
        end: Option<&'static str>,
        rules: Vec<RewriteRule>,
    ) -> Self {
        Self {
            name,
            rewrite: Rewrite::Within { start, end, rules },
        }
    }

    pub fn map(name: &'static str, f: fn(&str) -> String) -> Self {
        Self {
            name,
            rewrite: Rewrite::Map(f),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Applies this rule once.
    pub fn apply(&self, text: &str) -> String {
        match &self.rewrite {
            Rewrite::Replace {
                pattern,
                replacement,
            } => match replacement {
                Replacement::Literal(with) => {
                    pattern.replace_all(text, NoExpand(with)).into_owned()
                }
                Replacement::Template(template) => {
                    pattern.replace_all(text, *template).into_owned()
                }
                Replacement::With(f) => pattern
                    .replace_all(text, |caps: &Captures<'_>| f(caps))
                    .into_owned(),
            },
            Rewrite::Within { start, end, rules } => rewrite_within(text, start, *end, rules),
            Rewrite::Map(f) => f(text),
        }
    }
}

/// Applies `rules` in order, each to the output of the previous one.
pub fn apply_rules(rules: &[RewriteRule], text: &str) -> String {
    rules.iter().fold(text.to_string(), |current, rule| {
        let next = rule.apply(&current);
        if next != current {
            tracing::debug!(rule = rule.name, "rewrite applied");
        }
        next
    })
}

fn rewrite_within(
    text: &str,
    start: &str,
    end: Option<&str>,
    rules: &[RewriteRule],
) -> String {
    let Some(span_start) = text.find(start) else {
        return text.to_string();
    };
    let span_end = end
        .and_then(|marker| text[span_start..].find(marker))
        .map(|offset| span_start + offset)
        .unwrap_or(text.len());

    let span = &text[span_start..span_end];
    let content = span.trim_end();
    let gap = &span[content.len()..];

    let rewritten = apply_rules(rules, content);
    let gap = match gap.strip_prefix('\n') {
        Some(rest) if rewritten.ends_with('\n') => rest,
        _ => gap,
    };

    let mut out = String::with_capacity(text.len() + 16);
    out.push_str(&text[..span_start]);
    out.push_str(&rewritten);
    out.push_str(gap);
    out.push_str(&text[span_end..]);
    out
}

/// The ordered normalisation cascade.
pub fn rules() -> &'static [RewriteRule] {
    &RULES
}

/// Upper bound on cascade passes. Model output settles in two or three.
const MAX_PASSES: usize = 8;

/// Repairs a completed document into canonical markdown. Never fails.
pub fn normalize(text: &str) -> NormalizedDocument {
    let mut current = apply_rules(rules(), text);
    for _ in 1..MAX_PASSES {
        let next = apply_rules(rules(), &current);
        if next == current {
            return NormalizedDocument(current);
        }
        current = next;
    }
    tracing::warn!(passes = MAX_PASSES, "normalisation did not settle");
    NormalizedDocument(current)
}

static RULES: LazyLock<Vec<RewriteRule>> = LazyLock::new(build_rules);

fn build_rules() -> Vec<RewriteRule> {
    let mut rules = vec![
        RewriteRule::replace("line-endings", r"\r\n?", Replacement::Literal("\n".into())),
        // Trailing `---` rules are stripped with the sentinel; either may hide the other.
        RewriteRule::replace(
            "trailing-sentinel",
            &format!(r"(?i)(?:\s*(?:{}|-{{3,}}))+\s*\z", regex::escape(SENTINEL)),
            Replacement::Literal(String::new()),
        ),
        RewriteRule::replace(
            "trailing-line-whitespace",
            r"(?m)[ \t]+$",
            Replacement::Literal(String::new()),
        ),
        RewriteRule::map("trim-input", |s| s.trim().to_string()),
    ];

    for heading in SECTION_HEADINGS {
        rules.push(RewriteRule::replace(
            "isolate-heading",
            &format!(r"\s*(?i:{})\s*", heading_pattern(heading)),
            Replacement::Literal(format!("\n\n{}\n\n", heading)),
        ));
    }

    for label in FIELD_LABELS {
        let l = label_pattern(label);
        rules.push(RewriteRule::replace(
            "rejoin-split-label",
            &format!(
                concat!(
                    r"\*[ \t]*\n[ \t]*\*[ \t]*(?i:{l})[ \t]*:[ \t]*\*\*",
                    r"|\*\*[ \t]*\n[ \t]*(?i:{l})[ \t]*:[ \t]*\*\*",
                    r"|\*\*[ \t]*(?i:{l})[ \t]*:[ \t]*\n[ \t]*\*\*",
                ),
                l = l
            ),
            Replacement::Literal(format!("**{}:**", label)),
        ));
        rules.push(RewriteRule::replace(
            "label-own-line",
            &format!(r"[ \t]*\n?[ \t]*\*\*[ \t]*(?i:{})[ \t]*:[ \t]*\*\*", l),
            Replacement::Literal(format!("\n**{}:**", label)),
        ));
    }

    rules.extend([
        RewriteRule::replace(
            "placeholder-recipient-before-subject",
            r"(To:(?:\*\*)?[ \t]*<Patient Email>)[ \t]*((?:\*\*)?Subject:)",
            Replacement::Template("${1}\n\n${2}"),
        ),
        RewriteRule::replace(
            "recipient-before-subject",
            r"(\bTo:[^\n]*?)[ \t]*((?:\*\*)?Subject:)",
            Replacement::Template("${1}\n\n${2}"),
        ),
        RewriteRule::replace(
            "subject-before-greeting",
            r"(Subject:[^\n]*?)[ \t]*(Dear [^,\n]+,)",
            Replacement::Template("${1}\n\n${2}"),
        ),
        // Fires after every greeting, even one already followed by a blank line.
        RewriteRule::replace(
            "greeting-paragraph",
            r"(Dear [^,\n]+,)\s*",
            Replacement::Template("${1}\n\n"),
        ),
        RewriteRule::replace(
            "sentence-before-sign-off",
            r"([.!?])[ \t]*(Warm regards,)",
            Replacement::Template("${1}\n\n${2}"),
        ),
        RewriteRule::replace(
            "sign-off-before-signature",
            r"(Warm regards,)[ \t]*(\n*)",
            Replacement::With(separate_signature),
        ),
        RewriteRule::within(
            "next-steps-list",
            NEXT_STEPS_HEADING,
            Some(EMAIL_HEADING),
            vec![
                RewriteRule::map("break-list-markers", break_list_markers),
                RewriteRule::replace(
                    "collapse-blank-lines",
                    r"\n{3,}",
                    Replacement::Literal("\n\n".into()),
                ),
                RewriteRule::map("single-trailing-newline", |s| {
                    format!("{}\n", s.trim_end())
                }),
            ],
        ),
        RewriteRule::replace(
            "blank-line-before-list-item",
            r"\n+([ \t]*\d+\.[ \t])",
            Replacement::Template("\n\n${1}"),
        ),
        RewriteRule::replace(
            "trailing-horizontal-rule",
            r"(?m)(?:[ \t]*-{3,})+[ \t]*$",
            Replacement::Literal(String::new()),
        ),
        RewriteRule::replace(
            "collapse-blank-lines",
            r"\n{3,}",
            Replacement::Literal("\n\n".into()),
        ),
        RewriteRule::map("trim-output", |s| s.trim().to_string()),
    ]);

    rules
}

/// Case-insensitive pattern for a heading literal: flexible spacing, straight or curly
/// apostrophes.
fn heading_pattern(heading: &str) -> String {
    let mut words = heading.split_whitespace();
    let hashes = words.next().map(regex::escape).unwrap_or_default();
    let body = words
        .map(|w| regex::escape(w).replace('\'', "['’]"))
        .collect::<Vec<_>>()
        .join(r"[ \t]+");
    format!(r"{}[ \t]*{}", hashes, body)
}

/// Pattern for a field label: flexible spacing between words and around `/`.
fn label_pattern(label: &str) -> String {
    label
        .split(" / ")
        .map(|part| {
            part.split(' ')
                .map(regex::escape)
                .collect::<Vec<_>>()
                .join(r"[ \t]+")
        })
        .collect::<Vec<_>>()
        .join(r"[ \t]*/[ \t]*")
}

/// Puts the signature on its own paragraph unless a line break already follows the sign-off.
fn separate_signature(caps: &Captures<'_>) -> String {
    match &caps[2] {
        "" => format!("{}\n\n", &caps[1]),
        breaks => format!("{}{}", &caps[1], breaks),
    }
}

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t]*(\d+)\.[ \t]+").expect("valid regex"));

/// Moves numbered-list markers onto their own lines.
///
/// A marker at line start or set off by blanks always opens an item. A marker glued to the
/// end of the previous item (`CBC2. `, `weeks.3. `) opens one only when it carries the next
/// number in sequence, so `COVID-19. ` and `**1. ` stay where they are.
fn break_list_markers(block: &str) -> String {
    let mut out = String::with_capacity(block.len() + 16);
    let mut copied = 0;
    let mut previous: Option<u32> = Some(0);

    for caps in LIST_MARKER.captures_iter(block) {
        let (Some(marker), Some(digits)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let number = digits.as_str();
        let before = block[..marker.start()].chars().next_back();

        let line_start = matches!(before, None | Some('\n'));
        let spaced = marker.start() < digits.start() || matches!(before, Some(' ' | '\t'));
        let in_sequence = matches!(before, Some(c) if c.is_alphanumeric() || ".,;:!?)".contains(c))
            && previous
                .and_then(|n| n.checked_add(1))
                .is_some_and(|next| next.to_string() == number);

        out.push_str(&block[copied..marker.start()]);
        copied = marker.end();
        if !(line_start || spaced || in_sequence) {
            out.push_str(marker.as_str());
            continue;
        }
        if !line_start {
            let kept = out.trim_end_matches([' ', '\t']).len();
            out.truncate(kept);
            out.push('\n');
        }
        out.push_str(number);
        out.push_str(". ");
        previous = number.parse().ok();
    }

    out.push_str(&block[copied..]);
    out
}
