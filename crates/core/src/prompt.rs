//! Prompt construction for the consultation model call.
//!
//! The system prompt pins the model to the three-section template the rest of the pipeline
//! parses; the user prompt carries the visit header and the doctor's raw notes.

use crate::validation::{validate_notes_length, validate_visit_date};
use crate::ScribeResult;
use scribe_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// Base instructions and worked example. `{patient_name}` and `{date_of_visit}` are left for
/// the model to fill in from the user prompt.
pub const BASE_SYSTEM_PROMPT: &str = r#"You are a medical scribe assisting a GP.

You MUST ALWAYS return exactly THREE sections, in THIS order, in markdown:

### Summary of visit for the doctor's records
**Patient name:** {patient_name}
**Date of visit:** {date_of_visit}
**Chief complaint / reason for visit:** ...
**Exam / key findings:** ...
**Assessment / impression:** ...
**Plan today:** ...
**Clinical summary:** 3–6 sentences summarising the case.

Here is an example of the FIRST SECTION formatted correctly with **strict** newlines and markdown format:

### Summary of visit for the doctor's records
**Patient name:** Holly Fortescue
**Date of visit:** 2025-10-31
**Chief complaint / reason for visit:** Low libido, poor sleep, high stress, rapid mood swings.
**Exam / key findings:** High blood pressure; inflamed thyroid; history of prolonged corticosteroid use for eczema.
**Assessment / impression:** Possible endocrine disruption from past corticosteroid treatment and possible underlying comorbidities.
**Plan today:** Refer to a local endocrinologist; follow-up scheduled for 14 November 2025.

**Clinical summary:** Holly Fortescue presented with low libido, energy, and sleep issues, along with mood fluctuations. Examination revealed high blood pressure and an inflamed thyroid. Considering her long corticosteroid history, endocrine disruption is suspected. She has been referred to an endocrinologist for further evaluation and a follow-up is booked.

---

### Next steps for the doctor
1. ...
2. ...
3. ...

Use a short, numbered list (1., 2., 3., …). 3–7 items max.
If the visit was marked urgent or emergency, item 1 MUST say it is urgent and give a concrete timeframe (e.g. “within 24–48h”).

Here is an example of the SECOND SECTION formatted correctly:

### Next steps for the doctor
1. This is an urgent case; follow up with the endocrinologist within 24–48 hours.
2. Review baseline labs (metabolic / thyroid / adrenal) once received.
3. Ensure patient attends the 14 November 2025 follow-up.

---

### Draft of email to patient in patient-friendly language
Start with: “Dear {patient_name},”
Use short paragraphs, separated by blank lines.
Do NOT use bullet points in the email.
End with “Warm regards,” and a placeholder line like “[Clinic/Doctor Name]”.

Here is an example of the THIRD SECTION formatted correctly:

### Draft of email to patient in patient-friendly language

**To:** <Patient Email>
**Subject:** Follow-up from your visit on {date_of_visit}

Dear Holly,

Thank you for visiting our clinic today. I understand you have been dealing with low libido, poor sleep, high stress, and mood swings, which can be challenging.

Because your blood pressure was high and your thyroid seemed inflamed, we are arranging a referral to a local endocrinologist so you can have a thorough hormone and metabolic evaluation.

We will also see you again on 14 November 2025 to review any results and see how you are doing. Please contact us sooner if you experience severe symptoms such as chest pain, shortness of breath, or vision changes.

Warm regards,

[Clinic/Doctor Name]"#;

const URGENT_GUIDANCE: &str = "This case was marked URGENT. In 'Next steps for the doctor', the FIRST item must say the case is urgent and give a concrete timeframe (e.g. within 24–48h).";

const DEFAULT_SPECIALTY: &str = "General Practice";
const DEFAULT_URGENCY: &str = "routine";

/// Specialties with extra prompt guidance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Specialty {
    Cardiology,
    Pediatrics,
    Psychiatry,
    Dermatology,
    Endocrinology,
}

impl Specialty {
    pub fn guidance(self) -> &'static str {
        match self {
            Self::Cardiology => "Emphasise cardiovascular risk, blood pressure control, medication adherence, and follow-up for ordered tests.",
            Self::Pediatrics => "Use caregiver-friendly wording, include red flags for parents, mention immunisation follow-up if relevant.",
            Self::Psychiatry => "Use an empathetic tone, mention safety/risk follow-up, keep language warm and stigma-free.",
            Self::Dermatology => "Include topical/medication instructions in Next steps; mention re-review if no improvement.",
            Self::Endocrinology => "Highlight metabolic/thyroid/adrenal/hormone labs and specify follow-up windows for results.",
        }
    }

    /// Looks up a specialty by its exact name; unknown names have no guidance.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "Cardiology" => Some(Self::Cardiology),
            "Pediatrics" => Some(Self::Pediatrics),
            "Psychiatry" => Some(Self::Psychiatry),
            "Dermatology" => Some(Self::Dermatology),
            "Endocrinology" => Some(Self::Endocrinology),
            _ => None,
        }
    }
}

/// Visit urgency exactly as entered by the doctor.
///
/// Any value is accepted and echoed into the user prompt. Only `urgent` and `emergency`, in
/// any case, add the urgent-first guidance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Urgency(String);

impl Urgency {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn is_urgent(&self) -> bool {
        matches!(self.0.to_lowercase().as_str(), "urgent" | "emergency")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Urgency {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

impl fmt::Display for Urgency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A validated visit, ready to be turned into prompts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Visit {
    patient_name: NonEmptyText,
    date_of_visit: NonEmptyText,
    notes: NonEmptyText,
    specialty: Option<String>,
    urgency: Option<Urgency>,
}

impl Visit {
    /// Validates and builds a visit.
    ///
    /// # Errors
    ///
    /// Returns a `ScribeError` if:
    /// - the patient name, date or notes are blank,
    /// - the date is not `YYYY-MM-DD`,
    /// - the notes exceed the accepted length.
    pub fn new(
        patient_name: &str,
        date_of_visit: &str,
        notes: &str,
        specialty: Option<&str>,
        urgency: Option<&str>,
    ) -> ScribeResult<Self> {
        let patient_name = NonEmptyText::new(patient_name)?;
        let date_of_visit = NonEmptyText::new(date_of_visit)?;
        validate_visit_date(date_of_visit.as_str())?;
        let notes = NonEmptyText::new(notes)?;
        validate_notes_length(notes.as_str())?;

        let specialty = specialty
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        let urgency = urgency.filter(|u| !u.is_empty()).map(Urgency::new);

        Ok(Self {
            patient_name,
            date_of_visit,
            notes,
            specialty,
            urgency,
        })
    }

    pub fn patient_name(&self) -> &str {
        self.patient_name.as_str()
    }

    pub fn date_of_visit(&self) -> &str {
        self.date_of_visit.as_str()
    }

    pub fn notes(&self) -> &str {
        self.notes.as_str()
    }

    pub fn specialty(&self) -> Option<&str> {
        self.specialty.as_deref()
    }

    pub fn urgency(&self) -> Option<&Urgency> {
        self.urgency.as_ref()
    }
}

/// Builds the system prompt: the base template plus specialty and urgency guidance.
pub fn build_system_prompt(specialty: Option<&str>, urgency: Option<&Urgency>) -> String {
    let mut extras = Vec::new();
    if let Some(specialty) = specialty.and_then(Specialty::from_name) {
        extras.push(specialty.guidance());
    }
    if urgency.is_some_and(Urgency::is_urgent) {
        extras.push(URGENT_GUIDANCE);
    }

    if extras.is_empty() {
        return BASE_SYSTEM_PROMPT.to_string();
    }
    format!("{}\n\n{}", BASE_SYSTEM_PROMPT, extras.join("\n\n"))
}

/// Builds the user prompt for a visit.
pub fn build_user_prompt(visit: &Visit) -> String {
    format!(
        "Patient Name: {}\nDate of Visit: {}\nSpecialty (if any): {}\nUrgency (if any): {}\n\n\
         Doctor's raw notes:\n{}\n\nFollow the required 3-section markdown format exactly.\n",
        visit.patient_name(),
        visit.date_of_visit(),
        visit.specialty().unwrap_or(DEFAULT_SPECIALTY),
        visit.urgency().map_or(DEFAULT_URGENCY, Urgency::as_str),
        visit.notes(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{EMAIL_HEADING, NEXT_STEPS_HEADING, SUMMARY_HEADING};
    use crate::ScribeError;

    fn visit(specialty: Option<&str>, urgency: Option<&str>) -> Visit {
        Visit::new("Holly Fortescue", "2025-10-31", "Low libido.", specialty, urgency).unwrap()
    }

    #[test]
    fn test_base_prompt_names_every_heading() {
        for heading in [SUMMARY_HEADING, NEXT_STEPS_HEADING, EMAIL_HEADING] {
            assert!(BASE_SYSTEM_PROMPT.contains(heading));
        }
        assert!(BASE_SYSTEM_PROMPT.contains("{patient_name}"));
    }

    #[test]
    fn test_system_prompt_without_extras_is_base() {
        assert_eq!(build_system_prompt(None, None), BASE_SYSTEM_PROMPT);
        assert_eq!(
            build_system_prompt(Some("Oncology"), Some(&Urgency::new("routine"))),
            BASE_SYSTEM_PROMPT
        );
    }

    #[test]
    fn test_system_prompt_appends_specialty_then_urgency() {
        let prompt = build_system_prompt(Some("Cardiology"), Some(&Urgency::new("Emergency")));
        let expected = format!(
            "{}\n\n{}\n\n{}",
            BASE_SYSTEM_PROMPT,
            Specialty::Cardiology.guidance(),
            URGENT_GUIDANCE
        );
        assert_eq!(prompt, expected);
    }

    #[test]
    fn test_user_prompt_defaults() {
        let prompt = build_user_prompt(&visit(None, None));
        assert!(prompt.starts_with("Patient Name: Holly Fortescue\nDate of Visit: 2025-10-31\n"));
        assert!(prompt.contains("Specialty (if any): General Practice\n"));
        assert!(prompt.contains("Urgency (if any): routine\n"));
        assert!(prompt.contains("Doctor's raw notes:\nLow libido.\n"));
        assert!(prompt.ends_with("Follow the required 3-section markdown format exactly.\n"));
    }

    #[test]
    fn test_user_prompt_with_specialty_and_urgency() {
        let prompt = build_user_prompt(&visit(Some("Dermatology"), Some("URGENT")));
        assert!(prompt.contains("Specialty (if any): Dermatology\n"));
        assert!(prompt.contains("Urgency (if any): URGENT\n"));
    }

    #[test]
    fn test_unknown_urgency_is_echoed_without_guidance() {
        let unknown = visit(None, Some("soon-ish"));
        assert!(build_user_prompt(&unknown).contains("Urgency (if any): soon-ish\n"));
        assert_eq!(build_system_prompt(None, unknown.urgency()), BASE_SYSTEM_PROMPT);

        let blank = visit(None, Some(""));
        assert!(build_user_prompt(&blank).contains("Urgency (if any): routine\n"));
    }

    #[test]
    fn test_visit_validation() {
        assert!(matches!(
            Visit::new("  ", "2025-10-31", "notes", None, None),
            Err(ScribeError::Text(_))
        ));
        assert!(matches!(
            Visit::new("Ana", "31/10/2025", "notes", None, None),
            Err(ScribeError::InvalidInput(_))
        ));
        assert!(Visit::new("Ana", "2025-10-31", "", None, None).is_err());
    }

    #[test]
    fn test_urgency_matching_ignores_case_only() {
        assert!("Emergency".parse::<Urgency>().unwrap().is_urgent());
        assert!(Urgency::new("URGENT").is_urgent());
        assert!(!Urgency::new("routine").is_urgent());
        assert!(!Urgency::new(" urgent ").is_urgent());
        assert_eq!(Urgency::new("later").to_string(), "later");
    }
}
