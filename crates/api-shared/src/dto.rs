//! Request and response bodies for the scribe REST API.

use scribe_core::{Consultation, ParsedEmail, SectionSet, VisitContext};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A completed model document plus the visit details used for fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ParseConsultationReq {
    pub text: String,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub visit_date: Option<String>,
}

impl ParseConsultationReq {
    pub fn context(&self) -> VisitContext {
        VisitContext::new(self.patient_name.clone(), self.visit_date.clone())
    }
}

/// Visit details for a streamed document, passed in the query string.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct StreamQuery {
    pub patient_name: Option<String>,
    pub visit_date: Option<String>,
}

impl From<StreamQuery> for VisitContext {
    fn from(query: StreamQuery) -> Self {
        VisitContext::new(query.patient_name, query.visit_date)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SectionsRes {
    pub summary: String,
    pub next_steps: String,
    pub email: String,
}

impl From<SectionSet> for SectionsRes {
    fn from(sections: SectionSet) -> Self {
        Self {
            summary: sections.summary,
            next_steps: sections.next_steps,
            email: sections.email,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EmailRes {
    pub has_email: bool,
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl From<ParsedEmail> for EmailRes {
    fn from(email: ParsedEmail) -> Self {
        Self {
            has_email: email.has_email,
            to: email.to,
            subject: email.subject,
            body: email.body,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ConsultationRes {
    /// Normalised markdown document.
    pub document: String,
    pub sections: SectionsRes,
    pub email: EmailRes,
    /// At most two sentences from the clinical summary.
    pub handover: String,
    pub tasks: Vec<String>,
}

impl From<Consultation> for ConsultationRes {
    fn from(consultation: Consultation) -> Self {
        Self {
            document: consultation.document.into_string(),
            sections: consultation.sections.into(),
            email: consultation.email.into(),
            handover: consultation.handover,
            tasks: consultation.tasks,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromptReq {
    pub patient_name: String,
    /// `YYYY-MM-DD`
    pub date_of_visit: String,
    pub notes: String,
    #[serde(default)]
    pub specialty: Option<String>,
    /// Free text; `urgent` or `emergency` add urgent-first guidance
    #[serde(default)]
    pub urgency: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromptRes {
    pub system_prompt: String,
    pub user_prompt: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribe_core::ConsultationService;

    #[test]
    fn test_parse_request_optional_fields_default() {
        let req: ParseConsultationReq = serde_json::from_str(r#"{"text":"hello"}"#).unwrap();
        assert_eq!(req.text, "hello");
        assert_eq!(req.context(), VisitContext::default());
    }

    #[test]
    fn test_consultation_response_from_pipeline() {
        let consultation = ConsultationService::new().process(
            "### Next steps for the doctor\n1. Order CBC",
            &VisitContext::default(),
        );
        let res = ConsultationRes::from(consultation);
        assert_eq!(res.tasks, vec!["Order CBC".to_string()]);
        assert!(res.sections.next_steps.starts_with("### Next steps"));

        let json = serde_json::to_value(&res).unwrap();
        assert_eq!(json["email"]["hasEmail"], serde_json::Value::Bool(false));
        assert!(json["sections"]["next_steps"].is_string());
    }
}
