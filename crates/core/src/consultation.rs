//! Consultation pipeline.
//!
//! Wires the stages together for one request: assemble the model output, normalise it, split
//! it into sections and run the three extractors. Each call builds its own assembler, so
//! nothing is shared between requests.

use crate::email::{parse_email, ParsedEmail};
use crate::handover::extract_handover;
use crate::normalize::{normalize, NormalizedDocument};
use crate::sections::{split, SectionSet};
use crate::stream::{assemble, assemble_events, assemble_fragments, TransportEvent};
use crate::tasks::extract_tasks;
use crate::ScribeResult;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;

/// Visit details used by the email fallbacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitContext {
    pub patient_name: Option<String>,
    pub visit_date: Option<String>,
}

impl VisitContext {
    pub fn new(patient_name: Option<String>, visit_date: Option<String>) -> Self {
        Self {
            patient_name,
            visit_date,
        }
    }
}

/// Everything derived from one consultation document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Consultation {
    pub document: NormalizedDocument,
    pub sections: SectionSet,
    pub email: ParsedEmail,
    pub handover: String,
    pub tasks: Vec<String>,
}

/// Service running the normalisation, segmentation and extraction pipeline.
#[derive(Clone, Debug, Default)]
pub struct ConsultationService;

impl ConsultationService {
    pub fn new() -> Self {
        Self
    }

    /// Runs the pipeline over a completed document.
    ///
    /// Never fails: missing or duplicated structure yields partial output.
    pub fn process(&self, text: &str, context: &VisitContext) -> Consultation {
        let document = normalize(text);
        let sections = split(document.as_str());

        let email = parse_email(
            &sections.email,
            context.patient_name.as_deref(),
            context.visit_date.as_deref(),
        );
        let handover = extract_handover(&sections.summary);
        let tasks = extract_tasks(&sections.next_steps);

        tracing::info!(
            has_email = email.has_email,
            tasks = tasks.len(),
            has_handover = !handover.is_empty(),
            "consultation processed"
        );

        Consultation {
            document,
            sections,
            email,
            handover,
            tasks,
        }
    }

    /// Assembles fragments delivered synchronously and runs the pipeline.
    pub fn process_fragments<I, S>(&self, fragments: I, context: &VisitContext) -> Consultation
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let text = assemble_fragments(fragments);
        self.process(text.as_str(), context)
    }

    /// Assembles a recorded sequence of transport events and runs the pipeline.
    ///
    /// # Errors
    ///
    /// Returns `ScribeError::Transport` if a failure event arrives before the document
    /// completes.
    pub fn process_events<I>(&self, events: I, context: &VisitContext) -> ScribeResult<Consultation>
    where
        I: IntoIterator<Item = TransportEvent>,
    {
        let text = assemble_events(events)?;
        Ok(self.process(text.as_str(), context))
    }

    /// Assembles fragments from a transport channel and runs the pipeline.
    ///
    /// # Arguments
    ///
    /// * `events` - Receiving end of the transport channel. Closing every sender ends the
    ///   stream.
    /// * `context` - Visit details for the email fallbacks.
    ///
    /// # Errors
    ///
    /// Returns `ScribeError::Transport` if the transport reports a failure before the document
    /// completes. The pipeline does not run for that attempt.
    pub async fn process_stream(
        &self,
        events: mpsc::Receiver<TransportEvent>,
        context: &VisitContext,
    ) -> ScribeResult<Consultation> {
        let text = assemble(events).await?;
        Ok(self.process(text.as_str(), context))
    }
}
