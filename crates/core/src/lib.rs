//! # Scribe Core
//!
//! Core pipeline for turning generated consultation documents into structured records.
//!
//! The model's output arrives as a stream of text fragments and follows a three-section
//! markdown template only approximately. This crate:
//! - assembles fragments into one document (`stream`, `sse`)
//! - repairs formatting defects with an idempotent rewrite cascade (`normalize`)
//! - slices the document at its section headings (`sections`)
//! - extracts the patient email, handover summary and doctor tasks (`email`, `handover`,
//!   `tasks`)
//!
//! **No API concerns**: HTTP servers and CLI parsing belong in `api-rest` and `cli`.

pub mod config;
pub mod consultation;
pub mod constants;
pub mod email;
pub mod error;
pub mod handover;
pub mod normalize;
pub mod prompt;
pub mod sections;
pub mod sse;
pub mod stream;
pub mod tasks;
pub mod validation;

pub use config::ServiceConfig;
pub use consultation::{Consultation, ConsultationService, VisitContext};
pub use email::{parse_email, ParsedEmail};
pub use error::{ScribeError, ScribeResult};
pub use handover::extract_handover;
pub use normalize::{normalize, NormalizedDocument};
pub use sections::{split, SectionSet};
pub use stream::{assemble, assemble_events, AssembledText, StreamAssembler, TransportEvent};
pub use tasks::extract_tasks;
