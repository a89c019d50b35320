use clap::{Parser, Subcommand};
use scribe_core::prompt::{build_system_prompt, build_user_prompt, Visit};
use scribe_core::sse::decode_all;
use scribe_core::{
    normalize, Consultation, ConsultationService, ScribeError, ScribeResult, VisitContext,
};
use std::io::Read;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "scribe")]
#[command(about = "Consultation scribe output pipeline CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the normalised form of a generated document
    Normalize {
        /// Input file (`-` for stdin)
        file: String,
    },
    /// Extract the email, handover and tasks from a generated document
    Parse {
        /// Input file (`-` for stdin)
        file: String,
        /// Treat the input as a recorded server-sent event stream
        #[arg(long)]
        sse: bool,
        /// Patient name used when the email has no greeting
        #[arg(long)]
        patient_name: Option<String>,
        /// Visit date used when the email has no subject
        #[arg(long)]
        visit_date: Option<String>,
        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the system and user prompts for a visit
    Prompt {
        /// Patient name
        #[arg(long)]
        patient_name: String,
        /// Date of visit (YYYY-MM-DD)
        #[arg(long)]
        date_of_visit: String,
        /// File holding the doctor's raw notes (`-` for stdin)
        #[arg(long)]
        notes: String,
        /// Specialty (optional)
        #[arg(long)]
        specialty: Option<String>,
        /// Urgency; `urgent` or `emergency` add urgent-first guidance (optional)
        #[arg(long)]
        urgency: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("scribe=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let service = ConsultationService::new();

    match cli.command {
        Some(Commands::Normalize { file }) => {
            let raw = read_input(&file)?;
            println!("{}", normalize(&raw));
        }
        Some(Commands::Parse {
            file,
            sse,
            patient_name,
            visit_date,
            json,
        }) => {
            let raw = read_input(&file)?;
            let context = VisitContext::new(patient_name, visit_date);
            let consultation = if sse {
                service.process_events(decode_all(&raw), &context)?
            } else {
                service.process(&raw, &context)
            };

            if json {
                let out =
                    serde_json::to_string_pretty(&consultation).map_err(ScribeError::Serialization)?;
                println!("{}", out);
            } else {
                print!("{}", render(&consultation));
            }
        }
        Some(Commands::Prompt {
            patient_name,
            date_of_visit,
            notes,
            specialty,
            urgency,
        }) => {
            let notes = read_input(&notes)?;
            let visit = Visit::new(
                &patient_name,
                &date_of_visit,
                &notes,
                specialty.as_deref(),
                urgency.as_deref(),
            )?;
            println!("{}", build_system_prompt(visit.specialty(), visit.urgency()));
            println!();
            print!("{}", build_user_prompt(&visit));
        }
        None => {
            println!("Use 'scribe --help' for commands");
        }
    }

    Ok(())
}

/// Reads a whole input file, or stdin for `-`.
fn read_input(path: &str) -> ScribeResult<String> {
    if path == "-" {
        let mut buf = String::new();
        std::io::stdin()
            .read_to_string(&mut buf)
            .map_err(ScribeError::FileRead)?;
        return Ok(buf);
    }
    std::fs::read_to_string(path).map_err(ScribeError::FileRead)
}

fn render(consultation: &Consultation) -> String {
    let mut out = String::new();

    out.push_str("Handover:\n");
    if consultation.handover.is_empty() {
        out.push_str("  (none)\n");
    } else {
        out.push_str(&format!("  {}\n", consultation.handover));
    }

    out.push_str("\nTasks:\n");
    if consultation.tasks.is_empty() {
        out.push_str("  (none)\n");
    }
    for (i, task) in consultation.tasks.iter().enumerate() {
        out.push_str(&format!("  {}. {}\n", i + 1, task));
    }

    out.push_str("\nEmail:\n");
    let email = &consultation.email;
    if !email.has_email {
        out.push_str("  (none)\n");
        return out;
    }
    out.push_str(&format!("  To: {}\n", email.to));
    out.push_str(&format!("  Subject: {}\n\n", email.subject));
    for line in email.body.lines() {
        if line.is_empty() {
            out.push('\n');
        } else {
            out.push_str(&format!("  {}\n", line));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_read_input_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "### Next steps for the doctor\n1. Order CBC").unwrap();
        let raw = read_input(file.path().to_str().unwrap()).unwrap();
        assert!(raw.ends_with("Order CBC"));
    }

    #[test]
    fn test_read_input_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.md");
        assert!(matches!(
            read_input(missing.to_str().unwrap()),
            Err(ScribeError::FileRead(_))
        ));
    }

    #[test]
    fn test_render_lists_tasks_and_email() {
        let consultation = ConsultationService::new().process(
            "### Next steps for the doctor\n1. Order CBC\n\
             ### Draft of email to patient in patient-friendly language\n\
             To: ana@example.com\nSubject: Results\n\nDear Ana,\n\nAll fine.",
            &VisitContext::default(),
        );
        let text = render(&consultation);
        assert!(text.contains("Handover:\n  (none)\n"));
        assert!(text.contains("Tasks:\n  1. Order CBC\n"));
        assert!(text.contains("  To: ana@example.com\n"));
        assert!(text.contains("  Subject: Results\n"));
        assert!(text.contains("  Dear Ana,\n\n  All fine.\n"));
    }

    #[test]
    fn test_cli_parses_parse_flags() {
        let cli = Cli::try_parse_from([
            "scribe",
            "parse",
            "out.sse",
            "--sse",
            "--patient-name",
            "Ana",
            "--json",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Parse {
                file,
                sse,
                patient_name,
                visit_date,
                json,
            }) => {
                assert_eq!(file, "out.sse");
                assert!(sse && json);
                assert_eq!(patient_name.as_deref(), Some("Ana"));
                assert!(visit_date.is_none());
            }
            _ => panic!("expected parse command"),
        }
    }

    #[test]
    fn test_cli_parses_urgency() {
        let cli = Cli::try_parse_from([
            "scribe",
            "prompt",
            "--patient-name",
            "Ana",
            "--date-of-visit",
            "2025-11-01",
            "--notes",
            "-",
            "--urgency",
            "emergency",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Prompt { urgency, .. }) => {
                assert_eq!(urgency.as_deref(), Some("emergency"));
            }
            _ => panic!("expected prompt command"),
        }
    }
}
