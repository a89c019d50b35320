//! # API REST
//!
//! REST API implementation for the consultation scribe.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, body limits)
//!
//! Uses `api-shared` for request/response types and `scribe-core` for the pipeline.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{DefaultBodyLimit, Query, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use tokio::sync::mpsc;
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    ConsultationRes, EmailRes, HealthRes, HealthService, ParseConsultationReq, PromptReq,
    PromptRes, SectionsRes, StreamQuery,
};
use scribe_core::prompt::{build_system_prompt, build_user_prompt, Visit};
use scribe_core::sse::{SseDecoder, SseEvent};
use scribe_core::{ConsultationService, ScribeError, ServiceConfig, VisitContext};

/// Capacity of the channel between the event decoder and the assembler.
const TRANSPORT_CHANNEL_CAPACITY: usize = 64;

/// Application state shared across REST API handlers
#[derive(Clone)]
struct AppState {
    service: ConsultationService,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, parse_consultation, stream_consultation, build_prompt),
    components(schemas(
        HealthRes,
        ParseConsultationReq,
        ConsultationRes,
        SectionsRes,
        EmailRes,
        PromptReq,
        PromptRes,
    ))
)]
struct ApiDoc;

/// Builds the REST router.
///
/// Request bodies are capped at `cfg.max_body_bytes()`; larger bodies are rejected with
/// `413 Payload Too Large`.
pub fn router(cfg: &ServiceConfig) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/consultations/parse", post(parse_consultation))
        .route("/consultations/stream", post(stream_consultation))
        .route("/consultations/prompt", post(build_prompt))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(DefaultBodyLimit::max(cfg.max_body_bytes()))
        .layer(CorsLayer::permissive())
        .with_state(AppState {
            service: ConsultationService::new(),
        })
}

/// Maps a core error onto an HTTP status and a short, content-free message.
fn error_response(err: ScribeError) -> (StatusCode, &'static str) {
    match err {
        ScribeError::InvalidInput(_) | ScribeError::Text(_) => {
            tracing::info!("Rejected request: {}", err);
            (StatusCode::BAD_REQUEST, "Invalid input")
        }
        ScribeError::Transport(_) | ScribeError::AssemblyAborted => {
            tracing::warn!("Upstream stream failed: {}", err);
            (StatusCode::BAD_GATEWAY, "Upstream stream failed")
        }
        _ => {
            tracing::error!("Internal error: {:?}", err);
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error")
        }
    }
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks.
async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/consultations/parse",
    request_body = ParseConsultationReq,
    responses(
        (status = 200, description = "Structured consultation", body = ConsultationRes),
        (status = 400, description = "Bad request"),
        (status = 413, description = "Payload too large")
    )
)]
/// Normalise a completed document and extract its structured records
///
/// Malformed or partial documents are not an error: missing sections come back empty.
#[axum::debug_handler]
async fn parse_consultation(
    State(state): State<AppState>,
    Json(req): Json<ParseConsultationReq>,
) -> Json<ConsultationRes> {
    let context = req.context();
    let consultation = state.service.process(&req.text, &context);
    Json(consultation.into())
}

#[utoipa::path(
    post,
    path = "/consultations/stream",
    params(StreamQuery),
    request_body(content = String, content_type = "text/event-stream"),
    responses(
        (status = 200, description = "Structured consultation", body = ConsultationRes),
        (status = 413, description = "Payload too large"),
        (status = 502, description = "The event stream reported a failure")
    )
)]
/// Assemble a recorded server-sent event stream and extract its structured records
///
/// The body is the raw `text/event-stream` produced by the generation endpoint. Events are
/// fed to the assembler in order; assembly stops at the `[DONE]` sentinel or at the end of the
/// body. An `error` event aborts the attempt.
#[axum::debug_handler]
async fn stream_consultation(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
    body: String,
) -> Result<Json<ConsultationRes>, (StatusCode, &'static str)> {
    let context = VisitContext::from(query);
    let (tx, rx) = mpsc::channel(TRANSPORT_CHANNEL_CAPACITY);

    tokio::spawn(async move {
        let mut decoder = SseDecoder::new();
        let events = decoder.feed(&body).into_iter().chain(decoder.finish());
        for event in events.map(SseEvent::into_transport_event) {
            // The assembler hangs up once the sentinel arrives.
            if tx.send(event).await.is_err() {
                break;
            }
        }
    });

    match state.service.process_stream(rx, &context).await {
        Ok(consultation) => Ok(Json(consultation.into())),
        Err(e) => Err(error_response(e)),
    }
}

#[utoipa::path(
    post,
    path = "/consultations/prompt",
    request_body = PromptReq,
    responses(
        (status = 200, description = "System and user prompts", body = PromptRes),
        (status = 400, description = "Bad request")
    )
)]
/// Build the model prompts for a visit
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - the patient name, date or notes are blank,
/// - the date is not `YYYY-MM-DD`,
/// - the notes are too long.
#[axum::debug_handler]
async fn build_prompt(
    Json(req): Json<PromptReq>,
) -> Result<Json<PromptRes>, (StatusCode, &'static str)> {
    let visit = Visit::new(
        &req.patient_name,
        &req.date_of_visit,
        &req.notes,
        req.specialty.as_deref(),
        req.urgency.as_deref(),
    )
    .map_err(error_response)?;

    Ok(Json(PromptRes {
        system_prompt: build_system_prompt(visit.specialty(), visit.urgency()),
        user_prompt: build_user_prompt(&visit),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request};
    use http_body_util::BodyExt;
    use scribe_core::constants::{EMAIL_HEADING, NEXT_STEPS_HEADING, SUMMARY_HEADING};
    use serde::de::DeserializeOwned;
    use tower::ServiceExt;

    fn app() -> Router {
        router(&ServiceConfig::default())
    }

    async fn read_json<T: DeserializeOwned>(response: axum::response::Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn json_request(uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn sse_request(uri: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "text/event-stream")
            .body(Body::from(body))
            .unwrap()
    }

    fn sse_body(pieces: &[&str]) -> String {
        pieces.iter().map(|p| format!("data: {}\n\n", p)).collect()
    }

    #[tokio::test]
    async fn test_health() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let res: HealthRes = read_json(response).await;
        assert!(res.ok);
    }

    #[tokio::test]
    async fn test_parse_consultation() {
        let text = format!(
            "{SUMMARY_HEADING}**Clinical summary:** Patient improving. No red flags. Continue.\
             {NEXT_STEPS_HEADING}1. Order CBC 2. Follow up in 2 weeks\
             {EMAIL_HEADING}To: jane@example.com Subject: Hi Dear Jane, see you soon."
        );
        let response = app()
            .oneshot(json_request(
                "/consultations/parse",
                serde_json::json!({ "text": text, "patient_name": "Jane" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let res: ConsultationRes = read_json(response).await;
        assert_eq!(res.tasks, vec!["Order CBC", "Follow up in 2 weeks"]);
        assert_eq!(res.handover, "Patient improving. No red flags.");
        assert!(res.email.has_email);
        assert_eq!(res.email.to, "jane@example.com");
        assert_eq!(res.email.subject, "Hi");
        assert!(res.email.body.starts_with("Dear Jane,"));
    }

    #[tokio::test]
    async fn test_parse_empty_text_is_not_an_error() {
        let response = app()
            .oneshot(json_request(
                "/consultations/parse",
                serde_json::json!({ "text": "" }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let res: ConsultationRes = read_json(response).await;
        assert_eq!(res, ConsultationRes::default());
    }

    #[tokio::test]
    async fn test_stream_consultation_stops_at_sentinel() {
        let body = sse_body(&[
            NEXT_STEPS_HEADING,
            "1. Order CBC",
            "[DONE]",
            "2. Never assembled",
        ]);
        let response = app()
            .oneshot(sse_request(
                "/consultations/stream?patient_name=Ana&visit_date=2025-11-01",
                body,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let res: ConsultationRes = read_json(response).await;
        assert_eq!(res.tasks, vec!["Order CBC"]);
        assert!(!res.document.contains("Never assembled"));
    }

    #[tokio::test]
    async fn test_stream_error_event_is_bad_gateway() {
        let body = format!(
            "{}event: error\ndata: upstream timeout\n\n",
            sse_body(&[SUMMARY_HEADING])
        );
        let response = app()
            .oneshot(sse_request("/consultations/stream", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn test_prompt_builds_both_prompts() {
        let response = app()
            .oneshot(json_request(
                "/consultations/prompt",
                serde_json::json!({
                    "patient_name": "Holly",
                    "date_of_visit": "2025-10-31",
                    "notes": "Low libido.",
                    "specialty": "Endocrinology",
                    "urgency": "urgent"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let res: PromptRes = read_json(response).await;
        assert!(res.system_prompt.contains("marked URGENT"));
        assert!(res.user_prompt.contains("Specialty (if any): Endocrinology"));
    }

    #[tokio::test]
    async fn test_prompt_echoes_unknown_urgency() {
        let response = app()
            .oneshot(json_request(
                "/consultations/prompt",
                serde_json::json!({
                    "patient_name": "Holly",
                    "date_of_visit": "2025-10-31",
                    "notes": "Low libido.",
                    "urgency": "later"
                }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let res: PromptRes = read_json(response).await;
        assert!(!res.system_prompt.contains("marked URGENT"));
        assert!(res.user_prompt.contains("Urgency (if any): later\n"));
    }

    #[tokio::test]
    async fn test_prompt_rejects_bad_input() {
        for body in [
            serde_json::json!({ "patient_name": "Holly", "date_of_visit": "31/10/2025", "notes": "x" }),
            serde_json::json!({ "patient_name": " ", "date_of_visit": "2025-10-31", "notes": "x" }),
        ] {
            let response = app()
                .oneshot(json_request("/consultations/prompt", body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_body_limit_rejects_large_payload() {
        let cfg = ServiceConfig::new(([127, 0, 0, 1], 0).into(), 64).unwrap();
        let text = "a".repeat(1024);
        let response = router(&cfg)
            .oneshot(json_request(
                "/consultations/parse",
                serde_json::json!({ "text": text }),
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    }
}
