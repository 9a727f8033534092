//! The v1 API.
//!
//! | Method | Path | Body | Returns |
//! |--------|------|------|---------|
//! | POST | `/v1/chat` | [`ChatRequest`] | [`ChatReply`] |
//! | DELETE | `/v1/chat/history/{user_id}` | | [`ClearHistoryReport`] |
//! | POST | `/v1/quiz` | [`QuizRequest`] | [`Quiz`] |
//! | POST | `/v1/quiz/analysis` | [`QuizSubmission`] | [`QuizAnalysis`] |
//! | GET | `/v1/insights/{user_id}` | | [`StudentInsights`] |
//!
//! Every pipeline call gets a cancellation token that fires if the client
//! disconnects and Axum drops the handler future.

use axum::{
    Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use academaide_core::error::Error;
use academaide_pipeline::{
    ChatReply, ChatRequest, ClearHistoryReport, Quiz, QuizAnalysis, QuizRequest, QuizSubmission,
    StudentInsights,
};

use crate::SharedState;

/// Status used when the client went away first. Nobody reads it.
const CLIENT_CLOSED_REQUEST: u16 = 499;

pub fn v1_router() -> Router<SharedState> {
    Router::new()
        .route("/chat", post(chat_handler))
        .route("/chat/history/{user_id}", delete(clear_history_handler))
        .route("/quiz", post(quiz_handler))
        .route("/quiz/analysis", post(quiz_analysis_handler))
        .route("/insights/{user_id}", get(insights_handler))
}

// ── Errors ────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Maps pipeline errors to HTTP. Only `NotFound` and bad input leak
/// detail; everything else is a generic 500.
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        match e {
            Error::NotFound(what) => Self {
                status: StatusCode::NOT_FOUND,
                message: format!("Not found: {what}"),
            },
            Error::Cancelled => Self {
                status: StatusCode::from_u16(CLIENT_CLOSED_REQUEST)
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message: "Request cancelled".into(),
            },
            other => {
                error!(error = %other, "Request failed");
                Self {
                    status: StatusCode::INTERNAL_SERVER_ERROR,
                    message: "Internal server error".into(),
                }
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorResponse { error: self.message })).into_response()
    }
}

/// A token cancelled when dropped, unless disarmed on completion.
fn request_token() -> (CancellationToken, tokio_util::sync::DropGuard) {
    let token = CancellationToken::new();
    let guard = token.clone().drop_guard();
    (token, guard)
}

// ── Handlers ──────────────────────────────────────────────────────────────

async fn chat_handler(
    State(state): State<SharedState>,
    Json(payload): Json<ChatRequest>,
) -> Result<Json<ChatReply>, ApiError> {
    if payload.user_id.trim().is_empty() {
        return Err(ApiError::bad_request("user_id is required"));
    }
    if payload.message.trim().is_empty() {
        return Err(ApiError::bad_request("message is required"));
    }
    info!(user_id = %payload.user_id, role = %payload.role, agent = %payload.agent_id, "v1/chat request");

    let (cancel, guard) = request_token();
    let reply = state.pipeline.chat(&payload, &cancel).await;
    guard.disarm();
    Ok(Json(reply?))
}

async fn clear_history_handler(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> (StatusCode, Json<ClearHistoryReport>) {
    let report = state.pipeline.clear_history(&user_id).await;
    let status = if report.is_complete() {
        StatusCode::OK
    } else {
        warn!(user_id = %user_id, "History clear incomplete");
        StatusCode::INTERNAL_SERVER_ERROR
    };
    (status, Json(report))
}

async fn quiz_handler(
    State(state): State<SharedState>,
    Json(payload): Json<QuizRequest>,
) -> Result<Json<Quiz>, ApiError> {
    if payload.course_id.trim().is_empty() {
        return Err(ApiError::bad_request("course_id is required"));
    }
    info!(course_id = %payload.course_id, unit = ?payload.unit, "v1/quiz request");

    let (cancel, guard) = request_token();
    let quiz = state.pipeline.quiz().generate(&payload, &cancel).await;
    guard.disarm();
    Ok(Json(quiz?))
}

async fn quiz_analysis_handler(
    State(state): State<SharedState>,
    Json(payload): Json<QuizSubmission>,
) -> Result<Json<QuizAnalysis>, ApiError> {
    info!(
        course_id = %payload.course_id,
        wrong = payload.wrong_questions.len(),
        "v1/quiz/analysis request"
    );

    let (cancel, guard) = request_token();
    let analysis = state.pipeline.quiz().analyze(&payload, &cancel).await;
    guard.disarm();
    Ok(Json(analysis?))
}

async fn insights_handler(
    State(state): State<SharedState>,
    Path(user_id): Path<String>,
) -> Result<Json<StudentInsights>, ApiError> {
    info!(user_id = %user_id, "v1/insights request");
    Ok(Json(state.pipeline.insights().student(&user_id).await?))
}

// ── Tests ─────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GatewayState, build_router};
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use std::sync::Arc;
    use tower::ServiceExt;

    use academaide_core::academic::{Identity, Role};
    use academaide_core::error::ProviderError;
    use academaide_core::provider::*;
    use academaide_pipeline::{ChatPipeline, Collaborators, PipelineSettings};
    use academaide_store::{
        InMemoryAcademicStore, InMemoryConversationStore, InMemoryResponseCache, InMemoryVectorStore,
    };

    struct EchoGenerator;

    #[async_trait::async_trait]
    impl GenerationService for EchoGenerator {
        fn name(&self) -> &str {
            "echo_mock"
        }

        async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse, ProviderError> {
            let text = match request.format {
                OutputFormat::Json => r#"{"weak_areas":["Heaps"],"study_priorities":[{"topic":"Heaps","priority":"High","reason":"missed"}]}"#.into(),
                OutputFormat::Text => "Hello from the model.".into(),
            };
            Ok(GenerationResponse {
                text,
                model: request.model,
            })
        }
    }

    struct DownEmbedder;

    #[async_trait::async_trait]
    impl EmbeddingProvider for DownEmbedder {
        fn name(&self) -> &str {
            "down_mock"
        }

        async fn embed(&self, _request: EmbeddingRequest) -> Result<EmbeddingResponse, ProviderError> {
            Err(ProviderError::Network("unreachable".into()))
        }
    }

    fn app() -> Router {
        let records = InMemoryAcademicStore::new()
            .with_identity(Identity {
                id: "S1".into(),
                display_name: "Asha Rao".into(),
                role: Role::Student,
                organizational_unit: "CSE".into(),
                join_year: 2023,
            })
            .with_identity(Identity {
                id: "F1".into(),
                display_name: "Dr. Iyer".into(),
                role: Role::Faculty,
                organizational_unit: "MATH".into(),
                join_year: 2010,
            });
        let pipeline = ChatPipeline::new(
            Collaborators {
                records: Arc::new(records),
                vectors: Arc::new(InMemoryVectorStore::new()),
                conversations: Arc::new(InMemoryConversationStore::new()),
                cache: Arc::new(InMemoryResponseCache::new()),
                embedder: Arc::new(DownEmbedder),
                generator: Arc::new(EchoGenerator),
            },
            PipelineSettings::default(),
        );
        build_router(GatewayState::new(Arc::new(pipeline)))
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json<T: serde::de::DeserializeOwned>(response: Response) -> T {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint() {
        let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let health: crate::HealthResponse = body_json(response).await;
        assert_eq!(health.status, "ok");
    }

    #[tokio::test]
    async fn chat_returns_reply() {
        let req = json_request(
            "POST",
            "/v1/chat",
            serde_json::json!({"user_id": "S1", "role": "student", "message": "hello"}),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let reply: ChatReply = body_json(response).await;
        assert_eq!(reply.text, "Hello from the model.");
        assert!(!reply.cache_hit);
    }

    #[tokio::test]
    async fn teacher_role_resolves_to_faculty() {
        let req = json_request(
            "POST",
            "/v1/chat",
            serde_json::json!({"user_id": "F1", "role": "teacher", "message": "plan my lecture"}),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let reply: ChatReply = body_json(response).await;
        assert_eq!(reply.text, "Hello from the model.");
    }

    #[tokio::test]
    async fn unrecognised_role_falls_back_to_student() {
        let req = json_request(
            "POST",
            "/v1/chat",
            serde_json::json!({"user_id": "S1", "role": "admin", "message": "hello"}),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        // F1 exists only as faculty, so a student lookup misses.
        let req = json_request(
            "POST",
            "/v1/chat",
            serde_json::json!({"user_id": "F1", "role": "admin", "message": "hello"}),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_user_is_404() {
        let req = json_request(
            "POST",
            "/v1/chat",
            serde_json::json!({"user_id": "GHOST", "message": "hello"}),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let err: ErrorResponse = body_json(response).await;
        assert!(err.error.contains("GHOST"));
    }

    #[tokio::test]
    async fn empty_message_is_400() {
        let req = json_request(
            "POST",
            "/v1/chat",
            serde_json::json!({"user_id": "S1", "message": "   "}),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn clear_history_reports_both_steps() {
        let req = Request::builder()
            .method("DELETE")
            .uri("/v1/chat/history/S1")
            .body(Body::empty())
            .unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let report: serde_json::Value = body_json(response).await;
        assert_eq!(report["turns"]["status"], "done");
        assert_eq!(report["context"]["status"], "done");
    }

    #[tokio::test]
    async fn quiz_without_syllabus_is_404() {
        let req = json_request("POST", "/v1/quiz", serde_json::json!({"course_id": "CS101", "unit": 1}));
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn quiz_analysis_returns_priorities() {
        let req = json_request(
            "POST",
            "/v1/quiz/analysis",
            serde_json::json!({
                "course_id": "CS101",
                "wrong_questions": [{
                    "question_text": "What is a heap?",
                    "correct_answer": "A tree",
                    "user_answer": "A list",
                    "reference": "u1.pdf"
                }],
                "total_questions": 5,
                "score": 4
            }),
        );
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let analysis: QuizAnalysis = body_json(response).await;
        assert_eq!(analysis.study_priorities[0].priority, "High");
    }

    #[tokio::test]
    async fn insights_for_student() {
        let req = Request::builder().uri("/v1/insights/S1").body(Body::empty()).unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let insights: StudentInsights = body_json(response).await;
        assert!(insights.risks.is_empty());
        assert_eq!(insights.suggestions.len(), 1);
    }

    #[tokio::test]
    async fn insights_for_faculty_is_404() {
        let req = Request::builder().uri("/v1/insights/F1").body(Body::empty()).unwrap();
        let response = app().oneshot(req).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn internal_errors_are_generic() {
        let api: ApiError = Error::MalformedUpstreamResponse("secret detail".into()).into();
        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(!api.message.contains("secret"));

        let cancelled: ApiError = Error::Cancelled.into();
        assert_eq!(cancelled.status.as_u16(), 499);
    }
}
