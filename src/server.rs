use crate::app::AppContext;
use crate::error::PipelineError;
use crate::i18n::Language;
use crate::providers::ProviderId;
use crate::suggestion::{DialogueTurn, SuggestMode, SuggestRequest, Suggestions};
use crate::translation::TranslationRequest;
use anyhow::{Context, Result};
use axum::extract::{FromRequest, Request, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

/// Direction used when a translate request names no languages at all.
const DEFAULT_DIRECTION: &str = "ja-en";

type SharedContext = Arc<AppContext>;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl IntoResponse for PipelineError {
    fn into_response(self) -> Response {
        let status = match &self {
            PipelineError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            PipelineError::ProvidersExhausted { .. } => StatusCode::BAD_GATEWAY,
        };
        (
            status,
            Json(ErrorResponse {
                error: self.user_message(),
            }),
        )
            .into_response()
    }
}

/// JSON body extractor whose rejections use the same `{error}` body as
/// every other bad request.
#[derive(Debug)]
pub struct ApiJson<T>(pub T);

#[axum::async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = PipelineError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => Err(PipelineError::InvalidInput(rejection.body_text())),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TranslatePayload {
    #[serde(default)]
    pub text: String,
    pub src: Option<String>,
    pub dst: Option<String>,
    /// Legacy form, e.g. "ja-vi"
    pub direction: Option<String>,
}

impl TranslatePayload {
    fn into_request(self) -> Result<TranslationRequest, PipelineError> {
        match (self.src.as_deref(), self.dst.as_deref()) {
            (Some(src), Some(dst)) => {
                TranslationRequest::new(self.text, Language::from_code(src)?, Language::from_code(dst)?)
            }
            (None, None) => {
                let direction = self.direction.as_deref().unwrap_or(DEFAULT_DIRECTION);
                TranslationRequest::from_direction(self.text, direction)
            }
            _ => Err(PipelineError::InvalidInput(
                "Both src and dst are required".to_string(),
            )),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TranslateResponse {
    pub src: Language,
    pub dst: Language,
    pub dst_text: String,
    /// Same text under the key older clients read
    pub translated: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderId>,
}

#[derive(Debug, Deserialize)]
pub struct SuggestPayload {
    #[serde(default)]
    pub dialogue: Vec<DialogueTurn>,
    pub target_lang: String,
    pub n: Option<usize>,
    #[serde(default)]
    pub mode: SuggestMode,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExplainPayload {
    pub term: Option<String>,
    pub word: Option<String>,
    #[serde(rename = "maxLength")]
    pub max_length: Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ExplainResponse {
    pub explanation: String,
    pub definition: String,
}

impl ExplainResponse {
    fn new(text: String) -> Self {
        Self {
            explanation: text.clone(),
            definition: text,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct VersionResponse {
    pub service: String,
    pub version: String,
    pub git: String,
    pub started_at: String,
}

pub fn router(context: SharedContext) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/version", get(version))
        .route("/translate", post(translate))
        .route("/ja/translate", post(translate))
        .route("/suggest", post(suggest))
        .route("/ja/explain", post(explain))
        .with_state(context)
        .layer(TraceLayer::new_for_http())
}

pub async fn serve(context: AppContext, port: u16) -> Result<()> {
    let app = router(Arc::new(context));
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Listening on {}", addr);
    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub async fn readyz() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "ready": true }))
}

pub async fn version(State(context): State<SharedContext>) -> Json<VersionResponse> {
    let info = &context.version;
    Json(VersionResponse {
        service: info.service.clone(),
        version: info.version.to_string(),
        git: info.git.clone(),
        started_at: info.started_at.to_rfc3339(),
    })
}

pub async fn translate(
    State(context): State<SharedContext>,
    ApiJson(payload): ApiJson<TranslatePayload>,
) -> Result<Json<TranslateResponse>, PipelineError> {
    let request = payload.into_request()?;
    let translation = context.translator.translate(&request).await?;

    Ok(Json(TranslateResponse {
        src: request.source,
        dst: request.target,
        translated: translation.text.clone(),
        dst_text: translation.text,
        provider: translation.provider,
    }))
}

pub async fn suggest(
    State(context): State<SharedContext>,
    ApiJson(payload): ApiJson<SuggestPayload>,
) -> Result<Json<Suggestions>, PipelineError> {
    let target = Language::from_code(&payload.target_lang)?;
    let request = SuggestRequest::new(payload.dialogue, target, payload.n, payload.mode);

    Ok(Json(context.suggestions.suggest(&request).await))
}

pub async fn explain(
    State(context): State<SharedContext>,
    ApiJson(payload): ApiJson<ExplainPayload>,
) -> Result<Json<ExplainResponse>, (StatusCode, Json<ExplainResponse>)> {
    let term = payload
        .term
        .filter(|t| !t.trim().is_empty())
        .or(payload.word)
        .unwrap_or_default();

    match context.explainer.explain(&term, payload.max_length).await {
        Ok(text) => Ok(Json(ExplainResponse::new(text))),
        Err(err) => Err((
            StatusCode::BAD_REQUEST,
            Json(ExplainResponse::new(err.user_message())),
        )),
    }
}
