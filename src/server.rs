//! Web surface: a small axum app serving the upload page and `POST /review`.
//!
//! - `GET  /`        embedded HTML page
//! - `GET  /health`  `{status, version}`
//! - `POST /review`  multipart or url-encoded form, answers with a JSON
//!   [`WebPayload`]
//!
//! Requests are independent; the only shared state is the read-only
//! [`ReviewDefaults`] and the completion client, both behind an `Arc`.
//! Every failure is reported as a non-2xx JSON body `{error, kind}` whose
//! status comes from [`ReviewError::http_status`].

use crate::config::{ReviewConfig, ReviewDefaults};
use crate::error::ReviewError;
use crate::output::{format_report, OutputPayload, Surface, WebPayload};
use crate::pipeline::input::{is_url, ContentKind, PaperSource, RawDocument, ResolveOptions};
use crate::pipeline::llm::CompletionClient;
use crate::review::{review_document, review_with_stdin};
use axum::extract::multipart::MultipartError;
use axum::extract::{DefaultBodyLimit, FromRequest, Multipart, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum::Form;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

/// Default request body limit for uploads.
pub const DEFAULT_MAX_UPLOAD_MB: usize = 32;

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Read-only state shared by every request.
#[derive(Clone)]
pub struct AppState {
    pub defaults: ReviewDefaults,
    pub client: Arc<dyn CompletionClient>,
}

/// Build the application router.
pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/review", post(review_paper))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(CorsLayer::permissive())
        .with_state(Arc::new(state))
}

// ── Error body ───────────────────────────────────────────────────────────

/// JSON error body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
    pub kind: String,
}

/// A failed request: status plus `{error, kind}` body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl From<ReviewError> for ApiError {
    fn from(e: ReviewError) -> Self {
        Self {
            status: StatusCode::from_u16(e.http_status())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            body: ErrorBody {
                error: e.to_string(),
                kind: e.kind().to_string(),
            },
        }
    }
}

impl ApiError {
    /// A request the handler could not even read as a form.
    fn bad_request(status: StatusCode, error: String) -> Self {
        Self {
            status,
            body: ErrorBody {
                error,
                kind: "bad_request".to_string(),
            },
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        Self::bad_request(e.status(), format!("invalid multipart body: {}", e.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

// ── Handlers ─────────────────────────────────────────────────────────────

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn review_paper(
    State(state): State<Arc<AppState>>,
    request: Request,
) -> Result<Json<WebPayload>, ApiError> {
    let form = ReviewForm::read(request).await?;
    let config = form.review_config(&state.defaults)?;
    let kind_override = form.kind_override()?;

    let run = match form.upload {
        Some(upload) => {
            if upload.bytes.is_empty() {
                return Err(ReviewError::EmptyContent {
                    origin: upload.file_name.unwrap_or_else(|| "uploaded-file".into()),
                }
                .into());
            }
            let mut raw = RawDocument::from_upload(
                upload.file_name.as_deref(),
                upload.content_type.as_deref(),
                upload.bytes,
            );
            if let Some(kind) = kind_override {
                raw.kind = kind;
            }
            info!("Review request for upload {} ({} bytes)", raw.origin, raw.bytes.len());
            review_document(raw, &config, state.client.as_ref()).await
        }
        None => {
            let url = form.paper_url.ok_or_else(|| {
                ReviewError::Config("provide a file upload or a paper_url".into())
            })?;
            if !is_url(&url) {
                return Err(ReviewError::Config(format!(
                    "paper_url must be an http(s) URL, got '{url}'"
                ))
                .into());
            }
            info!("Review request for URL {}", url);
            let options = ResolveOptions {
                kind_override,
                download_timeout_secs: config.download_timeout_secs,
            };
            review_with_stdin(
                &PaperSource::RemoteUrl(url),
                &options,
                &config,
                state.client.as_ref(),
                tokio::io::empty(),
            )
            .await
        }
    }
    .inspect_err(|e| warn!("Review failed ({}): {}", e.kind(), e))?;

    let payload = match format_report(&run.result, Surface::Web) {
        OutputPayload::Web(payload) => payload,
        OutputPayload::Text(text) => WebPayload {
            text,
            model: run.result.model.clone(),
            created_at: run.result.created_at,
            usage: run.result.usage,
            paper: None,
        },
    };
    Ok(Json(payload.with_paper(run.paper)))
}

// ── Form parsing ─────────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct Upload {
    file_name: Option<String>,
    content_type: Option<String>,
    bytes: Vec<u8>,
}

/// Fields of `POST /review`. Blank text fields count as absent.
#[derive(Debug, Default)]
struct ReviewForm {
    upload: Option<Upload>,
    paper_url: Option<String>,
    domain: Option<String>,
    language: Option<String>,
    tone: Option<String>,
    model: Option<String>,
    api_key: Option<String>,
    base_url: Option<String>,
    temperature: Option<String>,
    paper_type: Option<String>,
}

impl ReviewForm {
    /// Read the form from a `multipart/form-data` or
    /// `application/x-www-form-urlencoded` body.
    async fn read(request: Request) -> Result<Self, ApiError> {
        let content_type = request
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_lowercase();

        if content_type.starts_with("multipart/form-data") {
            let multipart = Multipart::from_request(request, &())
                .await
                .map_err(|e| ApiError::bad_request(e.status(), e.body_text()))?;
            Self::from_multipart(multipart).await
        } else if content_type.starts_with("application/x-www-form-urlencoded") {
            let Form(fields) = Form::<HashMap<String, String>>::from_request(request, &())
                .await
                .map_err(|e| ApiError::bad_request(e.status(), e.body_text()))?;
            let mut form = ReviewForm::default();
            for (name, value) in fields {
                form.set_text(&name, value);
            }
            Ok(form)
        } else {
            Err(ApiError::bad_request(
                StatusCode::UNSUPPORTED_MEDIA_TYPE,
                format!(
                    "expected multipart/form-data or application/x-www-form-urlencoded, got '{content_type}'"
                ),
            ))
        }
    }

    async fn from_multipart(mut multipart: Multipart) -> Result<Self, ApiError> {
        let mut form = ReviewForm::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            match name.as_str() {
                "file" => {
                    let file_name = field.file_name().map(str::to_string);
                    let content_type = field.content_type().map(str::to_string);
                    let bytes = field.bytes().await?.to_vec();
                    // Browsers send an empty part when no file was picked.
                    if file_name.as_deref().unwrap_or_default().is_empty() && bytes.is_empty() {
                        continue;
                    }
                    form.upload = Some(Upload {
                        file_name,
                        content_type,
                        bytes,
                    });
                }
                _ => {
                    let value = field.text().await?;
                    form.set_text(&name, value);
                }
            }
        }
        Ok(form)
    }

    /// Store a text field; blank values count as absent.
    fn set_text(&mut self, name: &str, value: String) {
        let value = value.trim();
        let value = (!value.is_empty()).then(|| value.to_string());
        let slot = match name {
            "paper_url" => &mut self.paper_url,
            "domain" => &mut self.domain,
            "language" => &mut self.language,
            "tone" => &mut self.tone,
            "model" => &mut self.model,
            "api_key" => &mut self.api_key,
            "base_url" => &mut self.base_url,
            "temperature" => &mut self.temperature,
            "paper_type" => &mut self.paper_type,
            other => {
                warn!("Ignoring unknown form field '{}'", other);
                return;
            }
        };
        *slot = value;
    }

    fn review_config(&self, defaults: &ReviewDefaults) -> Result<ReviewConfig, ReviewError> {
        let mut builder = ReviewConfig::builder();
        if let Some(ref v) = self.domain {
            builder = builder.domain(v);
        }
        if let Some(ref v) = self.language {
            builder = builder.language(v);
        }
        if let Some(ref v) = self.tone {
            builder = builder.tone(v);
        }
        if let Some(ref v) = self.model {
            builder = builder.model(v);
        }
        if let Some(ref v) = self.api_key {
            builder = builder.api_key(v);
        }
        if let Some(ref v) = self.base_url {
            builder = builder.base_url(v);
        }
        if let Some(ref v) = self.temperature {
            let t: f32 = v.parse().map_err(|_| {
                ReviewError::Config(format!("temperature must be a number, got '{v}'"))
            })?;
            builder = builder.temperature(t);
        }
        builder.defaults(defaults).build()
    }

    fn kind_override(&self) -> Result<Option<ContentKind>, ReviewError> {
        self.paper_type.as_deref().map(str::parse).transpose()
    }
}
