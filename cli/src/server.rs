use std::sync::{Arc, Mutex, MutexGuard};

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Request, State},
    http::{HeaderValue, StatusCode, header},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::Serialize;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::{error, info, warn};

use stride_core::backup::BackupError;
use stride_core::models::{ImportCounts, Snapshot};
use stride_core::service::StrideService;

const BODY_LIMIT: usize = 50 * 1024 * 1024; // 50 MB

#[derive(Clone)]
struct AppState {
    svc: Arc<Mutex<StrideService>>,
    api_key: Option<String>,
}

impl AppState {
    fn service(&self) -> MutexGuard<'_, StrideService> {
        self.svc
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// --- Request / Response types ---

#[derive(Serialize)]
struct ExportResponse {
    success: bool,
    backup: Snapshot,
}

#[derive(Serialize)]
struct ImportResponse {
    success: bool,
    message: &'static str,
    imported: ImportCounts,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

// --- Error handling ---

enum ApiError {
    NotFound(String),
    BadRequest(String),
    /// Logged in full; only the public message reaches the client.
    Internal(&'static str, anyhow::Error),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            Self::Internal(public, err) => {
                error!("{public}: {err:#}");
                (StatusCode::INTERNAL_SERVER_ERROR, public.to_string())
            }
        };
        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal("Internal server error", err)
    }
}

impl ApiError {
    fn from_backup(err: BackupError, failure: &'static str) -> Self {
        match err {
            BackupError::InvalidFormat(detail) => {
                warn!(%detail, "rejected backup");
                Self::BadRequest("Invalid backup format".to_string())
            }
            BackupError::UserNotFound(user) => Self::NotFound(format!("User not found: {user}")),
            BackupError::Persistence(err) => Self::Internal(failure, err),
        }
    }
}

// --- Middleware ---

async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if let Some(ref expected_key) = state.api_key {
        let authorized = request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .is_some_and(|token| token == expected_key);

        if !authorized {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse {
                    error: "Invalid or missing API key".to_string(),
                }),
            )
                .into_response();
        }
    }
    next.run(request).await
}

async fn security_headers(request: Request, next: Next) -> Response {
    let mut response = next.run(request).await;
    let headers = response.headers_mut();
    headers.insert(
        "x-content-type-options",
        HeaderValue::from_static("nosniff"),
    );
    headers.insert("x-frame-options", HeaderValue::from_static("DENY"));
    headers.insert(
        "content-security-policy",
        HeaderValue::from_static("default-src 'none'"),
    );
    response
}

// --- Backup handlers ---

async fn export_backup(State(state): State<AppState>) -> Result<Json<ExportResponse>, ApiError> {
    let backup = state
        .service()
        .export_backup()
        .map_err(|e| ApiError::from_backup(e, "Failed to export backup"))?;
    Ok(Json(ExportResponse {
        success: true,
        backup,
    }))
}

/// The body is parsed by hand so malformed JSON maps to the same 400 as a
/// missing version marker.
async fn import_backup(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ImportResponse>, ApiError> {
    let raw = std::str::from_utf8(&body)
        .map_err(|_| ApiError::BadRequest("Invalid backup format".to_string()))?;
    let imported = state
        .service()
        .import_backup_json(raw)
        .map_err(|e| ApiError::from_backup(e, "Failed to import backup"))?;
    Ok(Json(ImportResponse {
        success: true,
        message: "Backup imported successfully",
        imported,
    }))
}

fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/backup/export", get(export_backup))
        .route("/api/backup/import", post(import_backup))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(middleware::from_fn(security_headers))
        .with_state(state)
}

// --- Server startup ---

/// First and last four characters of the key; short keys are hidden entirely.
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() < 12 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{head}...{tail}")
}

pub async fn start_server(
    svc: StrideService,
    port: u16,
    bind: &str,
    api_key: Option<String>,
    new_api_key: bool,
) -> anyhow::Result<()> {
    let user_id = svc.user_id().to_string();
    let state = AppState {
        svc: Arc::new(Mutex::new(svc)),
        api_key: api_key.clone(),
    };

    let app = build_router(state);

    match api_key {
        Some(ref key) if new_api_key => {
            eprintln!("Generated new API key: {key}");
            eprintln!("Include in requests: Authorization: Bearer {key}");
        }
        Some(ref key) => {
            eprintln!(
                "API key: {} (see api_key file in data directory)",
                mask_key(key)
            );
        }
        None => {
            warn!("authentication disabled (--no-auth), API is open to anyone");
        }
    }

    if bind != "127.0.0.1" && bind != "localhost" && api_key.is_none() {
        warn!(
            bind,
            "listening with no authentication, any device on your network can access this API"
        );
    }

    let listener = tokio::net::TcpListener::bind(format!("{bind}:{port}")).await?;
    info!(%user_id, "listening on http://{bind}:{port}");
    eprintln!("Listening on http://{bind}:{port}");
    axum::serve(listener, app).await?;

    Ok(())
}
