//! HTTP server for saving and loading training samples.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `POST` | `/api/training-data` | Save one sample, returns `{"success": true, "file": ...}` |
//! | `GET`  | `/api/training-data/load` | All landmark payloads grouped by gesture label |
//! | `OPTIONS` | any | CORS preflight, empty 200 |
//! | `GET`  | any other | Static front-end assets |
//!
//! Anything else under `/api/` is a 404 with an empty body.
//!
//! # Error Contract
//!
//! ```json
//! { "error": "invalid sample: gesture must be a string, got a number" }
//! ```
//!
//! Bad input (unparseable body, wrong field types, unsafe names) is `422`;
//! filesystem failures are `500`.
//!
//! # CORS
//!
//! Every response carries `Access-Control-Allow-Origin: *` so a front-end
//! served from another origin (or from `file://`) can call the API.

use axum::{
    body::{Body, Bytes},
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{any, get, get_service, post, MethodRouter},
    Json, Router,
};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::config::Config;
use crate::error::StoreError;
use crate::models::{SampleEnvelope, SaveResponse, TrainingSet};
use crate::store::SampleStore;

const ALLOWED_METHODS: &str = "POST, GET, OPTIONS";
const ALLOWED_HEADERS: &str = "Content-Type";

/// Shared application state passed to all route handlers via Axum's `State` extractor.
#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    store: Arc<SampleStore>,
}

/// Starts the sample store server.
///
/// Creates the training-data root, binds the first free port starting at
/// `[server].port`, prints the startup banner to stdout and serves until
/// Ctrl-C.
pub async fn run_server(config: &Config) -> anyhow::Result<()> {
    let store = SampleStore::new(config.storage.data_dir.clone());
    store.ensure_root()?;

    let listener = bind_with_retry(
        &config.server.host,
        config.server.port,
        config.server.port_attempts,
    )
    .await?;
    let addr = listener.local_addr()?;

    let data_dir =
        std::fs::canonicalize(store.root()).unwrap_or_else(|_| store.root().to_path_buf());
    println!("Server running at http://localhost:{}/", addr.port());
    println!("Training data directory: {}", data_dir.display());
    println!("Ready for connections...");
    std::io::stdout().flush()?;

    serve(listener, config.clone()).await
}

/// Serves requests on an already bound listener until Ctrl-C.
pub async fn serve(listener: TcpListener, config: Config) -> anyhow::Result<()> {
    let app = router(Arc::new(config))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    info!("server stopped");
    Ok(())
}

/// Builds the application router.
pub fn router(config: Arc<Config>) -> anyhow::Result<Router> {
    let static_dir = config.static_dir()?;
    info!(static_dir = %static_dir.display(), "serving static assets");

    let state = AppState {
        store: Arc::new(SampleStore::new(config.storage.data_dir.clone())),
        config,
    };

    // Only adds `Access-Control-Allow-Origin`; OPTIONS never reaches it.
    let cors = CorsLayer::new().allow_origin(Any);

    let assets: MethodRouter = get_service(ServeDir::new(static_dir)).fallback(handle_not_found);

    Ok(Router::new()
        .route(
            "/api/training-data",
            post(handle_save).fallback(handle_not_found),
        )
        .route(
            "/api/training-data/load",
            get(handle_load).fallback(handle_not_found),
        )
        .route("/api/{*rest}", any(handle_not_found))
        .fallback_service(assets)
        .layer(cors)
        .layer(middleware::from_fn(preflight))
        .layer(TraceLayer::new_for_http())
        .with_state(state))
}

/// Binds `host:port`, moving on to the next port while the address is in
/// use, for at most `attempts` ports.
pub async fn bind_with_retry(host: &str, port: u16, attempts: u16) -> anyhow::Result<TcpListener> {
    let mut port = port;
    for attempt in 1..=attempts {
        match TcpListener::bind((host, port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == std::io::ErrorKind::AddrInUse && attempt < attempts => {
                let next = port
                    .checked_add(1)
                    .ok_or_else(|| anyhow::anyhow!("no ports left above {}", port))?;
                println!("Port {} in use, trying {}...", port, next);
                warn!(port, next, "address in use");
                port = next;
            }
            Err(e) => {
                return Err(
                    anyhow::Error::new(e).context(format!("failed to bind {}:{}", host, port))
                );
            }
        }
    }
    anyhow::bail!("server.port_attempts must be >= 1")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
}

// ============ Middleware ============

/// Answers every `OPTIONS` request, browser preflight or not, with an
/// empty 200 and the allowed origin, methods and headers. Sits outside the
/// CORS layer so the header values are exactly these.
async fn preflight(request: Request, next: Next) -> Response {
    if request.method() != Method::OPTIONS {
        return next.run(request).await;
    }
    let mut response = Response::new(Body::empty());
    let headers = response.headers_mut();
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_METHODS,
        HeaderValue::from_static(ALLOWED_METHODS),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_HEADERS,
        HeaderValue::from_static(ALLOWED_HEADERS),
    );
    response
}

// ============ Error response ============

#[derive(Serialize)]
struct ErrorBody {
    error: String,
}

/// Internal error type that converts into an Axum HTTP response.
struct AppError {
    status: StatusCode,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        (self.status, Json(ErrorBody { error: self.message })).into_response()
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let status = if err.is_bad_input() {
            StatusCode::UNPROCESSABLE_ENTITY
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };
        AppError {
            status,
            message: err.to_string(),
        }
    }
}

fn internal(message: impl Into<String>) -> AppError {
    AppError {
        status: StatusCode::INTERNAL_SERVER_ERROR,
        message: message.into(),
    }
}

/// Runs blocking filesystem work off the async executor.
async fn blocking<T, F>(f: F) -> Result<T, AppError>
where
    F: FnOnce() -> Result<T, StoreError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| internal(format!("storage task failed: {}", e)))?
        .map_err(AppError::from)
}

// ============ POST /api/training-data ============

/// Handler for `POST /api/training-data`.
///
/// The body is read as raw bytes so that clients that omit
/// `Content-Type: application/json` are still accepted.
async fn handle_save(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<SaveResponse>, AppError> {
    let sample = SampleEnvelope::from_slice(&body).map_err(|e| {
        warn!(error = %e, "rejected sample");
        AppError::from(e)
    })?;

    let store = state.store.clone();
    let path: PathBuf = blocking(move || store.save(&sample))
        .await
        .map_err(|e| {
            warn!(error = %e.message, "failed to save sample");
            e
        })?;

    Ok(Json(SaveResponse {
        success: true,
        file: path.display().to_string(),
    }))
}

// ============ GET /api/training-data/load ============

/// Handler for `GET /api/training-data/load`.
async fn handle_load(State(state): State<AppState>) -> Result<Json<TrainingSet>, AppError> {
    let store = state.store.clone();
    let report = blocking(move || store.load_all()).await?;

    info!(
        root = %state.config.storage.data_dir.display(),
        gestures = report.training_set.len(),
        samples = report.sample_count(),
        skipped = report.skipped.len(),
        "training data loaded"
    );
    Ok(Json(report.training_set))
}

// ============ Fallbacks ============

async fn handle_not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bad_input_maps_to_422() {
        let err = AppError::from(StoreError::InvalidSample("gesture must not be empty".into()));
        assert_eq!(err.status, StatusCode::UNPROCESSABLE_ENTITY);

        let parse = serde_json::from_slice::<serde_json::Value>(b"{").unwrap_err();
        assert_eq!(
            AppError::from(StoreError::from(parse)).status,
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[test]
    fn test_storage_failures_map_to_500() {
        let encode = serde_json::from_slice::<serde_json::Value>(b"[").unwrap_err();
        let err = AppError::from(StoreError::Encode(encode));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert!(err.message.starts_with("failed to encode sample"));

        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = AppError::from(StoreError::io("failed to create", "/data/g", io));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
