//! HTTP control surface for the scan agent.
//!
//! Routes, token authentication, and the response envelope contract.
//! Every tool failure is a value inside a `200` envelope with
//! `success: false`; the only non-200 status is `401` for a bad token.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use thiserror::Error;
use tower_http::trace::TraceLayer;

use outpost_common::{
    normalize_report, severity_totals, ConfigScanRequest, HealthResponse, SbomRequest, ScanRequest,
};

use crate::command::{CommandResult, CommandRunner};
use crate::config::ScanAgentConfig;
use crate::scanner;

/// Header carrying the shared agent token.
pub const TOKEN_HEADER: &str = "x-agent-token";

/// Characters of stdout shipped back when a scan produced unparseable
/// output.
const RAW_PREVIEW_CHARS: usize = 500;

/// Shared per-process state: configuration plus the executor seam.
pub struct AppState {
    pub config: ScanAgentConfig,
    pub runner: Arc<dyn CommandRunner>,
}

impl AppState {
    #[must_use]
    pub fn new(config: ScanAgentConfig, runner: Arc<dyn CommandRunner>) -> Self {
        Self { config, runner }
    }
}

/// Failure taxonomy for the HTTP surface.
#[derive(Debug, Error)]
pub enum ScanFailure {
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Image required")]
    MissingImage,
    /// Scan command failed; the envelope carries the exit code.
    #[error("{error}")]
    ScanCommand { error: String, code: i32 },
    /// Tool exited 0 without producing the JSON it promised; the envelope
    /// carries a truncated stdout preview.
    #[error("Invalid JSON response")]
    UnparseableReport { raw: String },
    /// Command failed where the envelope carries only the message.
    #[error("{0}")]
    Command(String),
}

impl IntoResponse for ScanFailure {
    fn into_response(self) -> Response {
        let status = match &self {
            ScanFailure::Unauthorized => StatusCode::UNAUTHORIZED,
            _ => StatusCode::OK,
        };
        let body = match self {
            ScanFailure::ScanCommand { error, code } => {
                json!({ "success": false, "error": error, "code": code })
            }
            ScanFailure::UnparseableReport { raw } => {
                json!({ "success": false, "error": "Invalid JSON response", "raw": raw })
            }
            other => json!({ "success": false, "error": other.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}

/// Build the full route table. `/health` stays outside the token check.
pub fn router(state: Arc<AppState>) -> Router {
    let protected = Router::new()
        .route("/scan/image", post(scan_image))
        .route("/scan/sbom", post(scan_sbom))
        .route("/scan/config", post(scan_config))
        .route("/docker/images", get(docker_images))
        .route("/docker/containers", get(docker_containers))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_token));

    Router::new()
        .route("/health", get(health))
        .merge(protected)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Reject any request whose `X-Agent-Token` header does not match the
/// configured token exactly. Runs before the handler, so nothing is
/// executed on behalf of a rejected request.
async fn require_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Response {
    let presented = headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default();
    if presented != state.config.agent_token {
        return ScanFailure::Unauthorized.into_response();
    }
    next.run(request).await
}

/// Liveness probe; the answer is constant for the process lifetime.
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        agent_id: state.config.agent_id.clone(),
    })
}

/// `POST /scan/image`: vulnerability scan with a JSON report expected
/// back on stdout.
async fn scan_image(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ScanRequest>,
) -> Result<Json<Value>, ScanFailure> {
    if request.image.is_empty() {
        return Err(ScanFailure::MissingImage);
    }

    let command = scanner::image_scan(
        &state.config.trivy_path,
        &request.image,
        &request.severity,
        &request.checks,
    );
    tracing::info!(command = %command.display_line(), "running image scan");

    let result = state
        .runner
        .run(&command.program, &command.args, state.config.scan_timeout())
        .await;
    let report = parse_scan_output(&result, "Scan failed")?;
    log_findings(&request.image, &report);

    Ok(Json(json!({
        "success": true,
        "result": report,
        "image": request.image,
    })))
}

/// `POST /scan/sbom`: SBOM export. Stdout is passed through untouched
/// since not every SBOM format is JSON.
async fn scan_sbom(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SbomRequest>,
) -> Result<Json<Value>, ScanFailure> {
    if request.image.is_empty() {
        return Err(ScanFailure::MissingImage);
    }

    let command = scanner::sbom_export(&state.config.trivy_path, &request.image, &request.format);
    tracing::info!(command = %command.display_line(), "generating SBOM");

    let result = state
        .runner
        .run(&command.program, &command.args, state.config.scan_timeout())
        .await;
    if !result.success() || result.stdout.is_empty() {
        return Err(ScanFailure::Command(stderr_or(
            &result,
            "SBOM generation failed",
        )));
    }

    Ok(Json(json!({
        "success": true,
        "sbom": result.stdout,
        "image": request.image,
        "format": request.format,
    })))
}

/// `POST /scan/config`: configuration checks only by default; the
/// envelope matches the image scan.
async fn scan_config(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ConfigScanRequest>,
) -> Result<Json<Value>, ScanFailure> {
    if request.image.is_empty() {
        return Err(ScanFailure::MissingImage);
    }

    let command = scanner::config_scan(&state.config.trivy_path, &request.image, &request.checks);
    tracing::info!(command = %command.display_line(), "running config scan");

    let result = state
        .runner
        .run(&command.program, &command.args, state.config.scan_timeout())
        .await;
    let report = parse_scan_output(&result, "Config scan failed")?;
    log_findings(&request.image, &report);

    Ok(Json(json!({
        "success": true,
        "result": report,
        "image": request.image,
    })))
}

/// `GET /docker/images`: one JSON object per stdout line.
async fn docker_images(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ScanFailure> {
    let command = scanner::list_images(&state.config.docker_path);
    let result = state
        .runner
        .run(
            &command.program,
            &command.args,
            state.config.listing_timeout(),
        )
        .await;
    if !result.success() {
        return Err(ScanFailure::Command(result.stderr));
    }
    Ok(Json(json!({
        "success": true,
        "images": parse_json_lines(&result.stdout),
    })))
}

/// `GET /docker/containers`: `ps -a`, stopped containers included.
async fn docker_containers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ScanFailure> {
    let command = scanner::list_containers(&state.config.docker_path);
    let result = state
        .runner
        .run(
            &command.program,
            &command.args,
            state.config.listing_timeout(),
        )
        .await;
    if !result.success() {
        return Err(ScanFailure::Command(result.stderr));
    }
    Ok(Json(json!({
        "success": true,
        "containers": parse_json_lines(&result.stdout),
    })))
}

/// Map an executor result to the parsed report or the matching failure.
/// Success requires exit 0 and non-empty stdout; `default_error` stands
/// in when the tool wrote nothing to stderr.
fn parse_scan_output(result: &CommandResult, default_error: &str) -> Result<Value, ScanFailure> {
    if !result.success() || result.stdout.is_empty() {
        return Err(ScanFailure::ScanCommand {
            error: stderr_or(result, default_error),
            code: result.exit_code,
        });
    }
    serde_json::from_str(&result.stdout).map_err(|_| ScanFailure::UnparseableReport {
        raw: result.stdout.chars().take(RAW_PREVIEW_CHARS).collect(),
    })
}

fn stderr_or(result: &CommandResult, default_error: &str) -> String {
    if result.stderr.is_empty() {
        default_error.to_string()
    } else {
        result.stderr.clone()
    }
}

/// Parse newline-delimited JSON, dropping lines that fail to parse.
fn parse_json_lines(stdout: &str) -> Vec<Value> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(error = %err, "skipping malformed listing line");
                None
            }
        })
        .collect()
}

/// Summarize a parsed report into the log; rows are the sink's concern.
fn log_findings(image: &str, report: &Value) {
    let records = normalize_report(report);
    let totals = severity_totals(&records);
    tracing::info!(image = %image, findings = records.len(), totals = ?totals, "scan completed");
}
