use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tokio_util::sync::CancellationToken;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};

use crate::error::PipelineError;
use crate::history::{RunHistory, RunRecord};
use crate::model::{AnalysisRequest, CombinedResult};
use crate::workflow::Workflow;

const DEFAULT_RUNS_LIMIT: usize = 20;

#[derive(Clone)]
pub struct AppState {
    pub workflow: Arc<Workflow>,
    pub history: Arc<RunHistory>,
}

impl AppState {
    /// Wrap `workflow` and make it record into a fresh run history.
    pub fn new(workflow: Workflow) -> Self {
        let history = Arc::new(RunHistory::default());
        Self {
            workflow: Arc::new(workflow.with_history(history.clone())),
            history,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/analyze", post(analyze))
        .route("/debug/runs", get(debug_runs))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::very_permissive())
        .with_state(state)
}

/// Error body is always `{"error": <message>, "kind": <label>}`.
#[derive(Debug)]
pub struct ApiError(PipelineError);

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        Self(e)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match &self.0 {
            PipelineError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PipelineError::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
            PipelineError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
            PipelineError::State(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PipelineError::AllFetchesFailed { .. }
            | PipelineError::AllAnalysesFailed { .. }
            | PipelineError::QuickMetadata(_)
            | PipelineError::Combine(_) => StatusCode::BAD_GATEWAY,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.0.to_string(), "kind": self.0.kind() });
        (self.status(), Json(body)).into_response()
    }
}

async fn analyze(
    State(state): State<AppState>,
    payload: Result<Json<AnalysisRequest>, JsonRejection>,
) -> Result<Json<CombinedResult>, ApiError> {
    let Json(request) = payload.map_err(|e| {
        warn!(target: "webs::api", error = %e, "rejected request body");
        PipelineError::InvalidRequest(e.body_text())
    })?;

    // Dropping the handler future (client went away) cancels the run.
    let cancel = CancellationToken::new();
    let _guard = cancel.clone().drop_guard();

    info!(
        target: "webs::api",
        urls = request.urls.len(),
        web_id = request.web_id.as_deref().unwrap_or("-"),
        "analyze"
    );
    let result = state.workflow.run_with_cancel(&request, cancel).await?;
    Ok(Json(result))
}

#[derive(Deserialize)]
struct RunsQuery {
    limit: Option<usize>,
}

async fn debug_runs(
    State(state): State<AppState>,
    Query(q): Query<RunsQuery>,
) -> Json<Vec<RunRecord>> {
    let n = q.limit.unwrap_or(DEFAULT_RUNS_LIMIT);
    Json(state.history.snapshot_last_n(n))
}
