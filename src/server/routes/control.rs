//! Run control endpoints

use axum::{extract::State, Json};
use serde::Serialize;

use crate::error::Result;
use crate::queue::job::RunOptions;
use crate::queue::store::QueueStatus;
use crate::server::state::AppState;

#[derive(Debug, Serialize)]
pub struct StartResponse {
    pub started: bool,
    pub message: String,
}

/// POST /api/convert/start - Start processing the queue
pub async fn start(
    State(state): State<AppState>,
    Json(options): Json<RunOptions>,
) -> Result<Json<StartResponse>> {
    state.scheduler().start(options).await?;
    Ok(Json(StartResponse {
        started: true,
        message: "Processing started. Subscribe to /api/events for progress.".to_string(),
    }))
}

#[derive(Debug, Serialize)]
pub struct StopResponse {
    pub stopping: bool,
    pub message: String,
}

/// POST /api/convert/stop - Stop after the current job
pub async fn stop(State(state): State<AppState>) -> Json<StopResponse> {
    state.scheduler().stop();
    Json(StopResponse {
        stopping: true,
        message: "Stop requested. The in-flight conversion finishes on its own.".to_string(),
    })
}

/// GET /api/convert/status - Queue and run status
pub async fn status(State(state): State<AppState>) -> Json<QueueStatus> {
    Json(state.scheduler().status())
}
