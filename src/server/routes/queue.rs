//! Queue management endpoints

use std::path::PathBuf;

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::queue::job::Job;
use crate::server::state::AppState;

#[derive(Debug, Deserialize)]
pub struct EnqueueRequest {
    /// Documents to queue, in the order they should be converted
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Serialize)]
pub struct EnqueueResponse {
    pub queued: usize,
    pub jobs: Vec<Job>,
}

/// POST /api/queue - Enqueue documents for conversion
pub async fn enqueue(
    State(state): State<AppState>,
    Json(request): Json<EnqueueRequest>,
) -> Result<Json<EnqueueResponse>> {
    if request.paths.is_empty() {
        return Err(Error::validation("no input paths provided"));
    }

    let jobs = state.scheduler().store().enqueue(request.paths);
    tracing::info!(count = jobs.len(), "Enqueued documents");

    Ok(Json(EnqueueResponse {
        queued: jobs.len(),
        jobs,
    }))
}

#[derive(Debug, Serialize)]
pub struct QueueListResponse {
    pub total: usize,
    pub jobs: Vec<Job>,
}

/// GET /api/queue - List queued jobs
pub async fn list(State(state): State<AppState>) -> Json<QueueListResponse> {
    let jobs = state.scheduler().store().list();
    Json(QueueListResponse {
        total: jobs.len(),
        jobs,
    })
}

#[derive(Debug, Serialize)]
pub struct RemoveResponse {
    pub removed: Job,
}

/// DELETE /api/queue/:id - Remove one job from the queue
pub async fn remove(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<RemoveResponse>> {
    let removed = state.scheduler().store().remove(id)?;
    tracing::info!(job_id = %id, "Removed job from queue");
    Ok(Json(RemoveResponse { removed }))
}

#[derive(Debug, Serialize)]
pub struct ClearResponse {
    pub cleared: bool,
}

/// DELETE /api/queue - Clear the queue
pub async fn clear(State(state): State<AppState>) -> Result<Json<ClearResponse>> {
    state.scheduler().store().clear()?;
    tracing::info!("Queue cleared");
    Ok(Json(ClearResponse { cleared: true }))
}
