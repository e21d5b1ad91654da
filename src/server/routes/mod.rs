//! API routes for the conversion queue server

pub mod control;
pub mod events;
pub mod queue;
pub mod settings;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        // Queue management
        .route("/queue", post(queue::enqueue).get(queue::list).delete(queue::clear))
        .route("/queue/:id", delete(queue::remove))
        // Run control
        .route("/convert/start", post(control::start))
        .route("/convert/stop", post(control::stop))
        .route("/convert/status", get(control::status))
        // Settings and toolchain
        .route("/settings", get(settings::get_settings).put(settings::save_settings))
        .route("/tool", get(settings::tool_status))
        // Push events
        .route("/events", get(events::stream_events))
        // Info
        .route("/info", get(info))
}

/// API info endpoint
async fn info() -> axum::Json<serde_json::Value> {
    axum::Json(serde_json::json!({
        "name": "mineru-queue",
        "version": env!("CARGO_PKG_VERSION"),
        "description": "Batch document conversion queue driving the external MinerU toolchain",
        "endpoints": {
            "POST /api/queue": "Enqueue documents for conversion",
            "GET /api/queue": "List queued jobs",
            "DELETE /api/queue": "Clear the queue",
            "DELETE /api/queue/:id": "Remove one job",
            "POST /api/convert/start": "Start processing the queue",
            "POST /api/convert/stop": "Stop after the current job",
            "GET /api/convert/status": "Queue and run status",
            "GET /api/settings": "Load persisted conversion settings",
            "PUT /api/settings": "Save conversion settings",
            "GET /api/tool": "Conversion tool availability",
            "GET /api/events": "Server-sent event stream of queue changes"
        }
    }))
}
