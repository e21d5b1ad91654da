//! SSE endpoint for real-time queue events
//!
//! Clients subscribe here to follow queue changes, per-job progress and raw
//! tool output without polling.

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
    response::IntoResponse,
};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    StreamExt,
};

use crate::server::state::AppState;

/// GET /api/events - Server-sent event stream of queue changes
pub async fn stream_events(State(state): State<AppState>) -> impl IntoResponse {
    let receiver = state.events().subscribe();

    let stream = BroadcastStream::new(receiver).filter_map(|item| match item {
        Ok(event) => match Event::default().event(event.name()).json_data(&event) {
            Ok(sse_event) => Some(Ok::<_, Infallible>(sse_event)),
            Err(e) => {
                tracing::error!("Failed to serialize queue event: {}", e);
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(skipped)) => {
            tracing::warn!(skipped, "Event subscriber lagged; dropping events");
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
