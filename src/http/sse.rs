//! `GET /builds/{buildId}/logs` (spec §6): SSE stream of `{phase}`,
//! `{log: {...}}`, `{complete}` frames for one build's event bus.

use std::convert::Infallible;

use axum::extract::{Path, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::stream::{Stream, StreamExt};
use tokio_stream::wrappers::BroadcastStream;
use uuid::Uuid;

use crate::events::BuildEvent;

use super::errors::ApiError;
use super::state::AppState;

pub async fn build_logs(
    State(state): State<AppState>,
    Path(build_id): Path<Uuid>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, ApiError> {
    let bus = state.events.get(build_id).ok_or(ApiError::BuildNotFound(build_id))?;
    let stream = BroadcastStream::new(bus.subscribe()).filter_map(|item| async move { item.ok().map(to_sse_event) });

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}

fn to_sse_event(event: BuildEvent) -> Result<Event, Infallible> {
    let built = match &event {
        BuildEvent::Phase { phase, timestamp } => {
            Event::default().event("phase").json_data(serde_json::json!({ "phase": phase, "timestamp": timestamp }))
        }
        BuildEvent::Log(entry) => Event::default().event("log").json_data(serde_json::json!({ "log": entry })),
        BuildEvent::Complete { timestamp } => {
            Event::default().event("complete").json_data(serde_json::json!({ "complete": true, "timestamp": timestamp }))
        }
        BuildEvent::Shutdown { reason, timestamp } => {
            Event::default().event("shutdown").json_data(serde_json::json!({ "reason": reason, "timestamp": timestamp }))
        }
    };
    // `json_data` only fails to serialize types with non-string map keys,
    // which none of the above are; fall back to an empty comment frame
    // rather than panic on the off chance it ever does.
    Ok(built.unwrap_or_else(|_| Event::default().comment("serialization error")))
}
