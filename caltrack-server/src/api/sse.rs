//! Server-Sent Events endpoint for live refresh

use crate::AppState;
use axum::{
    extract::State,
    response::sse::{Event, Sse},
};
use futures::stream::Stream;
use std::convert::Infallible;

/// GET /events - SSE stream of `update_calibrations` notifications
///
/// Sits behind the session gate like every other data route.
pub async fn event_stream(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    state.notifier.handle_sse_connection()
}
