use std::collections::VecDeque;
use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::StreamExt as _;
use futures::stream::{self, Stream};
use serde::Deserialize;
use tokio::sync::broadcast;

use ultra_progress::ProgressEvent;

use crate::state::AppState;

/// How long the stream waits for the next event before giving up and
/// closing the connection.
const IDLE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    correlation_id: String,
}

enum ReplayState {
    Replaying(VecDeque<ProgressEvent>, broadcast::Receiver<ProgressEvent>),
    Live(broadcast::Receiver<ProgressEvent>),
    Done,
}

/// `GET /api/orchestrator/stream?correlation_id=...` — a server-sent
/// stream of `ProgressEvent`s for one pipeline execution, replaying
/// buffered history first (for a subscriber that connects slightly
/// after the pipeline started) then following live events, in strict
/// `sequence` order.
///
/// Closes after the terminal event (`pipeline_completed`/
/// `pipeline_failed`) or after `IDLE_TIMEOUT` with no events — including
/// immediately, if nothing has ever been published for this
/// `correlation_id`.
pub async fn stream(State(state): State<AppState>, Query(query): Query<StreamQuery>) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let initial_state = match state.progress.subscribe(&query.correlation_id) {
        Some(subscription) => ReplayState::Replaying(subscription.replay.into_iter().collect(), subscription.receiver),
        None => ReplayState::Done,
    };

    let events = stream::unfold(initial_state, next_event);
    Sse::new(events.map(|event| Ok(Event::default().data(serde_json::to_string(&event).unwrap_or_default())))).keep_alive(KeepAlive::default())
}

async fn next_event(state: ReplayState) -> Option<(ProgressEvent, ReplayState)> {
    match state {
        ReplayState::Replaying(mut queue, receiver) => {
            let event = queue.pop_front()?;
            let next_state = if event.kind.is_terminal() {
                ReplayState::Done
            } else if queue.is_empty() {
                ReplayState::Live(receiver)
            } else {
                ReplayState::Replaying(queue, receiver)
            };
            Some((event, next_state))
        }
        ReplayState::Live(mut receiver) => loop {
            match tokio::time::timeout(IDLE_TIMEOUT, receiver.recv()).await {
                Ok(Ok(event)) => {
                    let next_state = if event.kind.is_terminal() { ReplayState::Done } else { ReplayState::Live(receiver) };
                    return Some((event, next_state));
                }
                Ok(Err(broadcast::error::RecvError::Lagged(_))) => continue,
                Ok(Err(broadcast::error::RecvError::Closed)) | Err(_elapsed) => return None,
            }
        },
        ReplayState::Done => None,
    }
}
