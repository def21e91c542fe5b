//! Progress Channel: an in-process publish/subscribe bus keyed by
//! correlation_id, with per-key bounded replay buffers and terminal-event
//! semantics.
//!
//! Grounded on the `broadcast::Sender<LlmEvent>` idiom found in the pack's
//! other example sources, generalized from one global channel to one
//! channel per correlation_id (a `DashMap`-keyed map of entries), each
//! paired with a bounded `VecDeque` so a subscriber connecting slightly
//! after the pipeline started still receives everything emitted so far.

mod event;

pub use event::{ProgressEvent, ProgressKind};

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::sync::broadcast;

/// Number of events retained per correlation_id for late subscribers.
const BUFFER_CAPACITY: usize = 256;
/// How long a correlation_id's channel survives after its terminal event.
const POST_TERMINAL_RETENTION: Duration = Duration::from_secs(60);
/// Lag capacity for the underlying broadcast channel; a subscriber that
/// falls this far behind sees `RecvError::Lagged`, but the replay buffer
/// above is what actually guarantees no events are missed on connect.
const BROADCAST_CAPACITY: usize = 256;

struct ChannelEntry {
    sender: broadcast::Sender<ProgressEvent>,
    buffer: Mutex<VecDeque<ProgressEvent>>,
    next_sequence: AtomicU64,
}

impl ChannelEntry {
    fn new() -> Self {
        let (sender, _receiver) = broadcast::channel(BROADCAST_CAPACITY);
        Self { sender, buffer: Mutex::new(VecDeque::with_capacity(BUFFER_CAPACITY)), next_sequence: AtomicU64::new(0) }
    }
}

/// A subscriber's view into one correlation_id's event stream: buffered
/// history first, then whatever arrives live.
pub struct Subscription {
    pub replay: Vec<ProgressEvent>,
    pub receiver: broadcast::Receiver<ProgressEvent>,
}

/// Per-correlation_id event bus.
#[derive(Default)]
pub struct ProgressBus {
    channels: DashMap<String, Arc<ChannelEntry>>,
}

impl ProgressBus {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish one event for `correlation_id`. Non-blocking: a slow
    /// subscriber only ever lags its own receiver, never the writer.
    ///
    /// When `kind` is terminal, schedules this correlation_id's channel
    /// for removal after the retention window.
    pub fn publish(self: &Arc<Self>, correlation_id: &str, kind: ProgressKind) {
        let entry = self.channels.entry(correlation_id.to_owned()).or_insert_with(|| Arc::new(ChannelEntry::new())).clone();

        let sequence = entry.next_sequence.fetch_add(1, Ordering::SeqCst);
        let terminal = kind.is_terminal();
        let event = ProgressEvent {
            correlation_id: correlation_id.to_owned(),
            sequence,
            kind,
            emitted_at: OffsetDateTime::now_utc(),
        };

        {
            let mut buffer = entry.buffer.lock().expect("progress buffer mutex poisoned");
            if buffer.len() >= BUFFER_CAPACITY {
                buffer.pop_front();
            }
            buffer.push_back(event.clone());
        }

        // No active subscriber is not an error: the event is retained in
        // the buffer for anyone who subscribes later.
        let _ = entry.sender.send(event);

        if terminal {
            let bus = Arc::clone(self);
            let correlation_id = correlation_id.to_owned();
            tokio::spawn(async move {
                tokio::time::sleep(POST_TERMINAL_RETENTION).await;
                bus.channels.remove(&correlation_id);
            });
        }
    }

    /// Subscribe to `correlation_id`'s event stream.
    ///
    /// Returns `None` if nothing has ever been published for this
    /// correlation_id (including: its retention window already elapsed).
    #[must_use]
    pub fn subscribe(&self, correlation_id: &str) -> Option<Subscription> {
        let entry = self.channels.get(correlation_id)?;
        let replay = entry.buffer.lock().expect("progress buffer mutex poisoned").iter().cloned().collect();
        let receiver = entry.sender.subscribe();
        Some(Subscription { replay, receiver })
    }
}
