//! Upload progress notification for NetFS.
//!
//! An uploader publishes percentages under a caller-chosen token and at most
//! one observer per token receives them. Publishing never blocks: updates
//! for an unknown token, or beyond the channel's buffer, are dropped.

mod stream;

pub use stream::{progress_events, ProgressEvent};

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tracing::{debug, trace};

/// Percentage that completes an upload and ends the observer stream.
pub const COMPLETE: u8 = 100;

/// Default per-token channel buffer.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 10;

struct Registration {
    id: u64,
    sender: mpsc::Sender<u8>,
}

/// Registry of progress channels keyed by upload token.
pub struct ProgressNotifier {
    channels: Mutex<HashMap<String, Registration>>,
    capacity: usize,
    next_id: AtomicU64,
}

impl ProgressNotifier {
    /// Create a notifier whose channels buffer `capacity` updates.
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity: capacity.max(1),
            next_id: AtomicU64::new(1),
        }
    }

    fn channels(&self) -> MutexGuard<'_, HashMap<String, Registration>> {
        // The map stays consistent even if a holder panicked.
        self.channels.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Register an observer for `token`.
    ///
    /// A previous subscription for the same token is replaced and its stream
    /// ends. The returned handle unsubscribes when dropped.
    pub fn subscribe(self: &Arc<Self>, token: impl Into<String>) -> ProgressSubscription {
        let token = token.into();
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = mpsc::channel(self.capacity);

        let replaced = self
            .channels()
            .insert(token.clone(), Registration { id, sender })
            .is_some();
        debug!(token = %token, replaced, "Progress observer subscribed");

        ProgressSubscription {
            notifier: Arc::clone(self),
            token,
            id,
            receiver,
        }
    }

    /// Send `percent` to the observer of `token`, if any. Never blocks.
    pub fn publish(&self, token: &str, percent: u8) {
        let sender = match self.channels().get(token) {
            Some(registration) => registration.sender.clone(),
            None => return,
        };

        if let Err(e) = sender.try_send(percent.min(COMPLETE)) {
            trace!(token, percent, error = %e, "Progress update dropped");
        }
    }

    /// Publish completion for `token` and close its channel.
    ///
    /// The observer drains whatever is buffered and then ends, even when a
    /// full buffer made it miss the final 100.
    pub fn finish(&self, token: &str) {
        self.publish(token, COMPLETE);
        self.unsubscribe(token);
    }

    /// Remove the channel for `token`, ending its stream.
    pub fn unsubscribe(&self, token: &str) {
        if self.channels().remove(token).is_some() {
            debug!(token, "Progress observer unsubscribed");
        }
    }

    /// Whether an observer is registered for `token`.
    pub fn is_subscribed(&self, token: &str) -> bool {
        self.channels().contains_key(token)
    }

    /// Remove `token` only while it still belongs to subscription `id`.
    fn release(&self, token: &str, id: u64) {
        let mut channels = self.channels();
        if channels.get(token).is_some_and(|r| r.id == id) {
            channels.remove(token);
            debug!(token, "Progress observer released");
        }
    }
}

impl Default for ProgressNotifier {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

/// Receiving end of a progress channel.
pub struct ProgressSubscription {
    notifier: Arc<ProgressNotifier>,
    token: String,
    id: u64,
    receiver: mpsc::Receiver<u8>,
}

impl ProgressSubscription {
    /// The upload token this subscription observes.
    pub fn token(&self) -> &str {
        &self.token
    }

    /// Wait for the next percentage. None once the channel is closed.
    pub async fn recv(&mut self) -> Option<u8> {
        self.receiver.recv().await
    }
}

impl Drop for ProgressSubscription {
    fn drop(&mut self) {
        self.notifier.release(&self.token, self.id);
    }
}

/// Intermediate percentage for `read` of `total` bytes, capped at 99.
///
/// 100 is reserved for a completed upload.
pub fn percent(read: u64, total: u64) -> u8 {
    if total == 0 {
        return 0;
    }
    let pct = read.saturating_mul(100) / total;
    pct.min(u64::from(COMPLETE - 1)) as u8
}
