//! Observer event stream for upload progress.

use std::time::Duration;

use futures::stream::{self, Stream};
use tokio::time::timeout;

use super::{ProgressSubscription, COMPLETE};

/// An event delivered to a progress observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressEvent {
    /// Upload percentage, 0 to 100.
    Percent(u8),
    /// Nothing arrived within the keepalive interval.
    KeepAlive,
}

enum State {
    Start(ProgressSubscription),
    Open(ProgressSubscription),
    Done,
}

/// Turn a subscription into the observer event stream.
///
/// Starts with `Percent(0)`, emits `KeepAlive` whenever `keepalive` passes
/// without an update and ends after `Percent(100)` or when the channel is
/// closed. Dropping the stream releases the subscription.
pub fn progress_events(
    subscription: ProgressSubscription,
    keepalive: Duration,
) -> impl Stream<Item = ProgressEvent> {
    stream::unfold(State::Start(subscription), move |state| async move {
        match state {
            State::Start(sub) => Some((ProgressEvent::Percent(0), State::Open(sub))),
            State::Open(mut sub) => match timeout(keepalive, sub.recv()).await {
                Ok(Some(pct)) if pct >= COMPLETE => Some((ProgressEvent::Percent(pct), State::Done)),
                Ok(Some(pct)) => Some((ProgressEvent::Percent(pct), State::Open(sub))),
                Ok(None) => None,
                Err(_) => Some((ProgressEvent::KeepAlive, State::Open(sub))),
            },
            State::Done => None,
        }
    })
}
