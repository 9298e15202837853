// /////////////////////////////////////////////////////////////////////////////
// Recipe Import Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Channel Broadcaster
//!
//! [`StatusBroadcaster`] over a `tokio::sync::broadcast` channel. Emitters
//! never block and never fail on missing subscribers - an event with
//! nobody listening is dropped, which is the correct fire-and-forget
//! semantic for progress notifications. Backpressure is the channel's
//! ring buffer: slow subscribers observe a `Lagged` gap, not a stalled
//! pipeline.

use async_trait::async_trait;
use tokio::sync::broadcast;
use tracing::trace;

use recipe_import_domain::services::StatusBroadcaster;
use recipe_import_domain::{ImportError, StatusEvent};

/// Default ring-buffer capacity per subscriber.
const DEFAULT_CAPACITY: usize = 256;

pub struct ChannelBroadcaster {
    tx: broadcast::Sender<StatusEvent>,
}

impl ChannelBroadcaster {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// A new subscription to the event stream.
    pub fn subscribe(&self) -> broadcast::Receiver<StatusEvent> {
        self.tx.subscribe()
    }

    /// Current subscriber count.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StatusBroadcaster for ChannelBroadcaster {
    async fn emit(&self, event: StatusEvent) -> Result<(), ImportError> {
        match self.tx.send(event) {
            Ok(subscribers) => {
                trace!(subscribers, "status event broadcast");
                Ok(())
            }
            // No subscribers: events are fire-and-forget, not buffered.
            Err(_) => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use recipe_import_domain::{EventContext, ImportId, ImportStatus};

    fn event(message: &str) -> StatusEvent {
        StatusEvent::new(
            ImportId::new("i1").unwrap(),
            None,
            ImportStatus::Processing,
            EventContext::Import,
            message,
        )
    }

    #[tokio::test]
    async fn test_emit_without_subscribers_succeeds() {
        let broadcaster = ChannelBroadcaster::new();
        broadcaster.emit(event("nobody listening")).await.unwrap();
    }

    #[tokio::test]
    async fn test_subscriber_receives_events_in_order() {
        let broadcaster = ChannelBroadcaster::new();
        let mut rx = broadcaster.subscribe();
        broadcaster.emit(event("one")).await.unwrap();
        broadcaster.emit(event("two")).await.unwrap();
        assert_eq!(rx.recv().await.unwrap().message, "one");
        assert_eq!(rx.recv().await.unwrap().message, "two");
    }

    #[tokio::test]
    async fn test_multiple_subscribers_each_get_a_copy() {
        let broadcaster = ChannelBroadcaster::new();
        let mut a = broadcaster.subscribe();
        let mut b = broadcaster.subscribe();
        assert_eq!(broadcaster.subscriber_count(), 2);
        broadcaster.emit(event("fanout")).await.unwrap();
        assert_eq!(a.recv().await.unwrap().message, "fanout");
        assert_eq!(b.recv().await.unwrap().message, "fanout");
    }
}
