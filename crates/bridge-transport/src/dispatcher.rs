//! Outbound message dispatch.
//!
//! Sends are best-effort and fire-and-forget: a message with no channel to go
//! out on is counted and discarded, a message a channel refuses is logged and
//! discarded. Nothing is retried and the caller never sees an error.

use crate::channels::ActiveChannel;
use crate::messages::{BridgeMessage, MessageKind};
use crate::observability::{self, TransportStatistics};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, warn};

/// Per-endpoint outbound dispatcher and its counters.
#[derive(Debug)]
pub struct OutboundDispatcher {
    endpoint_id: String,
    /// Attempted sends, indexed by [`MessageKind::index`].
    sent_counts: [AtomicU64; MessageKind::COUNT],
    /// Sends that found no channel.
    dropped: AtomicU64,
    statistics: Arc<TransportStatistics>,
}

impl OutboundDispatcher {
    #[must_use]
    pub fn new(endpoint_id: impl Into<String>, statistics: Arc<TransportStatistics>) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
            sent_counts: std::array::from_fn(|_| AtomicU64::new(0)),
            dropped: AtomicU64::new(0),
            statistics,
        }
    }

    /// Send `message` on `channel`, or count a drop if there is none.
    pub fn send(&self, channel: Option<ActiveChannel>, message: &BridgeMessage) {
        let Some(channel) = channel else {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            observability::record_message_dropped("outbound", "no_channel");
            debug!(
                target: "bridge.transport.outbound",
                endpoint_id = %self.endpoint_id,
                message_type = message.kind().as_str(),
                "No available transport channel, can't send a message"
            );
            return;
        };

        if let Some(count) = self.sent_counts.get(message.kind().index()) {
            count.fetch_add(1, Ordering::Relaxed);
        }
        self.send_via(&channel, message);
    }

    /// Send `message` on a specific channel, bypassing selection.
    ///
    /// Used for replies, which go back on the channel the request came in on,
    /// and for the greeting on a newly installed socket.
    pub fn send_via(&self, channel: &ActiveChannel, message: &BridgeMessage) {
        let kind = channel.kind();
        let message_type = message.kind().as_str();

        let text = match message.to_json() {
            Ok(text) => text,
            Err(e) => {
                observability::record_message_dropped("outbound", e.label());
                warn!(
                    target: "bridge.transport.outbound",
                    endpoint_id = %self.endpoint_id,
                    message_type = message_type,
                    error = %e,
                    "Failed to encode message"
                );
                return;
            }
        };

        debug!(
            target: "bridge.transport.outbound",
            endpoint_id = %self.endpoint_id,
            channel = kind.as_str(),
            message_type = message_type,
            "Sending message"
        );

        let result = match channel {
            ActiveChannel::DataChannel(data_channel) => data_channel.send_text(text),
            // Queued, not awaited: several threads may send at once.
            ActiveChannel::Socket(socket) => socket.send_text(text),
        };

        match result {
            Ok(()) => {
                self.statistics.record_sent(kind);
                observability::record_message_sent(kind.as_str(), message_type);
            }
            Err(e) => {
                observability::record_message_dropped("outbound", e.label());
                debug!(
                    target: "bridge.transport.outbound",
                    endpoint_id = %self.endpoint_id,
                    channel = kind.as_str(),
                    message_type = message_type,
                    error = %e,
                    "Channel did not accept message"
                );
            }
        }
    }

    /// Number of sends that found no channel.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Attempted sends of one kind.
    #[must_use]
    pub fn sent_count(&self, kind: MessageKind) -> u64 {
        self.sent_counts
            .get(kind.index())
            .map_or(0, |count| count.load(Ordering::Relaxed))
    }

    /// Attempted sends keyed by kind name; kinds never sent are omitted.
    #[must_use]
    pub fn sent_counts(&self) -> BTreeMap<&'static str, u64> {
        MessageKind::ALL
            .iter()
            .map(|kind| (kind.as_str(), self.sent_count(*kind)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }
}
