//! Bridge-wide message totals shared by every endpoint transport.
//!
//! All fields are atomic for lock-free concurrent access. Values are
//! diagnostics only and never drive control decisions.

use crate::channels::ChannelKind;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

#[derive(Debug, Default)]
pub struct TransportStatistics {
    data_channel_messages_sent: AtomicU64,
    data_channel_messages_received: AtomicU64,
    socket_messages_sent: AtomicU64,
    socket_messages_received: AtomicU64,
}

/// Snapshot of [`TransportStatistics`] at a point in time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransportStatisticsSnapshot {
    pub data_channel_messages_sent: u64,
    pub data_channel_messages_received: u64,
    pub socket_messages_sent: u64,
    pub socket_messages_received: u64,
}

impl TransportStatistics {
    /// Create a new shared statistics instance.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn record_sent(&self, channel: ChannelKind) {
        match channel {
            ChannelKind::Socket => &self.socket_messages_sent,
            ChannelKind::DataChannel => &self.data_channel_messages_sent,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_received(&self, channel: ChannelKind) {
        match channel {
            ChannelKind::Socket => &self.socket_messages_received,
            ChannelKind::DataChannel => &self.data_channel_messages_received,
        }
        .fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> TransportStatisticsSnapshot {
        TransportStatisticsSnapshot {
            data_channel_messages_sent: self.data_channel_messages_sent.load(Ordering::Relaxed),
            data_channel_messages_received: self
                .data_channel_messages_received
                .load(Ordering::Relaxed),
            socket_messages_sent: self.socket_messages_sent.load(Ordering::Relaxed),
            socket_messages_received: self.socket_messages_received.load(Ordering::Relaxed),
        }
    }
}
