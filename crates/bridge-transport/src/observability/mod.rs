//! Observability for the endpoint message transport
//!
//! Prometheus metrics plus bridge-wide message statistics.
//!
//! # Privacy by Default
//!
//! Message bodies are never logged or used as labels; only the bounded
//! message kind is. Endpoint messages are opaque and may carry end-to-end
//! key material.
//!
//! # Metrics
//!
//! | Metric | Type | Labels | Purpose |
//! |--------|------|--------|---------|
//! | `bridge_messages_sent_total` | Counter | `channel`, `message_type` | Outbound messages handed to a channel |
//! | `bridge_messages_received_total` | Counter | `channel` | Inbound messages |
//! | `bridge_messages_dropped_total` | Counter | `direction`, `reason` | Dropped messages |
//! | `bridge_unhandled_messages_total` | Counter | `message_type` | Inbound kinds with no handler |
//! | `bridge_endpoint_messages_routed_total` | Counter | `route` | Endpoint message routing outcomes |
//! | `bridge_inbound_handle_duration_seconds` | Histogram | `message_type` | Inbound handling latency |

pub mod metrics;
pub mod statistics;

// Re-exports for convenience
pub use metrics::{
    init_metrics_recorder, record_endpoint_message_routed, record_inbound_handle_duration,
    record_message_dropped, record_message_received, record_message_sent,
    record_unhandled_message,
};
pub use statistics::{TransportStatistics, TransportStatisticsSnapshot};
