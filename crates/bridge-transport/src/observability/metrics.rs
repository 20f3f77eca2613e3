//! Metrics definitions for the endpoint message transport.
//!
//! All metrics follow Prometheus naming conventions:
//! - `bridge_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `channel`: 2 values (socket, data_channel)
//! - `message_type`: bounded by `MessageKind` (14 values)
//! - `direction`: 2 values (inbound, outbound)
//! - `reason`: bounded by `TransportError::label` plus `no_channel`, `stale_socket`
//! - `route`: 5 values (broadcast, unicast, remote, unknown_target, no_conference)

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;

/// Initialize Prometheus metrics recorder and return the handle
/// for serving metrics via HTTP.
///
/// # Errors
///
/// Returns error if Prometheus recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Inbound handling is in-process only; sub-millisecond is the norm
        .set_buckets_for_metric(
            Matcher::Prefix("bridge_inbound".to_string()),
            &[
                0.0001, 0.0005, 0.001, 0.005, 0.010, 0.025, 0.050, 0.100, 0.250,
            ],
        )
        .map_err(|e| format!("Failed to set inbound handling buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus metrics recorder: {e}"))
}

// ============================================================================
// Message Flow Metrics (Counters)
// ============================================================================

/// Record a message handed to a channel for sending.
///
/// Metric: `bridge_messages_sent_total`
/// Labels: `channel`, `message_type`
pub fn record_message_sent(channel: &str, message_type: &str) {
    counter!("bridge_messages_sent_total",
        "channel" => channel.to_string(),
        "message_type" => message_type.to_string()
    )
    .increment(1);
}

/// Record a message received from an endpoint.
///
/// Metric: `bridge_messages_received_total`
/// Labels: `channel`
pub fn record_message_received(channel: &str) {
    counter!("bridge_messages_received_total", "channel" => channel.to_string()).increment(1);
}

/// Record a dropped message.
///
/// Metric: `bridge_messages_dropped_total`
/// Labels: `direction` (inbound, outbound), `reason`
///
/// Outbound drops with reason `no_channel` mean the endpoint had neither a
/// socket nor a ready data channel.
pub fn record_message_dropped(direction: &str, reason: &str) {
    counter!("bridge_messages_dropped_total",
        "direction" => direction.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

/// Record an inbound message with no handler.
///
/// Metric: `bridge_unhandled_messages_total`
/// Labels: `message_type`
pub fn record_unhandled_message(message_type: &str) {
    counter!("bridge_unhandled_messages_total", "message_type" => message_type.to_string())
        .increment(1);
}

/// Record the routing outcome of an endpoint-to-endpoint message.
///
/// Metric: `bridge_endpoint_messages_routed_total`
/// Labels: `route`
pub fn record_endpoint_message_routed(route: &str) {
    counter!("bridge_endpoint_messages_routed_total", "route" => route.to_string()).increment(1);
}

// ============================================================================
// Latency Metrics (Histograms)
// ============================================================================

/// Record how long an inbound message took to handle.
///
/// Metric: `bridge_inbound_handle_duration_seconds`
/// Labels: `message_type`
pub fn record_inbound_handle_duration(message_type: &str, duration: Duration) {
    histogram!("bridge_inbound_handle_duration_seconds", "message_type" => message_type.to_string())
        .record(duration.as_secs_f64());
}
