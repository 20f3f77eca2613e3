//! Tests for inbound message handling.
//!
//! Covers:
//! - Hello replies on the request's channel
//! - Pin/select/max-height inputs driving constraint recomputes
//! - Stale, malformed, oversized, and unexpected messages

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use bridge_test_utils::{drain_json, MockDataChannel, TestTransport};
use bridge_transport::constraints::{SELECTED_PREFERRED_FPS, SELECTED_PREFERRED_HEIGHT};
use bridge_transport::{InboundSource, TransportConfig, VideoConstraints};
use serde_json::json;

const CLIENT_HELLO: &str = r#"{"colibriClass":"ClientHello"}"#;

fn set(ids: &[&str]) -> HashSet<String> {
    ids.iter().map(|id| (*id).to_string()).collect()
}

// ============================================================================
// Hello
// ============================================================================

#[test]
fn test_client_hello_answered_on_socket() {
    let t = TestTransport::new("a");
    let (id, mut rx) = t.connect_socket();
    drain_json(&mut rx);

    t.transport.on_receive(InboundSource::Socket(id), CLIENT_HELLO);

    assert_eq!(drain_json(&mut rx), vec![json!({"colibriClass": "ServerHello"})]);
    assert_eq!(t.statistics.snapshot().socket_messages_received, 1);
    // Replies are not counted per kind.
    assert!(t.transport.sent_counts().is_empty());
}

#[test]
fn test_client_hello_answered_on_data_channel() {
    let t = TestTransport::new("a");
    let dc = MockDataChannel::ready();
    t.transport.install_data_channel(&dc.as_dyn());

    dc.deliver_text(CLIENT_HELLO);

    assert_eq!(dc.sent_json(), vec![json!({"colibriClass": "ServerHello"})]);
    assert_eq!(t.statistics.snapshot().data_channel_messages_received, 1);
}

#[test]
fn test_reply_stays_on_request_channel() {
    let t = TestTransport::new("a");
    let dc = MockDataChannel::new();
    t.transport.install_data_channel(&dc.as_dyn());
    let (_id, mut rx) = t.connect_socket();
    drain_json(&mut rx);

    // The arbiter would fall back to the socket, the reply does not.
    dc.deliver_text(CLIENT_HELLO);

    assert!(drain_json(&mut rx).is_empty());
    assert!(dc.sent_texts().is_empty());
}

#[test]
fn test_message_from_replaced_socket_is_rejected() {
    let t = TestTransport::new("a");
    let (old_id, _old_rx) = t.connect_socket();
    let (_new_id, mut new_rx) = t.connect_socket();
    drain_json(&mut new_rx);

    t.transport.on_receive(
        InboundSource::Socket(old_id),
        r#"{"colibriClass":"LastNChangedEvent","lastN":7}"#,
    );
    t.transport.on_receive(InboundSource::Socket(old_id), CLIENT_HELLO);

    assert!(drain_json(&mut new_rx).is_empty());
    assert!(t.endpoint.last_n_values().is_empty());
    assert_eq!(t.statistics.snapshot().socket_messages_received, 0);
}

// ============================================================================
// Video constraints
// ============================================================================

#[test]
fn test_pin_then_unpin_recomputes_once_each() {
    let t = TestTransport::new("a");
    let dc = MockDataChannel::ready();
    t.transport.install_data_channel(&dc.as_dyn());

    dc.deliver_text(r#"{"colibriClass":"PinnedEndpointChangedEvent","pinnedEndpoint":"b"}"#);
    dc.deliver_text(r#"{"colibriClass":"PinnedEndpointChangedEvent","pinnedEndpoint":""}"#);

    let calls = t.adapter.calls();
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[0].pinned, set(&["b"]));
    assert!(calls[1].pinned.is_empty());

    let pushes = t.endpoint.constraint_pushes();
    assert_eq!(pushes.len(), 2);
    assert_eq!(pushes[0].get("b"), Some(&VideoConstraints::ideal(2160)));
    assert!(pushes[1].is_empty());
}

#[test]
fn test_blank_pin_and_empty_pin_list_agree() {
    let t = TestTransport::new("a");
    let dc = MockDataChannel::ready();
    t.transport.install_data_channel(&dc.as_dyn());

    dc.deliver_text(r#"{"colibriClass":"PinnedEndpointsChangedEvent","pinnedEndpoints":["b"]}"#);
    dc.deliver_text(r#"{"colibriClass":"PinnedEndpointChangedEvent","pinnedEndpoint":"  "}"#);
    dc.deliver_text(r#"{"colibriClass":"PinnedEndpointsChangedEvent","pinnedEndpoints":["b"]}"#);
    dc.deliver_text(r#"{"colibriClass":"PinnedEndpointsChangedEvent","pinnedEndpoints":[]}"#);
    dc.deliver_text(r#"{"colibriClass":"PinnedEndpointChangedEvent"}"#);

    let calls = t.adapter.calls();
    assert_eq!(calls.len(), 5);
    assert_eq!(calls[1].pinned, calls[3].pinned);
    assert!(calls[1].pinned.is_empty());
    assert!(calls[4].pinned.is_empty());
}

#[test]
fn test_pinned_endpoints_set_replaces_previous() {
    let t = TestTransport::new("a");
    let (id, _rx) = t.connect_socket();

    t.transport.on_receive(
        InboundSource::Socket(id),
        r#"{"colibriClass":"PinnedEndpointsChangedEvent","pinnedEndpoints":["b","c"]}"#,
    );
    t.transport.on_receive(
        InboundSource::Socket(id),
        r#"{"colibriClass":"PinnedEndpointsChangedEvent","pinnedEndpoints":["d"]}"#,
    );

    let latest = t.endpoint.last_constraints().unwrap();
    assert_eq!(latest.keys().cloned().collect::<HashSet<_>>(), set(&["d"]));
}

#[test]
fn test_own_endpoint_excluded_from_constraints() {
    let t = TestTransport::new("a");
    let (id, _rx) = t.connect_socket();

    t.transport.on_receive(
        InboundSource::Socket(id),
        r#"{"colibriClass":"SelectedEndpointsChangedEvent","selectedEndpoints":["a","b"]}"#,
    );

    // The adapter sees the raw inputs; the endpoint never gets its own id.
    assert_eq!(t.adapter.calls()[0].selected, set(&["a", "b"]));
    let latest = t.endpoint.last_constraints().unwrap();
    assert_eq!(latest.keys().cloned().collect::<HashSet<_>>(), set(&["b"]));
}

#[test]
fn test_selected_endpoint_gets_stage_view_preferences() {
    let t = TestTransport::new("a");
    let (id, _rx) = t.connect_socket();

    t.transport.on_receive(
        InboundSource::Socket(id),
        r#"{"colibriClass":"ReceiverVideoConstraint","maxFrameHeight":720}"#,
    );
    t.transport.on_receive(
        InboundSource::Socket(id),
        r#"{"colibriClass":"SelectedEndpointChangedEvent","selectedEndpoint":"b"}"#,
    );

    assert_eq!(t.adapter.call_count(), 2);
    let latest = t.endpoint.last_constraints().unwrap();
    assert_eq!(
        latest.get("b"),
        Some(&VideoConstraints {
            ideal_height: 720,
            preferred_height: Some(SELECTED_PREFERRED_HEIGHT),
            preferred_fps: Some(SELECTED_PREFERRED_FPS),
        })
    );
}

#[test]
fn test_low_max_height_disables_stage_view_preferences() {
    let t = TestTransport::new("a");
    let (id, _rx) = t.connect_socket();

    t.transport.on_receive(
        InboundSource::Socket(id),
        r#"{"colibriClass":"SelectedEndpointChangedEvent","selectedEndpoint":"b"}"#,
    );
    t.transport.on_receive(
        InboundSource::Socket(id),
        r#"{"colibriClass":"ReceiverVideoConstraint","maxFrameHeight":180}"#,
    );

    let latest = t.endpoint.last_constraints().unwrap();
    assert_eq!(latest.get("b"), Some(&VideoConstraints::ideal(180)));
    assert_eq!(
        t.transport.debug_state().video_constraints_compatibility.max_frame_height,
        180
    );
}

#[test]
fn test_endpoint_may_read_debug_state_while_handling_constraints() {
    let t = TestTransport::new("a");
    let (id, _rx) = t.connect_socket();

    let transport = Arc::downgrade(&t.transport);
    let seen_pinned = Arc::new(AtomicUsize::new(0));
    let seen = Arc::clone(&seen_pinned);
    t.endpoint
        .on_constraints(Arc::new(move |_: &HashMap<String, VideoConstraints>| {
            let transport = transport.upgrade().expect("transport alive");
            let state = transport.debug_state();
            seen.store(
                state.video_constraints_compatibility.pinned_endpoints.len(),
                Ordering::SeqCst,
            );
        }));

    t.transport.on_receive(
        InboundSource::Socket(id),
        r#"{"colibriClass":"PinnedEndpointsChangedEvent","pinnedEndpoints":["b","c"]}"#,
    );

    assert_eq!(seen_pinned.load(Ordering::SeqCst), 2);
    assert_eq!(t.endpoint.constraint_pushes().len(), 1);
}

#[test]
fn test_endpoint_may_feed_constraints_back_while_handling_constraints() {
    let t = TestTransport::new("a");
    let (id, _rx) = t.connect_socket();

    let transport = Arc::downgrade(&t.transport);
    let fired = Arc::new(AtomicBool::new(false));
    t.endpoint
        .on_constraints(Arc::new(move |_: &HashMap<String, VideoConstraints>| {
            if fired.swap(true, Ordering::SeqCst) {
                return;
            }
            let transport = transport.upgrade().expect("transport alive");
            transport.on_receive(
                InboundSource::DataChannel,
                r#"{"colibriClass":"ReceiverVideoConstraint","maxFrameHeight":180}"#,
            );
        }));

    t.transport.on_receive(
        InboundSource::Socket(id),
        r#"{"colibriClass":"PinnedEndpointChangedEvent","pinnedEndpoint":"b"}"#,
    );

    assert_eq!(t.adapter.call_count(), 2);
    let pushes = t.endpoint.constraint_pushes();
    assert_eq!(pushes.len(), 2);
    assert_eq!(pushes[0].get("b"), Some(&VideoConstraints::ideal(2160)));
    assert_eq!(pushes[1].get("b"), Some(&VideoConstraints::ideal(180)));
}

#[test]
fn test_concurrent_constraint_updates_end_on_latest_inputs() {
    let t = TestTransport::new("a");
    let (id, _rx) = t.connect_socket();

    std::thread::scope(|scope| {
        for height in [90, 180, 360, 720] {
            let t = &t;
            scope.spawn(move || {
                for _ in 0..50 {
                    let text = format!(
                        r#"{{"colibriClass":"ReceiverVideoConstraint","maxFrameHeight":{height}}}"#
                    );
                    t.transport.on_receive(InboundSource::Socket(id), &text);
                }
            });
        }
    });
    t.transport.on_receive(
        InboundSource::Socket(id),
        r#"{"colibriClass":"PinnedEndpointChangedEvent","pinnedEndpoint":"b"}"#,
    );

    assert_eq!(t.adapter.call_count(), 201);
    // The final pin is applied after every racing update has returned.
    let latest = t.endpoint.last_constraints().unwrap();
    let final_height = t.transport.debug_state().video_constraints_compatibility.max_frame_height;
    assert_eq!(latest.get("b"), Some(&VideoConstraints::ideal(final_height)));
}

// ============================================================================
// Other inbound messages
// ============================================================================

#[test]
fn test_last_n_forwarded_to_endpoint() {
    let t = TestTransport::new("a");
    let dc = MockDataChannel::ready();
    t.transport.install_data_channel(&dc.as_dyn());

    dc.deliver_text(r#"{"colibriClass":"LastNChangedEvent","lastN":5}"#);

    assert_eq!(t.endpoint.last_n_values(), vec![5]);
    assert_eq!(t.adapter.call_count(), 0);
}

#[test]
fn test_unknown_and_outbound_only_classes_are_ignored() {
    let t = TestTransport::new("a");
    let (id, mut rx) = t.connect_socket();
    drain_json(&mut rx);

    t.transport
        .on_receive(InboundSource::Socket(id), r#"{"colibriClass":"SomethingNew","x":1}"#);
    t.transport
        .on_receive(InboundSource::Socket(id), r#"{"colibriClass":"ServerHello"}"#);

    assert!(drain_json(&mut rx).is_empty());
    assert!(t.endpoint.constraint_pushes().is_empty());
    assert_eq!(t.statistics.snapshot().socket_messages_received, 2);
}

#[test]
fn test_malformed_text_is_dropped() {
    let t = TestTransport::new("a");
    let (id, mut rx) = t.connect_socket();
    drain_json(&mut rx);

    t.transport.on_receive(InboundSource::Socket(id), "not json");
    t.transport.on_receive(InboundSource::Socket(id), r#"{"noClass":true}"#);
    t.transport.on_receive(
        InboundSource::Socket(id),
        r#"{"colibriClass":"LastNChangedEvent","lastN":"five"}"#,
    );

    assert!(drain_json(&mut rx).is_empty());
    assert!(t.endpoint.last_n_values().is_empty());
}

#[test]
fn test_oversized_message_is_dropped() {
    let config = TransportConfig {
        max_inbound_message_bytes: 64,
        ..TransportConfig::default()
    };
    let t = TestTransport::builder("a").config(config).build();
    let (id, mut rx) = t.connect_socket();
    drain_json(&mut rx);

    let padded = format!(r#"{{"colibriClass":"ClientHello","pad":"{}"}}"#, "x".repeat(64));
    t.transport.on_receive(InboundSource::Socket(id), &padded);
    assert!(drain_json(&mut rx).is_empty());

    t.transport.on_receive(InboundSource::Socket(id), CLIENT_HELLO);
    assert_eq!(drain_json(&mut rx).len(), 1);
}

#[test]
fn test_binary_data_channel_message_marks_activity_only() {
    let t = TestTransport::new("a");
    let dc = MockDataChannel::ready();
    t.transport.install_data_channel(&dc.as_dyn());
    let (_id, _rx) = t.connect_socket();
    assert!(t.transport.debug_state().web_socket_last_active);

    dc.deliver_binary(&[0x01, 0x02]);

    assert!(!t.transport.debug_state().web_socket_last_active);
    assert_eq!(t.statistics.snapshot().data_channel_messages_received, 1);
    assert!(dc.sent_texts().is_empty());
}
