//! Tests for socket and data channel lifecycle on a transport.
//!
//! Covers:
//! - Socket install greeting, replacement, stale close notifications
//! - Endpoint expiry closing the socket as gone
//! - Data channel attach rules and connected notifications

#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::sync::Arc;

use bridge_test_utils::{drain_json, MockDataChannel, TestTransport};
use bridge_transport::channels::socket::{
    SOCKET_GONE_REASON, SOCKET_GONE_STATUS, SOCKET_REPLACED_REASON, SOCKET_REPLACED_STATUS,
};
use bridge_transport::channels::SocketChannel;
use bridge_transport::{BridgeMessage, InboundSource, SocketFrame, TransportConfig, TransportError};
use serde_json::json;

// ============================================================================
// Socket Tests
// ============================================================================

#[tokio::test]
async fn test_install_socket_greets_and_notifies() {
    let t = TestTransport::new("a");

    let (_id, mut rx) = t.connect_socket();

    assert_eq!(drain_json(&mut rx), vec![json!({"colibriClass": "ServerHello"})]);
    assert_eq!(t.events.connected(), vec!["a".to_string()]);
    assert!(t.transport.is_connected());

    // The greeting bypasses the per-kind counters but is a real send.
    assert!(t.transport.sent_counts().is_empty());
    assert_eq!(t.statistics.snapshot().socket_messages_sent, 1);
}

#[tokio::test]
async fn test_new_socket_replaces_previous() {
    let t = TestTransport::new("a");

    let (_first_id, mut first_rx) = t.connect_socket();
    let (_second_id, mut second_rx) = t.connect_socket();

    assert!(matches!(first_rx.recv().await, Some(SocketFrame::Text(_))));
    assert_eq!(
        first_rx.recv().await,
        Some(SocketFrame::Close {
            status: SOCKET_REPLACED_STATUS,
            reason: SOCKET_REPLACED_REASON.to_string(),
        })
    );
    assert_eq!(first_rx.recv().await, None);

    assert_eq!(drain_json(&mut second_rx), vec![json!({"colibriClass": "ServerHello"})]);
    assert_eq!(t.events.connected_count(), 2);

    // Outbound traffic now goes to the replacement only.
    t.transport.send(&BridgeMessage::DominantSpeaker {
        dominant_speaker_endpoint: "b".to_string(),
    });
    assert_eq!(drain_json(&mut second_rx).len(), 1);
}

#[test]
fn test_new_socket_uses_configured_send_buffer() {
    let t = TestTransport::builder("a")
        .config(TransportConfig {
            socket_send_buffer: 3,
            ..TransportConfig::default()
        })
        .build();

    let (handle, _rx) = t.transport.new_socket();
    for i in 0..3 {
        handle.send_text(format!("frame {i}")).unwrap();
    }

    assert!(matches!(
        handle.send_text("overflow".to_string()),
        Err(TransportError::Backpressure)
    ));
}

#[test]
fn test_stale_socket_close_is_ignored() {
    let t = TestTransport::new("a");

    let (first_id, _first_rx) = t.connect_socket();
    let (_second_id, _second_rx) = t.connect_socket();

    t.transport.clear_socket(first_id, 1001, "going away");

    let state = t.transport.debug_state();
    assert!(state.has_web_socket);
    assert!(state.web_socket_last_active);
    assert!(t.transport.is_connected());
}

#[test]
fn test_current_socket_close_clears_slot() {
    let t = TestTransport::new("a");
    let (id, _rx) = t.connect_socket();

    t.transport.clear_socket(id, 1000, "normal");

    let state = t.transport.debug_state();
    assert!(!state.has_web_socket);
    assert!(!state.web_socket_last_active);
    assert!(!t.transport.is_connected());
}

#[tokio::test]
async fn test_close_sends_gone_and_forgets_socket() {
    let t = TestTransport::new("a");
    let (_id, mut rx) = t.connect_socket();

    t.transport.close();
    // Second close is a no-op.
    t.transport.close();

    assert!(matches!(rx.recv().await, Some(SocketFrame::Text(_))));
    assert_eq!(
        rx.recv().await,
        Some(SocketFrame::Close {
            status: SOCKET_GONE_STATUS,
            reason: SOCKET_GONE_REASON.to_string(),
        })
    );
    assert_eq!(rx.recv().await, None);

    assert!(!t.transport.debug_state().has_web_socket);

    t.transport.send(&BridgeMessage::server_hello());
    assert_eq!(t.transport.dropped_count(), 1);
}

#[test]
fn test_close_leaves_data_channel_alone() {
    let t = TestTransport::new("a");
    let dc = MockDataChannel::ready();
    t.transport.install_data_channel(&dc.as_dyn());

    t.transport.close();
    t.transport.send(&BridgeMessage::server_hello());

    assert_eq!(dc.sent_texts().len(), 1);
    assert_eq!(t.transport.dropped_count(), 0);
}

#[test]
fn test_install_racing_close_and_receive_keeps_slots_consistent() {
    const THREADS: usize = 8;
    const ROUNDS: usize = 50;

    let t = TestTransport::new("a");

    let receivers: Vec<_> = std::thread::scope(|scope| {
        let workers: Vec<_> = (0..THREADS)
            .map(|_| {
                scope.spawn(|| {
                    (0..ROUNDS)
                        .map(|_| {
                            let (id, rx) = t.connect_socket();
                            t.transport.on_receive(
                                InboundSource::Socket(id),
                                r#"{"colibriClass":"LastNChangedEvent","lastN":3}"#,
                            );
                            t.transport.clear_socket(id, 1000, "normal");
                            rx
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        scope.spawn(|| {
            for _ in 0..ROUNDS {
                t.transport.on_receive(
                    InboundSource::DataChannel,
                    r#"{"colibriClass":"LastNChangedEvent","lastN":5}"#,
                );
            }
        });

        workers
            .into_iter()
            .flat_map(|worker| worker.join().unwrap())
            .collect()
    });

    // The last installed socket is never replaced, so its owner clears it.
    let state = t.transport.debug_state();
    assert!(!state.has_web_socket);
    assert!(!state.web_socket_last_active);
    assert_eq!(t.events.connected_count(), THREADS * ROUNDS);

    // A replaced socket is closed once; a cleared one is never closed by us.
    for mut rx in receivers {
        let close_frames = std::iter::from_fn(|| rx.try_recv())
            .filter(|frame| matches!(frame, SocketFrame::Close { .. }))
            .count();
        assert!(close_frames <= 1);
    }
}

// ============================================================================
// Data Channel Tests
// ============================================================================

#[test]
fn test_ready_data_channel_notifies_on_install() {
    let t = TestTransport::new("a");
    let dc = MockDataChannel::ready();

    t.transport.install_data_channel(&dc.as_dyn());

    assert_eq!(t.events.connected_count(), 1);
    assert!(t.transport.is_connected());
    assert!(t.transport.debug_state().data_channel_ready);
}

#[test]
fn test_data_channel_notifies_when_it_becomes_ready() {
    let t = TestTransport::new("a");
    let dc = MockDataChannel::new();

    t.transport.install_data_channel(&dc.as_dyn());
    assert_eq!(t.events.connected_count(), 0);
    assert!(!t.transport.is_connected());

    dc.set_ready(true);

    assert_eq!(t.events.connected(), vec!["a".to_string()]);
    assert!(t.transport.is_connected());
}

#[test]
fn test_transport_does_not_keep_data_channel_alive() {
    let t = TestTransport::new("a");
    let dc = MockDataChannel::ready();

    t.transport.install_data_channel(&dc.as_dyn());

    assert_eq!(Arc::strong_count(&dc), 1);
    assert!(dc.has_listener());

    drop(dc);

    assert!(!t.transport.is_connected());
    t.transport.send(&BridgeMessage::server_hello());
    assert_eq!(t.transport.dropped_count(), 1);
}

#[test]
fn test_data_channel_can_be_set_again_after_the_first_is_gone() {
    let t = TestTransport::new("a");

    let first = MockDataChannel::ready();
    t.transport.install_data_channel(&first.as_dyn());
    drop(first);

    let second = MockDataChannel::ready();
    t.transport.install_data_channel(&second.as_dyn());

    t.transport.send(&BridgeMessage::server_hello());
    assert_eq!(second.sent_texts().len(), 1);
}

#[test]
#[should_panic(expected = "Re-setting the same data channel")]
fn test_setting_same_data_channel_twice_panics() {
    let t = TestTransport::new("a");
    let dc = MockDataChannel::new();

    t.transport.install_data_channel(&dc.as_dyn());
    t.transport.install_data_channel(&dc.as_dyn());
}

#[test]
#[should_panic(expected = "Overwriting a previous data channel")]
fn test_overwriting_live_data_channel_panics() {
    let t = TestTransport::new("a");
    let first = MockDataChannel::new();
    let second = MockDataChannel::new();

    t.transport.install_data_channel(&first.as_dyn());
    t.transport.install_data_channel(&second.as_dyn());
}

#[test]
fn test_callbacks_outliving_transport_are_harmless() {
    let t = TestTransport::new("a");
    let dc = MockDataChannel::new();
    t.transport.install_data_channel(&dc.as_dyn());

    let events = Arc::clone(&t.events);
    drop(t);

    dc.set_ready(true);
    dc.deliver_text(r#"{"colibriClass":"ClientHello"}"#);

    assert_eq!(events.connected_count(), 0);
    assert!(dc.sent_texts().is_empty());
}
