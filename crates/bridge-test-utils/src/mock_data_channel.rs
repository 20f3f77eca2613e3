//! Mock data channel for transport testing.
//!
//! Can be configured to:
//! - Start ready or become ready later (firing the registered callback)
//! - Refuse sends
//! - Deliver inbound text or binary messages to the registered listener
//!
//! # Example
//!
//! ```rust,ignore
//! use bridge_test_utils::MockDataChannel;
//!
//! let dc = MockDataChannel::new();
//! transport.install_data_channel(&dc.as_dyn());
//! dc.set_ready(true);
//! dc.deliver_text(r#"{"colibriClass":"ClientHello"}"#);
//! assert_eq!(dc.sent_texts().len(), 1);
//! ```

use bridge_transport::channels::{DataChannel, DataChannelMessage, MessageListener, ReadyCallback};
use bridge_transport::TransportError;
use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Mock in-band data channel.
#[derive(Default)]
pub struct MockDataChannel {
    ready: AtomicBool,
    fail_sends: AtomicBool,
    sent: Mutex<Vec<String>>,
    ready_callback: Mutex<Option<ReadyCallback>>,
    listener: Mutex<Option<MessageListener>>,
}

impl MockDataChannel {
    /// Create a channel that is not yet ready.
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Create a channel that is already ready.
    #[must_use]
    pub fn ready() -> Arc<Self> {
        let dc = Self::new();
        dc.ready.store(true, Ordering::SeqCst);
        dc
    }

    /// Upcast for APIs taking `Arc<dyn DataChannel>`.
    #[must_use]
    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn DataChannel> {
        Arc::clone(self) as Arc<dyn DataChannel>
    }

    /// Change readiness. Becoming ready fires the registered callback.
    pub fn set_ready(&self, ready: bool) {
        let was_ready = self.ready.swap(ready, Ordering::SeqCst);
        if ready && !was_ready {
            if let Some(callback) = self.ready_callback.lock().as_ref() {
                callback();
            }
        }
    }

    /// Make every subsequent send fail.
    pub fn fail_sends(&self) {
        self.fail_sends.store(true, Ordering::SeqCst);
    }

    /// Deliver an inbound text message to the listener.
    ///
    /// # Panics
    ///
    /// Panics if no listener is registered.
    pub fn deliver_text(&self, text: &str) {
        self.deliver(DataChannelMessage::Text(text.to_string()));
    }

    /// Deliver an inbound binary message to the listener.
    pub fn deliver_binary(&self, data: &[u8]) {
        self.deliver(DataChannelMessage::Binary(Bytes::copy_from_slice(data)));
    }

    fn deliver(&self, message: DataChannelMessage) {
        let listener = self.listener.lock();
        let listener = listener.as_ref().expect("no message listener registered");
        listener(message);
    }

    /// Whether a listener has been registered.
    #[must_use]
    pub fn has_listener(&self) -> bool {
        self.listener.lock().is_some()
    }

    /// Texts successfully sent so far.
    #[must_use]
    pub fn sent_texts(&self) -> Vec<String> {
        self.sent.lock().clone()
    }

    /// Sent texts parsed as JSON.
    #[must_use]
    pub fn sent_json(&self) -> Vec<serde_json::Value> {
        self.sent_texts()
            .iter()
            .map(|text| serde_json::from_str(text).expect("sent text is not JSON"))
            .collect()
    }
}

impl DataChannel for MockDataChannel {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn send_text(&self, text: String) -> Result<(), TransportError> {
        if self.fail_sends.load(Ordering::SeqCst) {
            return Err(TransportError::DataChannel("send refused".to_string()));
        }
        if !self.is_ready() {
            return Err(TransportError::ChannelNotReady);
        }
        self.sent.lock().push(text);
        Ok(())
    }

    fn on_ready(&self, callback: ReadyCallback) {
        *self.ready_callback.lock() = Some(callback);
    }

    fn on_message(&self, listener: MessageListener) {
        *self.listener.lock() = Some(listener);
    }
}
