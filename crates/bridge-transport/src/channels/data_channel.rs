//! Data channel contract.
//!
//! The data channel is owned by the media transport. This layer only holds a
//! `Weak` reference to it and never keeps it alive.

use crate::errors::TransportError;
use bytes::Bytes;

/// Callback fired when the data channel becomes ready to send.
pub type ReadyCallback = Box<dyn Fn() + Send + Sync>;

/// Listener for messages arriving on the data channel.
pub type MessageListener = Box<dyn Fn(DataChannelMessage) + Send + Sync>;

/// A message received on the data channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataChannelMessage {
    Text(String),
    Binary(Bytes),
}

/// An ordered, reliable data channel carried inside the media transport.
pub trait DataChannel: Send + Sync {
    /// Whether the channel is open and can send.
    fn is_ready(&self) -> bool;

    /// Send `text` as a string message.
    fn send_text(&self, text: String) -> Result<(), TransportError>;

    /// Register a callback for when the channel becomes ready.
    fn on_ready(&self, callback: ReadyCallback);

    /// Register the listener for inbound messages.
    fn on_message(&self, listener: MessageListener);
}
