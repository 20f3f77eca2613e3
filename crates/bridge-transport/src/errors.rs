//! Endpoint message transport error types.
//!
//! None of these errors are ever reported to the remote participant. They are
//! absorbed at the transport boundary, logged, and counted. The only reply a
//! participant ever receives from this layer is the `ServerHello` liveness
//! acknowledgment.

use thiserror::Error;

/// Endpoint message transport error type.
#[derive(Debug, Error)]
pub enum TransportError {
    /// Inbound text could not be decoded as a bridge channel message.
    #[error("Decode error: {0}")]
    Decode(String),

    /// Outbound message could not be encoded.
    #[error("Encode error: {0}")]
    Encode(String),

    /// Inbound text exceeded the configured size limit.
    #[error("Message too large: {size} bytes (limit {limit})")]
    MessageTooLarge { size: usize, limit: usize },

    /// The socket send queue is full; the frame was not queued.
    #[error("Socket send queue full")]
    Backpressure,

    /// The channel has been closed and will not accept more frames.
    #[error("Channel closed")]
    ChannelClosed,

    /// The data channel is not open yet.
    #[error("Data channel not ready")]
    ChannelNotReady,

    /// The data channel rejected the frame.
    #[error("Data channel error: {0}")]
    DataChannel(String),
}

impl TransportError {
    /// Returns a bounded label for metrics (`reason`).
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            TransportError::Decode(_) => "decode",
            TransportError::Encode(_) => "encode",
            TransportError::MessageTooLarge { .. } => "too_large",
            TransportError::Backpressure => "backpressure",
            TransportError::ChannelClosed => "channel_closed",
            TransportError::ChannelNotReady => "not_ready",
            TransportError::DataChannel(_) => "data_channel",
        }
    }
}

impl From<serde_json::Error> for TransportError {
    fn from(err: serde_json::Error) -> Self {
        TransportError::Decode(err.to_string())
    }
}
