//! Signaling socket side of the endpoint transport.
//!
//! [`SocketHandle`] is the bridge's half of one accepted socket: frames are
//! queued on a bounded `mpsc` channel that the wire task drains through a
//! [`SocketReceiver`]. Queuing never waits; a full queue is reported back as
//! [`TransportError::Backpressure`] and the frame is dropped.

use crate::errors::TransportError;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tokio_util::sync::CancellationToken;
use tracing::debug;
use uuid::Uuid;

/// Close status used when a newer socket replaces this one.
pub const SOCKET_REPLACED_STATUS: u16 = 200;

/// Close reason used when a newer socket replaces this one.
pub const SOCKET_REPLACED_REASON: &str = "replaced";

/// Close status used when the endpoint expires (410 Gone).
pub const SOCKET_GONE_STATUS: u16 = 410;

/// Close reason used when the endpoint expires.
pub const SOCKET_GONE_REASON: &str = "gone";

/// Identity of one accepted socket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SocketId(pub Uuid);

impl SocketId {
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SocketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SocketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A full-duplex text socket to one endpoint.
pub trait SocketChannel: Send + Sync {
    /// Stable identity, used to ignore events from replaced sockets.
    fn id(&self) -> SocketId;

    /// Submit `text` for sending. Must not block the caller.
    fn send_text(&self, text: String) -> Result<(), TransportError>;

    /// Close the session with a protocol status and reason.
    fn close_session(&self, status: u16, reason: &str);
}

/// A frame queued for the wire task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SocketFrame {
    Text(String),
    Close { status: u16, reason: String },
}

/// Bridge-side handle to an accepted socket.
#[derive(Debug, Clone)]
pub struct SocketHandle {
    id: SocketId,
    sender: mpsc::Sender<SocketFrame>,
    /// Shared by clones; set by the first close only.
    closed: Arc<AtomicBool>,
    cancel_token: CancellationToken,
}

/// Wire-side end of a [`SocketHandle`].
#[derive(Debug)]
pub struct SocketReceiver {
    receiver: mpsc::Receiver<SocketFrame>,
    cancel_token: CancellationToken,
}

impl SocketHandle {
    /// Create a handle with room for `buffer` queued frames.
    #[must_use]
    pub fn channel(buffer: usize) -> (Self, SocketReceiver) {
        let (sender, receiver) = mpsc::channel(buffer.max(1));
        let cancel_token = CancellationToken::new();

        let handle = Self {
            id: SocketId::new(),
            sender,
            closed: Arc::new(AtomicBool::new(false)),
            cancel_token: cancel_token.clone(),
        };

        (
            handle,
            SocketReceiver {
                receiver,
                cancel_token,
            },
        )
    }

    /// Check if the session has been closed.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn try_queue(&self, frame: SocketFrame) -> Result<(), TransportError> {
        self.sender.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => TransportError::Backpressure,
            TrySendError::Closed(_) => TransportError::ChannelClosed,
        })
    }
}

impl SocketChannel for SocketHandle {
    fn id(&self) -> SocketId {
        self.id
    }

    fn send_text(&self, text: String) -> Result<(), TransportError> {
        if self.is_closed() {
            return Err(TransportError::ChannelClosed);
        }
        self.try_queue(SocketFrame::Text(text))
    }

    fn close_session(&self, status: u16, reason: &str) {
        // Only the caller that flips the flag queues a close frame.
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        // Cancel even if the close frame can't be queued so the wire task exits.
        if let Err(e) = self.try_queue(SocketFrame::Close {
            status,
            reason: reason.to_string(),
        }) {
            debug!(
                target: "bridge.transport.socket",
                socket_id = %self.id,
                error = %e,
                "Close frame not queued"
            );
        }
        self.cancel_token.cancel();
    }
}

impl SocketReceiver {
    /// Next frame to write, or `None` once the socket is closed and drained.
    pub async fn recv(&mut self) -> Option<SocketFrame> {
        tokio::select! {
            biased;
            frame = self.receiver.recv() => frame,
            () = self.cancel_token.cancelled() => self.receiver.try_recv().ok(),
        }
    }

    /// Next frame if one is already queued.
    pub fn try_recv(&mut self) -> Option<SocketFrame> {
        self.receiver.try_recv().ok()
    }

    /// Token cancelled when the bridge closes the session.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }
}
