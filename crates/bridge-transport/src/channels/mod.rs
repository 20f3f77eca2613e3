//! Transport channels for endpoint messages.
//!
//! An endpoint can reach the bridge over two interchangeable channels:
//!
//! - [`data_channel`] - the in-band data channel, owned by the media transport
//! - [`socket`] - the signaling socket, owned by this layer
//!
//! [`registry`] holds the current instance of each; [`arbiter`] decides which
//! one outbound messages use.

pub mod arbiter;
pub mod data_channel;
pub mod registry;
pub mod socket;

pub use arbiter::LastActive;
pub use data_channel::{DataChannel, DataChannelMessage, MessageListener, ReadyCallback};
pub use registry::{ActiveChannel, ChannelRegistry};
pub use socket::{SocketChannel, SocketFrame, SocketHandle, SocketId, SocketReceiver};

/// The two channel types an endpoint can use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelKind {
    Socket,
    DataChannel,
}

impl ChannelKind {
    /// Returns the channel kind as a string for metric labels.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            ChannelKind::Socket => "socket",
            ChannelKind::DataChannel => "data_channel",
        }
    }
}
