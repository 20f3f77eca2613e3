//! Active channel selection.
//!
//! Order of preference, re-evaluated on every send:
//!
//! 1. The socket, if it was the last channel to receive and is still installed.
//! 2. The data channel, if it is still alive and ready.
//! 3. The socket, if installed at all.
//! 4. Nothing.

use super::ChannelKind;

/// Which channel received an endpoint message most recently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LastActive {
    #[default]
    DataChannel,
    Socket,
}

impl LastActive {
    #[must_use]
    pub const fn is_socket(self) -> bool {
        matches!(self, LastActive::Socket)
    }
}

/// Pick the channel to send on.
#[must_use]
pub const fn select(
    last_active: LastActive,
    socket_present: bool,
    data_channel_ready: bool,
) -> Option<ChannelKind> {
    if last_active.is_socket() && socket_present {
        Some(ChannelKind::Socket)
    } else if data_channel_ready {
        Some(ChannelKind::DataChannel)
    } else if socket_present {
        Some(ChannelKind::Socket)
    } else {
        None
    }
}
