//! Channel slots for one endpoint.
//!
//! Holds at most one socket and at most one data channel, plus the
//! [`LastActive`] flag. All three live behind a single lock so that
//! "is this the current socket" checks and socket replacement are atomic.

use super::arbiter::{self, LastActive};
use super::data_channel::DataChannel;
use super::socket::{
    SocketChannel, SocketId, SOCKET_GONE_REASON, SOCKET_GONE_STATUS, SOCKET_REPLACED_REASON,
    SOCKET_REPLACED_STATUS,
};
use super::ChannelKind;
use parking_lot::Mutex;
use std::sync::{Arc, Weak};
use tracing::debug;

/// The channel chosen for an outbound send.
#[derive(Clone)]
pub enum ActiveChannel {
    Socket(Arc<dyn SocketChannel>),
    DataChannel(Arc<dyn DataChannel>),
}

impl ActiveChannel {
    #[must_use]
    pub fn kind(&self) -> ChannelKind {
        match self {
            ActiveChannel::Socket(_) => ChannelKind::Socket,
            ActiveChannel::DataChannel(_) => ChannelKind::DataChannel,
        }
    }
}

impl std::fmt::Debug for ActiveChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveChannel::Socket(socket) => {
                f.debug_tuple("Socket").field(&socket.id()).finish()
            }
            ActiveChannel::DataChannel(_) => f.write_str("DataChannel"),
        }
    }
}

#[derive(Default)]
struct Slots {
    socket: Option<Arc<dyn SocketChannel>>,
    data_channel: Option<Weak<dyn DataChannel>>,
    last_active: LastActive,
}

impl Slots {
    fn live_data_channel(&self) -> Option<Arc<dyn DataChannel>> {
        self.data_channel.as_ref().and_then(Weak::upgrade)
    }
}

/// Socket and data channel slots for one endpoint.
#[derive(Default)]
pub struct ChannelRegistry {
    slots: Mutex<Slots>,
}

impl ChannelRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Install `socket`, closing any previous socket with "replaced".
    ///
    /// `on_installed` runs while the lock is still held, so nothing can be
    /// sent on or clear the new socket before it does.
    pub fn install_socket<F>(&self, socket: Arc<dyn SocketChannel>, on_installed: F)
    where
        F: FnOnce(&Arc<dyn SocketChannel>),
    {
        let mut slots = self.slots.lock();

        if let Some(previous) = slots.socket.take() {
            if previous.id() != socket.id() {
                debug!(
                    target: "bridge.transport.channels",
                    old_socket_id = %previous.id(),
                    new_socket_id = %socket.id(),
                    "Replacing socket"
                );
                previous.close_session(SOCKET_REPLACED_STATUS, SOCKET_REPLACED_REASON);
            }
        }

        slots.socket = Some(Arc::clone(&socket));
        slots.last_active = LastActive::Socket;
        on_installed(&socket);
    }

    /// Clear the socket if `id` is still the current one.
    ///
    /// Returns `false` for a stale notification about a replaced socket.
    pub fn clear_socket(&self, id: SocketId) -> bool {
        let mut slots = self.slots.lock();

        if slots.socket.as_ref().is_some_and(|s| s.id() == id) {
            slots.socket = None;
            slots.last_active = LastActive::DataChannel;
            true
        } else {
            false
        }
    }

    /// Record inbound activity on socket `id`.
    ///
    /// Returns the socket if it is the current one; otherwise nothing changes.
    pub fn mark_socket_active(&self, id: SocketId) -> Option<Arc<dyn SocketChannel>> {
        let mut slots = self.slots.lock();

        let socket = slots.socket.as_ref().filter(|s| s.id() == id).cloned()?;
        slots.last_active = LastActive::Socket;
        Some(socket)
    }

    /// Record inbound activity on the data channel.
    pub fn mark_data_channel_active(&self) -> Option<Arc<dyn DataChannel>> {
        let mut slots = self.slots.lock();
        slots.last_active = LastActive::DataChannel;
        slots.live_data_channel()
    }

    /// Store a weak reference to `data_channel`.
    ///
    /// # Panics
    ///
    /// A data channel is set exactly once per endpoint. Installing the same
    /// channel again, or a second channel while the first is still alive, is
    /// a lifecycle bug in the caller and aborts.
    #[allow(clippy::panic)]
    pub fn install_data_channel(&self, data_channel: &Arc<dyn DataChannel>) {
        let mut slots = self.slots.lock();

        if let Some(previous) = slots.live_data_channel() {
            let same = Arc::as_ptr(&previous).cast::<()>() == Arc::as_ptr(data_channel).cast::<()>();
            drop(slots);
            if same {
                panic!("Re-setting the same data channel");
            }
            panic!("Overwriting a previous data channel");
        }

        slots.data_channel = Some(Arc::downgrade(data_channel));
    }

    /// Close and forget the socket with 410 Gone. Returns whether one was installed.
    pub fn close(&self) -> bool {
        let mut slots = self.slots.lock();

        match slots.socket.take() {
            Some(socket) => {
                socket.close_session(SOCKET_GONE_STATUS, SOCKET_GONE_REASON);
                true
            }
            None => false,
        }
    }

    /// The channel to send on right now, if any.
    #[must_use]
    pub fn active_channel(&self) -> Option<ActiveChannel> {
        let (last_active, socket, data_channel) = {
            let slots = self.slots.lock();
            (slots.last_active, slots.socket.clone(), slots.live_data_channel())
        };

        let data_channel_ready = data_channel.as_ref().is_some_and(|dc| dc.is_ready());

        match arbiter::select(last_active, socket.is_some(), data_channel_ready)? {
            ChannelKind::Socket => socket.map(ActiveChannel::Socket),
            ChannelKind::DataChannel => data_channel.map(ActiveChannel::DataChannel),
        }
    }

    #[must_use]
    pub fn last_active(&self) -> LastActive {
        self.slots.lock().last_active
    }

    #[must_use]
    pub fn has_socket(&self) -> bool {
        self.slots.lock().socket.is_some()
    }

    #[must_use]
    pub fn current_socket_id(&self) -> Option<SocketId> {
        self.slots.lock().socket.as_ref().map(|s| s.id())
    }

    /// Whether a live data channel reports ready.
    #[must_use]
    pub fn data_channel_ready(&self) -> bool {
        let data_channel = self.slots.lock().live_data_channel();
        data_channel.is_some_and(|dc| dc.is_ready())
    }
}
