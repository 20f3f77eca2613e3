//! `EndpointMessageTransport` - control-message transport for one endpoint.
//!
//! Each transport:
//! - Holds at most one signaling socket and one data channel
//! - Sends outbound messages on whichever channel the arbiter picks
//! - Routes inbound messages to handlers (see [`crate::router`])
//!
//! # Lifecycle
//!
//! 1. Created with its owning endpoint; shares that endpoint's lifetime
//! 2. Channels come and go via `install_*` / `clear_socket`
//! 3. `close()` when the endpoint expires; the data channel is left to its owner

use crate::channels::{
    ActiveChannel, ChannelRegistry, DataChannel, DataChannelMessage, SocketChannel, SocketHandle,
    SocketId, SocketReceiver,
};
use crate::conference::{Endpoint, TransportEventHandler};
use crate::config::TransportConfig;
use crate::constraints::{
    CompatibilityAdapter, ConstraintAdapter, ConstraintInputs, ConstraintInputsSnapshot,
};
use crate::dispatcher::OutboundDispatcher;
use crate::messages::BridgeMessage;
use crate::observability::TransportStatistics;
use crate::relay::EndpointMessageRelay;
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::atomic::AtomicU64;
use std::sync::{Arc, Weak};
use tracing::{debug, info};

/// Diagnostic snapshot of one transport.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DebugState {
    pub endpoint_id: String,
    pub web_socket_last_active: bool,
    pub has_web_socket: bool,
    pub data_channel_ready: bool,
    pub num_outgoing_messages_dropped: u64,
    pub sent_counts: BTreeMap<&'static str, u64>,
    pub video_constraints_compatibility: ConstraintInputsSnapshot,
}

/// Control-message transport for one endpoint.
pub struct EndpointMessageTransport {
    pub(crate) endpoint_id: String,
    /// The owning endpoint holds the transport, not the other way round.
    pub(crate) endpoint: Weak<dyn Endpoint>,
    pub(crate) registry: ChannelRegistry,
    pub(crate) dispatcher: OutboundDispatcher,
    pub(crate) relay: EndpointMessageRelay,
    pub(crate) constraint_inputs: Mutex<ConstraintInputs>,
    /// Bumped under `constraint_inputs` on every input change.
    pub(crate) constraint_generation: AtomicU64,
    /// Newest generation handed to the endpoint.
    pub(crate) constraint_pushed: AtomicU64,
    pub(crate) constraint_adapter: Arc<dyn ConstraintAdapter>,
    pub(crate) statistics: Arc<TransportStatistics>,
    pub(crate) config: TransportConfig,
    events: Arc<dyn TransportEventHandler>,
}

impl EndpointMessageTransport {
    /// Create a transport for `endpoint` using the default constraint adapter.
    pub fn new(
        endpoint: &Arc<dyn Endpoint>,
        events: Arc<dyn TransportEventHandler>,
        statistics: Arc<TransportStatistics>,
        config: TransportConfig,
    ) -> Self {
        let endpoint_id = endpoint.id().to_string();

        Self {
            endpoint: Arc::downgrade(endpoint),
            registry: ChannelRegistry::new(),
            dispatcher: OutboundDispatcher::new(endpoint_id.clone(), Arc::clone(&statistics)),
            relay: EndpointMessageRelay::new(endpoint_id.clone()),
            constraint_inputs: Mutex::new(ConstraintInputs::new(config.default_max_frame_height)),
            constraint_generation: AtomicU64::new(0),
            constraint_pushed: AtomicU64::new(0),
            constraint_adapter: Arc::new(CompatibilityAdapter),
            statistics,
            config,
            events,
            endpoint_id,
        }
    }

    /// Replace the constraint adapter.
    #[must_use]
    pub fn with_constraint_adapter(mut self, adapter: Arc<dyn ConstraintAdapter>) -> Self {
        self.constraint_adapter = adapter;
        self
    }

    #[must_use]
    pub fn endpoint_id(&self) -> &str {
        &self.endpoint_id
    }

    /// Create a socket handle with a send queue of `socket_send_buffer` frames.
    ///
    /// The wire task drains the receiver; the handle goes to [`Self::install_socket`].
    #[must_use]
    pub fn new_socket(&self) -> (SocketHandle, SocketReceiver) {
        SocketHandle::channel(self.config.socket_send_buffer)
    }

    /// Adopt a newly accepted socket.
    ///
    /// Any previous socket is closed as "replaced". The new socket becomes the
    /// last-active channel and is greeted with a `ServerHello`.
    pub fn install_socket(&self, socket: Arc<dyn SocketChannel>) {
        let socket_id = socket.id();

        self.registry.install_socket(socket, |installed| {
            self.dispatcher.send_via(
                &ActiveChannel::Socket(Arc::clone(installed)),
                &BridgeMessage::server_hello(),
            );
        });

        info!(
            target: "bridge.transport",
            endpoint_id = %self.endpoint_id,
            socket_id = %socket_id,
            "Socket connected"
        );
        self.notify_connected();
    }

    /// The socket `socket_id` closed. Ignored if it was already replaced.
    pub fn clear_socket(&self, socket_id: SocketId, status: u16, reason: &str) {
        if self.registry.clear_socket(socket_id) {
            debug!(
                target: "bridge.transport",
                endpoint_id = %self.endpoint_id,
                socket_id = %socket_id,
                status = status,
                reason = %reason,
                "Socket closed"
            );
        }
    }

    /// Attach the endpoint's data channel.
    ///
    /// # Panics
    ///
    /// Panics if a data channel is already attached and still alive, including
    /// when `data_channel` is that same channel.
    pub fn install_data_channel(self: &Arc<Self>, data_channel: &Arc<dyn DataChannel>) {
        self.registry.install_data_channel(data_channel);

        // Hook first: readiness may fire between the check and the hook.
        let weak = Arc::downgrade(self);
        data_channel.on_ready(Box::new(move || {
            if let Some(transport) = weak.upgrade() {
                transport.notify_connected();
            }
        }));
        if data_channel.is_ready() {
            self.notify_connected();
        }

        let weak = Arc::downgrade(self);
        data_channel.on_message(Box::new(move |message: DataChannelMessage| {
            if let Some(transport) = weak.upgrade() {
                transport.on_data_channel_message(message);
            }
        }));
    }

    /// Close the socket for good (410 Gone). In-flight frames are not recalled.
    pub fn close(&self) {
        if self.registry.close() {
            debug!(
                target: "bridge.transport",
                endpoint_id = %self.endpoint_id,
                "Endpoint expired, closed socket"
            );
        }
    }

    /// Whether any channel is currently usable for sending.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.registry.active_channel().is_some()
    }

    /// Send `message` on the active channel. Best-effort; never fails.
    pub fn send(&self, message: &BridgeMessage) {
        self.dispatcher.send(self.registry.active_channel(), message);
    }

    #[must_use]
    pub fn debug_state(&self) -> DebugState {
        DebugState {
            endpoint_id: self.endpoint_id.clone(),
            web_socket_last_active: self.registry.last_active().is_socket(),
            has_web_socket: self.registry.has_socket(),
            data_channel_ready: self.registry.data_channel_ready(),
            num_outgoing_messages_dropped: self.dispatcher.dropped_count(),
            sent_counts: self.dispatcher.sent_counts(),
            video_constraints_compatibility: self.constraint_inputs.lock().snapshot(),
        }
    }

    /// Messages that found no channel.
    #[must_use]
    pub fn dropped_count(&self) -> u64 {
        self.dispatcher.dropped_count()
    }

    /// Attempted sends keyed by message class.
    #[must_use]
    pub fn sent_counts(&self) -> BTreeMap<&'static str, u64> {
        self.dispatcher.sent_counts()
    }

    fn notify_connected(&self) {
        debug!(
            target: "bridge.transport",
            endpoint_id = %self.endpoint_id,
            "Transport channel connected"
        );
        self.events.transport_connected(&self.endpoint_id);
    }
}
