//! Inbound message routing.
//!
//! Text from either channel is attributed to that channel (making it the
//! last-active one), decoded, and dispatched by kind. A handler may return a
//! reply, which goes back on the channel the request arrived on rather than
//! on whatever the arbiter would pick.

use crate::channels::{ActiveChannel, ChannelKind, DataChannelMessage, SocketId};
use crate::constraints::{single_id_set, ConstraintInputs};
use crate::errors::TransportError;
use crate::messages::{self, BridgeMessage};
use crate::observability;
use crate::transport::EndpointMessageTransport;
use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::time::Instant;
use tracing::{debug, instrument, warn};

/// The channel an inbound message arrived on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InboundSource {
    /// A socket, identified so stale sockets can be rejected.
    Socket(SocketId),
    DataChannel,
}

impl InboundSource {
    #[must_use]
    pub const fn kind(&self) -> ChannelKind {
        match self {
            InboundSource::Socket(_) => ChannelKind::Socket,
            InboundSource::DataChannel => ChannelKind::DataChannel,
        }
    }
}

impl EndpointMessageTransport {
    /// Handle text received from the endpoint.
    #[instrument(
        skip_all,
        name = "bridge.transport.receive",
        fields(endpoint_id = %self.endpoint_id, channel = source.kind().as_str())
    )]
    pub fn on_receive(&self, source: InboundSource, text: &str) {
        let reply_to = match source {
            InboundSource::Socket(socket_id) => {
                let Some(socket) = self.registry.mark_socket_active(socket_id) else {
                    observability::record_message_dropped("inbound", "stale_socket");
                    warn!(
                        target: "bridge.transport.inbound",
                        endpoint_id = %self.endpoint_id,
                        socket_id = %socket_id,
                        "Received text from an unknown socket"
                    );
                    return;
                };
                Some(ActiveChannel::Socket(socket))
            }
            InboundSource::DataChannel => self
                .registry
                .mark_data_channel_active()
                .map(ActiveChannel::DataChannel),
        };

        self.record_received(source.kind());
        self.handle_text(reply_to.as_ref(), text);
    }

    /// Listener installed on the data channel.
    pub fn on_data_channel_message(&self, message: DataChannelMessage) {
        match message {
            DataChannelMessage::Text(text) => self.on_receive(InboundSource::DataChannel, &text),
            DataChannelMessage::Binary(data) => {
                self.registry.mark_data_channel_active();
                self.record_received(ChannelKind::DataChannel);
                debug!(
                    target: "bridge.transport.inbound",
                    endpoint_id = %self.endpoint_id,
                    len = data.len(),
                    "Ignoring binary data channel message"
                );
            }
        }
    }

    fn record_received(&self, channel: ChannelKind) {
        self.statistics.record_received(channel);
        observability::record_message_received(channel.as_str());
    }

    fn handle_text(&self, reply_to: Option<&ActiveChannel>, text: &str) {
        let limit = self.config.max_inbound_message_bytes;
        let decoded = if text.len() > limit {
            Err(TransportError::MessageTooLarge {
                size: text.len(),
                limit,
            })
        } else {
            messages::decode(text)
        };

        let message = match decoded {
            Ok(message) => message,
            Err(e) => {
                observability::record_message_dropped("inbound", e.label());
                warn!(
                    target: "bridge.transport.inbound",
                    endpoint_id = %self.endpoint_id,
                    error = %e,
                    "Dropping undecodable message"
                );
                return;
            }
        };

        let kind = message.kind();
        let started = Instant::now();
        let reply = self.handle_message(message);
        observability::record_inbound_handle_duration(kind.as_str(), started.elapsed());

        if let Some(reply) = reply {
            match reply_to {
                Some(channel) => self.dispatcher.send_via(channel, &reply),
                None => self.dispatcher.send(None, &reply),
            }
        }
    }

    /// Dispatch one decoded message. Returns the reply, if any.
    fn handle_message(&self, message: BridgeMessage) -> Option<BridgeMessage> {
        match message {
            // Reveals to the client that this channel works end to end.
            BridgeMessage::ClientHello => Some(BridgeMessage::server_hello()),

            BridgeMessage::PinnedEndpoint { pinned_endpoint } => {
                self.set_pinned(single_id_set(pinned_endpoint.as_deref()));
                None
            }
            BridgeMessage::PinnedEndpoints { pinned_endpoints } => {
                self.set_pinned(pinned_endpoints.into_iter().collect());
                None
            }
            BridgeMessage::SelectedEndpoint { selected_endpoint } => {
                self.set_selected(single_id_set(selected_endpoint.as_deref()));
                None
            }
            BridgeMessage::SelectedEndpoints { selected_endpoints } => {
                self.set_selected(selected_endpoints.into_iter().collect());
                None
            }
            BridgeMessage::ReceiverVideoConstraint { max_frame_height } => {
                debug!(
                    target: "bridge.transport.inbound",
                    endpoint_id = %self.endpoint_id,
                    max_frame_height = max_frame_height,
                    "Received a maxFrameHeight video constraint"
                );
                self.update_constraints(|inputs| inputs.set_max_frame_height(max_frame_height));
                None
            }
            BridgeMessage::LastN { last_n } => {
                match self.endpoint.upgrade() {
                    Some(endpoint) => endpoint.set_last_n(last_n),
                    None => debug!(
                        target: "bridge.transport.inbound",
                        endpoint_id = %self.endpoint_id,
                        "Endpoint gone, ignoring last-N"
                    ),
                }
                None
            }
            BridgeMessage::EndpointMessage(message) => {
                let conference = self.endpoint.upgrade().and_then(|e| e.conference());
                self.relay.route(conference, message);
                None
            }

            unhandled @ (BridgeMessage::ServerHello { .. }
            | BridgeMessage::DominantSpeaker { .. }
            | BridgeMessage::EndpointConnectivityStatus { .. }
            | BridgeMessage::LastNEndpoints { .. }
            | BridgeMessage::SenderVideoConstraints { .. }
            | BridgeMessage::Unknown) => {
                let message_type = unhandled.kind().as_str();
                observability::record_unhandled_message(message_type);
                warn!(
                    target: "bridge.transport.inbound",
                    endpoint_id = %self.endpoint_id,
                    message_type = message_type,
                    "Received a message with an unexpected type"
                );
                None
            }
        }
    }

    fn set_pinned(&self, pinned: HashSet<String>) {
        debug!(
            target: "bridge.transport.inbound",
            endpoint_id = %self.endpoint_id,
            pinned = ?pinned,
            "Pinned endpoints changed"
        );
        self.update_constraints(|inputs| inputs.set_pinned(pinned));
    }

    fn set_selected(&self, selected: HashSet<String>) {
        debug!(
            target: "bridge.transport.inbound",
            endpoint_id = %self.endpoint_id,
            selected = ?selected,
            "Selected endpoints changed"
        );
        self.update_constraints(|inputs| inputs.set_selected(selected));
    }

    /// Apply `update`, recompute constraints, and push them to the endpoint.
    ///
    /// The push happens after the inputs lock is released, so the endpoint may
    /// call back into this transport. When pushes race, a push computed from
    /// older inputs than one already delivered is skipped.
    fn update_constraints<F>(&self, update: F)
    where
        F: FnOnce(&mut ConstraintInputs),
    {
        let (generation, constraints) = {
            let mut inputs = self.constraint_inputs.lock();
            update(&mut inputs);

            let generation = self.constraint_generation.fetch_add(1, Ordering::AcqRel) + 1;
            let mut constraints = inputs.compute(self.constraint_adapter.as_ref());
            // Never a constraint on the endpoint's own video.
            constraints.remove(&self.endpoint_id);
            (generation, constraints)
        };

        if self.constraint_pushed.fetch_max(generation, Ordering::AcqRel) > generation {
            debug!(
                target: "bridge.transport.inbound",
                endpoint_id = %self.endpoint_id,
                generation = generation,
                "Skipping superseded video constraints"
            );
            return;
        }

        debug!(
            target: "bridge.transport.inbound",
            endpoint_id = %self.endpoint_id,
            senders = constraints.len(),
            generation = generation,
            "New video constraints"
        );

        match self.endpoint.upgrade() {
            Some(endpoint) => endpoint.set_sender_constraints(constraints),
            None => debug!(
                target: "bridge.transport.inbound",
                endpoint_id = %self.endpoint_id,
                "Endpoint gone, dropping video constraints"
            ),
        }
    }
}
