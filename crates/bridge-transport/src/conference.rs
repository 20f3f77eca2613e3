//! Contracts the transport needs from the rest of the bridge.
//!
//! The endpoint registry, conference bookkeeping, and remote-bridge relay
//! live elsewhere; this layer only sees them through these traits.

use crate::constraints::VideoConstraints;
use crate::messages::EndpointMessage;
use std::collections::HashMap;
use std::sync::Arc;

/// Where a conference member is hosted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndpointLocation {
    /// Connected to this bridge instance.
    Local,
    /// Connected to another bridge in a cascade; reached through the relay.
    Remote,
}

/// The endpoint that owns a transport.
pub trait Endpoint: Send + Sync {
    fn id(&self) -> &str;

    /// The endpoint's conference, if it still belongs to one.
    fn conference(&self) -> Option<Arc<dyn Conference>>;

    /// Replace the constraints this endpoint places on other senders.
    fn set_sender_constraints(&self, constraints: HashMap<String, VideoConstraints>);

    fn set_last_n(&self, last_n: i32);
}

/// A conference as seen by the endpoint message relay.
pub trait Conference: Send + Sync {
    /// Ids of every endpoint hosted on this bridge.
    fn local_endpoint_ids(&self) -> Vec<String>;

    /// Look up a member by id.
    fn endpoint(&self, id: &str) -> Option<EndpointLocation>;

    fn is_expired(&self) -> bool;

    /// Deliver `message` to each local target and, if `relay_remote`, to the
    /// remote-bridge relay.
    fn send_message(&self, message: &EndpointMessage, targets: &[String], relay_remote: bool);
}

/// Notified when a transport gains a usable channel.
pub trait TransportEventHandler: Send + Sync {
    fn transport_connected(&self, endpoint_id: &str);
}
