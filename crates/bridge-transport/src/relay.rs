//! Endpoint-to-endpoint message routing.
//!
//! An endpoint message goes either to one named recipient or, when it has no
//! recipient, to every other member of the conference. This module only
//! decides the targets; the conference does the delivery.

use crate::conference::{Conference, EndpointLocation};
use crate::messages::EndpointMessage;
use crate::observability;
use std::sync::Arc;
use tracing::{debug, warn};

/// Where an endpoint message went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// All other local endpoints plus the remote-bridge relay.
    Broadcast { targets: Vec<String> },
    /// A single local endpoint.
    Local { target: String },
    /// The remote-bridge relay only.
    Remote,
    /// Recipient is not in the conference; nothing was delivered.
    UnknownTarget(String),
    /// No live conference; nothing was delivered.
    NoConference,
}

impl Route {
    /// Returns a bounded label for metrics (`route`).
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Route::Broadcast { .. } => "broadcast",
            Route::Local { .. } => "unicast",
            Route::Remote => "remote",
            Route::UnknownTarget(_) => "unknown_target",
            Route::NoConference => "no_conference",
        }
    }

    /// Local targets and whether the relay is involved, if anything is delivered.
    #[must_use]
    pub fn delivery(&self) -> Option<(Vec<String>, bool)> {
        match self {
            Route::Broadcast { targets } => Some((targets.clone(), true)),
            Route::Local { target } => Some((vec![target.clone()], false)),
            Route::Remote => Some((Vec::new(), true)),
            Route::UnknownTarget(_) | Route::NoConference => None,
        }
    }
}

/// Decide the route for `message` sent by `sender_id` within `conference`.
#[must_use]
pub fn resolve(sender_id: &str, conference: &dyn Conference, message: &EndpointMessage) -> Route {
    if message.is_broadcast() {
        let targets = conference
            .local_endpoint_ids()
            .into_iter()
            .filter(|id| id != sender_id)
            .collect();
        return Route::Broadcast { targets };
    }

    let to = message.to.clone().unwrap_or_default();
    match conference.endpoint(&to) {
        Some(EndpointLocation::Remote) => Route::Remote,
        Some(EndpointLocation::Local) => Route::Local { target: to },
        None => Route::UnknownTarget(to),
    }
}

/// Routes endpoint messages sent by one endpoint.
#[derive(Debug, Clone)]
pub struct EndpointMessageRelay {
    endpoint_id: String,
}

impl EndpointMessageRelay {
    #[must_use]
    pub fn new(endpoint_id: impl Into<String>) -> Self {
        Self {
            endpoint_id: endpoint_id.into(),
        }
    }

    /// Stamp the sender, resolve targets, and hand the message to the conference.
    pub fn route(
        &self,
        conference: Option<Arc<dyn Conference>>,
        mut message: EndpointMessage,
    ) -> Route {
        // Always overwrite: an endpoint may not speak for another.
        message.from = Some(self.endpoint_id.clone());

        let route = match conference.as_deref() {
            Some(conference) if !conference.is_expired() => {
                let route = resolve(&self.endpoint_id, conference, &message);
                if let Some((targets, relay_remote)) = route.delivery() {
                    debug!(
                        target: "bridge.transport.relay",
                        endpoint_id = %self.endpoint_id,
                        route = route.label(),
                        targets = targets.len(),
                        relay_remote = relay_remote,
                        "Relaying endpoint message"
                    );
                    conference.send_message(&message, &targets, relay_remote);
                }
                route
            }
            _ => Route::NoConference,
        };

        match &route {
            Route::NoConference => warn!(
                target: "bridge.transport.relay",
                endpoint_id = %self.endpoint_id,
                "Unable to send EndpointMessage, conference is missing or expired"
            ),
            Route::UnknownTarget(to) => warn!(
                target: "bridge.transport.relay",
                endpoint_id = %self.endpoint_id,
                to = %to,
                "Unable to find endpoint to send EndpointMessage to"
            ),
            _ => {}
        }

        observability::record_endpoint_message_routed(route.label());
        route
    }
}
