//! Bridge channel message model.
//!
//! Every control message exchanged with an endpoint is a JSON object whose
//! `colibriClass` field names its kind. [`BridgeMessage`] is the closed set of
//! kinds this layer understands; anything else decodes to
//! [`BridgeMessage::Unknown`] so the router can log and drop it.

use crate::constraints::VideoConstraints;
use crate::errors::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A message carried over the data channel or the signaling socket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "colibriClass")]
pub enum BridgeMessage {
    /// Liveness check from the endpoint.
    #[serde(rename = "ClientHello")]
    ClientHello,

    /// Liveness acknowledgment from the bridge.
    #[serde(rename = "ServerHello")]
    ServerHello {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        version: Option<String>,
    },

    /// Single pinned endpoint (blank or absent clears the pin).
    #[serde(rename = "PinnedEndpointChangedEvent", rename_all = "camelCase")]
    PinnedEndpoint {
        #[serde(default)]
        pinned_endpoint: Option<String>,
    },

    /// Full pinned endpoint set.
    #[serde(rename = "PinnedEndpointsChangedEvent", rename_all = "camelCase")]
    PinnedEndpoints {
        #[serde(default)]
        pinned_endpoints: Vec<String>,
    },

    /// Single selected endpoint (blank or absent clears the selection).
    #[serde(rename = "SelectedEndpointChangedEvent", rename_all = "camelCase")]
    SelectedEndpoint {
        #[serde(default)]
        selected_endpoint: Option<String>,
    },

    /// Full selected endpoint set.
    #[serde(rename = "SelectedEndpointsChangedEvent", rename_all = "camelCase")]
    SelectedEndpoints {
        #[serde(default)]
        selected_endpoints: Vec<String>,
    },

    /// Max frame height the endpoint wants to receive.
    #[serde(rename = "ReceiverVideoConstraint", rename_all = "camelCase")]
    ReceiverVideoConstraint { max_frame_height: i32 },

    /// Last-N setting for the endpoint.
    #[serde(rename = "LastNChangedEvent", rename_all = "camelCase")]
    LastN { last_n: i32 },

    /// Opaque endpoint-to-endpoint message.
    #[serde(rename = "EndpointMessage")]
    EndpointMessage(EndpointMessage),

    /// Dominant speaker notification.
    #[serde(rename = "DominantSpeakerEndpointChangeEvent", rename_all = "camelCase")]
    DominantSpeaker { dominant_speaker_endpoint: String },

    /// Another endpoint's connectivity changed.
    #[serde(rename = "EndpointConnectivityStatusChangeEvent")]
    EndpointConnectivityStatus { endpoint: String, active: bool },

    /// Endpoints currently forwarded to this endpoint.
    #[serde(rename = "LastNEndpointsChangeEvent", rename_all = "camelCase")]
    LastNEndpoints { last_n_endpoints: Vec<String> },

    /// Constraints other endpoints place on this endpoint's video.
    #[serde(rename = "SenderVideoConstraints", rename_all = "camelCase")]
    SenderVideoConstraints { video_constraints: VideoConstraints },

    /// Any `colibriClass` not listed above.
    #[serde(other)]
    Unknown,
}

/// An endpoint-to-endpoint message.
///
/// Only `from` and `to` are interpreted; every other field is carried through
/// untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EndpointMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,

    #[serde(flatten)]
    pub payload: Map<String, Value>,
}

impl EndpointMessage {
    /// Create a message addressed to `to` (`None` broadcasts).
    #[must_use]
    pub fn new(to: Option<&str>, payload: Map<String, Value>) -> Self {
        Self {
            from: None,
            to: to.map(str::to_string),
            payload,
        }
    }

    /// A message without a recipient (absent or blank `to`) is a broadcast.
    #[must_use]
    pub fn is_broadcast(&self) -> bool {
        self.to.as_deref().map_or(true, |to| to.trim().is_empty())
    }
}

/// Message kind, used for counters and as a bounded metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    ClientHello,
    ServerHello,
    PinnedEndpoint,
    PinnedEndpoints,
    SelectedEndpoint,
    SelectedEndpoints,
    ReceiverVideoConstraint,
    LastN,
    EndpointMessage,
    DominantSpeaker,
    EndpointConnectivityStatus,
    LastNEndpoints,
    SenderVideoConstraints,
    Unknown,
}

impl MessageKind {
    /// Number of kinds.
    pub const COUNT: usize = 14;

    /// All kinds, in counter order.
    pub const ALL: [MessageKind; Self::COUNT] = [
        MessageKind::ClientHello,
        MessageKind::ServerHello,
        MessageKind::PinnedEndpoint,
        MessageKind::PinnedEndpoints,
        MessageKind::SelectedEndpoint,
        MessageKind::SelectedEndpoints,
        MessageKind::ReceiverVideoConstraint,
        MessageKind::LastN,
        MessageKind::EndpointMessage,
        MessageKind::DominantSpeaker,
        MessageKind::EndpointConnectivityStatus,
        MessageKind::LastNEndpoints,
        MessageKind::SenderVideoConstraints,
        MessageKind::Unknown,
    ];

    /// The `colibriClass` name of this kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            MessageKind::ClientHello => "ClientHello",
            MessageKind::ServerHello => "ServerHello",
            MessageKind::PinnedEndpoint => "PinnedEndpointChangedEvent",
            MessageKind::PinnedEndpoints => "PinnedEndpointsChangedEvent",
            MessageKind::SelectedEndpoint => "SelectedEndpointChangedEvent",
            MessageKind::SelectedEndpoints => "SelectedEndpointsChangedEvent",
            MessageKind::ReceiverVideoConstraint => "ReceiverVideoConstraint",
            MessageKind::LastN => "LastNChangedEvent",
            MessageKind::EndpointMessage => "EndpointMessage",
            MessageKind::DominantSpeaker => "DominantSpeakerEndpointChangeEvent",
            MessageKind::EndpointConnectivityStatus => "EndpointConnectivityStatusChangeEvent",
            MessageKind::LastNEndpoints => "LastNEndpointsChangeEvent",
            MessageKind::SenderVideoConstraints => "SenderVideoConstraints",
            MessageKind::Unknown => "Unknown",
        }
    }

    /// Position of this kind in [`MessageKind::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl BridgeMessage {
    /// The server's liveness acknowledgment.
    #[must_use]
    pub const fn server_hello() -> Self {
        BridgeMessage::ServerHello { version: None }
    }

    /// The kind of this message.
    #[must_use]
    pub const fn kind(&self) -> MessageKind {
        match self {
            BridgeMessage::ClientHello => MessageKind::ClientHello,
            BridgeMessage::ServerHello { .. } => MessageKind::ServerHello,
            BridgeMessage::PinnedEndpoint { .. } => MessageKind::PinnedEndpoint,
            BridgeMessage::PinnedEndpoints { .. } => MessageKind::PinnedEndpoints,
            BridgeMessage::SelectedEndpoint { .. } => MessageKind::SelectedEndpoint,
            BridgeMessage::SelectedEndpoints { .. } => MessageKind::SelectedEndpoints,
            BridgeMessage::ReceiverVideoConstraint { .. } => MessageKind::ReceiverVideoConstraint,
            BridgeMessage::LastN { .. } => MessageKind::LastN,
            BridgeMessage::EndpointMessage(_) => MessageKind::EndpointMessage,
            BridgeMessage::DominantSpeaker { .. } => MessageKind::DominantSpeaker,
            BridgeMessage::EndpointConnectivityStatus { .. } => {
                MessageKind::EndpointConnectivityStatus
            }
            BridgeMessage::LastNEndpoints { .. } => MessageKind::LastNEndpoints,
            BridgeMessage::SenderVideoConstraints { .. } => MessageKind::SenderVideoConstraints,
            BridgeMessage::Unknown => MessageKind::Unknown,
        }
    }

    /// Encode this message as JSON text.
    pub fn to_json(&self) -> Result<String, TransportError> {
        serde_json::to_string(self).map_err(|e| TransportError::Encode(e.to_string()))
    }
}

/// Decode inbound text into a [`BridgeMessage`].
pub fn decode(text: &str) -> Result<BridgeMessage, TransportError> {
    Ok(serde_json::from_str(text)?)
}
