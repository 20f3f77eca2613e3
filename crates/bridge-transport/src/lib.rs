//! Bridge Endpoint Message Transport Library
//!
//! Per-endpoint control-message transport for the media bridge. Each endpoint
//! in a conference can exchange JSON control messages with the bridge over
//! two interchangeable channels:
//!
//! - The in-band data channel carried by the media transport
//! - A signaling socket the client opens separately
//!
//! # Architecture
//!
//! ```text
//! EndpointMessageTransport (one per endpoint)
//! ├── ChannelRegistry (socket slot, weak data channel slot, last-active flag)
//! │   └── arbiter::select (which channel outbound messages use)
//! ├── OutboundDispatcher (best-effort send, per-kind and dropped counters)
//! ├── router (inbound decode + dispatch by colibriClass)
//! │   ├── ConstraintInputs -> ConstraintAdapter -> Endpoint::set_sender_constraints
//! │   └── EndpointMessageRelay -> Conference::send_message
//! └── TransportStatistics (bridge-wide, shared by every transport)
//! ```
//!
//! # Key Design Decisions
//!
//! - **Prefer the channel last heard from**: Falls back to the other one if
//!   the preferred channel is unusable
//! - **Best-effort sends**: Nothing is queued or retried; drops are counted
//! - **Weak data channel**: The media transport owns it; the transport never
//!   extends its lifetime
//! - **Replies on the request's channel**: Not on the arbiter's pick
//!
//! # Modules
//!
//! - [`channels`] - Socket and data channel contracts, slots, and selection
//! - [`config`] - Transport configuration from environment
//! - [`constraints`] - Video constraint inputs and adapters
//! - [`errors`] - Error types
//! - [`messages`] - Wire message model and codec
//! - [`observability`] - Prometheus metrics and shared statistics

pub mod channels;
pub mod conference;
pub mod config;
pub mod constraints;
pub mod dispatcher;
pub mod errors;
pub mod messages;
pub mod observability;
pub mod relay;
pub mod router;
pub mod transport;

pub use channels::{
    ActiveChannel, ChannelKind, DataChannel, DataChannelMessage, LastActive, SocketChannel,
    SocketFrame, SocketHandle, SocketId, SocketReceiver,
};
pub use conference::{Conference, Endpoint, EndpointLocation, TransportEventHandler};
pub use config::{ConfigError, TransportConfig};
pub use constraints::{CompatibilityAdapter, ConstraintAdapter, VideoConstraints};
pub use errors::TransportError;
pub use messages::{BridgeMessage, EndpointMessage, MessageKind};
pub use observability::TransportStatistics;
pub use relay::Route;
pub use router::InboundSource;
pub use transport::{DebugState, EndpointMessageTransport};
