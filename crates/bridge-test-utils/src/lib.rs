//! # Bridge Transport Test Utilities
//!
//! Shared test utilities for the endpoint message transport.
//!
//! Mocks for the collaborators the transport only sees through traits, so
//! transport behavior can be tested without a media stack or a conference.
//!
//! ## Modules
//!
//! - `mock_data_channel` - Scriptable data channel (readiness, inbound delivery, send capture)
//! - `mock_endpoint` - Endpoint that records constraint and last-N pushes
//! - `mock_conference` - Conference that records endpoint message deliveries
//! - `fixtures` - A wired-up transport plus recording adapter and event handler
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bridge_test_utils::*;
//!
//! #[tokio::test]
//! async fn test_example() {
//!     let conference = MockConference::builder().local("a").local("b").build();
//!     let t = TestTransport::builder("a").conference(conference).build();
//!
//!     let (socket_id, mut rx) = t.connect_socket();
//!     t.transport.on_receive(InboundSource::Socket(socket_id), r#"{"colibriClass":"ClientHello"}"#);
//! }
//! ```

pub mod fixtures;
pub mod mock_conference;
pub mod mock_data_channel;
pub mod mock_endpoint;

pub use fixtures::*;
pub use mock_conference::*;
pub use mock_data_channel::*;
pub use mock_endpoint::*;
