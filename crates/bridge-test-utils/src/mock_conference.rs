//! Mock conference for endpoint message relay testing.
//!
//! # Example
//!
//! ```rust,ignore
//! use bridge_test_utils::MockConference;
//!
//! let conference = MockConference::builder()
//!     .local("a")
//!     .local("b")
//!     .remote("r")
//!     .build();
//! ```

use bridge_transport::{Conference, EndpointLocation, EndpointMessage};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// One recorded `send_message` call.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub message: EndpointMessage,
    pub targets: Vec<String>,
    pub relay_remote: bool,
}

/// Mock conference.
#[derive(Debug, Default)]
pub struct MockConference {
    /// Local ids in insertion order.
    local: Vec<String>,
    members: HashMap<String, EndpointLocation>,
    expired: AtomicBool,
    deliveries: Mutex<Vec<Delivery>>,
}

impl MockConference {
    /// Create a new MockConference builder.
    #[must_use]
    pub fn builder() -> MockConferenceBuilder {
        MockConferenceBuilder::default()
    }

    /// Upcast for APIs taking `Arc<dyn Conference>`.
    #[must_use]
    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn Conference> {
        Arc::clone(self) as Arc<dyn Conference>
    }

    pub fn expire(&self) {
        self.expired.store(true, Ordering::SeqCst);
    }

    /// Every recorded delivery, oldest first.
    #[must_use]
    pub fn deliveries(&self) -> Vec<Delivery> {
        self.deliveries.lock().clone()
    }
}

impl Conference for MockConference {
    fn local_endpoint_ids(&self) -> Vec<String> {
        self.local.clone()
    }

    fn endpoint(&self, id: &str) -> Option<EndpointLocation> {
        self.members.get(id).copied()
    }

    fn is_expired(&self) -> bool {
        self.expired.load(Ordering::SeqCst)
    }

    fn send_message(&self, message: &EndpointMessage, targets: &[String], relay_remote: bool) {
        self.deliveries.lock().push(Delivery {
            message: message.clone(),
            targets: targets.to_vec(),
            relay_remote,
        });
    }
}

/// Builder for MockConference configuration.
#[derive(Debug, Default)]
pub struct MockConferenceBuilder {
    local: Vec<String>,
    remote: Vec<String>,
    expired: bool,
}

impl MockConferenceBuilder {
    /// Add an endpoint hosted on this bridge.
    #[must_use]
    pub fn local(mut self, id: impl Into<String>) -> Self {
        self.local.push(id.into());
        self
    }

    /// Add an endpoint hosted on another bridge.
    #[must_use]
    pub fn remote(mut self, id: impl Into<String>) -> Self {
        self.remote.push(id.into());
        self
    }

    /// Start out expired.
    #[must_use]
    pub fn expired(mut self) -> Self {
        self.expired = true;
        self
    }

    #[must_use]
    pub fn build(self) -> Arc<MockConference> {
        let members = self
            .local
            .iter()
            .map(|id| (id.clone(), EndpointLocation::Local))
            .chain(
                self.remote
                    .iter()
                    .map(|id| (id.clone(), EndpointLocation::Remote)),
            )
            .collect();

        Arc::new(MockConference {
            local: self.local,
            members,
            expired: AtomicBool::new(self.expired),
            deliveries: Mutex::new(Vec::new()),
        })
    }
}
