//! Pre-wired transport fixtures.
//!
//! Provides:
//! - A recording constraint adapter (counts recomputes, keeps inputs)
//! - A recording transport event handler
//! - [`TestTransport`], a transport wired to a mock endpoint

use crate::mock_conference::MockConference;
use crate::mock_endpoint::MockEndpoint;
use bridge_transport::channels::SocketChannel;
use bridge_transport::constraints::{CompatibilityAdapter, ConstraintAdapter};
use bridge_transport::{
    EndpointMessageTransport, SocketFrame, SocketId, SocketReceiver, TransportConfig,
    TransportEventHandler, TransportStatistics, VideoConstraints,
};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Inputs of one recompute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterCall {
    pub pinned: HashSet<String>,
    pub selected: HashSet<String>,
    pub max_frame_height: i32,
}

/// Delegates to [`CompatibilityAdapter`] and records each call.
#[derive(Debug, Default)]
pub struct RecordingAdapter {
    calls: Mutex<Vec<AdapterCall>>,
}

impl RecordingAdapter {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    #[must_use]
    pub fn calls(&self) -> Vec<AdapterCall> {
        self.calls.lock().clone()
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

impl ConstraintAdapter for RecordingAdapter {
    fn compute(
        &self,
        pinned: &HashSet<String>,
        selected: &HashSet<String>,
        max_frame_height: i32,
    ) -> HashMap<String, VideoConstraints> {
        self.calls.lock().push(AdapterCall {
            pinned: pinned.clone(),
            selected: selected.clone(),
            max_frame_height,
        });
        CompatibilityAdapter.compute(pinned, selected, max_frame_height)
    }
}

/// Records `transport_connected` notifications.
#[derive(Debug, Default)]
pub struct RecordingEventHandler {
    connected: Mutex<Vec<String>>,
}

impl RecordingEventHandler {
    #[must_use]
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Endpoint ids notified, oldest first.
    #[must_use]
    pub fn connected(&self) -> Vec<String> {
        self.connected.lock().clone()
    }

    #[must_use]
    pub fn connected_count(&self) -> usize {
        self.connected.lock().len()
    }
}

impl TransportEventHandler for RecordingEventHandler {
    fn transport_connected(&self, endpoint_id: &str) {
        self.connected.lock().push(endpoint_id.to_string());
    }
}

/// A transport plus every collaborator, all observable.
pub struct TestTransport {
    pub transport: Arc<EndpointMessageTransport>,
    pub endpoint: Arc<MockEndpoint>,
    pub events: Arc<RecordingEventHandler>,
    pub adapter: Arc<RecordingAdapter>,
    pub statistics: Arc<TransportStatistics>,
    pub config: TransportConfig,
}

impl TestTransport {
    /// Create a new TestTransport builder for endpoint `id`.
    #[must_use]
    pub fn builder(id: impl Into<String>) -> TestTransportBuilder {
        TestTransportBuilder {
            id: id.into(),
            conference: None,
            statistics: None,
            config: TransportConfig::default(),
        }
    }

    /// A transport for `id` with defaults and no conference.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self::builder(id).build()
    }

    /// Install a fresh socket. Returns its id and the wire end.
    #[must_use]
    pub fn connect_socket(&self) -> (SocketId, SocketReceiver) {
        let (handle, rx) = self.transport.new_socket();
        let id = handle.id();
        self.transport.install_socket(Arc::new(handle));
        (id, rx)
    }
}

/// Builder for [`TestTransport`].
pub struct TestTransportBuilder {
    id: String,
    conference: Option<Arc<MockConference>>,
    statistics: Option<Arc<TransportStatistics>>,
    config: TransportConfig,
}

impl TestTransportBuilder {
    /// Put the endpoint in `conference`.
    #[must_use]
    pub fn conference(mut self, conference: Arc<MockConference>) -> Self {
        self.conference = Some(conference);
        self
    }

    /// Share statistics with other transports.
    #[must_use]
    pub fn statistics(mut self, statistics: Arc<TransportStatistics>) -> Self {
        self.statistics = Some(statistics);
        self
    }

    #[must_use]
    pub fn config(mut self, config: TransportConfig) -> Self {
        self.config = config;
        self
    }

    #[must_use]
    pub fn build(self) -> TestTransport {
        let endpoint = MockEndpoint::new(self.id);
        if let Some(conference) = &self.conference {
            endpoint.set_conference(Some(conference.as_dyn()));
        }

        let events = RecordingEventHandler::new();
        let adapter = RecordingAdapter::new();
        let statistics = self.statistics.unwrap_or_else(TransportStatistics::new);

        let transport = EndpointMessageTransport::new(
            &endpoint.as_dyn(),
            Arc::clone(&events) as Arc<dyn TransportEventHandler>,
            Arc::clone(&statistics),
            self.config.clone(),
        )
        .with_constraint_adapter(Arc::clone(&adapter) as Arc<dyn ConstraintAdapter>);

        TestTransport {
            transport: Arc::new(transport),
            endpoint,
            events,
            adapter,
            statistics,
            config: self.config,
        }
    }
}

/// Drain every text frame already queued on `rx`, parsed as JSON.
///
/// # Panics
///
/// Panics if a queued text frame is not JSON.
pub fn drain_json(rx: &mut SocketReceiver) -> Vec<serde_json::Value> {
    std::iter::from_fn(|| rx.try_recv())
        .filter_map(|frame| match frame {
            SocketFrame::Text(text) => {
                Some(serde_json::from_str(&text).expect("socket text is not JSON"))
            }
            SocketFrame::Close { .. } => None,
        })
        .collect()
}
