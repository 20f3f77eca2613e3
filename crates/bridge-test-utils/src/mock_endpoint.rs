//! Mock endpoint for transport testing.
//!
//! Records every constraint set and last-N value the transport pushes, and can
//! run a hook on each constraint push (for example to call back into the
//! transport the way a real endpoint might).

use bridge_transport::{Conference, Endpoint, VideoConstraints};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Hook run after a constraint push is recorded.
pub type ConstraintsHook = Arc<dyn Fn(&HashMap<String, VideoConstraints>) + Send + Sync>;

/// Mock endpoint owning a transport.
pub struct MockEndpoint {
    id: String,
    conference: Mutex<Option<Arc<dyn Conference>>>,
    constraint_pushes: Mutex<Vec<HashMap<String, VideoConstraints>>>,
    last_n: Mutex<Vec<i32>>,
    constraints_hook: Mutex<Option<ConstraintsHook>>,
}

impl MockEndpoint {
    /// Create an endpoint with no conference.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            conference: Mutex::new(None),
            constraint_pushes: Mutex::new(Vec::new()),
            last_n: Mutex::new(Vec::new()),
            constraints_hook: Mutex::new(None),
        })
    }

    /// Upcast for APIs taking `Arc<dyn Endpoint>`.
    #[must_use]
    pub fn as_dyn(self: &Arc<Self>) -> Arc<dyn Endpoint> {
        Arc::clone(self) as Arc<dyn Endpoint>
    }

    /// Attach (or detach, with `None`) the endpoint's conference.
    pub fn set_conference(&self, conference: Option<Arc<dyn Conference>>) {
        *self.conference.lock() = conference;
    }

    /// Run `hook` on every subsequent constraint push.
    pub fn on_constraints(&self, hook: ConstraintsHook) {
        *self.constraints_hook.lock() = Some(hook);
    }

    /// Every constraint set pushed, oldest first.
    #[must_use]
    pub fn constraint_pushes(&self) -> Vec<HashMap<String, VideoConstraints>> {
        self.constraint_pushes.lock().clone()
    }

    /// The most recent constraint push.
    #[must_use]
    pub fn last_constraints(&self) -> Option<HashMap<String, VideoConstraints>> {
        self.constraint_pushes.lock().last().cloned()
    }

    /// Every last-N value pushed, oldest first.
    #[must_use]
    pub fn last_n_values(&self) -> Vec<i32> {
        self.last_n.lock().clone()
    }
}

impl Endpoint for MockEndpoint {
    fn id(&self) -> &str {
        &self.id
    }

    fn conference(&self) -> Option<Arc<dyn Conference>> {
        self.conference.lock().clone()
    }

    fn set_sender_constraints(&self, constraints: HashMap<String, VideoConstraints>) {
        self.constraint_pushes.lock().push(constraints.clone());

        // Cloned out so the hook may re-enter this endpoint.
        let hook = self.constraints_hook.lock().clone();
        if let Some(hook) = hook {
            hook(&constraints);
        }
    }

    fn set_last_n(&self, last_n: i32) {
        self.last_n.lock().push(last_n);
    }
}
