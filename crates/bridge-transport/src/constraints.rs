//! Receiver-side video constraint inputs and the compatibility adapter.
//!
//! Endpoints still speak the legacy pin/select/max-height messages. Each
//! transport keeps the last value of each input in [`ConstraintInputs`]; a
//! [`ConstraintAdapter`] turns those inputs into per-sender constraints.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap, HashSet};

/// Above this max frame height the receiver is assumed to be in stage view.
pub const STAGE_VIEW_HEIGHT_THRESHOLD: i32 = 180;

/// Preferred height for a selected endpoint in stage view.
pub const SELECTED_PREFERRED_HEIGHT: i32 = 360;

/// Preferred frame rate for a selected endpoint in stage view.
pub const SELECTED_PREFERRED_FPS: f64 = 30.0;

/// Video constraints a receiver places on one sender.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VideoConstraints {
    pub ideal_height: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_height: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preferred_fps: Option<f64>,
}

impl VideoConstraints {
    /// Constraints with only an ideal height.
    #[must_use]
    pub const fn ideal(ideal_height: i32) -> Self {
        Self {
            ideal_height,
            preferred_height: None,
            preferred_fps: None,
        }
    }
}

/// Merges pin/select/max-height inputs into constraints keyed by sender id.
///
/// Implementations must be pure: same inputs, same output.
pub trait ConstraintAdapter: Send + Sync {
    fn compute(
        &self,
        pinned: &HashSet<String>,
        selected: &HashSet<String>,
        max_frame_height: i32,
    ) -> HashMap<String, VideoConstraints>;
}

/// Default adapter.
///
/// Selected endpoints win over pinned ones. In stage view a selected
/// endpoint also gets a preferred height and frame rate.
#[derive(Debug, Default, Clone, Copy)]
pub struct CompatibilityAdapter;

impl ConstraintAdapter for CompatibilityAdapter {
    fn compute(
        &self,
        pinned: &HashSet<String>,
        selected: &HashSet<String>,
        max_frame_height: i32,
    ) -> HashMap<String, VideoConstraints> {
        let mut constraints: HashMap<String, VideoConstraints> = pinned
            .iter()
            .map(|id| (id.clone(), VideoConstraints::ideal(max_frame_height)))
            .collect();

        let selected_constraints = if max_frame_height > STAGE_VIEW_HEIGHT_THRESHOLD {
            VideoConstraints {
                ideal_height: max_frame_height,
                preferred_height: Some(SELECTED_PREFERRED_HEIGHT),
                preferred_fps: Some(SELECTED_PREFERRED_FPS),
            }
        } else {
            VideoConstraints::ideal(max_frame_height)
        };

        for id in selected {
            constraints.insert(id.clone(), selected_constraints);
        }

        constraints
    }
}

/// Last received pin/select/max-height inputs for one endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstraintInputs {
    pinned: HashSet<String>,
    selected: HashSet<String>,
    max_frame_height: i32,
}

/// Serializable view of [`ConstraintInputs`] for debug state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintInputsSnapshot {
    pub pinned_endpoints: BTreeSet<String>,
    pub selected_endpoints: BTreeSet<String>,
    pub max_frame_height: i32,
}

impl ConstraintInputs {
    #[must_use]
    pub fn new(max_frame_height: i32) -> Self {
        Self {
            pinned: HashSet::new(),
            selected: HashSet::new(),
            max_frame_height,
        }
    }

    pub fn set_pinned(&mut self, pinned: HashSet<String>) {
        self.pinned = pinned;
    }

    pub fn set_selected(&mut self, selected: HashSet<String>) {
        self.selected = selected;
    }

    pub fn set_max_frame_height(&mut self, max_frame_height: i32) {
        self.max_frame_height = max_frame_height;
    }

    #[must_use]
    pub fn pinned(&self) -> &HashSet<String> {
        &self.pinned
    }

    #[must_use]
    pub fn selected(&self) -> &HashSet<String> {
        &self.selected
    }

    #[must_use]
    pub fn max_frame_height(&self) -> i32 {
        self.max_frame_height
    }

    /// Run `adapter` over the current inputs.
    #[must_use]
    pub fn compute(&self, adapter: &dyn ConstraintAdapter) -> HashMap<String, VideoConstraints> {
        adapter.compute(&self.pinned, &self.selected, self.max_frame_height)
    }

    #[must_use]
    pub fn snapshot(&self) -> ConstraintInputsSnapshot {
        ConstraintInputsSnapshot {
            pinned_endpoints: self.pinned.iter().cloned().collect(),
            selected_endpoints: self.selected.iter().cloned().collect(),
            max_frame_height: self.max_frame_height,
        }
    }
}

/// Turn a single optional id into a set; blank ids clear the set.
#[must_use]
pub fn single_id_set(id: Option<&str>) -> HashSet<String> {
    match id {
        Some(id) if !id.trim().is_empty() => HashSet::from([id.to_string()]),
        _ => HashSet::new(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn set(ids: &[&str]) -> HashSet<String> {
        ids.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_empty_inputs_produce_no_constraints() {
        let result = CompatibilityAdapter.compute(&HashSet::new(), &HashSet::new(), 720);
        assert!(result.is_empty());
    }

    #[test]
    fn test_pinned_get_ideal_height() {
        let result = CompatibilityAdapter.compute(&set(&["a", "b"]), &HashSet::new(), 720);

        assert_eq!(result.len(), 2);
        assert_eq!(result.get("a"), Some(&VideoConstraints::ideal(720)));
        assert_eq!(result.get("b"), Some(&VideoConstraints::ideal(720)));
    }

    #[test]
    fn test_selected_in_stage_view_gets_preferred() {
        let result = CompatibilityAdapter.compute(&set(&["a"]), &set(&["a", "c"]), 1080);

        let expected = VideoConstraints {
            ideal_height: 1080,
            preferred_height: Some(SELECTED_PREFERRED_HEIGHT),
            preferred_fps: Some(SELECTED_PREFERRED_FPS),
        };
        assert_eq!(result.get("a"), Some(&expected));
        assert_eq!(result.get("c"), Some(&expected));
    }

    #[test]
    fn test_selected_in_tile_view_gets_ideal_only() {
        let result =
            CompatibilityAdapter.compute(&HashSet::new(), &set(&["a"]), STAGE_VIEW_HEIGHT_THRESHOLD);
        assert_eq!(
            result.get("a"),
            Some(&VideoConstraints::ideal(STAGE_VIEW_HEIGHT_THRESHOLD))
        );
    }

    #[test]
    fn test_single_id_set_normalizes_blank() {
        assert!(single_id_set(None).is_empty());
        assert!(single_id_set(Some("")).is_empty());
        assert!(single_id_set(Some("   ")).is_empty());
        assert_eq!(single_id_set(Some("b")), set(&["b"]));
    }

    #[test]
    fn test_inputs_last_write_wins() {
        let mut inputs = ConstraintInputs::new(2160);
        inputs.set_pinned(set(&["a"]));
        inputs.set_pinned(set(&["b", "c"]));
        inputs.set_max_frame_height(360);
        inputs.set_max_frame_height(180);

        assert_eq!(inputs.pinned(), &set(&["b", "c"]));
        assert!(inputs.selected().is_empty());
        assert_eq!(inputs.max_frame_height(), 180);
    }

    #[test]
    fn test_snapshot_serializes_sorted() {
        let mut inputs = ConstraintInputs::new(720);
        inputs.set_selected(set(&["z", "a"]));

        let json = serde_json::to_value(inputs.snapshot()).unwrap();
        assert_eq!(json["selectedEndpoints"], serde_json::json!(["a", "z"]));
        assert_eq!(json["pinnedEndpoints"], serde_json::json!([]));
        assert_eq!(json["maxFrameHeight"], 720);
    }
}
