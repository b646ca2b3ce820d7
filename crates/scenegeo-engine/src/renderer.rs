//! Scene-graph seam.
//!
//! The engine never touches a scene graph directly. It asks a
//! [`SceneRenderer`] to attach, detach and move nodes, and to rotate the
//! scene root. [`RecordingRenderer`] is an in-process stub that records
//! every request so the full engine can run in headless tests.

use std::collections::HashMap;
use std::time::Duration;

use scenegeo_types::{NodeId, NodeTransform};

/// A scene graph that can display [`LocationNode`][crate::node::LocationNode]s.
pub trait SceneRenderer: Send {
    /// Insert the node into the scene graph.
    fn attach(&mut self, node: NodeId);

    /// Remove the node from the scene graph. Unknown ids are ignored.
    fn detach(&mut self, node: NodeId);

    /// Apply a complete transform atomically, animating over `animation`
    /// (`Duration::ZERO` for an instant change).
    fn apply_transform(&mut self, node: NodeId, transform: &NodeTransform, animation: Duration);

    /// Rotate the scene root about the vertical axis, in degrees.
    fn set_scene_yaw(&mut self, yaw_deg: f64);
}

impl<R: SceneRenderer + ?Sized> SceneRenderer for Box<R> {
    fn attach(&mut self, node: NodeId) {
        (**self).attach(node);
    }

    fn detach(&mut self, node: NodeId) {
        (**self).detach(node);
    }

    fn apply_transform(&mut self, node: NodeId, transform: &NodeTransform, animation: Duration) {
        (**self).apply_transform(node, transform, animation);
    }

    fn set_scene_yaw(&mut self, yaw_deg: f64) {
        (**self).set_scene_yaw(yaw_deg);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Stub renderer
// ────────────────────────────────────────────────────────────────────────────

/// Records the most recent state of every attached node. Always succeeds.
#[derive(Debug, Default)]
pub struct RecordingRenderer {
    attached: HashMap<NodeId, Option<(NodeTransform, Duration)>>,
    scene_yaw: Option<f64>,
    transforms_applied: usize,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_attached(&self, node: NodeId) -> bool {
        self.attached.contains_key(&node)
    }

    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    pub fn last_transform(&self, node: NodeId) -> Option<NodeTransform> {
        self.attached.get(&node).copied().flatten().map(|(t, _)| t)
    }

    pub fn last_animation(&self, node: NodeId) -> Option<Duration> {
        self.attached.get(&node).copied().flatten().map(|(_, d)| d)
    }

    /// Yaw most recently set on the scene root, if any.
    pub fn scene_yaw(&self) -> Option<f64> {
        self.scene_yaw
    }

    /// Total number of transform updates received.
    pub fn transforms_applied(&self) -> usize {
        self.transforms_applied
    }
}

impl SceneRenderer for RecordingRenderer {
    fn attach(&mut self, node: NodeId) {
        self.attached.entry(node).or_insert(None);
    }

    fn detach(&mut self, node: NodeId) {
        self.attached.remove(&node);
    }

    fn apply_transform(&mut self, node: NodeId, transform: &NodeTransform, animation: Duration) {
        self.transforms_applied += 1;
        if let Some(slot) = self.attached.get_mut(&node) {
            *slot = Some((*transform, animation));
        }
    }

    fn set_scene_yaw(&mut self, yaw_deg: f64) {
        self.scene_yaw = Some(yaw_deg);
    }
}
