//! Camera tracking seam.
//!
//! A [`PoseSource`] answers, on demand, where the viewer is in the scene
//! frame. [`SharedPose`] is a clonable simulated pose: one clone is handed to
//! the engine while another is moved by a test or demo driver.

use std::sync::{Arc, Mutex, MutexGuard};

use scenegeo_types::ScenePoint;

/// Live viewer pose supplied by the camera/tracking collaborator.
pub trait PoseSource: Send {
    /// Viewer position in the scene frame, or `None` while no tracking frame
    /// is available.
    fn scene_position(&self) -> Option<ScenePoint>;

    /// Viewer orientation as Euler angles (pitch, yaw, roll) in degrees.
    fn euler_angles(&self) -> Option<ScenePoint>;

    /// `true` once the tracker has produced at least one frame.
    fn has_frame(&self) -> bool {
        self.scene_position().is_some()
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct PoseState {
    position: Option<ScenePoint>,
    euler_angles: Option<ScenePoint>,
}

/// Thread-safe simulated pose.
#[derive(Debug, Default, Clone)]
pub struct SharedPose {
    state: Arc<Mutex<PoseState>>,
}

impl SharedPose {
    /// A pose with no tracking frame yet.
    pub fn new() -> Self {
        Self::default()
    }

    /// A pose already tracking at `position`.
    pub fn at(position: ScenePoint) -> Self {
        let pose = Self::new();
        pose.set_position(Some(position));
        pose
    }

    pub fn set_position(&self, position: Option<ScenePoint>) {
        self.lock().position = position;
    }

    pub fn set_euler_angles(&self, angles: Option<ScenePoint>) {
        self.lock().euler_angles = angles;
    }

    fn lock(&self) -> MutexGuard<'_, PoseState> {
        // The state is plain data; a panicked writer cannot leave it torn.
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl PoseSource for SharedPose {
    fn scene_position(&self) -> Option<ScenePoint> {
        self.lock().position
    }

    fn euler_angles(&self) -> Option<ScenePoint> {
        self.lock().euler_angles
    }
}
