//! `scenegeo-engine` – Positioning & Placement
//!
//! Pins geolocated points of interest into a locally tracked AR scene and
//! keeps them there as tracking drifts and better fixes arrive.
//!
//! # Modules
//!
//! - [`estimate`] – [`EstimateBuffer`][estimate::EstimateBuffer]: bounded
//!   history of fix-to-scene pairings, pruned by horizontal distance and
//!   ranked by accuracy then recency.
//! - [`node`] – [`LocationNode`][node::LocationNode]: a placed node with an
//!   optional billboard [`Annotation`][node::Annotation].
//! - [`registry`] – [`NodeRegistry`][registry::NodeRegistry]: flat
//!   collection of nodes with tag lookup.
//! - [`engine`] – [`PositioningEngine`][engine::PositioningEngine]: the
//!   per-tick prune / confirm / place state machine.
//! - [`renderer`] – the [`SceneRenderer`][renderer::SceneRenderer] seam and a
//!   recording stub.
//! - [`tracking`] – the [`PoseSource`][tracking::PoseSource] seam and a
//!   shared simulated pose.
//! - [`config`] – [`EngineConfig`][config::EngineConfig] tuning knobs.

pub mod config;
pub mod engine;
pub mod estimate;
pub mod node;
pub mod registry;
pub mod renderer;
pub mod tracking;

pub use config::{EngineConfig, EstimateMethod};
pub use engine::{HeadingReading, PositioningEngine, TickOutcome};
pub use estimate::{EstimateBuffer, SceneLocationEstimate};
pub use node::{Annotation, LocationNode};
pub use registry::NodeRegistry;
pub use renderer::{RecordingRenderer, SceneRenderer};
pub use tracking::{PoseSource, SharedPose};
