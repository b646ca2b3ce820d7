//! [`PositioningEngine`] – keeps geolocated nodes pinned to the AR scene.
//!
//! The engine reconciles two coordinate systems that drift apart over time:
//! geodetic fixes from the location sensor and the locally tracked scene
//! frame. Every fix is paired with the scene position the viewer held when
//! it arrived (an estimate). Each [`tick`][PositioningEngine::tick] then:
//!
//! 1. reads the viewer's scene position from a [`PoseSource`]; without one
//!    the tick is skipped and nothing changes,
//! 2. prunes estimates recorded beyond the scene limit,
//! 3. confirms provisional nodes the viewer has walked away from,
//! 4. recomputes position and scale of every auto-updating node.
//!
//! Nodes farther than the scene limit are pulled in to the limit and scaled
//! down by the same factor, so they render at the right angular size without
//! leaving the tracked volume.
//!
//! All methods run on the caller's context. The engine never blocks and
//! never retries; hosts that receive sensor callbacks on other threads
//! marshal them through `scenegeo-runtime`'s session loop.
//!
//! # Example
//!
//! ```rust
//! use scenegeo_engine::{EngineConfig, LocationNode, PositioningEngine, RecordingRenderer, SharedPose};
//! use scenegeo_geodesy::destination;
//! use scenegeo_middleware::EventBus;
//! use scenegeo_types::{GeoCoordinate, ScenePoint};
//!
//! let pose = SharedPose::at(ScenePoint::zero());
//! let mut engine =
//!     PositioningEngine::new(EngineConfig::default(), RecordingRenderer::new(), EventBus::default()).unwrap();
//!
//! let here = GeoCoordinate::new(48.8584, 2.2945, 0.0).unwrap().with_accuracy(5.0, 5.0);
//! engine.on_location_fix(&pose, here).unwrap();
//!
//! // A landmark 500 m north is drawn 100 units ahead at a fifth of its size.
//! let landmark = destination(&here, 0.0, 500.0);
//! let id = engine.add_node_with_confirmed_location(&pose, LocationNode::new(Some(landmark))).unwrap();
//! let node = engine.node(id).unwrap();
//! assert!((node.position().z + 100.0).abs() < 0.1);
//! assert!((node.scale().x - 0.2).abs() < 1e-3);
//! ```

use std::time::Duration;

use scenegeo_geodesy::{angle_delta, distance_3d, translation};
use scenegeo_middleware::{EventBus, Topic};
use scenegeo_types::{
    Event, EventPayload, EvictionReason, GeoCoordinate, NodeId, NodeTransform, SceneError,
    ScenePoint, TrackingState,
};
use tracing::{debug, info, trace, warn};

use crate::config::{EngineConfig, EstimateMethod};
use crate::estimate::{EstimateBuffer, SceneLocationEstimate};
use crate::node::LocationNode;
use crate::registry::NodeRegistry;
use crate::renderer::SceneRenderer;
use crate::tracking::PoseSource;

/// Event sources stamped on published events.
const SOURCE_ESTIMATES: &str = "scenegeo-engine::estimates";
const SOURCE_NODES: &str = "scenegeo-engine::nodes";
const SOURCE_SESSION: &str = "scenegeo-engine::session";
const SOURCE_DIAGNOSTICS: &str = "scenegeo-engine::diagnostics";

/// Ratio between a billboard's size and how far its pivot is lowered.
const PIVOT_DROP_FACTOR: f64 = 1.1;

/// A compass reading from the heading collaborator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeadingReading {
    /// Degrees clockwise from north.
    pub degrees: f64,
    /// Accuracy in degrees; negative means magnetic-only and unreliable.
    pub accuracy: f64,
}

impl HeadingReading {
    pub fn is_reliable(&self) -> bool {
        self.accuracy >= 0.0 && self.degrees.is_finite()
    }
}

/// What a call to [`PositioningEngine::tick`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No scene position was available; nothing changed.
    Skipped,
    Completed {
        /// Estimates removed for being out of range.
        pruned: usize,
        /// Provisional nodes confirmed this tick.
        confirmed: usize,
        /// Nodes whose transform was recomputed.
        updated: usize,
    },
}

pub struct PositioningEngine<R: SceneRenderer> {
    config: EngineConfig,
    estimates: EstimateBuffer,
    registry: NodeRegistry,
    renderer: R,
    bus: EventBus,
    scene_root_established: bool,
    did_fetch_initial_location: bool,
    last_fix: Option<GeoCoordinate>,
    last_heading: Option<HeadingReading>,
    tracking_state: Option<TrackingState>,
}

impl<R: SceneRenderer> PositioningEngine<R> {
    /// Build an engine drawing into `renderer` and reporting on `bus`.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::Config`] if `config` fails validation.
    pub fn new(config: EngineConfig, renderer: R, bus: EventBus) -> Result<Self, SceneError> {
        config.validate()?;
        Ok(Self {
            estimates: EstimateBuffer::new(config.estimate_capacity),
            config,
            registry: NodeRegistry::new(),
            renderer,
            bus,
            scene_root_established: false,
            did_fetch_initial_location: false,
            last_fix: None,
            last_heading: None,
            tracking_state: None,
        })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Sensor input
    // ────────────────────────────────────────────────────────────────────────

    /// Accept a geodetic fix. When the viewer's scene position is known the
    /// fix is paired with it and recorded as an estimate.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidCoordinate`] for out-of-range fixes; they
    /// are reported as a diagnostic and otherwise ignored.
    pub fn on_location_fix(
        &mut self,
        pose: &dyn PoseSource,
        fix: GeoCoordinate,
    ) -> Result<(), SceneError> {
        if !fix.is_valid() {
            warn!(
                latitude = fix.latitude,
                longitude = fix.longitude,
                "Rejected invalid location fix"
            );
            self.publish(
                Topic::Diagnostics,
                EventPayload::SensorFault {
                    component: "location".into(),
                    message: format!(
                        "invalid fix lat {} lon {}",
                        fix.latitude, fix.longitude
                    ),
                },
            );
            return Err(SceneError::InvalidCoordinate {
                latitude: fix.latitude,
                longitude: fix.longitude,
            });
        }

        self.last_fix = Some(fix);
        if let Some(position) = pose.scene_position() {
            self.record_estimate(fix, position);
        }
        Ok(())
    }

    /// Accept a compass reading. A reliable heading within the configured
    /// tolerance of north resets the scene yaw; returns whether it did.
    pub fn on_heading(&mut self, reading: HeadingReading) -> bool {
        if !reading.is_reliable() {
            trace!(heading = reading.degrees, "Ignoring unreliable heading");
            return false;
        }
        self.last_heading = Some(reading);

        if angle_delta(reading.degrees, 0.0).abs() <= self.config.heading_reset_tolerance_deg {
            self.reset_yaw(reading.degrees);
            true
        } else {
            false
        }
    }

    /// Called once per rendered camera frame.
    ///
    /// Establishes the scene root on the first frame and, the first time a
    /// tracking frame and a fix coexist, records the initial estimate.
    pub fn on_frame_rendered(&mut self, pose: &dyn PoseSource) {
        self.ensure_scene_root();

        if self.did_fetch_initial_location {
            return;
        }
        if let (Some(fix), Some(position)) = (self.last_fix, pose.scene_position()) {
            debug!("Captured initial fix-to-scene pairing");
            self.record_estimate(fix, position);
        }
    }

    /// Republish a tracking-quality change. Repeats of the current state are
    /// dropped; returns whether the state changed.
    pub fn report_tracking_state(&mut self, state: TrackingState) -> bool {
        if self.tracking_state == Some(state) {
            return false;
        }
        match state {
            TrackingState::Normal => info!("Tracking normal"),
            TrackingState::Limited(reason) => warn!(?reason, "Tracking limited"),
            TrackingState::NotAvailable => warn!("Tracking not available"),
        }
        self.tracking_state = Some(state);
        self.publish(Topic::Diagnostics, EventPayload::TrackingStateChanged { state });
        true
    }

    /// Republish a sensor or session failure reported by the host.
    pub fn report_sensor_fault(&mut self, component: &str, message: &str) {
        warn!(component, message, "Sensor fault");
        self.publish(
            Topic::Diagnostics,
            EventPayload::SensorFault {
                component: component.to_string(),
                message: message.to_string(),
            },
        );
    }

    // ────────────────────────────────────────────────────────────────────────
    // Queries
    // ────────────────────────────────────────────────────────────────────────

    pub fn current_scene_position(&self, pose: &dyn PoseSource) -> Option<ScenePoint> {
        pose.scene_position()
    }

    /// Viewer orientation as Euler angles in degrees.
    pub fn current_orientation(&self, pose: &dyn PoseSource) -> Option<ScenePoint> {
        pose.euler_angles()
    }

    /// The most accurate live estimate.
    pub fn best_estimate(&self) -> Option<SceneLocationEstimate> {
        self.estimates.best().copied()
    }

    /// Where the device is right now.
    ///
    /// With [`EstimateMethod::SensorOnly`] this is the latest fix. Otherwise
    /// it is the best estimate walked to the viewer's current scene position;
    /// `None` if either is missing.
    pub fn current_location(&self, pose: &dyn PoseSource) -> Option<GeoCoordinate> {
        current_location(
            self.config.estimate_method,
            self.last_fix,
            self.estimates.best(),
            pose.scene_position(),
        )
    }

    /// The coordinate the engine currently attributes to a node.
    ///
    /// # Errors
    ///
    /// [`SceneError::NodeNotFound`] for unknown ids,
    /// [`SceneError::MissingLocation`] if nothing is known about the node's
    /// whereabouts yet.
    pub fn location_of_node(&self, id: NodeId) -> Result<GeoCoordinate, SceneError> {
        let node = self.registry.get(id).ok_or(SceneError::NodeNotFound(id))?;
        effective_location(self.config.estimate_method, self.estimates.best(), node)
            .ok_or(SceneError::MissingLocation(id))
    }

    pub fn last_heading(&self) -> Option<HeadingReading> {
        self.last_heading
    }

    pub fn tracking_state(&self) -> Option<TrackingState> {
        self.tracking_state
    }

    pub fn is_scene_root_established(&self) -> bool {
        self.scene_root_established
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn estimates(&self) -> &EstimateBuffer {
        &self.estimates
    }

    pub fn registry(&self) -> &NodeRegistry {
        &self.registry
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // ────────────────────────────────────────────────────────────────────────
    // Node commands
    // ────────────────────────────────────────────────────────────────────────

    /// Drop a node at the viewer's live position.
    ///
    /// The node is provisional and will be confirmed once the viewer moves
    /// beyond the scene limit, unless the engine trusts the location sensor
    /// exclusively, in which case it is confirmed immediately.
    ///
    /// # Errors
    ///
    /// [`SceneError::SceneNotReady`] when the scene position or the current
    /// location is unknown.
    pub fn add_node_at_current_position(
        &mut self,
        pose: &dyn PoseSource,
        mut node: LocationNode,
    ) -> Result<NodeId, SceneError> {
        let position = pose
            .scene_position()
            .ok_or_else(|| SceneError::SceneNotReady("no scene position".into()))?;
        let location = self
            .current_location(pose)
            .ok_or_else(|| SceneError::SceneNotReady("no current location".into()))?;

        let confirmed = self.config.estimate_method == EstimateMethod::SensorOnly;
        node.place(location, position, confirmed);
        let id = node.id();

        self.renderer.attach(id);
        self.renderer
            .apply_transform(id, node.transform(), Duration::ZERO);
        self.registry.add(node);
        info!(node = %id, confirmed, "Placed node at current position");

        if confirmed {
            self.publish(
                Topic::Nodes,
                EventPayload::NodeConfirmed {
                    node: id,
                    coordinate: location,
                },
            );
        }
        Ok(id)
    }

    /// Add a node whose coordinate is already authoritative and place it
    /// immediately (without animation).
    ///
    /// # Errors
    ///
    /// - [`SceneError::MissingLocation`] – the node has no coordinate.
    /// - [`SceneError::InvalidCoordinate`] – the coordinate is out of range.
    /// - [`SceneError::NotConfirmed`] – the node is provisional.
    pub fn add_node_with_confirmed_location(
        &mut self,
        pose: &dyn PoseSource,
        node: LocationNode,
    ) -> Result<NodeId, SceneError> {
        let id = node.id();
        let location = node.location().ok_or(SceneError::MissingLocation(id))?;
        if !location.is_valid() {
            warn!(node = %id, "Rejected node with invalid coordinate");
            return Err(SceneError::InvalidCoordinate {
                latitude: location.latitude,
                longitude: location.longitude,
            });
        }
        if !node.is_confirmed() {
            return Err(SceneError::NotConfirmed(id));
        }

        self.renderer.attach(id);
        self.registry.add(node);
        info!(node = %id, latitude = location.latitude, longitude = location.longitude, "Added confirmed node");
        self.update_node_inner(pose, id, true, false);
        Ok(id)
    }

    /// Remove a node and detach it from the scene graph.
    ///
    /// # Errors
    ///
    /// [`SceneError::NodeNotFound`] for unknown ids.
    pub fn remove_node(&mut self, id: NodeId) -> Result<LocationNode, SceneError> {
        let node = self.registry.remove(id).ok_or(SceneError::NodeNotFound(id))?;
        self.renderer.detach(id);
        debug!(node = %id, "Removed node");
        Ok(node)
    }

    /// Remove every node; returns how many were removed.
    pub fn remove_all_nodes(&mut self) -> usize {
        let removed = self.registry.remove_all();
        for node in &removed {
            self.renderer.detach(node.id());
        }
        info!(count = removed.len(), "Removed all nodes");
        removed.len()
    }

    pub fn find_nodes(&self, tag: &str) -> Vec<&LocationNode> {
        self.registry.find_by_tag(tag)
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        self.registry.contains_tag(tag)
    }

    pub fn node(&self, id: NodeId) -> Option<&LocationNode> {
        self.registry.get(id)
    }

    /// Mutable access to a node's host-controlled settings (tag, update
    /// flags, annotation).
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut LocationNode> {
        self.registry.get_mut(id)
    }

    /// Recompute one node's position and scale now, regardless of its
    /// auto-update flag. Returns whether a transform was applied; `false`
    /// when the viewer's position or location is unknown.
    ///
    /// # Errors
    ///
    /// [`SceneError::NodeNotFound`] for unknown ids.
    pub fn update_node(
        &mut self,
        pose: &dyn PoseSource,
        id: NodeId,
        animated: bool,
    ) -> Result<bool, SceneError> {
        if self.registry.get(id).is_none() {
            return Err(SceneError::NodeNotFound(id));
        }
        Ok(self.update_node_inner(pose, id, false, animated))
    }

    /// Rotate the scene root back to a yaw of zero.
    pub fn reset_scene_heading(&mut self) {
        self.reset_yaw(0.0);
    }

    // ────────────────────────────────────────────────────────────────────────
    // Tick
    // ────────────────────────────────────────────────────────────────────────

    /// Run one positioning pass.
    pub fn tick(&mut self, pose: &dyn PoseSource) -> TickOutcome {
        let Some(position) = pose.scene_position() else {
            trace!("Tick skipped: no scene position");
            self.publish(
                Topic::Diagnostics,
                EventPayload::TickSkipped {
                    reason: "no scene position".into(),
                },
            );
            return TickOutcome::Skipped;
        };
        self.ensure_scene_root();

        let pruned = self.prune_estimates(&position);
        let confirmed = self.confirm_distant_nodes(&position);
        let updated = self.update_all_nodes(pose);

        TickOutcome::Completed {
            pruned,
            confirmed,
            updated,
        }
    }

    fn prune_estimates(&mut self, position: &ScenePoint) -> usize {
        let removed = self.estimates.prune(position, self.config.scene_limit);
        for estimate in &removed {
            self.publish(
                Topic::Estimates,
                EventPayload::EstimateEvicted {
                    position: estimate.position,
                    coordinate: estimate.location,
                    reason: EvictionReason::OutOfRange,
                },
            );
        }
        if !removed.is_empty() {
            debug!(count = removed.len(), "Pruned out-of-range estimates");
        }
        removed.len()
    }

    fn confirm_distant_nodes(&mut self, position: &ScenePoint) -> usize {
        let method = self.config.estimate_method;
        let limit = self.config.scene_limit;
        let best = self.estimates.best().copied();

        let mut confirmed = Vec::new();
        for node in self.registry.iter_mut() {
            if node.is_confirmed() || position.horizontally_within(&node.position(), limit) {
                continue;
            }
            let Some(location) = effective_location(method, best.as_ref(), node) else {
                continue;
            };
            node.confirm(location);
            confirmed.push((node.id(), location));
        }

        for (id, coordinate) in &confirmed {
            info!(node = %id, latitude = coordinate.latitude, longitude = coordinate.longitude, "Confirmed node location");
            self.publish(
                Topic::Nodes,
                EventPayload::NodeConfirmed {
                    node: *id,
                    coordinate: *coordinate,
                },
            );
        }
        confirmed.len()
    }

    fn update_all_nodes(&mut self, pose: &dyn PoseSource) -> usize {
        let Some(ctx) = self.placement_context(pose) else {
            trace!("Skipping node updates: no current location");
            return 0;
        };
        let animation = self.config.animation_duration();

        let mut updated = 0;
        for node in self.registry.iter_mut() {
            if !node.continually_update_position_and_scale {
                continue;
            }
            if let Some(placement) = ctx.place(node, false) {
                apply_placement(&mut self.renderer, &self.bus, node, placement, animation);
                updated += 1;
            }
        }
        updated
    }

    fn update_node_inner(
        &mut self,
        pose: &dyn PoseSource,
        id: NodeId,
        initial_setup: bool,
        animated: bool,
    ) -> bool {
        let Some(ctx) = self.placement_context(pose) else {
            return false;
        };
        let animation = if animated {
            self.config.animation_duration()
        } else {
            Duration::ZERO
        };
        let Some(node) = self.registry.get_mut(id) else {
            return false;
        };
        match ctx.place(node, initial_setup) {
            Some(placement) => {
                apply_placement(&mut self.renderer, &self.bus, node, placement, animation);
                true
            }
            None => false,
        }
    }

    fn placement_context(&self, pose: &dyn PoseSource) -> Option<PlacementContext> {
        let position = pose.scene_position()?;
        let location = current_location(
            self.config.estimate_method,
            self.last_fix,
            self.estimates.best(),
            Some(position),
        )?;
        Some(PlacementContext {
            config: self.config.clone(),
            best: self.estimates.best().copied(),
            position,
            location,
        })
    }

    // ────────────────────────────────────────────────────────────────────────
    // Internals
    // ────────────────────────────────────────────────────────────────────────

    fn record_estimate(&mut self, fix: GeoCoordinate, position: ScenePoint) {
        self.did_fetch_initial_location = true;
        let evicted = self.estimates.record(fix, position);
        debug!(
            x = position.x,
            z = position.z,
            accuracy = fix.horizontal_accuracy,
            "Recorded estimate"
        );
        self.publish(
            Topic::Estimates,
            EventPayload::EstimateRecorded {
                position,
                coordinate: fix,
            },
        );
        if let Some(old) = evicted {
            self.publish(
                Topic::Estimates,
                EventPayload::EstimateEvicted {
                    position: old.position,
                    coordinate: old.location,
                    reason: EvictionReason::Capacity,
                },
            );
        }
    }

    fn ensure_scene_root(&mut self) {
        if self.scene_root_established {
            return;
        }
        self.scene_root_established = true;
        info!("Scene root established");
        self.publish(Topic::Session, EventPayload::SceneRootEstablished);
    }

    fn reset_yaw(&mut self, heading_deg: f64) {
        self.renderer.set_scene_yaw(0.0);
        debug!(heading_deg, "Scene yaw reset");
        self.publish(Topic::Session, EventPayload::HeadingReset { heading_deg });
    }

    fn publish(&self, topic: Topic, payload: EventPayload) {
        publish(&self.bus, topic, payload);
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Placement math
// ────────────────────────────────────────────────────────────────────────────

/// Snapshot of the viewer used to place nodes during one pass.
struct PlacementContext {
    config: EngineConfig,
    best: Option<SceneLocationEstimate>,
    position: ScenePoint,
    location: GeoCoordinate,
}

struct Placement {
    transform: NodeTransform,
    distance_m: f64,
}

impl PlacementContext {
    fn place(&self, node: &LocationNode, initial_setup: bool) -> Option<Placement> {
        let node_location =
            effective_location(self.config.estimate_method, self.best.as_ref(), node)?;
        let distance = distance_3d(&self.location, &node_location);
        let limit = self.config.scene_limit;

        let mut transform = *node.transform();
        let effective_distance;

        if node.is_confirmed()
            && (distance > limit || node.continually_adjust_when_within_range || initial_setup)
        {
            let offset = translation(&self.location, &node_location);
            let scale = if distance > limit { limit / distance } else { 1.0 };
            let offset = offset.scaled(scale);

            effective_distance = distance * scale;
            // Forward is -z, so north maps onto negative z.
            transform.position = self
                .position
                .add(ScenePoint::new(offset.east, offset.altitude, -offset.north));
            transform.scale = ScenePoint::splat(scale);
        } else {
            effective_distance = self.position.horizontal_distance(&node.position());
            transform.scale = ScenePoint::splat(1.0);
        }

        transform.visual_scale = ScenePoint::splat(1.0);
        transform.pivot_offset = 0.0;
        if let Some(annotation) = node.annotation_content() {
            if annotation.scale_relative_to_distance {
                transform.pivot_offset = -PIVOT_DROP_FACTOR * transform.scale.y;
            } else {
                let mut size = effective_distance * self.config.annotation_size_factor;
                if distance > self.config.far_annotation_distance {
                    size *= self.config.far_annotation_factor;
                }
                transform.visual_scale = ScenePoint::splat(size);
                transform.pivot_offset = -PIVOT_DROP_FACTOR * size;
            }
        }

        Some(Placement {
            transform,
            distance_m: distance,
        })
    }
}

fn apply_placement<R: SceneRenderer>(
    renderer: &mut R,
    bus: &EventBus,
    node: &mut LocationNode,
    placement: Placement,
    animation: Duration,
) {
    let id = node.id();
    node.set_transform(placement.transform);
    renderer.apply_transform(id, &placement.transform, animation);
    trace!(node = %id, distance_m = placement.distance_m, "Node updated");
    publish(
        bus,
        Topic::Nodes,
        EventPayload::NodeUpdated {
            node: id,
            transform: placement.transform,
            distance_m: placement.distance_m,
        },
    );
}

/// The coordinate attributed to `node`.
///
/// Confirmed nodes (and every node when the sensor is trusted exclusively)
/// keep their stored coordinate. A provisional node is re-derived from the
/// best estimate whenever that estimate is strictly more accurate than the
/// node's own fix.
fn effective_location(
    method: EstimateMethod,
    best: Option<&SceneLocationEstimate>,
    node: &LocationNode,
) -> Option<GeoCoordinate> {
    if node.is_confirmed() || method == EstimateMethod::SensorOnly {
        return node.location();
    }
    match (best, node.location()) {
        (Some(estimate), None) => Some(estimate.translated_location(&node.position())),
        (Some(estimate), Some(own))
            if estimate.location.horizontal_accuracy < own.horizontal_accuracy =>
        {
            Some(estimate.translated_location(&node.position()))
        }
        (_, own) => own,
    }
}

fn current_location(
    method: EstimateMethod,
    last_fix: Option<GeoCoordinate>,
    best: Option<&SceneLocationEstimate>,
    position: Option<ScenePoint>,
) -> Option<GeoCoordinate> {
    match method {
        EstimateMethod::SensorOnly => last_fix,
        EstimateMethod::Fused => {
            let position = position?;
            best.map(|estimate| estimate.translated_location(&position))
        }
    }
}

fn publish(bus: &EventBus, topic: Topic, payload: EventPayload) {
    let source = match topic {
        Topic::Estimates => SOURCE_ESTIMATES,
        Topic::Nodes => SOURCE_NODES,
        Topic::Session => SOURCE_SESSION,
        Topic::Diagnostics => SOURCE_DIAGNOSTICS,
    };
    if let Err(e) = bus.publish_to(topic, Event::new(source, payload)) {
        trace!(error = %e, "Event not delivered");
    }
}
