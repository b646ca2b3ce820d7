//! `scenegeo-types` – shared data model for the scenegeo workspace.
//!
//! Holds the two coordinate systems the engine reconciles ([`GeoCoordinate`]
//! for Earth-referenced fixes, [`ScenePoint`] for the tracked AR frame), the
//! [`LocationTranslation`] that bridges them, the [`Event`] envelope routed
//! over the event bus, and the workspace-wide [`SceneError`].

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ────────────────────────────────────────────────────────────────────────────
// Identity
// ────────────────────────────────────────────────────────────────────────────

/// Stable identity of a placed point-of-interest node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeId(pub Uuid);

impl NodeId {
    /// Generate a fresh random identifier.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// GeoCoordinate
// ────────────────────────────────────────────────────────────────────────────

/// A single geodetic fix: position on the WGS84 sphere plus its accuracy and
/// capture time.
///
/// Accuracies are radii in metres; lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoCoordinate {
    /// Latitude in degrees, `[-90, 90]`.
    pub latitude: f64,
    /// Longitude in degrees, `[-180, 180]`.
    pub longitude: f64,
    /// Altitude in metres.
    pub altitude: f64,
    /// Horizontal accuracy radius in metres.
    pub horizontal_accuracy: f64,
    /// Vertical accuracy in metres.
    pub vertical_accuracy: f64,
    /// Wall-clock time at which the fix was captured.
    pub timestamp: DateTime<Utc>,
}

impl GeoCoordinate {
    /// Build a coordinate captured now with perfect (zero) accuracy.
    ///
    /// # Errors
    ///
    /// Returns [`SceneError::InvalidCoordinate`] when latitude or longitude is
    /// out of range or any component is not finite.
    pub fn new(latitude: f64, longitude: f64, altitude: f64) -> Result<Self, SceneError> {
        let coordinate = Self::unchecked(latitude, longitude, altitude);
        if coordinate.is_valid() {
            Ok(coordinate)
        } else {
            Err(SceneError::InvalidCoordinate {
                latitude,
                longitude,
            })
        }
    }

    /// Build a coordinate without range checks.
    ///
    /// Intended for values produced by the geodetic math itself, whose output
    /// is always normalised.
    pub fn unchecked(latitude: f64, longitude: f64, altitude: f64) -> Self {
        Self {
            latitude,
            longitude,
            altitude,
            horizontal_accuracy: 0.0,
            vertical_accuracy: 0.0,
            timestamp: Utc::now(),
        }
    }

    /// Replace the accuracy radii.
    pub fn with_accuracy(mut self, horizontal: f64, vertical: f64) -> Self {
        self.horizontal_accuracy = horizontal;
        self.vertical_accuracy = vertical;
        self
    }

    /// Replace the capture timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// `true` when latitude/longitude are in range and altitude is finite.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.altitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// ScenePoint
// ────────────────────────────────────────────────────────────────────────────

/// A point (or vector) in the tracked AR scene frame.
///
/// `x` points right, `y` points up, and the camera looks down negative `z`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScenePoint {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl ScenePoint {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// The origin of the scene frame.
    pub fn zero() -> Self {
        Self::new(0.0, 0.0, 0.0)
    }

    /// A vector with all three components equal to `v`.
    pub fn splat(v: f64) -> Self {
        Self::new(v, v, v)
    }

    pub fn add(self, rhs: Self) -> Self {
        Self::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }

    /// Distance to `other` in the horizontal (x/z) plane; `y` is ignored.
    pub fn horizontal_distance(&self, other: &Self) -> f64 {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        (dx * dx + dz * dz).sqrt()
    }

    /// `true` when `other` lies within `radius` of `self` in the horizontal
    /// plane (boundary inclusive).
    pub fn horizontally_within(&self, other: &Self, radius: f64) -> bool {
        let dx = other.x - self.x;
        let dz = other.z - self.z;
        dx * dx + dz * dz <= radius * radius
    }
}

// ────────────────────────────────────────────────────────────────────────────
// LocationTranslation
// ────────────────────────────────────────────────────────────────────────────

/// Offset in metres between two [`GeoCoordinate`]s, decomposed along the
/// local cardinal axes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct LocationTranslation {
    /// Positive towards geographic north.
    pub north: f64,
    /// Positive towards east.
    pub east: f64,
    /// Positive upwards.
    pub altitude: f64,
}

impl LocationTranslation {
    pub fn new(north: f64, east: f64, altitude: f64) -> Self {
        Self {
            north,
            east,
            altitude,
        }
    }

    /// Multiply every component by `factor`.
    pub fn scaled(self, factor: f64) -> Self {
        Self::new(self.north * factor, self.east * factor, self.altitude * factor)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// NodeTransform
// ────────────────────────────────────────────────────────────────────────────

/// The complete render state of one node, applied atomically by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeTransform {
    /// Node origin in the scene frame.
    pub position: ScenePoint,
    /// Scale of the node itself (carries the distance-collapsing factor).
    pub scale: ScenePoint,
    /// Scale of the billboard child of an annotation node; unit otherwise.
    pub visual_scale: ScenePoint,
    /// Vertical pivot offset of the visual child (negative = down).
    pub pivot_offset: f64,
}

impl NodeTransform {
    /// Unscaled transform at `position`.
    pub fn at(position: ScenePoint) -> Self {
        Self {
            position,
            scale: ScenePoint::splat(1.0),
            visual_scale: ScenePoint::splat(1.0),
            pivot_offset: 0.0,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tracking state
// ────────────────────────────────────────────────────────────────────────────

/// Why visual-inertial tracking is degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingLimitation {
    Initializing,
    ExcessiveMotion,
    InsufficientFeatures,
    Relocalizing,
}

/// Tracking quality reported by the camera collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackingState {
    Normal,
    Limited(TrackingLimitation),
    NotAvailable,
}

// ────────────────────────────────────────────────────────────────────────────
// Events
// ────────────────────────────────────────────────────────────────────────────

/// Why an estimate left the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EvictionReason {
    /// The buffer exceeded its capacity and dropped its oldest entry.
    Capacity,
    /// The estimate was recorded too far from the current scene position.
    OutOfRange,
}

/// Unified event wrapper for the event bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    /// e.g., "scenegeo-engine::estimates"
    pub source: String,
    pub payload: EventPayload,
}

impl Event {
    /// Wrap `payload` with a fresh id and the current time.
    pub fn new(source: impl Into<String>, payload: EventPayload) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            source: source.into(),
            payload,
        }
    }
}

/// Everything the positioning engine reports to its host.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventPayload {
    EstimateRecorded {
        position: ScenePoint,
        coordinate: GeoCoordinate,
    },
    EstimateEvicted {
        position: ScenePoint,
        coordinate: GeoCoordinate,
        reason: EvictionReason,
    },
    /// A provisional node's location was frozen.
    NodeConfirmed {
        node: NodeId,
        coordinate: GeoCoordinate,
    },
    /// The first rendered frame of a session established the scene root.
    SceneRootEstablished,
    NodeUpdated {
        node: NodeId,
        transform: NodeTransform,
        /// Geodetic distance from the viewer in metres.
        distance_m: f64,
    },
    /// A reliable heading of north reset the scene yaw.
    HeadingReset { heading_deg: f64 },
    /// A tick could not run; nothing changed.
    TickSkipped { reason: String },
    TrackingStateChanged { state: TrackingState },
    SensorFault { component: String, message: String },
    /// A sensor feed stopped delivering within its deadline.
    SensorStale { component: String },
}

// ────────────────────────────────────────────────────────────────────────────
// Errors
// ────────────────────────────────────────────────────────────────────────────

/// Workspace-wide error type.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("Invalid coordinate: lat {latitude}, lon {longitude}")]
    InvalidCoordinate { latitude: f64, longitude: f64 },

    #[error("Node {0} has no location")]
    MissingLocation(NodeId),

    #[error("Node {0} is not confirmed")]
    NotConfirmed(NodeId),

    #[error("Scene not ready: {0}")]
    SceneNotReady(String),

    #[error("Node {0} is not registered")]
    NodeNotFound(NodeId),

    #[error("Channel Error: {0}")]
    Channel(String),

    #[error("Configuration Error: {0}")]
    Config(String),
}
