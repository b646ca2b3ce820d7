//! Location Estimate Buffer.
//!
//! Each [`SceneLocationEstimate`] pairs a geodetic fix with the scene
//! position the viewer occupied when the fix arrived. Knowing both lets any
//! other scene position be converted back to a coordinate: measure the
//! scene-space offset from the estimate, then walk the same number of metres
//! from the estimate's fix.
//!
//! The [`EstimateBuffer`] keeps a bounded FIFO of estimates, drops those
//! recorded too far from where the viewer is now (tracking drift makes them
//! unreliable), and ranks the rest by horizontal accuracy then recency.
//!
//! # Example
//!
//! ```rust
//! use scenegeo_engine::estimate::EstimateBuffer;
//! use scenegeo_types::{GeoCoordinate, ScenePoint};
//!
//! let mut buffer = EstimateBuffer::new(30);
//! let fix = GeoCoordinate::new(10.0, 20.0, 0.0).unwrap().with_accuracy(5.0, 5.0);
//! buffer.record(fix, ScenePoint::zero());
//!
//! let removed = buffer.prune(&ScenePoint::new(0.0, 0.0, -250.0), 100.0);
//! assert_eq!(removed.len(), 1);
//! assert!(buffer.best().is_none());
//! ```

use std::collections::VecDeque;

use scenegeo_geodesy::apply_translation;
use scenegeo_types::{GeoCoordinate, LocationTranslation, ScenePoint};

/// A geodetic fix and the scene position recorded at the same moment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneLocationEstimate {
    pub location: GeoCoordinate,
    pub position: ScenePoint,
}

impl SceneLocationEstimate {
    pub fn new(location: GeoCoordinate, position: ScenePoint) -> Self {
        Self { location, position }
    }

    /// Metre offset from this estimate's scene position to `position`.
    ///
    /// The scene's forward axis (−z) points along geographic north, `x`
    /// east and `y` up.
    pub fn location_translation(&self, position: &ScenePoint) -> LocationTranslation {
        LocationTranslation::new(
            self.position.z - position.z,
            position.x - self.position.x,
            position.y - self.position.y,
        )
    }

    /// The coordinate of `position`, derived from this estimate's fix.
    ///
    /// The result keeps the fix's accuracy and timestamp.
    pub fn translated_location(&self, position: &ScenePoint) -> GeoCoordinate {
        apply_translation(&self.location, self.location_translation(position))
    }
}

/// Bounded FIFO of [`SceneLocationEstimate`]s.
#[derive(Debug, Clone)]
pub struct EstimateBuffer {
    estimates: VecDeque<SceneLocationEstimate>,
    capacity: usize,
}

impl EstimateBuffer {
    /// Create an empty buffer holding at most `capacity` estimates (at least
    /// one).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            estimates: VecDeque::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Append an estimate. Returns the oldest estimate if the append pushed
    /// the buffer past its capacity.
    pub fn record(
        &mut self,
        location: GeoCoordinate,
        position: ScenePoint,
    ) -> Option<SceneLocationEstimate> {
        self.estimates
            .push_back(SceneLocationEstimate::new(location, position));
        if self.estimates.len() > self.capacity {
            self.estimates.pop_front()
        } else {
            None
        }
    }

    /// Remove every estimate recorded farther than `radius` from `current`
    /// in the horizontal plane, returning the removed estimates in age order.
    pub fn prune(&mut self, current: &ScenePoint, radius: f64) -> Vec<SceneLocationEstimate> {
        let (kept, removed): (VecDeque<_>, VecDeque<_>) = self
            .estimates
            .drain(..)
            .partition(|e| current.horizontally_within(&e.position, radius));
        self.estimates = kept;
        removed.into()
    }

    /// The most accurate estimate; among equally accurate ones the most
    /// recent.
    pub fn best(&self) -> Option<&SceneLocationEstimate> {
        self.estimates.iter().min_by(|a, b| {
            a.location
                .horizontal_accuracy
                .total_cmp(&b.location.horizontal_accuracy)
                .then_with(|| b.location.timestamp.cmp(&a.location.timestamp))
        })
    }

    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Estimates from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &SceneLocationEstimate> {
        self.estimates.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    fn fix(accuracy: f64, seconds_ago: i64) -> GeoCoordinate {
        GeoCoordinate::new(21.0, 105.0, 0.0)
            .unwrap()
            .with_accuracy(accuracy, accuracy)
            .with_timestamp(Utc::now() - Duration::seconds(seconds_ago))
    }

    #[test]
    fn never_exceeds_capacity_and_evicts_oldest_first() {
        let mut buffer = EstimateBuffer::new(30);
        let mut evicted = Vec::new();
        for i in 0..45 {
            let position = ScenePoint::new(i as f64, 0.0, 0.0);
            if let Some(old) = buffer.record(fix(5.0, 0), position) {
                evicted.push(old.position.x);
            }
            assert!(buffer.len() <= 30);
        }
        assert_eq!(buffer.len(), 30);
        assert_eq!(evicted, (0..15).map(|i| i as f64).collect::<Vec<_>>());
        assert_eq!(buffer.iter().next().map(|e| e.position.x), Some(15.0));
    }

    #[test]
    fn prune_uses_horizontal_distance_only() {
        let mut buffer = EstimateBuffer::new(30);
        buffer.record(fix(5.0, 0), ScenePoint::new(0.0, 400.0, 0.0));
        buffer.record(fix(5.0, 0), ScenePoint::new(60.0, 0.0, -80.0));
        buffer.record(fix(5.0, 0), ScenePoint::new(0.0, 0.0, -100.5));

        let removed = buffer.prune(&ScenePoint::zero(), 100.0);

        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].position.z, -100.5);
        assert_eq!(buffer.len(), 2);
        for e in buffer.iter() {
            assert!(ScenePoint::zero().horizontal_distance(&e.position) <= 100.0);
        }
    }

    #[test]
    fn best_of_empty_is_none() {
        assert!(EstimateBuffer::new(30).best().is_none());
    }

    #[test]
    fn best_prefers_lower_accuracy_value_regardless_of_order() {
        for flip in [false, true] {
            let mut buffer = EstimateBuffer::new(30);
            let (first, second) = if flip { (10.0, 5.0) } else { (5.0, 10.0) };
            buffer.record(fix(first, 0), ScenePoint::zero());
            buffer.record(fix(second, 0), ScenePoint::zero());
            let best = buffer.best().unwrap();
            assert_eq!(best.location.horizontal_accuracy, 5.0);
        }
    }

    #[test]
    fn equal_accuracy_prefers_most_recent() {
        let mut buffer = EstimateBuffer::new(30);
        let newer = fix(5.0, 1);
        let older = fix(5.0, 60);
        buffer.record(newer, ScenePoint::new(1.0, 0.0, 0.0));
        buffer.record(older, ScenePoint::new(2.0, 0.0, 0.0));
        assert_eq!(buffer.best().unwrap().position.x, 1.0);
    }

    #[test]
    fn translated_location_walks_scene_offset() {
        let origin = GeoCoordinate::new(0.0, 0.0, 10.0).unwrap().with_accuracy(4.0, 2.0);
        let estimate = SceneLocationEstimate::new(origin, ScenePoint::zero());

        // 100 m forward (north) and 2 m up.
        let moved = estimate.translated_location(&ScenePoint::new(0.0, 2.0, -100.0));
        let t = estimate.location_translation(&ScenePoint::new(0.0, 2.0, -100.0));

        assert_eq!(t, LocationTranslation::new(100.0, 0.0, 2.0));
        assert!(moved.latitude > origin.latitude);
        assert!((moved.longitude - origin.longitude).abs() < 1e-12);
        assert_eq!(moved.altitude, 12.0);
        assert_eq!(moved.horizontal_accuracy, 4.0);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut buffer = EstimateBuffer::new(0);
        assert!(buffer.record(fix(5.0, 0), ScenePoint::zero()).is_none());
        assert!(buffer.record(fix(5.0, 0), ScenePoint::zero()).is_some());
        assert_eq!(buffer.len(), 1);
    }
}
