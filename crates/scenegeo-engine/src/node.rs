//! Placed point-of-interest nodes.

use scenegeo_types::{GeoCoordinate, NodeId, NodeTransform, ScenePoint};

/// Billboard content attached to an annotation node.
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Asset name of the image shown on the billboard.
    pub image: String,
    /// When `false` (the default) the billboard keeps a constant on-screen
    /// size regardless of distance; when `true` it shrinks with distance like
    /// ordinary geometry.
    pub scale_relative_to_distance: bool,
}

impl Annotation {
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            scale_relative_to_distance: false,
        }
    }
}

/// A geolocated node placed in the AR scene.
///
/// Location and confirmation are owned by the engine once the node is
/// registered: a node starts either provisional (placed at the viewer's live
/// position) or confirmed (placed at an authoritative coordinate), and a
/// provisional node is confirmed exactly once.
#[derive(Debug, Clone)]
pub struct LocationNode {
    id: NodeId,
    /// Free-form label used by [`NodeRegistry::find_by_tag`][crate::registry::NodeRegistry::find_by_tag].
    pub tag: Option<String>,
    location: Option<GeoCoordinate>,
    confirmed: bool,
    transform: NodeTransform,
    /// Keep re-deriving a confirmed node's position from its coordinate while
    /// it is within the scene limit. Smoother when `false`, more accurate
    /// when `true`.
    pub continually_adjust_when_within_range: bool,
    /// Recompute position and scale on every tick. Turn off to drive updates
    /// manually through
    /// [`PositioningEngine::update_node`][crate::engine::PositioningEngine::update_node].
    pub continually_update_position_and_scale: bool,
    annotation: Option<Annotation>,
}

impl LocationNode {
    /// A plain node. Supplying a location makes it confirmed.
    pub fn new(location: Option<GeoCoordinate>) -> Self {
        Self {
            id: NodeId::new(),
            tag: None,
            confirmed: location.is_some(),
            location,
            transform: NodeTransform::at(ScenePoint::zero()),
            continually_adjust_when_within_range: true,
            continually_update_position_and_scale: true,
            annotation: None,
        }
    }

    /// A node carrying a billboard image.
    pub fn annotation(location: Option<GeoCoordinate>, image: impl Into<String>) -> Self {
        Self {
            annotation: Some(Annotation::new(image)),
            ..Self::new(location)
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn id(&self) -> NodeId {
        self.id
    }

    pub fn location(&self) -> Option<GeoCoordinate> {
        self.location
    }

    pub fn is_confirmed(&self) -> bool {
        self.confirmed
    }

    pub fn position(&self) -> ScenePoint {
        self.transform.position
    }

    pub fn scale(&self) -> ScenePoint {
        self.transform.scale
    }

    pub fn transform(&self) -> &NodeTransform {
        &self.transform
    }

    pub fn annotation_content(&self) -> Option<&Annotation> {
        self.annotation.as_ref()
    }

    pub fn annotation_content_mut(&mut self) -> Option<&mut Annotation> {
        self.annotation.as_mut()
    }

    /// Place an unregistered node at the viewer's live position.
    pub(crate) fn place(&mut self, location: GeoCoordinate, position: ScenePoint, confirmed: bool) {
        self.location = Some(location);
        self.confirmed = confirmed;
        self.transform.position = position;
    }

    /// Freeze `location` as authoritative. Irreversible.
    pub(crate) fn confirm(&mut self, location: GeoCoordinate) {
        self.location = Some(location);
        self.confirmed = true;
    }

    pub(crate) fn set_transform(&mut self, transform: NodeTransform) {
        self.transform = transform;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_with_location_starts_confirmed() {
        let loc = GeoCoordinate::new(1.0, 2.0, 10.0).unwrap();
        let node = LocationNode::new(Some(loc));
        assert!(node.is_confirmed());
        assert_eq!(node.location(), Some(loc));
        assert_eq!(node.scale(), ScenePoint::splat(1.0));
    }

    #[test]
    fn node_without_location_starts_provisional() {
        let node = LocationNode::new(None).with_tag("cafe");
        assert!(!node.is_confirmed());
        assert_eq!(node.tag.as_deref(), Some("cafe"));
        assert!(node.continually_adjust_when_within_range);
        assert!(node.continually_update_position_and_scale);
    }

    #[test]
    fn annotation_defaults_to_constant_screen_size() {
        let node = LocationNode::annotation(None, "pin");
        let annotation = node.annotation_content().unwrap();
        assert_eq!(annotation.image, "pin");
        assert!(!annotation.scale_relative_to_distance);
    }

    #[test]
    fn confirm_freezes_location() {
        let mut node = LocationNode::new(None);
        let loc = GeoCoordinate::new(5.0, 5.0, 0.0).unwrap();
        node.confirm(loc);
        assert!(node.is_confirmed());
        assert_eq!(node.location(), Some(loc));
    }
}
