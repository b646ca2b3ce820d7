//! [`NodeRegistry`] – flat, engine-owned collection of placed nodes.
//!
//! Nodes are kept in insertion order and addressed by [`NodeId`]. The
//! registry knows nothing about rendering; attaching and detaching scene
//! graph content is requested by the engine through
//! [`SceneRenderer`][crate::renderer::SceneRenderer].

use scenegeo_types::NodeId;

use crate::node::LocationNode;

#[derive(Debug, Default)]
pub struct NodeRegistry {
    nodes: Vec<LocationNode>,
}

impl NodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `node`. A node with the same id is replaced.
    pub fn add(&mut self, node: LocationNode) -> NodeId {
        let id = node.id();
        match self.nodes.iter_mut().find(|n| n.id() == id) {
            Some(existing) => *existing = node,
            None => self.nodes.push(node),
        }
        id
    }

    /// Remove and return the node with `id`.
    pub fn remove(&mut self, id: NodeId) -> Option<LocationNode> {
        let index = self.nodes.iter().position(|n| n.id() == id)?;
        Some(self.nodes.remove(index))
    }

    /// Remove every node, returning them in insertion order.
    pub fn remove_all(&mut self) -> Vec<LocationNode> {
        std::mem::take(&mut self.nodes)
    }

    pub fn get(&self, id: NodeId) -> Option<&LocationNode> {
        self.nodes.iter().find(|n| n.id() == id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut LocationNode> {
        self.nodes.iter_mut().find(|n| n.id() == id)
    }

    /// All nodes tagged exactly `tag`. An empty tag matches nothing.
    pub fn find_by_tag(&self, tag: &str) -> Vec<&LocationNode> {
        if tag.is_empty() {
            return Vec::new();
        }
        self.nodes
            .iter()
            .filter(|n| n.tag.as_deref() == Some(tag))
            .collect()
    }

    pub fn contains_tag(&self, tag: &str) -> bool {
        !self.find_by_tag(tag).is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocationNode> {
        self.nodes.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut LocationNode> {
        self.nodes.iter_mut()
    }

    pub fn ids(&self) -> Vec<NodeId> {
        self.nodes.iter().map(LocationNode::id).collect()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_remove_by_identity() {
        let mut registry = NodeRegistry::new();
        let a = registry.add(LocationNode::new(None));
        let b = registry.add(LocationNode::new(None));
        assert_eq!(registry.len(), 2);

        let removed = registry.remove(a).expect("a is registered");
        assert_eq!(removed.id(), a);
        assert!(registry.get(a).is_none());
        assert!(registry.get(b).is_some());
        assert!(registry.remove(a).is_none());
    }

    #[test]
    fn re_adding_same_node_replaces_it() {
        let mut registry = NodeRegistry::new();
        let node = LocationNode::new(None);
        let id = registry.add(node.clone());
        registry.add(node.with_tag("second"));
        assert_eq!(registry.len(), 1);
        assert!(registry.contains_tag("second"));
        assert_eq!(registry.ids(), vec![id]);
    }

    #[test]
    fn tag_lookup_returns_every_match() {
        let mut registry = NodeRegistry::new();
        registry.add(LocationNode::new(None).with_tag("poi"));
        registry.add(LocationNode::new(None).with_tag("poi"));
        registry.add(LocationNode::new(None).with_tag("other"));
        registry.add(LocationNode::new(None));

        assert_eq!(registry.find_by_tag("poi").len(), 2);
        assert_eq!(registry.find_by_tag("other").len(), 1);
        assert!(registry.find_by_tag("missing").is_empty());
    }

    #[test]
    fn empty_tag_never_matches() {
        let mut registry = NodeRegistry::new();
        registry.add(LocationNode::new(None).with_tag(""));
        assert!(registry.find_by_tag("").is_empty());
        assert!(!registry.contains_tag(""));
    }

    #[test]
    fn remove_all_empties_registry() {
        let mut registry = NodeRegistry::new();
        registry.add(LocationNode::new(None).with_tag("poi"));
        registry.add(LocationNode::new(None).with_tag("poi"));

        let removed = registry.remove_all();
        assert_eq!(removed.len(), 2);
        assert!(registry.is_empty());
        assert!(registry.find_by_tag("poi").is_empty());
    }
}
