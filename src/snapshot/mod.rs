//! Immutable graph state and the snapshot store that mutates it
//!
//! A [`State`] is the whole world an algorithm can see: nodes, edges, their
//! attributes, and a display message. States are never mutated in place by
//! callers; every change goes through [`SnapshotStore::update`], which records
//! the forward [`Patch`]es and their exact inverse as a
//! [`Rule`](crate::history::Rule), or through [`SnapshotStore::apply_patches`],
//! which replays recorded patches onto another replica.
//!
//! - [`patch`]: the patch vocabulary and how it applies to a state
//! - [`store`]: the store and its recording [`Draft`]

pub mod patch;
pub mod store;

pub use patch::Patch;
pub use store::{Draft, SnapshotStore};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

pub type NodeId = String;
pub type EdgeId = String;

/// Attribute bag attached to nodes and edges
pub type Attributes = FxHashMap<String, Value>;

/// A graph node
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Node {
    #[serde(default)]
    pub attrs: Attributes,
}

impl Node {
    pub fn new() -> Self {
        Node::default()
    }

    /// Builder-style attribute setter
    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn attr(&self, key: &str) -> Option<&Value> {
        self.attrs.get(key)
    }
}

/// A directed edge between two nodes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub source: NodeId,
    pub target: NodeId,
    #[serde(default)]
    pub attrs: Attributes,
}

impl Edge {
    pub fn new(source: impl Into<NodeId>, target: impl Into<NodeId>) -> Self {
        Edge {
            source: source.into(),
            target: target.into(),
            attrs: Attributes::default(),
        }
    }

    pub fn with_attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    pub fn touches(&self, node: &str) -> bool {
        self.source == node || self.target == node
    }
}

/// The full graph-plus-message world
///
/// Fields are private: outside this module a `State` is read-only.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    nodes: BTreeMap<NodeId, Node>,
    #[serde(default)]
    edges: BTreeMap<EdgeId, Edge>,
    #[serde(default)]
    message: Option<String>,
}

impl State {
    pub fn new() -> Self {
        State::default()
    }

    /// Parse a state from its JSON form
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn with_node(mut self, id: impl Into<NodeId>, node: Node) -> Self {
        self.nodes.insert(id.into(), node);
        self
    }

    pub fn with_edge(mut self, id: impl Into<EdgeId>, edge: Edge) -> Self {
        self.edges.insert(id.into(), edge);
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&NodeId, &Node)> {
        self.nodes.iter()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn node_attr(&self, id: &str, key: &str) -> Option<&Value> {
        self.nodes.get(id).and_then(|n| n.attrs.get(key))
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    pub fn edges(&self) -> impl Iterator<Item = (&EdgeId, &Edge)> {
        self.edges.iter()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Targets of the outgoing edges of `id`, in edge id order
    pub fn neighbors<'a>(&'a self, id: &'a str) -> impl Iterator<Item = &'a NodeId> + 'a {
        self.edges
            .values()
            .filter(move |e| e.source == id)
            .map(|e| &e.target)
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Check that every edge endpoint exists
    pub fn validate(&self) -> Result<(), crate::errors::PatchError> {
        for (id, edge) in &self.edges {
            for end in [&edge.source, &edge.target] {
                if !self.nodes.contains_key(end) {
                    return Err(crate::errors::PatchError::DanglingEdge {
                        edge: id.clone(),
                        node: end.clone(),
                    });
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> State {
        State::new()
            .with_node("a", Node::new().with_attr("color", "black"))
            .with_node("b", Node::new())
            .with_node("c", Node::new())
            .with_edge("ab", Edge::new("a", "b"))
            .with_edge("ac", Edge::new("a", "c"))
            .with_edge("bc", Edge::new("b", "c"))
    }

    #[test]
    fn test_neighbors_follow_outgoing_edges() {
        let state = triangle();
        let n: Vec<&NodeId> = state.neighbors("a").collect();
        assert_eq!(n, vec!["b", "c"]);
        assert_eq!(state.neighbors("c").count(), 0);
    }

    #[test]
    fn test_json_round_trip() {
        let state = triangle().with_message("hello");
        let text = state.to_json().unwrap();
        let back = State::from_json(&text).unwrap();
        assert_eq!(back, state);
    }

    #[test]
    fn test_from_json_defaults_missing_sections() {
        let state = State::from_json(r#"{"nodes": {"x": {}}}"#).unwrap();
        assert_eq!(state.node_count(), 1);
        assert_eq!(state.edge_count(), 0);
        assert!(state.message().is_none());
    }

    #[test]
    fn test_validate_rejects_dangling_edges() {
        let state = State::new()
            .with_node("a", Node::new())
            .with_edge("ax", Edge::new("a", "x"));
        assert!(matches!(
            state.validate(),
            Err(crate::errors::PatchError::DanglingEdge { ref node, .. }) if node == "x"
        ));
        assert!(triangle().validate().is_ok());
    }
}
