//! Field-level patches between two states
//!
//! Patches are produced in forward/reverse pairs by the recording
//! [`Draft`](super::Draft) at the moment a mutation is made. They are never
//! derived afterwards by diffing.

use super::{Edge, EdgeId, Node, NodeId, State};
use crate::errors::PatchError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One minimal mutation of a [`State`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Patch {
    /// Insert or replace a node record
    UpsertNode { id: NodeId, node: Node },
    DeleteNode { id: NodeId },
    /// Insert or replace an edge record
    UpsertEdge { id: EdgeId, edge: Edge },
    DeleteEdge { id: EdgeId },
    /// Set (or clear, when `value` is `None`) a node attribute
    SetNodeAttr {
        id: NodeId,
        key: String,
        value: Option<Value>,
    },
    /// Set (or clear, when `value` is `None`) an edge attribute
    SetEdgeAttr {
        id: EdgeId,
        key: String,
        value: Option<Value>,
    },
    SetMessage { message: Option<String> },
}

impl Patch {
    /// Short human-readable description, used in logs and the viewer
    pub fn describe(&self) -> String {
        match self {
            Patch::UpsertNode { id, .. } => format!("upsert node {}", id),
            Patch::DeleteNode { id } => format!("delete node {}", id),
            Patch::UpsertEdge { id, .. } => format!("upsert edge {}", id),
            Patch::DeleteEdge { id } => format!("delete edge {}", id),
            Patch::SetNodeAttr { id, key, value } => match value {
                Some(v) => format!("{}.{} = {}", id, key, v),
                None => format!("unset {}.{}", id, key),
            },
            Patch::SetEdgeAttr { id, key, value } => match value {
                Some(v) => format!("edge {}.{} = {}", id, key, v),
                None => format!("unset edge {}.{}", id, key),
            },
            Patch::SetMessage { message } => match message {
                Some(m) => format!("message = {:?}", m),
                None => "clear message".to_string(),
            },
        }
    }
}

impl State {
    /// Apply a single patch in place.
    ///
    /// Only reachable from inside the snapshot module; everyone else goes
    /// through [`SnapshotStore`](super::SnapshotStore).
    pub(super) fn apply_patch(&mut self, patch: &Patch) -> Result<(), PatchError> {
        match patch {
            Patch::UpsertNode { id, node } => {
                self.nodes.insert(id.clone(), node.clone());
            }
            Patch::DeleteNode { id } => {
                self.nodes
                    .remove(id)
                    .ok_or_else(|| PatchError::MissingNode(id.clone()))?;
            }
            Patch::UpsertEdge { id, edge } => {
                for end in [&edge.source, &edge.target] {
                    if !self.nodes.contains_key(end) {
                        return Err(PatchError::DanglingEdge {
                            edge: id.clone(),
                            node: end.clone(),
                        });
                    }
                }
                self.edges.insert(id.clone(), edge.clone());
            }
            Patch::DeleteEdge { id } => {
                self.edges
                    .remove(id)
                    .ok_or_else(|| PatchError::MissingEdge(id.clone()))?;
            }
            Patch::SetNodeAttr { id, key, value } => {
                let node = self
                    .nodes
                    .get_mut(id)
                    .ok_or_else(|| PatchError::MissingNode(id.clone()))?;
                match value {
                    Some(v) => {
                        node.attrs.insert(key.clone(), v.clone());
                    }
                    None => {
                        node.attrs.remove(key);
                    }
                }
            }
            Patch::SetEdgeAttr { id, key, value } => {
                let edge = self
                    .edges
                    .get_mut(id)
                    .ok_or_else(|| PatchError::MissingEdge(id.clone()))?;
                match value {
                    Some(v) => {
                        edge.attrs.insert(key.clone(), v.clone());
                    }
                    None => {
                        edge.attrs.remove(key);
                    }
                }
            }
            Patch::SetMessage { message } => {
                self.message = message.clone();
            }
        }
        Ok(())
    }

    /// Apply a list of patches in order, stopping at the first failure
    pub(super) fn apply_all<'a, I>(&mut self, patches: I) -> Result<(), PatchError>
    where
        I: IntoIterator<Item = &'a Patch>,
    {
        for patch in patches {
            self.apply_patch(patch)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_set_and_clear_node_attr() {
        let mut state = State::new().with_node("a", Node::new());
        state
            .apply_patch(&Patch::SetNodeAttr {
                id: "a".into(),
                key: "color".into(),
                value: Some(json!("red")),
            })
            .unwrap();
        assert_eq!(state.node_attr("a", "color"), Some(&json!("red")));

        state
            .apply_patch(&Patch::SetNodeAttr {
                id: "a".into(),
                key: "color".into(),
                value: None,
            })
            .unwrap();
        assert!(state.node_attr("a", "color").is_none());
    }

    #[test]
    fn test_missing_targets_are_errors() {
        let mut state = State::new();
        assert_eq!(
            state.apply_patch(&Patch::DeleteNode { id: "x".into() }),
            Err(PatchError::MissingNode("x".into()))
        );
        assert_eq!(
            state.apply_patch(&Patch::SetEdgeAttr {
                id: "e".into(),
                key: "w".into(),
                value: Some(json!(1)),
            }),
            Err(PatchError::MissingEdge("e".into()))
        );
        assert!(matches!(
            state.apply_patch(&Patch::UpsertEdge {
                id: "e".into(),
                edge: Edge::new("x", "y"),
            }),
            Err(PatchError::DanglingEdge { .. })
        ));
    }

    #[test]
    fn test_patch_serializes_with_op_tag() {
        let patch = Patch::SetMessage {
            message: Some("hi".into()),
        };
        let text = serde_json::to_string(&patch).unwrap();
        assert!(text.contains(r#""op":"set_message""#));
        let back: Patch = serde_json::from_str(&text).unwrap();
        assert_eq!(back, patch);
    }
}
