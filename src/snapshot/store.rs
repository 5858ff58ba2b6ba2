//! The snapshot store and its recording draft

use super::{Edge, EdgeId, Node, NodeId, Patch, State};
use crate::errors::PatchError;
use crate::history::Rule;
use serde_json::Value;
use std::sync::Arc;

/// Holds one immutable [`State`] at a time.
///
/// Two stores exist per session: the algorithm replica inside the execution
/// host (changed through [`update`](Self::update)) and the display replica
/// inside the navigator (changed only through
/// [`apply_patches`](Self::apply_patches)).
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    state: Arc<State>,
}

impl SnapshotStore {
    pub fn new(state: State) -> Self {
        SnapshotStore {
            state: Arc::new(state),
        }
    }

    /// Current value. Cheap to clone and impossible to mutate.
    pub fn get(&self) -> Arc<State> {
        Arc::clone(&self.state)
    }

    /// Run `mutator` against a draft of the current state and commit it.
    ///
    /// Returns the [`Rule`] capturing the change. If `mutator` fails, the
    /// draft is dropped and the store is left untouched.
    pub fn update<F, E>(&mut self, mutator: F) -> Result<Rule, E>
    where
        F: FnOnce(&mut Draft) -> Result<(), E>,
    {
        let mut draft = Draft::new((*self.state).clone());
        mutator(&mut draft)?;
        let (state, rule) = draft.finish();
        self.state = Arc::new(state);
        Ok(rule)
    }

    /// Derive a new state by applying `patches` in order.
    ///
    /// All or nothing: on error the current state is kept.
    pub fn apply_patches(&mut self, patches: &[Patch]) -> Result<(), PatchError> {
        self.apply_iter(patches.iter())
    }

    pub(crate) fn apply_iter<'a, I>(&mut self, patches: I) -> Result<(), PatchError>
    where
        I: IntoIterator<Item = &'a Patch>,
    {
        let mut next = (*self.state).clone();
        next.apply_all(patches)?;
        self.state = Arc::new(next);
        Ok(())
    }

    /// Replace the held state wholesale (used when the input graph is swapped)
    pub fn reset(&mut self, state: State) {
        self.state = Arc::new(state);
    }
}

/// Mutable working copy handed to a mutator.
///
/// Every edit is applied to the working copy immediately and recorded as a
/// forward patch plus the patch that undoes it.
#[derive(Debug)]
pub struct Draft {
    state: State,
    apply: Vec<Patch>,
    // Stored newest-first while recording; reversed in `finish`.
    revert: Vec<Patch>,
}

impl Draft {
    fn new(state: State) -> Self {
        Draft {
            state,
            apply: Vec::new(),
            revert: Vec::new(),
        }
    }

    /// The working copy including edits made so far
    pub fn state(&self) -> &State {
        &self.state
    }

    fn record(&mut self, forward: Patch, inverse: Patch) -> Result<(), PatchError> {
        self.state.apply_patch(&forward)?;
        self.apply.push(forward);
        self.revert.push(inverse);
        Ok(())
    }

    fn finish(mut self) -> (State, Rule) {
        self.revert.reverse();
        (self.state, Rule::new(self.apply, self.revert))
    }

    /// Insert or replace a node
    pub fn add_node(&mut self, id: impl Into<NodeId>, node: Node) -> Result<(), PatchError> {
        let id = id.into();
        let inverse = match self.state.nodes.get(&id) {
            Some(old) => Patch::UpsertNode {
                id: id.clone(),
                node: old.clone(),
            },
            None => Patch::DeleteNode { id: id.clone() },
        };
        self.record(Patch::UpsertNode { id, node }, inverse)
    }

    /// Remove a node together with every edge touching it
    pub fn remove_node(&mut self, id: &str) -> Result<(), PatchError> {
        let old = self
            .state
            .nodes
            .get(id)
            .cloned()
            .ok_or_else(|| PatchError::MissingNode(id.to_string()))?;

        let incident: Vec<EdgeId> = self
            .state
            .edges
            .iter()
            .filter(|(_, e)| e.touches(id))
            .map(|(eid, _)| eid.clone())
            .collect();
        for eid in incident {
            self.remove_edge(&eid)?;
        }

        self.record(
            Patch::DeleteNode { id: id.to_string() },
            Patch::UpsertNode {
                id: id.to_string(),
                node: old,
            },
        )
    }

    pub fn set_node_attr(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), PatchError> {
        self.write_node_attr(id, key.into(), Some(value.into()))
    }

    pub fn remove_node_attr(&mut self, id: &str, key: &str) -> Result<(), PatchError> {
        self.write_node_attr(id, key.to_string(), None)
    }

    fn write_node_attr(
        &mut self,
        id: &str,
        key: String,
        value: Option<Value>,
    ) -> Result<(), PatchError> {
        let node = self
            .state
            .nodes
            .get(id)
            .ok_or_else(|| PatchError::MissingNode(id.to_string()))?;
        let old = node.attrs.get(&key).cloned();
        if old == value {
            return Ok(());
        }
        self.record(
            Patch::SetNodeAttr {
                id: id.to_string(),
                key: key.clone(),
                value,
            },
            Patch::SetNodeAttr {
                id: id.to_string(),
                key,
                value: old,
            },
        )
    }

    /// Insert or replace an edge; both endpoints must exist
    pub fn add_edge(&mut self, id: impl Into<EdgeId>, edge: Edge) -> Result<(), PatchError> {
        let id = id.into();
        let inverse = match self.state.edges.get(&id) {
            Some(old) => Patch::UpsertEdge {
                id: id.clone(),
                edge: old.clone(),
            },
            None => Patch::DeleteEdge { id: id.clone() },
        };
        self.record(Patch::UpsertEdge { id, edge }, inverse)
    }

    pub fn remove_edge(&mut self, id: &str) -> Result<(), PatchError> {
        let old = self
            .state
            .edges
            .get(id)
            .cloned()
            .ok_or_else(|| PatchError::MissingEdge(id.to_string()))?;
        self.record(
            Patch::DeleteEdge { id: id.to_string() },
            Patch::UpsertEdge {
                id: id.to_string(),
                edge: old,
            },
        )
    }

    pub fn set_edge_attr(
        &mut self,
        id: &str,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Result<(), PatchError> {
        self.write_edge_attr(id, key.into(), Some(value.into()))
    }

    pub fn remove_edge_attr(&mut self, id: &str, key: &str) -> Result<(), PatchError> {
        self.write_edge_attr(id, key.to_string(), None)
    }

    fn write_edge_attr(
        &mut self,
        id: &str,
        key: String,
        value: Option<Value>,
    ) -> Result<(), PatchError> {
        let edge = self
            .state
            .edges
            .get(id)
            .ok_or_else(|| PatchError::MissingEdge(id.to_string()))?;
        let old = edge.attrs.get(&key).cloned();
        if old == value {
            return Ok(());
        }
        self.record(
            Patch::SetEdgeAttr {
                id: id.to_string(),
                key: key.clone(),
                value,
            },
            Patch::SetEdgeAttr {
                id: id.to_string(),
                key,
                value: old,
            },
        )
    }

    pub fn set_message(&mut self, message: impl Into<String>) -> Result<(), PatchError> {
        self.write_message(Some(message.into()))
    }

    pub fn clear_message(&mut self) -> Result<(), PatchError> {
        self.write_message(None)
    }

    fn write_message(&mut self, message: Option<String>) -> Result<(), PatchError> {
        if self.state.message == message {
            return Ok(());
        }
        let old = self.state.message.clone();
        self.record(
            Patch::SetMessage { message },
            Patch::SetMessage { message: old },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn store() -> SnapshotStore {
        SnapshotStore::new(
            State::new()
                .with_node("a", Node::new().with_attr("color", "black"))
                .with_node("b", Node::new().with_attr("color", "black"))
                .with_edge("ab", Edge::new("a", "b")),
        )
    }

    #[test]
    fn test_update_returns_rule_and_replaces_state() {
        let mut store = store();
        let before = store.get();
        let rule = store
            .update(|d| d.set_node_attr("a", "color", "red"))
            .unwrap();

        assert_eq!(rule.apply().len(), 1);
        assert_eq!(rule.revert().len(), 1);
        assert_eq!(store.get().node_attr("a", "color"), Some(&json!("red")));
        // The old value is untouched
        assert_eq!(before.node_attr("a", "color"), Some(&json!("black")));
    }

    #[test]
    fn test_failed_mutator_leaves_state_unchanged() {
        let mut store = store();
        let before = store.get();
        let result = store.update(|d| {
            d.set_node_attr("a", "color", "red")?;
            d.set_node_attr("missing", "color", "red")
        });
        assert_eq!(result.unwrap_err(), PatchError::MissingNode("missing".into()));
        assert_eq!(*store.get(), *before);
    }

    #[test]
    fn test_revert_undoes_overlapping_edits() {
        let mut store = store();
        let original = store.get();
        let rule = store
            .update(|d| {
                d.set_node_attr("a", "color", "red")?;
                d.set_node_attr("a", "color", "blue")?;
                d.set_message("painted")
            })
            .unwrap();

        let mut replica = SnapshotStore::new((*original).clone());
        replica.apply_patches(rule.apply()).unwrap();
        assert_eq!(*replica.get(), *store.get());
        replica.apply_patches(rule.revert()).unwrap();
        assert_eq!(*replica.get(), *original);
    }

    #[test]
    fn test_remove_node_cascades_edges() {
        let mut store = store();
        let original = store.get();
        let rule = store.update(|d| d.remove_node("a")).unwrap();
        assert!(store.get().node("a").is_none());
        assert_eq!(store.get().edge_count(), 0);

        let mut replica = SnapshotStore::new((*store.get()).clone());
        replica.apply_patches(rule.revert()).unwrap();
        assert_eq!(*replica.get(), *original);
    }

    #[test]
    fn test_noop_edits_record_nothing() {
        let mut store = store();
        let rule = store
            .update(|d| d.set_node_attr("a", "color", "black"))
            .unwrap();
        assert!(rule.is_empty());
    }

    #[test]
    fn test_apply_patches_is_atomic() {
        let mut store = store();
        let before = store.get();
        let result = store.apply_patches(&[
            Patch::SetMessage {
                message: Some("x".into()),
            },
            Patch::DeleteNode { id: "zzz".into() },
        ]);
        assert!(result.is_err());
        assert_eq!(*store.get(), *before);
    }
}
