//! Bidirectional navigation over completed steps
//!
//! The navigator owns the *display* replica. It never talks to the execution
//! host directly: when the human asks for a step that has not been produced
//! yet, [`StepNavigator::step_forward`] answers [`Advance::NeedsRules`] and the
//! caller is responsible for resuming the host. Every method that changes the
//! display returns the patches it applied so they can be forwarded to a
//! renderer.

use super::{Rule, Step};
use crate::errors::ProtocolError;
use crate::snapshot::{Patch, SnapshotStore, State};
use std::sync::Arc;
use tracing::debug;

/// Result of [`StepNavigator::step_forward`]
#[derive(Debug, Clone, PartialEq)]
pub enum Advance {
    /// A buffered step was replayed onto the display
    Replayed(Vec<Patch>),
    /// Nothing buffered: a pending step was opened and new rules are needed
    NeedsRules,
}

/// Result of [`StepNavigator::complete_step`]
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The new step was the one being waited on and has been replayed
    Replayed(Vec<Patch>),
    /// The new step was appended to history without touching the display
    Buffered,
    /// The boundary carried no rules, so no step was created
    Empty,
}

/// How the rule source (the execution host) ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Closure {
    Completed,
    Failed,
}

/// Snapshot of the navigator's counters for UI controls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NavigatorStatus {
    pub display_state: usize,
    pub steps: usize,
    pub pending_rules: usize,
    pub awaiting_rules: bool,
    pub source_open: bool,
    pub can_step_forward: bool,
    pub can_step_back: bool,
}

#[derive(Debug)]
pub struct StepNavigator {
    display: SnapshotStore,
    steps: Vec<Step>,
    pending: Option<Vec<Rule>>,
    /// Number of steps replayed onto the display, in `0..=steps.len()`
    display_state: usize,
    /// A step_forward is waiting for the pending step to complete
    awaiting: bool,
    /// The execution host may still produce rules
    source_open: bool,
}

impl StepNavigator {
    pub fn new(initial: State) -> Self {
        StepNavigator {
            display: SnapshotStore::new(initial),
            steps: Vec::new(),
            pending: None,
            display_state: 0,
            awaiting: false,
            source_open: true,
        }
    }

    /// Current value of the display replica
    pub fn display(&self) -> Arc<State> {
        self.display.get()
    }

    pub fn display_state(&self) -> usize {
        self.display_state
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Rules buffered for the step still being assembled
    pub fn pending_rules(&self) -> &[Rule] {
        self.pending.as_deref().unwrap_or(&[])
    }

    pub fn is_awaiting_rules(&self) -> bool {
        self.awaiting
    }

    pub fn is_source_open(&self) -> bool {
        self.source_open
    }

    /// Forward motion is blocked only when nothing is buffered and nothing
    /// more can be requested (the source is closed or a request is in flight).
    pub fn can_step_forward(&self) -> bool {
        self.display_state < self.steps.len() || (self.source_open && !self.awaiting)
    }

    pub fn can_step_back(&self) -> bool {
        self.display_state > 0
    }

    pub fn status(&self) -> NavigatorStatus {
        NavigatorStatus {
            display_state: self.display_state,
            steps: self.steps.len(),
            pending_rules: self.pending_rules().len(),
            awaiting_rules: self.awaiting,
            source_open: self.source_open,
            can_step_forward: self.can_step_forward(),
            can_step_back: self.can_step_back(),
        }
    }

    /// Replay the next buffered step, or open a pending step and ask for rules
    pub fn step_forward(&mut self) -> Result<Advance, ProtocolError> {
        if !self.can_step_forward() {
            return Err(ProtocolError::CannotStepForward);
        }
        if self.display_state < self.steps.len() {
            return self.replay_next().map(Advance::Replayed);
        }
        self.pending.get_or_insert_with(Vec::new);
        self.awaiting = true;
        debug!(display_state = self.display_state, "waiting for new rules");
        Ok(Advance::NeedsRules)
    }

    /// Undo the most recently replayed step
    pub fn step_back(&mut self) -> Result<Vec<Patch>, ProtocolError> {
        if !self.can_step_back() {
            return Err(ProtocolError::CannotStepBack);
        }
        let step = &self.steps[self.display_state - 1];
        let patches: Vec<Patch> = step.revert_patches().cloned().collect();
        self.display.apply_patches(&patches)?;
        self.display_state -= 1;
        Ok(patches)
    }

    /// Buffer a rule into the pending step, opening one if needed
    pub fn add_rule(&mut self, rule: Rule) {
        self.pending.get_or_insert_with(Vec::new).push(rule);
    }

    /// Move the pending buffer into history.
    ///
    /// If the display was waiting on exactly this step it is replayed right
    /// away so no second user action is needed.
    pub fn complete_step(&mut self) -> Result<Completion, ProtocolError> {
        let rules = self.pending.take().unwrap_or_default();
        let step = match Step::new(rules) {
            Some(step) => step,
            None => {
                if self.awaiting {
                    self.pending = Some(Vec::new());
                }
                return Ok(Completion::Empty);
            }
        };

        self.steps.push(step);
        self.awaiting = false;
        debug!(steps = self.steps.len(), "step completed");

        if self.display_state + 1 == self.steps.len() {
            self.replay_next().map(Completion::Replayed)
        } else {
            Ok(Completion::Buffered)
        }
    }

    /// Mark the rule source as finished.
    ///
    /// A normal completion promotes leftover rules into a final step. A
    /// failure keeps them pending; they are never completed.
    pub fn close(&mut self, how: Closure) -> Result<Completion, ProtocolError> {
        self.source_open = false;
        let completion = match how {
            Closure::Completed if !self.pending_rules().is_empty() => self.complete_step()?,
            Closure::Completed => {
                self.pending = None;
                Completion::Empty
            }
            Closure::Failed => Completion::Empty,
        };
        self.awaiting = false;
        Ok(completion)
    }

    /// Unwind every replayed step in a single patch application
    pub fn revert_all(&mut self) -> Result<Vec<Patch>, ProtocolError> {
        let patches: Vec<Patch> = self.steps[..self.display_state]
            .iter()
            .rev()
            .flat_map(|step| step.revert_patches())
            .cloned()
            .collect();
        self.display.apply_patches(&patches)?;
        self.display_state = 0;
        Ok(patches)
    }

    fn replay_next(&mut self) -> Result<Vec<Patch>, ProtocolError> {
        let step = &self.steps[self.display_state];
        let patches: Vec<Patch> = step.apply_patches().cloned().collect();
        self.display.apply_patches(&patches)?;
        self.display_state += 1;
        Ok(patches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Node;
    use serde_json::json;

    fn three_nodes() -> State {
        ["a", "b", "c"].iter().fold(State::new(), |s, id| {
            s.with_node(*id, Node::new().with_attr("color", "black"))
        })
    }

    /// Record one rule per node, each painting it red
    fn paint_rules(initial: &State) -> Vec<Rule> {
        let mut algo = SnapshotStore::new(initial.clone());
        ["a", "b", "c"]
            .iter()
            .map(|id| algo.update(|d| d.set_node_attr(id, "color", "red")).unwrap())
            .collect()
    }

    fn color(nav: &StepNavigator, id: &str) -> serde_json::Value {
        nav.display().node_attr(id, "color").cloned().unwrap()
    }

    #[test]
    fn test_fresh_navigator_can_only_request() {
        let nav = StepNavigator::new(three_nodes());
        assert!(nav.can_step_forward());
        assert!(!nav.can_step_back());
        assert_eq!(nav.display_state(), 0);
    }

    #[test]
    fn test_request_then_complete_replays_immediately() {
        let initial = three_nodes();
        let rules = paint_rules(&initial);
        let mut nav = StepNavigator::new(initial);

        assert_eq!(nav.step_forward().unwrap(), Advance::NeedsRules);
        assert!(nav.has_pending());
        // In flight: a second request is refused
        assert!(!nav.can_step_forward());
        assert_eq!(nav.step_forward(), Err(ProtocolError::CannotStepForward));

        nav.add_rule(rules[0].clone());
        assert!(matches!(nav.complete_step().unwrap(), Completion::Replayed(_)));
        assert_eq!(nav.display_state(), 1);
        assert!(!nav.has_pending());
        assert_eq!(color(&nav, "a"), json!("red"));
    }

    #[test]
    fn test_back_and_forth_replays_in_order() {
        let initial = three_nodes();
        let rules = paint_rules(&initial);
        let mut nav = StepNavigator::new(initial);
        for rule in rules {
            nav.step_forward().unwrap();
            nav.add_rule(rule);
            nav.complete_step().unwrap();
        }
        assert_eq!(nav.display_state(), 3);

        nav.step_back().unwrap();
        assert_eq!(color(&nav, "c"), json!("black"));
        assert_eq!(color(&nav, "b"), json!("red"));
        nav.step_back().unwrap();
        nav.step_back().unwrap();
        assert!(!nav.can_step_back());
        assert_eq!(nav.step_back(), Err(ProtocolError::CannotStepBack));

        for (i, id) in ["a", "b", "c"].iter().enumerate() {
            assert!(matches!(nav.step_forward().unwrap(), Advance::Replayed(_)));
            assert_eq!(nav.display_state(), i + 1);
            assert_eq!(color(&nav, id), json!("red"));
        }
    }

    #[test]
    fn test_empty_boundary_keeps_waiting() {
        let mut nav = StepNavigator::new(three_nodes());
        nav.step_forward().unwrap();
        assert_eq!(nav.complete_step().unwrap(), Completion::Empty);
        assert!(nav.is_awaiting_rules());
        assert!(nav.has_pending());
        assert!(nav.steps().is_empty());
    }

    #[test]
    fn test_completion_while_stepped_back_is_buffered() {
        let initial = three_nodes();
        let rules = paint_rules(&initial);
        let mut nav = StepNavigator::new(initial);
        nav.step_forward().unwrap();
        nav.add_rule(rules[0].clone());
        nav.complete_step().unwrap();

        nav.step_forward().unwrap();
        nav.step_back().unwrap();
        nav.add_rule(rules[1].clone());
        assert_eq!(nav.complete_step().unwrap(), Completion::Buffered);
        assert_eq!(nav.display_state(), 0);
        assert_eq!(nav.steps().len(), 2);
        assert!(!nav.is_awaiting_rules());
    }

    #[test]
    fn test_failure_never_completes_pending_step() {
        let initial = three_nodes();
        let rules = paint_rules(&initial);
        let mut nav = StepNavigator::new(initial);
        nav.step_forward().unwrap();
        nav.add_rule(rules[0].clone());

        assert_eq!(nav.close(Closure::Failed).unwrap(), Completion::Empty);
        assert!(nav.steps().is_empty());
        assert_eq!(nav.pending_rules().len(), 1);
        assert!(!nav.can_step_forward());
    }

    #[test]
    fn test_completion_promotes_trailing_rules() {
        let initial = three_nodes();
        let rules = paint_rules(&initial);
        let mut nav = StepNavigator::new(initial);
        nav.step_forward().unwrap();
        nav.add_rule(rules[0].clone());

        assert!(matches!(
            nav.close(Closure::Completed).unwrap(),
            Completion::Replayed(_)
        ));
        assert_eq!(nav.steps().len(), 1);
        assert_eq!(nav.display_state(), 1);
        assert!(!nav.can_step_forward());
    }

    #[test]
    fn test_revert_all_restores_initial_display() {
        let initial = three_nodes();
        let rules = paint_rules(&initial);
        let mut nav = StepNavigator::new(initial.clone());
        for rule in rules {
            nav.step_forward().unwrap();
            nav.add_rule(rule);
            nav.complete_step().unwrap();
        }
        nav.step_back().unwrap();

        let patches = nav.revert_all().unwrap();
        assert_eq!(patches.len(), 2);
        assert_eq!(nav.display_state(), 0);
        assert_eq!(*nav.display(), initial);
    }
}
