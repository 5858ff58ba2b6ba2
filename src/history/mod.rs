//! Recorded history: rules, steps, and the navigator that replays them
//!
//! A [`Rule`] is one captured mutation (forward patches plus their exact
//! inverse). A [`Step`] is the ordered, non-empty group of rules produced
//! between two step markers of the algorithm. The
//! [`StepNavigator`](navigator::StepNavigator) moves a display replica back
//! and forth through completed steps.

pub mod navigator;

pub use navigator::{Advance, Closure, Completion, NavigatorStatus, StepNavigator};

use crate::snapshot::Patch;
use serde::{Deserialize, Serialize};

/// A captured mutation
///
/// `revert` is stored in application order: applying `apply` and then
/// `revert` to the same state returns the original state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    apply: Vec<Patch>,
    revert: Vec<Patch>,
}

impl Rule {
    pub(crate) fn new(apply: Vec<Patch>, revert: Vec<Patch>) -> Self {
        Rule { apply, revert }
    }

    pub fn apply(&self) -> &[Patch] {
        &self.apply
    }

    pub fn revert(&self) -> &[Patch] {
        &self.revert
    }

    pub fn is_empty(&self) -> bool {
        self.apply.is_empty()
    }
}

/// An author-delimited group of rules; the unit of navigation
#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    rules: Vec<Rule>,
}

impl Step {
    /// Build a step, or `None` if there are no rules
    pub fn new(rules: Vec<Rule>) -> Option<Self> {
        if rules.is_empty() {
            None
        } else {
            Some(Step { rules })
        }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Forward patches, rule by rule
    pub fn apply_patches(&self) -> impl Iterator<Item = &Patch> {
        self.rules.iter().flat_map(|r| r.apply.iter())
    }

    /// Undo patches: last rule first, each rule's revert list in order
    pub fn revert_patches(&self) -> impl Iterator<Item = &Patch> {
        self.rules.iter().rev().flat_map(|r| r.revert.iter())
    }
}
