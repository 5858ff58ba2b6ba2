// Property tests: recorded patches replay and undo exactly

use graphstep::errors::PatchError;
use graphstep::history::{Advance, Completion, Rule, StepNavigator};
use graphstep::snapshot::{Draft, Edge, Node, SnapshotStore, State};
use proptest::prelude::*;

const NODES: [&str; 4] = ["a", "b", "c", "d"];
const COLORS: [&str; 3] = ["red", "orange", "green"];

#[derive(Debug, Clone)]
enum Op {
    Color(usize, usize),
    Uncolor(usize),
    Link(usize, usize),
    Unlink(usize, usize),
    Insert(usize),
    Remove(usize),
    Message(u8),
    ClearMessage,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (0..4usize, 0..3usize).prop_map(|(n, c)| Op::Color(n, c)),
        (0..4usize).prop_map(Op::Uncolor),
        (0..4usize, 0..4usize).prop_map(|(s, t)| Op::Link(s, t)),
        (0..4usize, 0..4usize).prop_map(|(s, t)| Op::Unlink(s, t)),
        (0..4usize).prop_map(Op::Insert),
        (0..4usize).prop_map(Op::Remove),
        any::<u8>().prop_map(Op::Message),
        Just(Op::ClearMessage),
    ]
}

/// steps → rules → edits
fn program() -> impl Strategy<Value = Vec<Vec<Vec<Op>>>> {
    prop::collection::vec(
        prop::collection::vec(prop::collection::vec(op(), 1..4), 1..4),
        0..8,
    )
}

fn initial() -> State {
    State::new()
        .with_node("a", Node::new().with_attr("color", "black"))
        .with_node("b", Node::new())
        .with_node("c", Node::new().with_attr("weight", 3))
        .with_edge("a-b", Edge::new("a", "b"))
}

fn edge_id(s: usize, t: usize) -> String {
    format!("{}-{}", NODES[s], NODES[t])
}

fn run_op(draft: &mut Draft, op: &Op) -> Result<(), PatchError> {
    match op {
        Op::Color(n, c) => draft.set_node_attr(NODES[*n], "color", COLORS[*c]),
        Op::Uncolor(n) => draft.remove_node_attr(NODES[*n], "color"),
        Op::Link(s, t) => draft.add_edge(edge_id(*s, *t), Edge::new(NODES[*s], NODES[*t])),
        Op::Unlink(s, t) => draft.remove_edge(&edge_id(*s, *t)),
        Op::Insert(n) => draft.add_node(NODES[*n], Node::new()),
        Op::Remove(n) => draft.remove_node(NODES[*n]),
        Op::Message(m) => draft.set_message(format!("m{}", m)),
        Op::ClearMessage => draft.clear_message(),
    }
}

/// Record the program against a store; failed or empty rules are dropped.
///
/// Returns the non-empty steps and the algorithm state after each of them.
fn record(ops: &[Vec<Vec<Op>>]) -> (Vec<Vec<Rule>>, Vec<State>) {
    let mut store = SnapshotStore::new(initial());
    let mut steps = Vec::new();
    let mut states = Vec::new();
    for step in ops {
        let rules: Vec<Rule> = step
            .iter()
            .filter_map(|edits| {
                store
                    .update(|d| edits.iter().try_for_each(|op| run_op(d, op)))
                    .ok()
            })
            .filter(|rule| !rule.is_empty())
            .collect();
        if !rules.is_empty() {
            steps.push(rules);
            states.push((*store.get()).clone());
        }
    }
    (steps, states)
}

proptest! {
    #[test]
    fn rule_revert_restores_prior_state(edits in prop::collection::vec(op(), 1..8)) {
        let before = initial();
        let mut store = SnapshotStore::new(before.clone());
        if let Ok(rule) = store.update(|d| edits.iter().try_for_each(|op| run_op(d, op))) {
            let after = (*store.get()).clone();

            let mut replica = SnapshotStore::new(before.clone());
            replica.apply_patches(rule.apply()).unwrap();
            prop_assert_eq!(&*replica.get(), &after);

            replica.apply_patches(rule.revert()).unwrap();
            prop_assert_eq!(&*replica.get(), &before);
        } else {
            // A failed mutator leaves nothing behind
            prop_assert_eq!(&*store.get(), &before);
        }
    }

    #[test]
    fn navigator_tracks_algorithm_states(ops in program()) {
        let (steps, states) = record(&ops);
        let mut nav = StepNavigator::new(initial());

        for (rules, expected) in steps.iter().zip(&states) {
            prop_assert_eq!(nav.step_forward().unwrap(), Advance::NeedsRules);
            for rule in rules {
                nav.add_rule(rule.clone());
            }
            let replayed = matches!(nav.complete_step().unwrap(), Completion::Replayed(_));
            prop_assert!(replayed);
            prop_assert_eq!(&*nav.display(), expected);
        }

        // Walk all the way back, checking every intermediate state
        for i in (0..states.len()).rev() {
            nav.step_back().unwrap();
            let expected = if i == 0 { initial() } else { states[i - 1].clone() };
            prop_assert_eq!(&*nav.display(), &expected);
        }

        // And forward again from the buffer
        for expected in &states {
            let advanced = matches!(nav.step_forward().unwrap(), Advance::Replayed(_));
            prop_assert!(advanced);
            prop_assert_eq!(&*nav.display(), expected);
        }
    }

    #[test]
    fn revert_all_returns_to_initial(ops in program(), back in 0usize..8) {
        let (steps, _) = record(&ops);
        let mut nav = StepNavigator::new(initial());
        for rules in &steps {
            nav.step_forward().unwrap();
            for rule in rules {
                nav.add_rule(rule.clone());
            }
            nav.complete_step().unwrap();
        }
        for _ in 0..back.min(steps.len()) {
            nav.step_back().unwrap();
        }

        nav.revert_all().unwrap();
        prop_assert_eq!(nav.display_state(), 0);
        prop_assert_eq!(&*nav.display(), &initial());
        prop_assert_eq!(nav.steps().len(), steps.len());
    }
}
