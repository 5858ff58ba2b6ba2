//! Built-in algorithms
//!
//! Each algorithm marks one step per visible change so the viewer can walk
//! through it node by node. Colors are plain attribute values (`"color"`);
//! the viewer knows how to draw the common ones.

use crate::errors::AlgorithmError;
use crate::host::{Algorithm, HostContext, HostError, PromptKind};
use crate::snapshot::NodeId;
use rustc_hash::FxHashSet;
use std::collections::VecDeque;
use std::sync::Arc;

pub const COLOR: &str = "color";
pub const VISITED: &str = "visited";

const NAMES: &[&str] = &["paint", "bfs", "dfs"];

/// Names accepted by [`by_name`]
pub fn names() -> &'static [&'static str] {
    NAMES
}

pub fn by_name(name: &str) -> Option<Arc<dyn Algorithm>> {
    match name {
        "paint" => Some(Arc::new(Paint::new("red"))),
        "bfs" => Some(Arc::new(Traversal::breadth_first())),
        "dfs" => Some(Arc::new(Traversal::depth_first())),
        _ => None,
    }
}

/// Colors every node, one step per node, in id order
pub struct Paint {
    color: String,
}

impl Paint {
    pub fn new(color: impl Into<String>) -> Self {
        Paint {
            color: color.into(),
        }
    }
}

impl Algorithm for Paint {
    fn name(&self) -> &str {
        "paint"
    }

    fn run(&self, ctx: &mut HostContext) -> Result<(), HostError> {
        let ids: Vec<NodeId> = ctx.state().nodes().map(|(id, _)| id.clone()).collect();
        for id in &ids {
            ctx.update(|d| {
                d.set_node_attr(id, COLOR, self.color.as_str())?;
                d.set_message(format!("painted {}", id))
            })?;
            ctx.step()?;
        }
        ctx.print(format!("painted {} nodes {}", ids.len(), self.color))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Order {
    Breadth,
    Depth,
}

/// Graph traversal from a node chosen by the user.
///
/// Visited nodes turn red and get their visit index; discovered but not yet
/// visited nodes turn orange.
pub struct Traversal {
    order: Order,
}

impl Traversal {
    pub fn breadth_first() -> Self {
        Traversal {
            order: Order::Breadth,
        }
    }

    pub fn depth_first() -> Self {
        Traversal {
            order: Order::Depth,
        }
    }
}

impl Algorithm for Traversal {
    fn name(&self) -> &str {
        match self.order {
            Order::Breadth => "bfs",
            Order::Depth => "dfs",
        }
    }

    fn run(&self, ctx: &mut HostContext) -> Result<(), HostError> {
        if ctx.state().node_count() == 0 {
            return Err(AlgorithmError::new("graph has no nodes").into());
        }
        let start = prompt_start_node(ctx)?;

        let mut seen: FxHashSet<NodeId> = FxHashSet::default();
        let mut frontier: VecDeque<NodeId> = VecDeque::new();
        seen.insert(start.clone());
        frontier.push_back(start);

        let mut visited = 0u64;
        loop {
            let next = match self.order {
                Order::Breadth => frontier.pop_front(),
                Order::Depth => frontier.pop_back(),
            };
            let Some(node) = next else { break };

            let state = ctx.state();
            let discovered: Vec<NodeId> = state
                .neighbors(&node)
                .filter(|n| !seen.contains(*n))
                .cloned()
                .collect();

            ctx.update(|d| {
                d.set_node_attr(&node, COLOR, "red")?;
                d.set_node_attr(&node, VISITED, visited)?;
                for n in &discovered {
                    d.set_node_attr(n, COLOR, "orange")?;
                }
                d.set_message(format!("visit {} (#{})", node, visited))
            })?;

            for n in discovered {
                seen.insert(n.clone());
                frontier.push_back(n);
            }
            visited += 1;
            ctx.step()?;
        }

        ctx.print(format!("{} visited {} node(s)", self.name(), visited))
    }
}

/// Ask until the answer names an existing node
fn prompt_start_node(ctx: &mut HostContext) -> Result<NodeId, HostError> {
    loop {
        let answer = ctx.prompt("Start node", PromptKind::Node)?;
        let answer = answer.trim().to_string();
        if ctx.state().node(&answer).is_some() {
            return Ok(answer);
        }
        ctx.print(format!("no node named '{}'", answer))?;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_name_resolves() {
        for name in names() {
            let algorithm = by_name(name).unwrap();
            assert_eq!(algorithm.name(), *name);
        }
        assert!(by_name("nope").is_none());
    }
}
