//! The execution host: where algorithm code runs
//!
//! An algorithm runs on its own thread against its own replica of the state.
//! It reports back to the session through a FIFO of [`HostMessage`]s and
//! suspends itself on the [`SyncChannel`](channel::SyncChannel) at exactly two
//! points: a step boundary and a prompt for user input.
//!
//! - [`channel`]: the shared wake/prompt cell
//! - [`context`]: the API algorithm code is written against
//! - [`worker`]: spawning and terminating the host thread

pub mod channel;
pub mod context;
pub mod worker;

pub use channel::{SyncChannel, Wake};
pub use context::HostContext;
pub use worker::ExecutionHost;

use crate::errors::{AlgorithmError, PatchError};
use crate::history::Rule;
use std::fmt;
use thiserror::Error;

/// What kind of value a prompt expects
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Text,
    Number,
    /// The id of a node in the current graph
    Node,
}

impl fmt::Display for PromptKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PromptKind::Text => write!(f, "text"),
            PromptKind::Number => write!(f, "number"),
            PromptKind::Node => write!(f, "node"),
        }
    }
}

/// A request for a value from the human
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptRequest {
    pub label: String,
    pub kind: PromptKind,
}

/// Messages from the execution host, delivered in emission order
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    /// One completed mutation
    Rule(Rule),
    /// The algorithm reached a step marker and is now blocked
    StepComplete,
    /// The algorithm needs a value and is now blocked
    Prompt(PromptRequest),
    /// Console output, no effect on state
    Print(String),
    /// Unrecoverable fault; the host has stopped
    Error(AlgorithmError),
    /// The algorithm returned normally; the host has stopped
    Complete,
}

impl HostMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            HostMessage::Rule(_) => "rule",
            HostMessage::StepComplete => "step-complete",
            HostMessage::Prompt(_) => "prompt",
            HostMessage::Print(_) => "print",
            HostMessage::Error(_) => "error",
            HostMessage::Complete => "complete",
        }
    }
}

/// Why an algorithm stopped early
#[derive(Debug, Error)]
pub enum HostError {
    #[error(transparent)]
    Algorithm(#[from] AlgorithmError),

    /// The session asked the host to stop, or went away
    #[error("execution host terminated")]
    Terminated,
}

impl From<PatchError> for HostError {
    #[track_caller]
    fn from(err: PatchError) -> Self {
        HostError::Algorithm(AlgorithmError::new(err.to_string()))
    }
}

/// A graph algorithm that can be stepped through
pub trait Algorithm: Send + Sync {
    fn name(&self) -> &str;

    /// Run to completion. Call [`HostContext::step`] to mark step boundaries.
    fn run(&self, ctx: &mut HostContext) -> Result<(), HostError>;
}

/// Algorithm built from a closure
pub struct FnAlgorithm<F> {
    name: String,
    body: F,
}

impl<F> Algorithm for FnAlgorithm<F>
where
    F: Fn(&mut HostContext) -> Result<(), HostError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn run(&self, ctx: &mut HostContext) -> Result<(), HostError> {
        (self.body)(ctx)
    }
}

/// Wrap a closure as an [`Algorithm`]
pub fn algorithm_fn<F>(name: impl Into<String>, body: F) -> FnAlgorithm<F>
where
    F: Fn(&mut HostContext) -> Result<(), HostError> + Send + Sync,
{
    FnAlgorithm {
        name: name.into(),
        body,
    }
}
