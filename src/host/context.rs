//! The interface algorithm code runs against

use super::{HostError, HostMessage, PromptKind, PromptRequest, SyncChannel, Wake};
use crate::snapshot::{Draft, SnapshotStore, State};
use std::sync::mpsc::Sender;
use std::sync::Arc;
use tracing::trace;

/// Handle given to [`Algorithm::run`](super::Algorithm::run).
///
/// Owns the algorithm's replica of the state. Every method first checks for
/// termination, so an algorithm that keeps calling into its context stops
/// promptly once the session lets go of it.
pub struct HostContext {
    store: SnapshotStore,
    channel: Arc<SyncChannel>,
    outbox: Sender<HostMessage>,
}

impl HostContext {
    pub(crate) fn new(state: State, channel: Arc<SyncChannel>, outbox: Sender<HostMessage>) -> Self {
        HostContext {
            store: SnapshotStore::new(state),
            channel,
            outbox,
        }
    }

    /// The algorithm replica as of the last update
    pub fn state(&self) -> Arc<State> {
        self.store.get()
    }

    /// Mutate the graph. The change is reported as one rule.
    ///
    /// A failing mutator leaves the replica unchanged and reports nothing.
    pub fn update<F, E>(&mut self, mutator: F) -> Result<(), HostError>
    where
        F: FnOnce(&mut Draft) -> Result<(), E>,
        HostError: From<E>,
    {
        self.ensure_alive()?;
        let rule = self.store.update(mutator)?;
        if !rule.is_empty() {
            trace!(patches = rule.apply().len(), "rule recorded");
            self.send(HostMessage::Rule(rule))?;
        }
        Ok(())
    }

    /// Mark a step boundary and block until the session asks for more
    pub fn step(&mut self) -> Result<(), HostError> {
        self.ensure_alive()?;
        self.send(HostMessage::StepComplete)?;
        self.block()
    }

    /// Ask the human for a value and block until it is entered
    pub fn prompt(&mut self, label: impl Into<String>, kind: PromptKind) -> Result<String, HostError> {
        self.ensure_alive()?;
        self.send(HostMessage::Prompt(PromptRequest {
            label: label.into(),
            kind,
        }))?;
        self.block()?;
        Ok(self.channel.read_payload())
    }

    /// Console output for the human; no effect on state
    pub fn print(&mut self, text: impl Into<String>) -> Result<(), HostError> {
        self.ensure_alive()?;
        self.send(HostMessage::Print(text.into()))
    }

    pub fn is_terminated(&self) -> bool {
        self.channel.is_terminated()
    }

    fn ensure_alive(&self) -> Result<(), HostError> {
        if self.channel.is_terminated() {
            Err(HostError::Terminated)
        } else {
            Ok(())
        }
    }

    fn send(&self, message: HostMessage) -> Result<(), HostError> {
        // A closed inbox means the session dropped this host
        self.outbox.send(message).map_err(|_| HostError::Terminated)
    }

    fn block(&self) -> Result<(), HostError> {
        match self.channel.wait() {
            Wake::Resumed => Ok(()),
            Wake::Terminated => Err(HostError::Terminated),
        }
    }
}
