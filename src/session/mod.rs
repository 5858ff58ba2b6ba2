//! The session: wires the step navigator to an execution host
//!
//! A [`Session`] owns exactly one [`StepNavigator`], at most one
//! [`ExecutionHost`], and the watchdog that watches it. It never blocks on the
//! host: [`Session::poll`] drains whatever messages are queued and returns.
//!
//! # Flow
//!
//! ```text
//! step_forward ─► navigator has a buffered step? ─► replay ─► display_changed
//!                        │ no
//!                        ▼
//!                 resume host, arm watchdog
//!                        │
//! poll ◄── rule / step-complete / prompt / print / error / complete
//! ```
//!
//! External collaborators (renderer, prompt UI, console) are reached through
//! the [`SessionListener`] trait.

pub mod watchdog;

pub use watchdog::Watchdog;

use crate::config::SessionConfig;
use crate::errors::{ProtocolError, SessionError, TimeoutError};
use crate::history::{Advance, Closure, Completion, StepNavigator};
use crate::host::{Algorithm, ExecutionHost, HostMessage, PromptRequest};
use crate::snapshot::{Patch, State};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument, warn};

/// Lifecycle of the current algorithm run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmState {
    /// Host started, no step requested yet
    Idle,
    /// Waiting for the host to reach its next boundary
    Running,
    /// Host blocked at a step boundary
    Paused,
    /// Host blocked on a prompt
    Prompting,
    Completed,
    Failed,
    TimedOut,
}

impl AlgorithmState {
    pub fn is_finished(self) -> bool {
        matches!(
            self,
            AlgorithmState::Completed | AlgorithmState::Failed | AlgorithmState::TimedOut
        )
    }

    pub fn label(self) -> &'static str {
        match self {
            AlgorithmState::Idle => "idle",
            AlgorithmState::Running => "running",
            AlgorithmState::Paused => "paused",
            AlgorithmState::Prompting => "input",
            AlgorithmState::Completed => "done",
            AlgorithmState::Failed => "failed",
            AlgorithmState::TimedOut => "timed out",
        }
    }
}

/// What UI controls need after every change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionStatus {
    pub display_state: usize,
    pub steps: usize,
    pub algorithm_state: AlgorithmState,
    pub can_step_forward: bool,
    pub can_step_back: bool,
    pub prompt: Option<PromptRequest>,
}

/// Callbacks into the collaborators around the session
pub trait SessionListener {
    /// The display replica changed by exactly these patches
    fn display_changed(&mut self, patches: &[Patch]);

    /// The display replica was replaced (a new graph was loaded)
    fn display_reset(&mut self, _state: &State) {}

    fn status_changed(&mut self, _status: &SessionStatus) {}

    /// The algorithm wants a value; answer with [`Session::enter_prompt_result`]
    fn prompt(&mut self, request: &PromptRequest);

    /// Console output from the algorithm
    fn message(&mut self, text: &str);

    /// An algorithm error or watchdog timeout ended the run
    fn error(&mut self, error: &SessionError);
}

pub struct Session<L: SessionListener> {
    config: SessionConfig,
    graph: State,
    program: Arc<dyn Algorithm>,
    navigator: StepNavigator,
    host: Option<ExecutionHost>,
    watchdog: Watchdog,
    algorithm_state: AlgorithmState,
    prompt: Option<PromptRequest>,
    listener: L,
}

impl<L: SessionListener> Session<L> {
    /// Create a session and start its execution host.
    ///
    /// Fails with [`SessionError::Patch`] if an edge of `graph` points at a
    /// missing node.
    pub fn new(
        config: SessionConfig,
        graph: State,
        program: Arc<dyn Algorithm>,
        listener: L,
    ) -> Result<Self, SessionError> {
        graph.validate()?;
        let mut session = Session {
            watchdog: Watchdog::new(config.watchdog_timeout),
            config,
            navigator: StepNavigator::new(graph.clone()),
            graph,
            program,
            host: None,
            algorithm_state: AlgorithmState::Idle,
            prompt: None,
            listener,
        };
        session.start()?;
        Ok(session)
    }

    fn start(&mut self) -> Result<(), SessionError> {
        self.navigator = StepNavigator::new(self.graph.clone());
        self.host = Some(ExecutionHost::spawn(&self.graph, Arc::clone(&self.program))?);
        self.algorithm_state = AlgorithmState::Idle;
        self.prompt = None;
        self.watchdog.disarm();
        self.notify_status();
        Ok(())
    }

    fn teardown(&mut self) {
        if let Some(mut host) = self.host.take() {
            host.terminate();
        }
        self.watchdog.disarm();
        self.prompt = None;
    }

    // ========== Accessors ==========

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn graph(&self) -> &State {
        &self.graph
    }

    pub fn algorithm_name(&self) -> &str {
        self.program.name()
    }

    /// Current display replica
    pub fn display(&self) -> Arc<State> {
        self.navigator.display()
    }

    pub fn navigator(&self) -> &StepNavigator {
        &self.navigator
    }

    pub fn algorithm_state(&self) -> AlgorithmState {
        self.algorithm_state
    }

    pub fn host_id(&self) -> Option<u64> {
        self.host.as_ref().map(ExecutionHost::id)
    }

    pub fn pending_prompt(&self) -> Option<&PromptRequest> {
        self.prompt.as_ref()
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            display_state: self.navigator.display_state(),
            steps: self.navigator.steps().len(),
            algorithm_state: self.algorithm_state,
            can_step_forward: self.prompt.is_none() && self.navigator.can_step_forward(),
            can_step_back: self.navigator.can_step_back(),
            prompt: self.prompt.clone(),
        }
    }

    fn notify_status(&mut self) {
        let status = self.status();
        self.listener.status_changed(&status);
    }

    // ========== Human actions ==========

    /// Replay the next step, or ask the host to produce it
    pub fn step_forward(&mut self) -> Result<(), SessionError> {
        if self.prompt.is_some() {
            return Err(ProtocolError::PromptOutstanding.into());
        }
        match self.navigator.step_forward()? {
            Advance::Replayed(patches) => self.listener.display_changed(&patches),
            Advance::NeedsRules => {
                let host = self.host.as_ref().ok_or(ProtocolError::HostNotRunning)?;
                host.resume();
                self.watchdog.arm(Instant::now());
                self.algorithm_state = AlgorithmState::Running;
                debug!(host = host.id(), "requested next step");
            }
        }
        self.notify_status();
        Ok(())
    }

    pub fn step_back(&mut self) -> Result<(), SessionError> {
        let patches = self.navigator.step_back()?;
        self.listener.display_changed(&patches);
        self.notify_status();
        Ok(())
    }

    /// Unwind the display to the initial graph in one change
    pub fn rewind(&mut self) -> Result<(), SessionError> {
        let patches = self.navigator.revert_all()?;
        if !patches.is_empty() {
            self.listener.display_changed(&patches);
        }
        self.notify_status();
        Ok(())
    }

    /// Hand a value to the algorithm blocked on a prompt
    #[instrument(skip_all)]
    pub fn enter_prompt_result(&mut self, value: &str) -> Result<(), SessionError> {
        if self.prompt.is_none() {
            return Err(ProtocolError::NoPromptOutstanding.into());
        }
        let host = self.host.as_ref().ok_or(ProtocolError::HostNotRunning)?;
        host.resume_with(value)?;
        info!(host = host.id(), "prompt answered");
        self.prompt = None;
        self.algorithm_state = AlgorithmState::Running;
        self.watchdog.arm(Instant::now());
        self.notify_status();
        Ok(())
    }

    /// Swap in a new input graph; history and host start over.
    ///
    /// An invalid graph is rejected and the current run is left as it was.
    #[instrument(skip_all)]
    pub fn set_graph(&mut self, graph: State) -> Result<(), SessionError> {
        graph.validate()?;
        self.unwind()?;
        self.teardown();
        self.graph = graph;
        self.listener.display_reset(&self.graph);
        info!(nodes = self.graph.node_count(), "graph replaced");
        self.start()
    }

    /// Swap in a new algorithm; history and host start over
    #[instrument(skip_all)]
    pub fn set_algorithm(&mut self, program: Arc<dyn Algorithm>) -> Result<(), SessionError> {
        self.unwind()?;
        self.teardown();
        self.program = program;
        info!(algorithm = self.program.name(), "algorithm replaced");
        self.start()
    }

    /// Run the current algorithm again from scratch
    #[instrument(skip_all)]
    pub fn restart(&mut self) -> Result<(), SessionError> {
        self.unwind()?;
        self.teardown();
        self.start()
    }

    fn unwind(&mut self) -> Result<(), SessionError> {
        let patches = self.navigator.revert_all()?;
        if !patches.is_empty() {
            self.listener.display_changed(&patches);
        }
        Ok(())
    }

    // ========== Host messages ==========

    /// Process every queued host message, then check the watchdog.
    ///
    /// Returns the number of messages handled. Never blocks.
    pub fn poll(&mut self) -> Result<usize, SessionError> {
        let mut handled = 0;
        while let Some(host) = self.host.as_ref() {
            match host.try_recv() {
                Ok(Some(message)) => {
                    self.dispatch(message)?;
                    handled += 1;
                }
                Ok(None) => break,
                Err(e) => {
                    self.fail_silently(AlgorithmState::Failed)?;
                    return Err(e.into());
                }
            }
        }
        self.check_watchdog(Instant::now())?;
        Ok(handled)
    }

    /// Wait up to `max_wait` (shortened to the watchdog deadline) for the
    /// next host message, then behave like [`poll`](Self::poll).
    pub fn poll_timeout(&mut self, max_wait: Duration) -> Result<usize, SessionError> {
        let wait = match self.watchdog.remaining(Instant::now()) {
            Some(left) => left.min(max_wait),
            None => max_wait,
        };
        let mut handled = 0;
        if let Some(host) = self.host.as_ref() {
            match host.recv_timeout(wait) {
                Ok(Some(message)) => {
                    self.dispatch(message)?;
                    handled += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    self.fail_silently(AlgorithmState::Failed)?;
                    return Err(e.into());
                }
            }
        }
        Ok(handled + self.poll()?)
    }

    fn dispatch(&mut self, message: HostMessage) -> Result<(), SessionError> {
        debug!(kind = message.kind(), "host message");
        match message {
            HostMessage::Rule(rule) => {
                self.navigator.add_rule(rule);
                self.watchdog.disarm();
                // Still expecting the boundary: the window starts over
                if self.navigator.is_awaiting_rules() {
                    self.watchdog.arm(Instant::now());
                }
            }
            HostMessage::StepComplete => {
                self.watchdog.disarm();
                match self.navigator.complete_step()? {
                    Completion::Replayed(patches) => {
                        self.listener.display_changed(&patches);
                        self.algorithm_state = AlgorithmState::Paused;
                    }
                    Completion::Buffered => self.algorithm_state = AlgorithmState::Paused,
                    Completion::Empty if self.navigator.is_awaiting_rules() => {
                        // Nothing visible happened yet; keep going
                        let host = self.host.as_ref().ok_or(ProtocolError::HostNotRunning)?;
                        host.resume();
                        self.watchdog.arm(Instant::now());
                    }
                    Completion::Empty => self.algorithm_state = AlgorithmState::Paused,
                }
                self.notify_status();
            }
            HostMessage::Prompt(request) => {
                if self.prompt.is_some() {
                    return Err(ProtocolError::PromptOutstanding.into());
                }
                self.watchdog.disarm();
                self.algorithm_state = AlgorithmState::Prompting;
                info!(label = %request.label, kind = %request.kind, "algorithm prompted");
                self.listener.prompt(&request);
                self.prompt = Some(request);
                self.notify_status();
            }
            HostMessage::Print(text) => self.listener.message(&text),
            HostMessage::Error(error) => {
                warn!(%error, "algorithm failed");
                self.fail(SessionError::Algorithm(error), AlgorithmState::Failed)?;
            }
            HostMessage::Complete => {
                self.watchdog.disarm();
                if let Completion::Replayed(patches) = self.navigator.close(Closure::Completed)? {
                    self.listener.display_changed(&patches);
                }
                if let Some(mut host) = self.host.take() {
                    host.reap();
                }
                self.algorithm_state = AlgorithmState::Completed;
                info!(steps = self.navigator.steps().len(), "algorithm completed");
                self.notify_status();
            }
        }
        Ok(())
    }

    fn check_watchdog(&mut self, now: Instant) -> Result<(), SessionError> {
        if !self.watchdog.expired(now) {
            return Ok(());
        }
        let error = TimeoutError::new(self.watchdog.timeout());
        warn!(%error, "watchdog expired");
        self.fail(SessionError::Timeout(error), AlgorithmState::TimedOut)
    }

    /// End the run and report `error` to the user
    fn fail(&mut self, error: SessionError, state: AlgorithmState) -> Result<(), SessionError> {
        self.fail_silently(state)?;
        self.listener.error(&error);
        self.notify_status();
        Ok(())
    }

    fn fail_silently(&mut self, state: AlgorithmState) -> Result<(), SessionError> {
        self.teardown();
        self.navigator.close(Closure::Failed)?;
        self.algorithm_state = state;
        Ok(())
    }
}
