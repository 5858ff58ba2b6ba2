//! Spawning, talking to, and stopping the execution host thread

use super::{Algorithm, HostContext, HostError, HostMessage, SyncChannel, Wake};
use crate::errors::{AlgorithmError, ChannelError, ProtocolError, SessionError};
use crate::snapshot::State;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, info_span, warn};

static NEXT_HOST_ID: AtomicU64 = AtomicU64::new(1);

/// Session-side handle to one running algorithm.
///
/// Each host gets a fresh [`SyncChannel`] and message queue; neither is ever
/// reused by another host. Dropping the handle terminates the host.
#[derive(Debug)]
pub struct ExecutionHost {
    id: u64,
    algorithm: String,
    channel: Arc<SyncChannel>,
    inbox: Receiver<HostMessage>,
    handle: Option<JoinHandle<()>>,
}

impl ExecutionHost {
    /// Start a host thread for `program` over a serialized copy of `initial`.
    ///
    /// The algorithm does not run until the first [`resume`](Self::resume).
    pub fn spawn(initial: &State, program: Arc<dyn Algorithm>) -> Result<Self, SessionError> {
        let id = NEXT_HOST_ID.fetch_add(1, Ordering::Relaxed);
        let serialized = initial.to_json()?;
        let channel = Arc::new(SyncChannel::new());
        let (outbox, inbox) = mpsc::channel();
        let algorithm = program.name().to_string();

        let host_channel = Arc::clone(&channel);
        let handle = thread::Builder::new()
            .name(format!("graphstep-host-{}", id))
            .spawn(move || host_main(id, serialized, program, host_channel, outbox))?;

        info!(host = id, algorithm = %algorithm, "execution host spawned");
        Ok(ExecutionHost {
            id,
            algorithm,
            channel,
            inbox,
            handle: Some(handle),
        })
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn algorithm(&self) -> &str {
        &self.algorithm
    }

    pub fn resume(&self) {
        self.channel.resume();
    }

    pub fn resume_with(&self, value: &str) -> Result<(), ChannelError> {
        self.channel.resume_with(value)
    }

    /// Next message, if one is queued
    pub fn try_recv(&self) -> Result<Option<HostMessage>, ProtocolError> {
        match self.inbox.try_recv() {
            Ok(message) => Ok(Some(message)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(ProtocolError::HostDisconnected),
        }
    }

    /// Next message, waiting at most `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Result<Option<HostMessage>, ProtocolError> {
        match self.inbox.recv_timeout(timeout) {
            Ok(message) => Ok(Some(message)),
            Err(RecvTimeoutError::Timeout) => Ok(None),
            Err(RecvTimeoutError::Disconnected) => Err(ProtocolError::HostDisconnected),
        }
    }

    /// Stop the host. Safe at any time, including while it is blocked.
    ///
    /// A thread stuck in code that never calls into its context cannot be
    /// interrupted; it is detached and its output is discarded.
    pub fn terminate(&mut self) {
        self.channel.terminate();
        if let Some(handle) = self.handle.take() {
            if handle.is_finished() {
                let _ = handle.join();
            } else {
                warn!(host = self.id, "detaching execution host thread that is still running");
            }
        }
        info!(host = self.id, "execution host terminated");
    }

    /// Join a host that has reported `complete` or `error`
    pub fn reap(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(host = self.id, "execution host thread panicked while exiting");
            }
        }
    }
}

impl Drop for ExecutionHost {
    fn drop(&mut self) {
        if self.handle.is_some() {
            self.terminate();
        }
    }
}

fn host_main(
    id: u64,
    serialized: String,
    program: Arc<dyn Algorithm>,
    channel: Arc<SyncChannel>,
    outbox: Sender<HostMessage>,
) {
    let span = info_span!("host", id);
    let _enter = span.enter();

    let state = match State::from_json(&serialized) {
        Ok(state) => state,
        Err(e) => {
            let _ = outbox.send(HostMessage::Error(AlgorithmError::unlocated(format!(
                "invalid initial state: {}",
                e
            ))));
            return;
        }
    };

    // Nothing runs until the first step is requested
    if channel.wait() == Wake::Terminated {
        debug!("terminated before start");
        return;
    }

    let mut ctx = HostContext::new(state, Arc::clone(&channel), outbox.clone());
    let outcome = panic::catch_unwind(AssertUnwindSafe(|| program.run(&mut ctx)));

    let message = match outcome {
        Ok(Ok(())) => HostMessage::Complete,
        Ok(Err(HostError::Algorithm(e))) => HostMessage::Error(e),
        Ok(Err(HostError::Terminated)) => {
            debug!("algorithm unwound after termination");
            return;
        }
        Err(payload) => HostMessage::Error(AlgorithmError::unlocated(format!(
            "algorithm panicked: {}",
            panic_message(payload.as_ref())
        ))),
    };

    if channel.is_terminated() {
        return;
    }
    debug!(kind = message.kind(), "algorithm finished");
    let _ = outbox.send(message);
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
