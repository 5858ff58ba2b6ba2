//! Shared wake/prompt cell between the session and its execution host
//!
//! # Layout
//!
//! ```text
//! slot 0        wake flag   0 = idle, 1 = resume, 2 = terminate
//! slot 1        payload length (characters, at most MAX_PAYLOAD)
//! slot 2..2+len payload characters as Unicode scalar values
//! ```
//!
//! # Protocol
//!
//! The writer (session side) fills the payload, then stores the wake flag with
//! `Release` under the lock and notifies. The waiter (host side) loads the flag
//! with `Acquire` and only then reads the payload. The waiter clears a resume
//! flag when it consumes it; terminate is sticky and is never cleared, so every
//! later wait returns immediately.
//!
//! A signal sent before the host starts waiting is not lost: the flag stays set
//! until the next wait consumes it.

use crate::errors::ChannelError;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Condvar, Mutex, PoisonError};

pub const CELL_SLOTS: usize = 256;
/// Longest prompt answer the cell can carry
pub const MAX_PAYLOAD: usize = CELL_SLOTS - 2;

const WAKE: usize = 0;
const LEN: usize = 1;
const DATA: usize = 2;

const IDLE: u32 = 0;
const RESUME: u32 = 1;
const TERMINATE: u32 = 2;

/// What a waiting host observed when it woke up
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Wake {
    Resumed,
    Terminated,
}

pub struct SyncChannel {
    cells: [AtomicU32; CELL_SLOTS],
    // Guards nothing but the condvar handshake
    lock: Mutex<()>,
    wake: Condvar,
}

impl std::fmt::Debug for SyncChannel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncChannel")
            .field("wake", &self.cells[WAKE].load(Ordering::Relaxed))
            .field("len", &self.cells[LEN].load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for SyncChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl SyncChannel {
    pub fn new() -> Self {
        SyncChannel {
            cells: std::array::from_fn(|_| AtomicU32::new(0)),
            lock: Mutex::new(()),
            wake: Condvar::new(),
        }
    }

    /// Wake the host without a payload
    pub fn resume(&self) {
        self.cells[LEN].store(0, Ordering::Relaxed);
        self.signal(RESUME);
    }

    /// Write a prompt answer, then wake the host
    pub fn resume_with(&self, value: &str) -> Result<(), ChannelError> {
        let len = value.chars().count();
        if len > MAX_PAYLOAD {
            return Err(ChannelError::PayloadTooLong {
                len,
                max: MAX_PAYLOAD,
            });
        }
        for (i, ch) in value.chars().enumerate() {
            self.cells[DATA + i].store(ch as u32, Ordering::Relaxed);
        }
        // `len` fits in u32: it is bounded by MAX_PAYLOAD
        self.cells[LEN].store(len as u32, Ordering::Relaxed);
        self.signal(RESUME);
        Ok(())
    }

    /// Ask the host to stop. Safe to call at any time, any number of times.
    pub fn terminate(&self) {
        self.signal(TERMINATE);
    }

    pub fn is_terminated(&self) -> bool {
        self.cells[WAKE].load(Ordering::Acquire) == TERMINATE
    }

    fn signal(&self, value: u32) {
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        // Never downgrade a terminate back to a resume
        if self.cells[WAKE].load(Ordering::Relaxed) != TERMINATE {
            self.cells[WAKE].store(value, Ordering::Release);
        }
        self.wake.notify_all();
    }

    /// Block until the session signals. Host side only.
    pub fn wait(&self) -> Wake {
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if let Some(wake) = self.consume() {
                return wake;
            }
            guard = self
                .wake
                .wait(guard)
                .unwrap_or_else(PoisonError::into_inner);
        }
    }

    // Caller holds the lock
    fn consume(&self) -> Option<Wake> {
        match self.cells[WAKE].load(Ordering::Acquire) {
            IDLE => None,
            TERMINATE => Some(Wake::Terminated),
            _ => {
                self.cells[WAKE].store(IDLE, Ordering::Relaxed);
                Some(Wake::Resumed)
            }
        }
    }

    /// Read the answer written before the last resume. Host side only, and
    /// only after [`wait`](Self::wait) returned [`Wake::Resumed`].
    pub fn read_payload(&self) -> String {
        let len = (self.cells[LEN].load(Ordering::Relaxed) as usize).min(MAX_PAYLOAD);
        self.cells[DATA..DATA + len]
            .iter()
            .map(|c| char::from_u32(c.load(Ordering::Relaxed)).unwrap_or(char::REPLACEMENT_CHARACTER))
            .collect()
    }
}
