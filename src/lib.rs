//! # Introduction
//!
//! graphstep runs a graph algorithm on a background thread and lets a human
//! walk through what it did one step at a time, forward and backward.
//!
//! ## Pipeline
//!
//! ```text
//! Algorithm → HostContext → Rule / StepComplete → Session → StepNavigator → Viewer
//!      ▲                                            │
//!      └──────────── SyncChannel (wake, prompt answer)
//! ```
//!
//! 1. [`snapshot`]: immutable graph [`snapshot::State`] and the recording
//!    [`snapshot::SnapshotStore`] that yields forward/reverse patches.
//! 2. [`history`]: [`history::Rule`]s grouped into [`history::Step`]s and
//!    the [`history::StepNavigator`] that replays and undoes them.
//! 3. [`host`]: the execution host thread, its [`host::HostContext`], and
//!    the [`host::SyncChannel`] it blocks on.
//! 4. [`session`]: the coordinator tying navigator, host and watchdog
//!    together behind [`session::SessionListener`] callbacks.
//! 5. [`algorithms`]: built-in algorithms (`paint`, `bfs`, `dfs`).
//! 6. [`ui`]: ratatui viewer; not part of the stable library API.

pub mod algorithms;
pub mod config;
pub mod errors;
pub mod history;
pub mod host;
pub mod session;
pub mod snapshot;
pub mod ui;
