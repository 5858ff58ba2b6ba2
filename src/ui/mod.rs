//! Terminal viewer built on [ratatui](https://github.com/ratatui-org/ratatui).
//!
//! - **[`app`]**: the [`Viewer`] session listener (display replica, console)
//!   and the keyboard event loop
//! - **[`panes`]**: stateless render functions for graph, console, status bar
//! - **[`console`]**: line buffer for algorithm output
//! - **[`theme`]**: color palette shared by all panes
//!
//! Construct a [`Session`](crate::session::Session) with a [`Viewer`], wrap it
//! in an [`App`] and call [`App::run`](app::App::run).

pub mod app;
pub mod console;
pub mod panes;
pub mod theme;

pub use app::{App, Viewer};
