//! TUI pane rendering modules
//!
//! - [`graph`]: nodes with color swatches and attributes, then edges
//! - [`console`]: algorithm output, prompt echoes, and run errors
//! - [`status`]: status bar with step counter, run badge, and keybindings
//!
//! Each pane exports a single `render_*` function that takes the data it
//! draws plus a scroll offset it clamps in place.

pub mod console;
pub mod graph;
pub mod status;

pub use console::render_console_pane;
pub use graph::render_graph_pane;
pub use status::render_status_bar;
