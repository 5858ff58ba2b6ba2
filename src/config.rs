//! Session configuration and command-line arguments

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Default watchdog window
pub const DEFAULT_WATCHDOG: Duration = Duration::from_secs(5);

/// Tunables for a [`Session`](crate::session::Session)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// How long the host may stay silent while a message is expected
    pub watchdog_timeout: Duration,
    /// Upper bound for a single blocking wait in event loops
    pub poll_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            watchdog_timeout: DEFAULT_WATCHDOG,
            poll_interval: Duration::from_millis(50),
        }
    }
}

impl SessionConfig {
    pub fn with_watchdog(mut self, timeout: Duration) -> Self {
        self.watchdog_timeout = timeout;
        self
    }
}

/// Step through a graph algorithm forward and backward
#[derive(Parser, Debug)]
#[command(name = "graphstep", version, about)]
pub struct Args {
    /// Graph to load (JSON: {"nodes": {...}, "edges": {...}})
    #[arg(required_unless_present = "list")]
    pub graph: Option<PathBuf>,

    /// Built-in algorithm to run
    #[arg(short, long, default_value = "bfs")]
    pub algorithm: String,

    /// Watchdog window in milliseconds
    #[arg(long, default_value_t = 5000)]
    pub watchdog_ms: u64,

    /// Write logs here (the terminal is taken by the viewer). Honors RUST_LOG.
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// List built-in algorithms and exit
    #[arg(long)]
    pub list: bool,
}

impl Args {
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig::default().with_watchdog(Duration::from_millis(self.watchdog_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_args_map_to_config() {
        let args = Args::parse_from(["graphstep", "g.json", "--watchdog-ms", "250"]);
        assert_eq!(args.graph, Some(PathBuf::from("g.json")));
        assert_eq!(args.algorithm, "bfs");
        assert_eq!(
            args.session_config().watchdog_timeout,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn test_graph_required_unless_listing() {
        assert!(Args::try_parse_from(["graphstep"]).is_err());
        assert!(Args::try_parse_from(["graphstep", "--list"]).is_ok());
    }
}
