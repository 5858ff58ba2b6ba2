// graphstep: step through graph algorithms forward and backward

use std::fs;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::info;
use tracing_subscriber::EnvFilter;

use graphstep::algorithms;
use graphstep::config::Args;
use graphstep::session::Session;
use graphstep::snapshot::State;
use graphstep::ui::{App, Viewer};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    if args.list {
        for name in algorithms::names() {
            println!("{}", name);
        }
        return Ok(());
    }

    if let Some(path) = &args.log_file {
        init_logging(path)?;
    }

    let Some(graph_path) = &args.graph else {
        eprintln!("Error: No graph file provided");
        std::process::exit(1);
    };
    if !graph_path.exists() {
        eprintln!("Error: File '{}' not found", graph_path.display());
        std::process::exit(1);
    }

    let Some(program) = algorithms::by_name(&args.algorithm) else {
        eprintln!("Error: Unknown algorithm '{}'", args.algorithm);
        eprintln!("Available: {}", algorithms::names().join(", "));
        std::process::exit(1);
    };

    let text = fs::read_to_string(graph_path)?;
    let graph = match State::from_json(&text) {
        Ok(graph) => graph,
        Err(e) => {
            eprintln!("Graph error: {}", e);
            std::process::exit(1);
        }
    };
    info!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        algorithm = %args.algorithm,
        "graph loaded"
    );

    let viewer = Viewer::new(&graph);
    let session = match Session::new(args.session_config(), graph, program, viewer) {
        Ok(session) => session,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };

    // Set up terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session);
    let res = app.run(&mut terminal);

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        eprintln!("Error: {:?}", err);
    }

    Ok(())
}

/// Log to a file; the terminal belongs to the viewer
fn init_logging(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = fs::File::create(path)?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_names(true)
        .init();
    Ok(())
}
