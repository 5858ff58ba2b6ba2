//! Main TUI application state and logic

use crate::errors::SessionError;
use crate::history::NavigatorStatus;
use crate::host::PromptRequest;
use crate::session::{Session, SessionListener, SessionStatus};
use crate::snapshot::{Patch, SnapshotStore, State};
use crate::ui::console::{Console, LineKind};
use crate::ui::theme::DEFAULT_THEME;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};
use std::io;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::warn;

/// Which pane is currently focused
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusedPane {
    Graph,
    Console,
}

impl FocusedPane {
    pub fn next(self) -> Self {
        match self {
            FocusedPane::Graph => FocusedPane::Console,
            FocusedPane::Console => FocusedPane::Graph,
        }
    }
}

/// Session listener backing the viewer.
///
/// Keeps its own replica of the display graph and moves it only by the
/// patches the session hands over.
pub struct Viewer {
    replica: SnapshotStore,
    pub console: Console,
    pub status: Option<SessionStatus>,
    pub prompt: Option<PromptRequest>,
    /// Descriptions of the most recent display change
    pub last_change: Vec<String>,
    pub last_error: Option<String>,
}

impl Viewer {
    pub fn new(initial: &State) -> Self {
        Viewer {
            replica: SnapshotStore::new(initial.clone()),
            console: Console::new(),
            status: None,
            prompt: None,
            last_change: Vec::new(),
            last_error: None,
        }
    }

    pub fn display(&self) -> Arc<State> {
        self.replica.get()
    }
}

impl SessionListener for Viewer {
    fn display_changed(&mut self, patches: &[Patch]) {
        if let Err(e) = self.replica.apply_patches(patches) {
            warn!(error = %e, "viewer replica rejected patches");
            self.console
                .push(&format!("display out of sync: {}", e), LineKind::Error);
        }
        self.last_change = patches.iter().map(Patch::describe).collect();
    }

    fn display_reset(&mut self, state: &State) {
        self.replica.reset(state.clone());
        self.last_change.clear();
    }

    fn status_changed(&mut self, status: &SessionStatus) {
        self.prompt = status.prompt.clone();
        self.status = Some(status.clone());
    }

    fn prompt(&mut self, request: &PromptRequest) {
        self.console.push(
            &format!("{} ({}):", request.label, request.kind),
            LineKind::Info,
        );
        self.prompt = Some(request.clone());
    }

    fn message(&mut self, text: &str) {
        self.console.push(text, LineKind::Output);
    }

    fn error(&mut self, error: &SessionError) {
        let text = error.to_string();
        self.console.push(&text, LineKind::Error);
        self.last_error = Some(text);
    }
}

/// The main application state
pub struct App {
    session: Session<Viewer>,

    /// Currently focused pane
    pub focused_pane: FocusedPane,

    /// Per-pane scroll offsets
    pub graph_scroll: usize,
    pub console_scroll: usize,

    /// Text typed while a prompt is outstanding
    pub input: String,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,

    /// Whether auto-play mode is active
    pub is_playing: bool,

    /// Last time a step was taken in play mode
    pub last_play_time: Instant,
}

impl App {
    pub fn new(session: Session<Viewer>) -> Self {
        App {
            session,
            focused_pane: FocusedPane::Graph,
            graph_scroll: 0,
            console_scroll: 0,
            input: String::new(),
            should_quit: false,
            status_message: String::from("Ready!"),
            is_playing: false,
            last_play_time: Instant::now(),
        }
    }

    pub fn session(&self) -> &Session<Viewer> {
        &self.session
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        let tick = self.session.config().poll_interval;
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            let before = self.session.listener().console.len();
            if let Err(e) = self.session.poll() {
                self.report(e);
            }
            if self.session.listener().console.len() != before {
                self.console_scroll = usize::MAX;
            }

            if self.is_playing && self.last_play_time.elapsed() >= Duration::from_secs(1) {
                self.play_tick();
                self.last_play_time = Instant::now();
            }

            // Use poll with timeout so host messages and auto-play keep flowing
            if event::poll(tick)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        self.handle_key_event(key);
                    }
                }
            }
        }

        Ok(())
    }

    fn play_tick(&mut self) {
        let nav: NavigatorStatus = self.session.navigator().status();
        if self.session.pending_prompt().is_some() {
            self.is_playing = false;
            self.status_message = "Waiting for input".to_string();
        } else if nav.awaiting_rules {
            // Previous request still in flight
        } else if self.session.status().can_step_forward {
            self.step_forward();
            self.status_message = "Playing...".to_string();
        } else {
            self.is_playing = false;
            self.status_message = "Playback complete".to_string();
        }
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();
        let prompt_height = if self.session.pending_prompt().is_some() {
            3
        } else {
            0
        };

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Min(0),
                Constraint::Length(prompt_height),
                Constraint::Length(1),
            ])
            .split(size);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)])
            .split(main_chunks[0]);

        let viewer = self.session.listener();
        let display = viewer.display();
        super::panes::render_graph_pane(
            frame,
            columns[0],
            &display,
            self.focused_pane == FocusedPane::Graph,
            &mut self.graph_scroll,
        );
        super::panes::render_console_pane(
            frame,
            columns[1],
            &viewer.console,
            self.focused_pane == FocusedPane::Console,
            &mut self.console_scroll,
        );

        if let Some(request) = self.session.pending_prompt() {
            render_prompt_line(frame, main_chunks[1], request, &self.input);
        }

        let status = viewer
            .status
            .clone()
            .unwrap_or_else(|| self.session.status());
        let (message, is_error) = match &viewer.last_error {
            Some(error) if status.algorithm_state.is_finished() => (error.clone(), true),
            _ => match viewer.last_change.first() {
                Some(change) if self.status_message.is_empty() => (change.clone(), false),
                _ => (self.status_message.clone(), false),
            },
        };
        super::panes::render_status_bar(
            frame,
            main_chunks[2],
            &status,
            self.session.algorithm_name(),
            &message,
            is_error,
            self.is_playing,
        );
    }

    /// Handle keyboard events
    fn handle_key_event(&mut self, key: KeyEvent) {
        if self.session.pending_prompt().is_some() {
            self.handle_prompt_key(key);
            return;
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') => {
                self.should_quit = true;
            }
            KeyCode::Tab => {
                self.focused_pane = self.focused_pane.next();
            }
            KeyCode::Left => {
                self.is_playing = false;
                self.step_backward();
            }
            KeyCode::Right => {
                self.is_playing = false;
                self.step_forward();
            }
            KeyCode::Up => match self.focused_pane {
                FocusedPane::Graph => self.graph_scroll = self.graph_scroll.saturating_sub(1),
                FocusedPane::Console => {
                    self.console_scroll = self.console_scroll.saturating_sub(1)
                }
            },
            KeyCode::Down => match self.focused_pane {
                FocusedPane::Graph => self.graph_scroll = self.graph_scroll.saturating_add(1),
                FocusedPane::Console => {
                    self.console_scroll = self.console_scroll.saturating_add(1)
                }
            },
            KeyCode::Char(' ') => {
                self.is_playing = !self.is_playing;
                self.last_play_time = Instant::now()
                    .checked_sub(Duration::from_secs(1))
                    .unwrap_or_else(Instant::now);
                self.status_message = if self.is_playing {
                    "Playing...".to_string()
                } else {
                    "Paused".to_string()
                };
            }
            KeyCode::Backspace => {
                self.is_playing = false;
                match self.session.rewind() {
                    Ok(()) => self.status_message = "Rewound to start".to_string(),
                    Err(e) => self.report(e),
                }
            }
            KeyCode::Char('r') | KeyCode::Char('R') => {
                self.is_playing = false;
                self.session.listener_mut().last_error = None;
                match self.session.restart() {
                    Ok(()) => {
                        self.session.listener_mut().console.clear();
                        self.console_scroll = 0;
                        self.status_message = "Restarted".to_string();
                    }
                    Err(e) => self.report(e),
                }
            }
            _ => {}
        }
    }

    fn handle_prompt_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter => {
                let value = std::mem::take(&mut self.input);
                match self.session.enter_prompt_result(&value) {
                    Ok(()) => {
                        self.session
                            .listener_mut()
                            .console
                            .push(&format!("> {}", value), LineKind::Info);
                        self.status_message.clear();
                    }
                    Err(e) => {
                        self.input = value;
                        self.report(e);
                    }
                }
            }
            KeyCode::Esc => self.input.clear(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Char(c) => self.input.push(c),
            _ => {}
        }
    }

    fn step_forward(&mut self) {
        if !self.session.status().can_step_forward {
            self.status_message = "Nothing more to show".to_string();
            return;
        }
        match self.session.step_forward() {
            Ok(()) => self.status_message.clear(),
            Err(e) => self.report(e),
        }
    }

    fn step_backward(&mut self) {
        if !self.session.status().can_step_back {
            self.status_message = "Already at start".to_string();
            return;
        }
        match self.session.step_back() {
            Ok(()) => self.status_message.clear(),
            Err(e) => self.report(e),
        }
    }

    fn report(&mut self, error: SessionError) {
        warn!(%error, "session call failed");
        self.is_playing = false;
        self.status_message = format!("Error: {}", error);
    }
}

fn render_prompt_line(frame: &mut Frame, area: Rect, request: &PromptRequest, input: &str) {
    let block = Block::default()
        .title(format!(" {} ({}) ", request.label, request.kind))
        .borders(Borders::ALL)
        .border_style(
            Style::default()
                .fg(DEFAULT_THEME.secondary)
                .add_modifier(Modifier::BOLD),
        );
    let line = Line::from(vec![
        Span::styled("> ", Style::default().fg(DEFAULT_THEME.secondary)),
        Span::styled(input.to_string(), Style::default().fg(DEFAULT_THEME.fg)),
        Span::styled("█", Style::default().fg(DEFAULT_THEME.comment)),
    ]);
    frame.render_widget(Paragraph::new(line).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::PromptKind;
    use crate::snapshot::Node;

    #[test]
    fn test_viewer_replica_follows_patches() {
        let initial = State::new().with_node("a", Node::new());
        let mut viewer = Viewer::new(&initial);

        let mut store = SnapshotStore::new(initial.clone());
        let rule = store
            .update(|d| d.set_node_attr("a", "color", "red"))
            .unwrap();

        viewer.display_changed(rule.apply());
        assert_eq!(*viewer.display(), *store.get());
        assert_eq!(viewer.last_change.len(), 1);

        viewer.display_changed(rule.revert());
        assert_eq!(*viewer.display(), initial);
    }

    #[test]
    fn test_viewer_collects_console_and_prompt() {
        let mut viewer = Viewer::new(&State::new());
        viewer.message("hello\nworld");
        viewer.prompt(&PromptRequest {
            label: "Start node".to_string(),
            kind: PromptKind::Node,
        });
        assert_eq!(viewer.console.len(), 3);
        assert!(viewer.prompt.is_some());
    }
}
