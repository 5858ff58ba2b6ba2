//! Status bar rendering with keybindings and run indicators

use crate::session::{AlgorithmState, SessionStatus};
use crate::ui::theme::DEFAULT_THEME;
use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

/// Render the status bar at the bottom.
///
/// While the algorithm can still produce steps the total is shown as `n+`.
pub fn render_status_bar(
    frame: &mut Frame,
    area: Rect,
    status: &SessionStatus,
    algorithm: &str,
    message: &str,
    is_error: bool,
    is_playing: bool,
) {
    let layout = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    let finished = status.algorithm_state.is_finished();
    let step_text = if finished {
        format!(" {} {}/{} ", algorithm, status.display_state, status.steps)
    } else {
        format!(" {} {}/{}+ ", algorithm, status.display_state, status.steps)
    };
    let badge_bg = if is_error {
        DEFAULT_THEME.error
    } else if status.prompt.is_some() {
        DEFAULT_THEME.secondary
    } else {
        DEFAULT_THEME.primary
    };

    let left_spans = vec![
        Span::styled(
            step_text,
            Style::default()
                .bg(badge_bg)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::styled(
            " | ",
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(DEFAULT_THEME.comment),
        ),
        Span::styled(
            format!(" {} ", message),
            Style::default()
                .bg(DEFAULT_THEME.current_line_bg)
                .fg(if is_error {
                    DEFAULT_THEME.error
                } else {
                    DEFAULT_THEME.fg
                }),
        ),
    ];

    frame.render_widget(
        Paragraph::new(Line::from(left_spans))
            .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
            .alignment(Alignment::Left),
        layout[0],
    );

    let key_style = Style::default().bg(DEFAULT_THEME.comment).fg(Color::Black);
    let desc_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.fg);
    let sep_style = Style::default()
        .bg(DEFAULT_THEME.current_line_bg)
        .fg(DEFAULT_THEME.comment);

    let mut right_spans = if status.prompt.is_some() {
        vec![
            Span::styled(" ↵ ", key_style),
            Span::styled(" submit ", desc_style),
            Span::styled("│", sep_style),
            Span::styled(" ", desc_style),
            Span::styled(" esc ", key_style),
            Span::styled(" clear ", desc_style),
        ]
    } else {
        vec![
            Span::styled(" ←/→ ", key_style),
            Span::styled(" step ", desc_style),
            Span::styled("│", sep_style),
            Span::styled(" ", desc_style),
            Span::styled(" ⎵ ", key_style),
            Span::styled(" play ", desc_style),
            Span::styled("│", sep_style),
            Span::styled(" ", desc_style),
            Span::styled(" ⌫ ", key_style),
            Span::styled(" rewind ", desc_style),
            Span::styled("│", sep_style),
            Span::styled(" ", desc_style),
            Span::styled(" r ", key_style),
            Span::styled(" restart ", desc_style),
            Span::styled("│", sep_style),
            Span::styled(" ", desc_style),
            Span::styled("q", key_style),
            Span::styled(" quit ", desc_style),
        ]
    };

    let indicator = match status.algorithm_state {
        AlgorithmState::Prompting => Some((" ⌨ INPUT ", DEFAULT_THEME.secondary)),
        AlgorithmState::Failed | AlgorithmState::TimedOut => {
            Some((" ✖ FAILED ", DEFAULT_THEME.error))
        }
        _ if is_playing => Some((" ▶ PLAYING ", DEFAULT_THEME.secondary)),
        AlgorithmState::Completed if !status.can_step_forward => {
            Some((" END ", DEFAULT_THEME.error))
        }
        _ if status.display_state == 0 => Some((" START ", DEFAULT_THEME.success)),
        _ => None,
    };
    if let Some((label, bg)) = indicator {
        right_spans.push(Span::styled("│", sep_style));
        right_spans.push(Span::styled(
            label,
            Style::default()
                .bg(bg)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ));
    }

    frame.render_widget(
        Paragraph::new(Line::from(right_spans))
            .style(Style::default().bg(DEFAULT_THEME.current_line_bg))
            .alignment(Alignment::Right),
        layout[1],
    );
}
