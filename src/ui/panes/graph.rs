//! Graph pane: nodes with their color swatch and attributes, then edges

use crate::snapshot::{Attributes, State};
use crate::ui::theme::{node_color, DEFAULT_THEME};
use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, Padding},
    Frame,
};

/// Render the display replica
pub fn render_graph_pane(
    frame: &mut Frame,
    area: Rect,
    state: &State,
    is_focused: bool,
    scroll_offset: &mut usize,
) {
    let border_style = if is_focused {
        Style::default()
            .fg(DEFAULT_THEME.border_focused)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(DEFAULT_THEME.border_normal)
    };

    let title = match state.message() {
        Some(message) => format!(" Graph: {} ", message),
        None => " Graph ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(border_style)
        .padding(Padding::new(1, 0, 0, 0));

    let mut all_items: Vec<ListItem> = Vec::new();

    if state.node_count() == 0 {
        all_items.push(
            ListItem::new("(empty graph)").style(Style::default().fg(DEFAULT_THEME.comment)),
        );
    }

    for (id, node) in state.nodes() {
        let color = node.attr("color").and_then(|v| v.as_str());
        let mut spans = vec![
            Span::styled("● ", Style::default().fg(node_color(color))),
            Span::styled(
                id.clone(),
                Style::default()
                    .fg(DEFAULT_THEME.fg)
                    .add_modifier(Modifier::BOLD),
            ),
        ];
        spans.extend(attr_spans(&node.attrs));
        all_items.push(ListItem::new(Line::from(spans)));
    }

    if state.edge_count() > 0 {
        all_items.push(ListItem::new(""));
        all_items.push(
            ListItem::new("Edges").style(
                Style::default()
                    .fg(DEFAULT_THEME.primary)
                    .add_modifier(Modifier::BOLD),
            ),
        );
        for (id, edge) in state.edges() {
            let mut spans = vec![
                Span::styled(
                    format!("{}: ", id),
                    Style::default().fg(DEFAULT_THEME.comment),
                ),
                Span::styled(
                    format!("{} → {}", edge.source, edge.target),
                    Style::default().fg(DEFAULT_THEME.fg),
                ),
            ];
            spans.extend(attr_spans(&edge.attrs));
            all_items.push(ListItem::new(Line::from(spans)));
        }
    }

    // Calculate visible range for scrolling
    let total_items = all_items.len();
    let visible_height = area.height.saturating_sub(2).max(1) as usize;
    if total_items > visible_height {
        *scroll_offset = (*scroll_offset).min(total_items - visible_height);
    } else {
        *scroll_offset = 0;
    }

    let visible_items: Vec<ListItem> = all_items
        .into_iter()
        .skip(*scroll_offset)
        .take(visible_height)
        .collect();

    frame.render_widget(List::new(visible_items).block(block), area);
}

/// `key=value` spans, sorted by key for a stable layout
fn attr_spans(attrs: &Attributes) -> Vec<Span<'static>> {
    let mut keys: Vec<&String> = attrs.keys().collect();
    keys.sort();

    let mut spans = Vec::with_capacity(keys.len() * 2);
    for key in keys {
        spans.push(Span::styled(
            format!("  {}=", key),
            Style::default().fg(DEFAULT_THEME.attr_key),
        ));
        let value = match &attrs[key] {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        spans.push(Span::styled(
            value,
            Style::default().fg(DEFAULT_THEME.attr_value),
        ));
    }
    spans
}
