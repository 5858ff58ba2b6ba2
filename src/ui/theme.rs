use ratatui::style::Color;

pub struct Theme {
    pub fg: Color,
    pub primary: Color,   // Blue
    pub secondary: Color, // Orange
    pub comment: Color,   // Grey
    pub success: Color,   // Green
    pub error: Color,     // Red
    pub border_focused: Color,
    pub border_normal: Color,
    pub current_line_bg: Color,
    pub attr_key: Color,   // Cyan for attribute names
    pub attr_value: Color, // Yellow for attribute values
}

pub const DEFAULT_THEME: Theme = Theme {
    fg: Color::Rgb(205, 214, 244),
    primary: Color::Rgb(137, 180, 250),   // Blue
    secondary: Color::Rgb(250, 179, 135), // Orange
    comment: Color::Rgb(108, 112, 134),
    success: Color::Rgb(166, 227, 161),
    error: Color::Rgb(243, 139, 168),
    border_focused: Color::Rgb(249, 226, 175), // Yellow border for focus
    border_normal: Color::Rgb(108, 112, 134),  // Grey border for normal
    current_line_bg: Color::Rgb(50, 50, 70),   // Slightly lighter BG for the status bar
    attr_key: Color::Rgb(148, 226, 213),
    attr_value: Color::Rgb(249, 226, 175),
};

/// Swatch for a node's `color` attribute
pub fn node_color(name: Option<&str>) -> Color {
    match name {
        Some("red") => DEFAULT_THEME.error,
        Some("orange") => DEFAULT_THEME.secondary,
        Some("green") => DEFAULT_THEME.success,
        Some("blue") => DEFAULT_THEME.primary,
        Some("yellow") => DEFAULT_THEME.attr_value,
        Some("black") | None => DEFAULT_THEME.comment,
        Some(_) => DEFAULT_THEME.fg,
    }
}
