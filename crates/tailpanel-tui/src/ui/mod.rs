// ABOUTME: UI rendering module for tailpanel
// ABOUTME: Lays out the panel and dispatches to widget modules

mod activity;
mod devices;
mod header;
mod help;
mod status;

use crate::app::App;
use ratatui::prelude::*;
use ratatui::Frame;

/// Create a centered rect using percentages of the parent rect
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(r);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

pub fn render(f: &mut Frame, app: &App) {
    let chunks = Layout::vertical([
        Constraint::Length(3), // Header
        Constraint::Length(4), // Daemon + connection
        Constraint::Min(5),    // Activity log
        Constraint::Length(1), // Help
    ])
    .split(f.area());

    header::render(f, chunks[0], app);
    status::render(f, chunks[1], app);
    activity::render(f, chunks[2], app);
    help::render(f, chunks[3], app);

    // Device list is an overlay
    if app.show_devices {
        devices::render(f, app);
    }
}
