// ABOUTME: Daemon and connection indicators
// ABOUTME: Colored dots with labels from the latest status snapshot

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;
use tailpanel_core::{ConnectionState, DaemonState};

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let (daemon, connection) = match &app.snapshot {
        Some(snapshot) => (
            indicator(daemon_color(snapshot.daemon), snapshot.daemon.label()),
            indicator(
                connection_color(snapshot.connection),
                snapshot.connection.label(),
            ),
        ),
        None => (
            indicator(Color::DarkGray, "Checking..."),
            indicator(Color::DarkGray, "Checking..."),
        ),
    };

    let mut daemon_line = vec![Span::styled(
        format!(" {:<12}", "Daemon"),
        Style::default().fg(Color::Gray),
    )];
    daemon_line.extend(daemon);

    let mut connection_line = vec![Span::styled(
        format!(" {:<12}", "Connection"),
        Style::default().fg(Color::Gray),
    )];
    connection_line.extend(connection);

    if let Some(snapshot) = &app.snapshot {
        connection_line.push(Span::styled(
            format!("   checked {}", snapshot.taken_at.format("%H:%M:%S")),
            Style::default().fg(Color::DarkGray),
        ));
    }

    let block = Block::default()
        .title(" Status ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph =
        Paragraph::new(vec![Line::from(daemon_line), Line::from(connection_line)]).block(block);
    f.render_widget(paragraph, area);
}

fn indicator(color: Color, label: &str) -> Vec<Span<'static>> {
    vec![
        Span::styled("● ", Style::default().fg(color)),
        Span::styled(
            label.to_string(),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
    ]
}

fn daemon_color(state: DaemonState) -> Color {
    match state {
        DaemonState::Running => Color::Green,
        DaemonState::Stopped => Color::Red,
    }
}

fn connection_color(state: ConnectionState) -> Color {
    match state {
        ConnectionState::Connected => Color::Green,
        ConnectionState::Disconnected => Color::Yellow,
        ConnectionState::DaemonOffline => Color::Red,
    }
}
