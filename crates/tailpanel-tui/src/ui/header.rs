// ABOUTME: Top header rendering
// ABOUTME: Shows the app name, supervised daemon, uptime and a busy throbber

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let elapsed = app.start_time.elapsed();
    let uptime = format!(
        "{:02}:{:02}:{:02}",
        elapsed.as_secs() / 3600,
        (elapsed.as_secs() % 3600) / 60,
        elapsed.as_secs() % 60
    );

    let mut spans = vec![
        Span::styled(
            " tailpanel ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
        Span::styled(app.daemon_name.as_str(), Style::default().fg(Color::White)),
        Span::raw(" | "),
        Span::styled(
            format!("uptime {}", uptime),
            Style::default().fg(Color::Gray),
        ),
    ];

    if app.quitting {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("{} shutting down", app.throbber_char()),
            Style::default().fg(Color::Yellow),
        ));
    } else if app.is_busy() {
        spans.push(Span::raw(" | "));
        spans.push(Span::styled(
            format!("{} working", app.throbber_char()),
            Style::default().fg(Color::Yellow),
        ));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    let paragraph = Paragraph::new(Line::from(spans)).block(block);
    f.render_widget(paragraph, area);
}
