// ABOUTME: Activity log rendering
// ABOUTME: Timestamped supervisor messages with scrollback

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem};
use ratatui::Frame;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let inner_height = area.height.saturating_sub(2) as usize;
    let total = app.activity.len();

    // Calculate visible range with scroll offset
    let end = total.saturating_sub(app.scroll_offset);
    let start = end.saturating_sub(inner_height);

    let items: Vec<ListItem> = app.activity[start..end]
        .iter()
        .map(|entry| {
            let style = if entry.message.contains("Failed") || entry.message.contains("failure") {
                Style::default().fg(Color::Red)
            } else {
                Style::default()
            };
            let line = Line::from(vec![
                Span::styled(
                    entry.timestamp.format("%H:%M:%S").to_string(),
                    Style::default().fg(Color::DarkGray),
                ),
                Span::raw(" "),
                Span::styled(entry.message.as_str(), style),
            ]);
            ListItem::new(line)
        })
        .collect();

    let title = if app.scroll_offset > 0 {
        format!(" Activity (scroll: -{}) ", app.scroll_offset)
    } else {
        " Activity ".to_string()
    };

    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::DarkGray));

    f.render_widget(List::new(items).block(block), area);
}
