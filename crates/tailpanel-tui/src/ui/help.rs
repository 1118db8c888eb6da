// ABOUTME: Bottom keybinding hint line
// ABOUTME: Swaps to the force-quit hint while shutdown is in progress

use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;
use ratatui::Frame;

pub fn render(f: &mut Frame, area: Rect, app: &App) {
    let key = |k: &'static str| Span::styled(k, Style::default().fg(Color::Yellow));

    let help = if app.quitting {
        Line::from(vec![key(" ^C"), Span::raw(" quit without waiting")])
    } else {
        Line::from(vec![
            key(" s"),
            Span::raw(" start/stop  "),
            key("c"),
            Span::raw(" connect  "),
            key("d"),
            Span::raw(" disconnect  "),
            key("v"),
            Span::raw(" devices  "),
            key("r"),
            Span::raw(" refresh  "),
            key("↑/↓"),
            Span::raw(" scroll  "),
            key("q"),
            Span::raw(" quit"),
        ])
    };

    f.render_widget(Paragraph::new(help), area);
}
