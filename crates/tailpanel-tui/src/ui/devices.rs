// ABOUTME: Device list overlay
// ABOUTME: Table of peers from the client's status output

use super::centered_rect;
use crate::app::App;
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Row, Table};
use ratatui::Frame;
use tailpanel_core::status::NO_DEVICES;

pub fn render(f: &mut Frame, app: &App) {
    let area = centered_rect(90, 70, f.area());
    f.render_widget(Clear, area);

    let block = Block::default()
        .title(" Devices (r: reload, Esc: close) ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let table = match &app.devices {
        None => {
            let loading = format!("{} Loading devices...", app.throbber_char());
            f.render_widget(Paragraph::new(loading).block(block), area);
            return;
        }
        Some(table) if table.is_empty() => {
            f.render_widget(
                Paragraph::new(NO_DEVICES)
                    .style(Style::default().fg(Color::Gray))
                    .block(block),
                area,
            );
            return;
        }
        Some(table) => table,
    };

    let header = Row::new(["IP Address", "Hostname", "User", "OS", "Status"]).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    );

    let rows = table.devices.iter().map(|device| {
        Row::new([
            device.ip.as_str(),
            device.hostname.as_str(),
            device.user.as_str(),
            device.os.as_str(),
            device.status.as_str(),
        ])
    });

    let widths = [
        Constraint::Length(17),
        Constraint::Length(25),
        Constraint::Length(15),
        Constraint::Length(10),
        Constraint::Min(10),
    ];

    f.render_widget(Table::new(rows, widths).header(header).block(block), area);
}
