//! Help overlay showing keybindings and cache lifetimes

use std::time::Duration;

use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use coindash::data::CacheTtls;

const OVERLAY_WIDTH: u16 = 56;

/// Renders the help overlay on top of the dashboard
pub fn render(frame: &mut Frame, ttls: CacheTtls) {
    let lines = help_lines(ttls);
    let area = centered(frame.area(), OVERLAY_WIDTH, lines.len() as u16 + 2);

    frame.render_widget(Clear, area);
    frame.render_widget(
        Paragraph::new(lines).block(
            Block::default()
                .title(" Help ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        ),
        area,
    );
}

fn help_lines(ttls: CacheTtls) -> Vec<Line<'static>> {
    let heading = |text: &'static str| {
        Line::from(Span::styled(text, Style::default().add_modifier(Modifier::BOLD)))
    };

    vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        heading("Dashboard"),
        entry("r", "Reload (cached panels reuse data)".to_string()),
        entry("?", "Toggle this help".to_string()),
        entry("q, Esc", "Quit application".to_string()),
        Line::from(""),
        heading("Cache lifetimes"),
        entry("Live market", describe(ttls.live_market)),
        entry("History", describe(ttls.history)),
        entry("Fundamentals", describe(ttls.metadata)),
        Line::from(""),
        Line::from(Span::styled(
            "Press Esc or ? to close",
            Style::default().fg(Color::DarkGray),
        )),
    ]
}

fn entry(key: &str, description: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("  {:<14}", key), Style::default().fg(Color::Yellow)),
        Span::raw(description),
    ])
}

/// Human form of a cache lifetime, e.g. 300 s -> "5 min"
fn describe(ttl: Duration) -> String {
    let secs = ttl.as_secs();
    if secs >= 60 && secs % 60 == 0 {
        format!("{} min", secs / 60)
    } else {
        format!("{} s", secs)
    }
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let [row] = Layout::vertical([Constraint::Length(height)])
        .flex(Flex::Center)
        .areas(area);
    let [cell] = Layout::horizontal([Constraint::Length(width)])
        .flex(Flex::Center)
        .areas(row);
    cell
}
