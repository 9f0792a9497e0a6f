//! Dashboard screen rendering
//!
//! Renders the single dashboard view: prediction link, live KPI cards,
//! candlestick and line charts, and project fundamentals. A panel whose data
//! is unavailable is replaced by a short notice; the rest still render.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, Paragraph, Wrap},
    Frame,
};

use coindash::data::{Candle, CoinMetadata, MarketSnapshot, SeriesPoint};
use coindash::format::{format_compact, format_currency, format_percent};

use crate::app::App;
use crate::ui::widgets::candlestick::price_range;
use crate::ui::widgets::Candlestick;

/// Shown instead of the KPI cards
pub const MARKET_NOTICE: &str = "Data temporarily unavailable - please retry later.";

/// Shown instead of the candlestick chart
pub const HISTORY_NOTICE: &str = "Price history unavailable right now.";

/// Shown when neither market-cap nor volume series are available
pub const SERIES_NOTICE: &str = "Market cap and volume history unavailable right now.";

/// Shown instead of the fundamentals panel
pub const FUNDAMENTALS_NOTICE: &str = "Project fundamentals unavailable - please refresh later.";

mod colors {
    use ratatui::style::Color;

    /// Accent for headings and borders
    pub const GOLD: Color = Color::Rgb(240, 185, 11);
    /// Primary text
    pub const PRIMARY: Color = Color::White;
    /// Secondary/dimmed text
    pub const MUTED: Color = Color::Gray;
    /// Unavailable-data notices
    pub const NOTICE: Color = Color::DarkGray;
    /// Price went up
    pub const UP: Color = Color::Green;
    /// Price went down
    pub const DOWN: Color = Color::Red;
    /// Market-cap series
    pub const MARKET_CAP: Color = Color::Cyan;
    /// Volume series
    pub const VOLUME: Color = Color::Magenta;
}

/// A labelled KPI value ready for display
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KpiCard {
    pub label: String,
    pub value: String,
}

/// Builds the four KPI cards for a snapshot
pub fn kpi_cards(snapshot: &MarketSnapshot) -> Vec<KpiCard> {
    let code = snapshot.currency.to_uppercase();
    let currency = snapshot.currency.as_str();
    vec![
        KpiCard {
            label: format!("Price ({})", code),
            value: format_currency(snapshot.price, currency, 2),
        },
        KpiCard {
            label: "24h Change (%)".to_string(),
            value: format_percent(snapshot.change_24h),
        },
        KpiCard {
            label: format!("Market Cap ({})", code),
            value: format_currency(snapshot.market_cap, currency, 0),
        },
        KpiCard {
            label: format!("24h Volume ({})", code),
            value: format_currency(snapshot.volume_24h, currency, 0),
        },
    ]
}

/// Renders the dashboard screen
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2), // Title and caption
            Constraint::Length(3), // Prediction link
            Constraint::Length(4), // KPI cards
            Constraint::Min(8),    // History charts
            Constraint::Length(7), // Fundamentals
            Constraint::Length(1), // Help
        ])
        .split(area);

    render_header(frame, chunks[0], app);
    render_prediction(frame, chunks[1], app);
    render_kpis(frame, chunks[2], app);
    render_history(frame, chunks[3], app);
    render_fundamentals(frame, chunks[4], app.data.metadata.as_ref());
    render_help(frame, chunks[5]);
}

fn render_header(frame: &mut Frame, area: Rect, app: &App) {
    let updated = app
        .last_refresh
        .map(|t| format!("  ·  updated {}", t.format("%H:%M:%S")))
        .unwrap_or_default();

    let lines = vec![
        Line::from(Span::styled(
            format!("{} Next-Day High Price Prediction", app.coin().label()),
            Style::default()
                .fg(colors::GOLD)
                .add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            format!("Powered by CoinGecko & the prediction service{}", updated),
            Style::default().fg(colors::MUTED),
        )),
    ];

    frame.render_widget(Paragraph::new(lines), area);
}

fn render_prediction(frame: &mut Frame, area: Rect, app: &App) {
    let block = panel_block(" Prediction ");
    let line = match &app.prediction_url {
        Some(url) => Line::from(vec![
            Span::styled("Open in a browser: ", Style::default().fg(colors::MUTED)),
            Span::styled(url.clone(), Style::default().fg(colors::PRIMARY)),
        ]),
        None => notice_line("Prediction link not loaded yet."),
    };

    frame.render_widget(Paragraph::new(line).block(block), area);
}

fn render_kpis(frame: &mut Frame, area: Rect, app: &App) {
    let Some(snapshot) = app.data.snapshot.as_ref() else {
        let block = panel_block(" Live Market Snapshot ");
        frame.render_widget(Paragraph::new(notice_line(MARKET_NOTICE)).block(block), area);
        return;
    };

    let cards = kpi_cards(snapshot);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Ratio(1, 4); 4])
        .split(area);

    for (i, card) in cards.iter().enumerate() {
        let value_color = if i == 1 {
            change_color(snapshot.change_24h)
        } else {
            colors::PRIMARY
        };
        let lines = vec![
            Line::from(Span::styled(card.label.clone(), Style::default().fg(colors::MUTED))),
            Line::from(Span::styled(
                card.value.clone(),
                Style::default()
                    .fg(value_color)
                    .add_modifier(Modifier::BOLD),
            )),
        ];
        let paragraph = Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).border_style(Style::default().fg(colors::GOLD)));
        frame.render_widget(paragraph, columns[i]);
    }
}

fn change_color(change: f64) -> Color {
    if change >= 0.0 {
        colors::UP
    } else {
        colors::DOWN
    }
}

fn render_history(frame: &mut Frame, area: Rect, app: &App) {
    let halves = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);

    render_candles(frame, halves[0], app);

    let market_caps = app.data.chart.as_ref().map(|c| c.market_caps.as_slice()).unwrap_or_default();
    let volumes = app.data.chart.as_ref().map(|c| c.total_volumes.as_slice()).unwrap_or_default();
    let code = app.currency().to_uppercase();

    let series: Vec<(String, &[SeriesPoint], Color)> = [
        (format!(" Market Cap ({}) ", code), market_caps, colors::MARKET_CAP),
        (format!(" Trading Volume ({}) ", code), volumes, colors::VOLUME),
    ]
    .into_iter()
    .filter(|(_, points, _)| !points.is_empty())
    .collect();

    if series.is_empty() {
        let block = panel_block(" Market History ");
        frame.render_widget(Paragraph::new(notice_line(SERIES_NOTICE)).block(block), halves[1]);
        return;
    }

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(vec![Constraint::Ratio(1, series.len() as u32); series.len()])
        .split(halves[1]);

    for ((title, points, color), row) in series.iter().zip(rows.iter()) {
        render_line_chart(frame, *row, title, points, *color);
    }
}

fn render_candles(frame: &mut Frame, area: Rect, app: &App) {
    let candles: &[Candle] = match app.data.candles.as_deref() {
        Some(candles) if !candles.is_empty() => candles,
        _ => {
            let block = panel_block(" Price History ");
            frame.render_widget(Paragraph::new(notice_line(HISTORY_NOTICE)).block(block), area);
            return;
        }
    };

    let currency = app.currency();
    let title = match price_range(candles) {
        Some((low, high)) => format!(
            " Price ({}) {}d  low {}  high {} ",
            currency.to_uppercase(),
            app.history_days,
            format_currency(low, currency, 2),
            format_currency(high, currency, 2)
        ),
        None => " Price History ".to_string(),
    };

    let block = panel_block(&title);
    let inner = block.inner(area);
    frame.render_widget(block, area);
    frame.render_widget(
        Candlestick::new(candles)
            .bullish_style(Style::default().fg(colors::UP))
            .bearish_style(Style::default().fg(colors::DOWN)),
        inner,
    );
}

/// Converts a series into (unix seconds, value) chart points
fn chart_points(series: &[SeriesPoint]) -> Vec<(f64, f64)> {
    series
        .iter()
        .map(|p| (p.timestamp.timestamp() as f64, p.value))
        .collect()
}

/// Min and max of one coordinate, widened when flat so the axis has extent
fn axis_bounds(values: impl Iterator<Item = f64>) -> [f64; 2] {
    let (min, max) = values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    });
    if !min.is_finite() || !max.is_finite() {
        return [0.0, 1.0];
    }
    if (max - min).abs() <= f64::EPSILON {
        return [min - 1.0, max + 1.0];
    }
    [min, max]
}

fn render_line_chart(frame: &mut Frame, area: Rect, title: &str, series: &[SeriesPoint], color: Color) {
    let points = chart_points(series);
    let x_bounds = axis_bounds(points.iter().map(|(x, _)| *x));
    let y_bounds = axis_bounds(points.iter().map(|(_, y)| *y));

    let first = series.first().map(|p| p.timestamp.format("%b %d").to_string());
    let last = series.last().map(|p| p.timestamp.format("%b %d").to_string());

    let dataset = Dataset::default()
        .marker(symbols::Marker::Braille)
        .graph_type(GraphType::Line)
        .style(Style::default().fg(color))
        .data(&points);

    let chart = Chart::new(vec![dataset])
        .block(panel_block(title))
        .x_axis(
            Axis::default()
                .style(Style::default().fg(colors::MUTED))
                .bounds(x_bounds)
                .labels(vec![
                    Span::raw(first.unwrap_or_default()),
                    Span::raw(last.unwrap_or_default()),
                ]),
        )
        .y_axis(
            Axis::default()
                .style(Style::default().fg(colors::MUTED))
                .bounds(y_bounds)
                .labels(vec![
                    Span::raw(format_compact(y_bounds[0])),
                    Span::raw(format_compact(y_bounds[1])),
                ]),
        );

    frame.render_widget(chart, area);
}

/// Lines for the fundamentals panel
pub fn fundamentals_lines(meta: &CoinMetadata) -> Vec<Line<'static>> {
    let label = |text: &str| Span::styled(text.to_string(), Style::default().fg(colors::MUTED));
    let value = |text: String| Span::styled(text, Style::default().fg(colors::PRIMARY));

    let categories = if meta.categories.is_empty() {
        "N/A".to_string()
    } else {
        meta.categories.join(", ")
    };

    vec![
        Line::from(vec![
            label("Name: "),
            value(meta.name.clone()),
            Span::raw("  |  "),
            label("Symbol: "),
            value(meta.symbol.to_uppercase()),
        ]),
        Line::from(vec![
            label("Algorithm: "),
            value(meta.hashing_algorithm.clone().unwrap_or_else(|| "N/A".to_string())),
        ]),
        Line::from(vec![label("Category: "), value(categories)]),
        Line::from(vec![
            label("Website: "),
            value(meta.homepage.clone().unwrap_or_else(|| "N/A".to_string())),
            Span::raw("  |  "),
            label("Explorer: "),
            value(meta.explorer.clone().unwrap_or_else(|| "N/A".to_string())),
        ]),
        Line::from(vec![
            label("Logo: "),
            value(meta.logo_url.clone().unwrap_or_else(|| "N/A".to_string())),
        ]),
    ]
}

fn render_fundamentals(frame: &mut Frame, area: Rect, metadata: Option<&CoinMetadata>) {
    let block = panel_block(" Fundamentals ");
    let lines = match metadata {
        Some(meta) => fundamentals_lines(meta),
        None => vec![notice_line(FUNDAMENTALS_NOTICE)],
    };

    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
}

fn render_help(frame: &mut Frame, area: Rect) {
    let line = Line::from(vec![
        Span::styled("r", Style::default().fg(colors::GOLD)),
        Span::styled(" Refresh", Style::default().fg(colors::MUTED)),
        Span::raw("  "),
        Span::styled("?", Style::default().fg(colors::GOLD)),
        Span::styled(" Help", Style::default().fg(colors::MUTED)),
        Span::raw("  "),
        Span::styled("q", Style::default().fg(colors::GOLD)),
        Span::styled(" Quit", Style::default().fg(colors::MUTED)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn panel_block(title: &str) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(colors::GOLD))
        .title(Span::styled(
            title.to_string(),
            Style::default()
                .fg(colors::GOLD)
                .add_modifier(Modifier::BOLD),
        ))
}

fn notice_line(text: &str) -> Line<'static> {
    Line::from(Span::styled(text.to_string(), Style::default().fg(colors::NOTICE)))
}
