//! Candlestick widget for OHLC history

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style},
    widgets::Widget,
};

use coindash::data::Candle;

/// Glyph for the open-to-close body
const BODY: &str = "█";

/// Glyph for the high/low wick
const WICK: &str = "│";

/// A candlestick chart drawing one column per candle
///
/// When there are more candles than columns, the most recent ones are shown.
pub struct Candlestick<'a> {
    /// Candles in chronological order
    candles: &'a [Candle],
    /// Style for candles that closed at or above their open
    bullish_style: Style,
    /// Style for candles that closed below their open
    bearish_style: Style,
}

impl<'a> Candlestick<'a> {
    pub fn new(candles: &'a [Candle]) -> Self {
        Self {
            candles,
            bullish_style: Style::default().fg(Color::Green),
            bearish_style: Style::default().fg(Color::Red),
        }
    }

    pub fn bullish_style(mut self, style: Style) -> Self {
        self.bullish_style = style;
        self
    }

    pub fn bearish_style(mut self, style: Style) -> Self {
        self.bearish_style = style;
        self
    }

    /// The candles that fit into `width` columns
    fn visible(&self, width: usize) -> &'a [Candle] {
        let start = self.candles.len().saturating_sub(width);
        &self.candles[start..]
    }
}

/// Lowest low and highest high across `candles`
pub fn price_range(candles: &[Candle]) -> Option<(f64, f64)> {
    let low = candles.iter().map(|c| c.low).fold(f64::INFINITY, f64::min);
    let high = candles.iter().map(|c| c.high).fold(f64::NEG_INFINITY, f64::max);
    if low.is_finite() && high.is_finite() {
        Some((low, high))
    } else {
        None
    }
}

/// Maps a price to a row offset, 0 being the top row
fn price_to_row(price: f64, min: f64, max: f64, height: u16) -> u16 {
    let span = max - min;
    if span <= f64::EPSILON || height <= 1 {
        return height / 2;
    }
    let normalized = ((max - price) / span).clamp(0.0, 1.0);
    ((normalized * f64::from(height - 1)).round() as u16).min(height - 1)
}

impl<'a> Widget for Candlestick<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        let visible = self.visible(area.width as usize);
        let Some((min, max)) = price_range(visible) else {
            return;
        };

        for (i, candle) in visible.iter().enumerate() {
            let x = area.x + i as u16;
            let style = if candle.is_bullish() {
                self.bullish_style
            } else {
                self.bearish_style
            };

            let wick_top = price_to_row(candle.high, min, max, area.height);
            let wick_bottom = price_to_row(candle.low, min, max, area.height);
            let body_top = price_to_row(candle.open.max(candle.close), min, max, area.height);
            let body_bottom = price_to_row(candle.open.min(candle.close), min, max, area.height);

            for row in wick_top..=wick_bottom {
                let symbol = if (body_top..=body_bottom).contains(&row) {
                    BODY
                } else {
                    WICK
                };
                if let Some(cell) = buf.cell_mut((x, area.y + row)) {
                    cell.set_symbol(symbol).set_style(style);
                }
            }
        }
    }
}
