//! Custom widgets

pub mod candlestick;

pub use candlestick::Candlestick;
