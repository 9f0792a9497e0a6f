//! coindash library
//!
//! Exposes the fetch, cache, data and configuration layers for the binary and
//! for integration tests.

pub mod cache;
pub mod cli;
pub mod config;
pub mod data;
pub mod fetch;
pub mod format;
pub mod logging;
