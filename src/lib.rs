//! # e6filter
//!
//! e6filter applies an e621 style blacklist to posts fetched from the site's API. Posts are
//! requested through a single-flight, rate-limited queue, normalized, and pushed through every
//! blacklist line once. Visibility is then answered from each line's match cache.
pub mod app;
pub mod cli;
pub mod config;
pub mod error;
pub mod progress_bars;

pub use app::{App, LineSummary, PostReport};
pub use config::AppConfig;
