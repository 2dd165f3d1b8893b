//! Display-ready state derived from poll results.

pub mod format;
mod gauge;
mod history;
mod timeline;

pub use gauge::{fill_fraction, GaugeDisplay, GaugeSnapshot, GaugeView, LevelBucket, DEFAULT_MAX_LEVEL};
pub use history::{synthetic_series, HistorySnapshot, HistoryView, SYNTHETIC_POINTS};
pub use timeline::{ImageTimeline, NavKey, TimelineSnapshot, MAX_AXIS_LABELS};
