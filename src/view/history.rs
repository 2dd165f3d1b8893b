use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::{PollResult, SeriesPoint, TimeWindow};
use crate::query::round_one_decimal;
use crate::view::format;

/// Points in a synthetic series, both ends included.
pub const SYNTHETIC_POINTS: usize = 51;

const SYNTHETIC_BASE: f64 = 340.0;
const SYNTHETIC_AMPLITUDE: f64 = 40.0;
const SYNTHETIC_NOISE: f64 = 5.0;

/// Placeholder level series for a window with no data.
///
/// `i` counts down from 50 to 0; point `i` sits at `now - i * duration / 50`
/// with `level = 340 + 40 * sin(0.5 * i) + noise`, noise in `[0, 5)`. The last
/// point is exactly `now`.
pub fn synthetic_series(
    window: TimeWindow,
    now: DateTime<Utc>,
    rng: &mut fastrand::Rng,
) -> Vec<SeriesPoint> {
    let steps = (SYNTHETIC_POINTS - 1) as i32;
    let step = window.duration() / steps;

    (0..=steps)
        .rev()
        .map(|i| {
            let wave = SYNTHETIC_AMPLITUDE * (0.5 * f64::from(i)).sin();
            let noise = rng.f64() * SYNTHETIC_NOISE;
            SeriesPoint {
                time: now - step * i,
                level: round_one_decimal(SYNTHETIC_BASE + wave + noise),
            }
        })
        .collect()
}

/// Water-level history chart.
#[derive(Debug, Clone, Default)]
pub struct HistoryView {
    window: TimeWindow,
    points: Vec<SeriesPoint>,
    is_synthetic: bool,
    loading: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HistorySnapshot {
    pub window: TimeWindow,
    pub points: Vec<SeriesPoint>,
    pub is_synthetic: bool,
    pub status: &'static str,
}

impl HistoryView {
    #[must_use]
    pub fn new(window: TimeWindow) -> Self {
        Self {
            window,
            points: Vec::new(),
            is_synthetic: false,
            loading: true,
        }
    }

    /// Switch windows. Existing points stay until the next poll lands.
    pub fn set_window(&mut self, window: TimeWindow) -> bool {
        if self.window == window {
            return false;
        }
        self.window = window;
        self.loading = true;
        true
    }

    /// Apply a poll outcome. `Empty` and `Failed` are replaced by a
    /// synthetic series ending at `now`.
    pub fn apply(
        &mut self,
        result: PollResult<Vec<SeriesPoint>>,
        now: DateTime<Utc>,
        rng: &mut fastrand::Rng,
    ) {
        match result {
            PollResult::Fresh(points) if !points.is_empty() => {
                self.points = points;
                self.is_synthetic = false;
            }
            _ => {
                tracing::debug!(window = %self.window, "No history data, using synthetic series");
                self.points = synthetic_series(self.window, now, rng);
                self.is_synthetic = true;
            }
        }
        self.loading = false;
    }

    #[must_use]
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    #[must_use]
    pub fn points(&self) -> &[SeriesPoint] {
        &self.points
    }

    #[must_use]
    pub fn is_synthetic(&self) -> bool {
        self.is_synthetic
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn status_label(&self) -> &'static str {
        if self.is_synthetic {
            "OFFLINE SIMULATION"
        } else {
            "Live Sensor Data"
        }
    }

    #[must_use]
    pub fn axis_tick(&self, time: DateTime<Utc>) -> String {
        format::axis_tick(time, self.window)
    }

    #[must_use]
    pub fn snapshot(&self) -> HistorySnapshot {
        HistorySnapshot {
            window: self.window,
            points: self.points.clone(),
            is_synthetic: self.is_synthetic,
            status: self.status_label(),
        }
    }
}
