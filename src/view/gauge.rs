use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::common::{PollResult, Reading};
use crate::sensors::{DefaultReading, Thresholds};
use crate::view::format;

pub const DEFAULT_MAX_LEVEL: f64 = 1000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelBucket {
    Normal,
    Elevated,
    Critical,
}

impl LevelBucket {
    /// Bucket for `level`. Each bound belongs to the higher bucket.
    #[must_use]
    pub fn classify(level: f64, thresholds: &Thresholds) -> Self {
        if level >= thresholds.high {
            Self::Critical
        } else if level >= thresholds.medium {
            Self::Elevated
        } else {
            Self::Normal
        }
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Normal => "Normal Levels",
            Self::Elevated => "Elevated Levels",
            Self::Critical => "High Alert",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "state", content = "bucket")]
pub enum GaugeDisplay {
    /// No poll has completed yet.
    Loading,
    Live(LevelBucket),
    /// Overrides the bucket colouring; the last known level stays visible.
    Offline,
}

/// `min(level / max_level, 1.0)`, never below zero.
#[must_use]
pub fn fill_fraction(level: f64, max_level: f64) -> f64 {
    if max_level <= 0.0 || !level.is_finite() {
        return 0.0;
    }
    (level / max_level).clamp(0.0, 1.0)
}

/// Live water-level gauge for one sensor.
#[derive(Debug, Clone)]
pub struct GaugeView {
    thresholds: Thresholds,
    max_level: f64,
    fallback: Option<DefaultReading>,
    reading: Option<Reading>,
    offline: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct GaugeSnapshot {
    pub level: f64,
    pub battery: f64,
    pub solar: f64,
    pub fill_percent: f64,
    pub display: GaugeDisplay,
    pub status: &'static str,
    pub last_updated: String,
}

impl GaugeView {
    #[must_use]
    pub fn new(thresholds: Thresholds, max_level: f64) -> Self {
        Self {
            thresholds,
            max_level,
            fallback: None,
            reading: None,
            offline: false,
        }
    }

    /// Reading to show when the sensor stops reporting.
    #[must_use]
    pub fn with_fallback(mut self, fallback: Option<DefaultReading>) -> Self {
        self.fallback = fallback;
        self
    }

    pub fn apply(&mut self, result: PollResult<Reading>) {
        match result {
            PollResult::Fresh(reading) => {
                self.offline = reading.observed_at.is_none();
                self.reading = Some(reading);
            }
            PollResult::Empty | PollResult::Failed => {
                if let Some(fallback) = self.fallback {
                    self.reading = Some(fallback.to_reading());
                } else if self.reading.is_none() {
                    self.reading = Some(Reading::default());
                }
                self.offline = true;
            }
        }
    }

    pub fn reading(&self) -> Option<&Reading> {
        self.reading.as_ref()
    }

    #[must_use]
    pub fn thresholds(&self) -> &Thresholds {
        &self.thresholds
    }

    #[must_use]
    pub fn level(&self) -> f64 {
        self.reading.as_ref().map_or(0.0, |r| r.level)
    }

    #[must_use]
    pub fn fill(&self) -> f64 {
        fill_fraction(self.level(), self.max_level)
    }

    #[must_use]
    pub fn fill_percent(&self) -> f64 {
        self.fill() * 100.0
    }

    #[must_use]
    pub fn bucket(&self) -> LevelBucket {
        LevelBucket::classify(self.level(), &self.thresholds)
    }

    #[must_use]
    pub fn display(&self) -> GaugeDisplay {
        match &self.reading {
            None => GaugeDisplay::Loading,
            Some(_) if self.offline => GaugeDisplay::Offline,
            Some(_) => GaugeDisplay::Live(self.bucket()),
        }
    }

    #[must_use]
    pub fn is_offline(&self) -> bool {
        self.display() == GaugeDisplay::Offline
    }

    /// "Updated: ..." text.
    #[must_use]
    pub fn last_updated(&self, now: DateTime<Utc>) -> String {
        match (&self.reading, self.offline) {
            (None, _) => "Loading...".to_string(),
            (Some(_), true) => format::OFFLINE_LABEL.to_string(),
            (Some(reading), false) => reading
                .observed_at
                .map_or_else(|| format::OFFLINE_LABEL.to_string(), |t| format::relative_age(t, now)),
        }
    }

    #[must_use]
    pub fn snapshot(&self, now: DateTime<Utc>) -> GaugeSnapshot {
        let reading = self.reading.clone().unwrap_or_default();
        GaugeSnapshot {
            level: reading.level,
            battery: reading.battery,
            solar: reading.solar,
            fill_percent: self.fill_percent(),
            display: self.display(),
            status: self.bucket().label(),
            last_updated: self.last_updated(now),
        }
    }
}
