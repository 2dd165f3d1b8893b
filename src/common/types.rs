use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AppError;

/// Lookback window shared by the history chart and the image timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TimeWindow {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[default]
    #[serde(rename = "24h")]
    Day,
    #[serde(rename = "7d")]
    Week,
}

impl TimeWindow {
    pub const ALL: [Self; 4] = [Self::OneHour, Self::SixHours, Self::Day, Self::Week];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OneHour => "1h",
            Self::SixHours => "6h",
            Self::Day => "24h",
            Self::Week => "7d",
        }
    }

    /// Button label used by the range selector.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::OneHour => "1H",
            Self::SixHours => "6H",
            Self::Day => "24H",
            Self::Week => "7D",
        }
    }

    #[must_use]
    pub fn duration(self) -> TimeDelta {
        match self {
            Self::OneHour => TimeDelta::hours(1),
            Self::SixHours => TimeDelta::hours(6),
            Self::Day => TimeDelta::hours(24),
            Self::Week => TimeDelta::days(7),
        }
    }

    /// Flux `range(start: ..)` argument.
    #[must_use]
    pub fn range_start(self) -> String {
        format!("-{}", self.as_str())
    }

    /// `aggregateWindow(every: ..)` for the history query.
    #[must_use]
    pub fn granularity(self) -> &'static str {
        match self {
            Self::OneHour => "1m",
            Self::SixHours => "5m",
            Self::Day => "15m",
            Self::Week => "1h",
        }
    }

    /// Coarse windows are labelled by date rather than clock time.
    #[must_use]
    pub fn is_short(self) -> bool {
        matches!(self, Self::OneHour | Self::SixHours)
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeWindow {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "1h" => Ok(Self::OneHour),
            "6h" => Ok(Self::SixHours),
            "24h" => Ok(Self::Day),
            "7d" => Ok(Self::Week),
            other => Err(AppError::Parse(format!(
                "Invalid window: {other}. Must be one of: 1h, 6h, 24h, 7d"
            ))),
        }
    }
}

/// What a poller is tracking. Any field change makes a new subject.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct SensorSubject {
    pub sensor_id: String,
    pub view: Option<String>,
    pub window: TimeWindow,
}

impl SensorSubject {
    /// Subject for the latest-reading query. Its lookback is fixed, so the
    /// window stays at the default.
    pub fn latest(sensor_id: impl Into<String>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            view: None,
            window: TimeWindow::Day,
        }
    }

    pub fn history(sensor_id: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            view: None,
            window,
        }
    }

    pub fn images(sensor_id: impl Into<String>, view: impl Into<String>, window: TimeWindow) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            view: Some(view.into()),
            window,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryKind {
    Latest,
    History,
    Images,
}

impl QueryKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Latest => "latest",
            Self::History => "history",
            Self::Images => "images",
        }
    }
}

/// Merged latest values of one sensor. `observed_at == None` means offline.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Reading {
    pub level: f64,
    pub battery: f64,
    pub solar: f64,
    pub observed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub time: DateTime<Utc>,
    pub level: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ImageFrame {
    pub time: DateTime<Utc>,
    pub image_url: String,
    pub filename: Option<String>,
    pub view: String,
}

/// Outcome of one query attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum PollResult<T> {
    /// Successful query with at least one row.
    Fresh(T),
    /// Successful query, zero rows.
    Empty,
    /// Transport, backend or parse failure.
    Failed,
}

impl<T> PollResult<T> {
    #[must_use]
    pub fn is_fresh(&self) -> bool {
        matches!(self, Self::Fresh(_))
    }

    pub fn fresh(&self) -> Option<&T> {
        match self {
            Self::Fresh(value) => Some(value),
            _ => None,
        }
    }

    pub fn into_fresh(self) -> Option<T> {
        match self {
            Self::Fresh(value) => Some(value),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PollResult<U> {
        match self {
            Self::Fresh(value) => PollResult::Fresh(f(value)),
            Self::Empty => PollResult::Empty,
            Self::Failed => PollResult::Failed,
        }
    }

    #[must_use]
    pub fn status(&self) -> &'static str {
        match self {
            Self::Fresh(_) => "fresh",
            Self::Empty => "empty",
            Self::Failed => "failed",
        }
    }
}
