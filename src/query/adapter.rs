use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::common::{ImageFrame, PollResult, QueryKind, Reading, SensorSubject, SeriesPoint};
use crate::error::AppResult;
use crate::influx::{FluxRecord, ReadApi};
use crate::query::flux;

/// Camera view used when an image subject carries none.
pub const DEFAULT_VIEW: &str = "front";

/// Turns subjects into Flux queries and query rows into display records.
///
/// Every error is logged and reported as `PollResult::Failed`; nothing
/// escapes this boundary.
pub struct QueryAdapter<R> {
    api: Arc<R>,
    bucket: String,
}

impl<R> Clone for QueryAdapter<R> {
    fn clone(&self) -> Self {
        Self {
            api: Arc::clone(&self.api),
            bucket: self.bucket.clone(),
        }
    }
}

impl<R: ReadApi> QueryAdapter<R> {
    pub fn new(api: Arc<R>, bucket: impl Into<String>) -> Self {
        Self {
            api,
            bucket: bucket.into(),
        }
    }

    /// Latest merged reading for `subject.sensor_id`.
    pub async fn latest(&self, subject: &SensorSubject) -> PollResult<Reading> {
        let query = flux::latest(&self.bucket, &subject.sensor_id);
        let rows = self.run(QueryKind::Latest, subject, &query).await;
        to_poll_result(rows, |rows| merge_latest(&rows))
    }

    /// Aggregated level history for the subject's window.
    pub async fn history(&self, subject: &SensorSubject) -> PollResult<Vec<SeriesPoint>> {
        let query = flux::history(&self.bucket, &subject.sensor_id, subject.window);
        let rows = self.run(QueryKind::History, subject, &query).await;
        to_poll_result(rows, |rows| non_empty(shape_history(&rows)))
    }

    /// Camera frames for the subject's view and window.
    pub async fn images(&self, subject: &SensorSubject) -> PollResult<Vec<ImageFrame>> {
        let view = subject.view.as_deref().unwrap_or(DEFAULT_VIEW);
        let query = flux::images(&self.bucket, &subject.sensor_id, view, subject.window);
        let rows = self.run(QueryKind::Images, subject, &query).await;
        to_poll_result(rows, |rows| non_empty(shape_images(&rows, view)))
    }

    async fn run(
        &self,
        kind: QueryKind,
        subject: &SensorSubject,
        query: &str,
    ) -> AppResult<Vec<FluxRecord>> {
        tracing::debug!(
            kind = kind.as_str(),
            sensor_id = %subject.sensor_id,
            window = %subject.window,
            "Running query"
        );

        let rows = self.api.query(query).await;
        match &rows {
            Ok(rows) => tracing::debug!(kind = kind.as_str(), rows = rows.len(), "Query completed"),
            Err(e) => tracing::warn!(
                kind = kind.as_str(),
                sensor_id = %subject.sensor_id,
                error = %e,
                "Query failed"
            ),
        }
        rows
    }
}

fn to_poll_result<T>(
    rows: AppResult<Vec<FluxRecord>>,
    shape: impl FnOnce(Vec<FluxRecord>) -> Option<T>,
) -> PollResult<T> {
    match rows {
        Err(_) => PollResult::Failed,
        Ok(rows) if rows.is_empty() => PollResult::Empty,
        Ok(rows) => shape(rows).map_or(PollResult::Empty, PollResult::Fresh),
    }
}

fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    (!items.is_empty()).then_some(items)
}

/// Merge per-field `last()` rows into one reading.
///
/// Only `dist_cm`, `bat_volt` and `solar_volt` are kept. `observed_at` is the
/// newest timestamp among the merged rows and stays `None` if none of them
/// carries one. Returns `None` when no allow-listed field is present.
pub fn merge_latest(rows: &[FluxRecord]) -> Option<Reading> {
    let mut reading = Reading::default();
    let mut merged = false;

    for row in rows {
        let Some(value) = row.value() else {
            continue;
        };
        match row.field() {
            Some(flux::LEVEL_FIELD) => reading.level = value,
            Some(flux::BATTERY_FIELD) => reading.battery = value,
            Some(flux::SOLAR_FIELD) => reading.solar = value,
            _ => continue,
        }
        merged = true;

        if let Some(time) = row.time() {
            reading.observed_at = Some(reading.observed_at.map_or(time, |t| t.max(time)));
        }
    }

    merged.then_some(reading)
}

/// Ascending, de-duplicated level series with one-decimal rounding.
pub fn shape_history(rows: &[FluxRecord]) -> Vec<SeriesPoint> {
    let mut points: BTreeMap<DateTime<Utc>, f64> = BTreeMap::new();

    for row in rows {
        if let (Some(time), Some(level)) = (row.time(), row.value()) {
            points.insert(time, round_one_decimal(level));
        }
    }

    points
        .into_iter()
        .map(|(time, level)| SeriesPoint { time, level })
        .collect()
}

/// Ascending, de-duplicated image frames from pivoted rows.
pub fn shape_images(rows: &[FluxRecord], requested_view: &str) -> Vec<ImageFrame> {
    let mut frames: BTreeMap<DateTime<Utc>, ImageFrame> = BTreeMap::new();

    for row in rows {
        let (Some(time), Some(image_url)) = (row.time(), row.get_str("image_url")) else {
            continue;
        };
        if image_url.is_empty() {
            continue;
        }

        let view = row
            .get_str("view")
            .filter(|v| !v.is_empty())
            .unwrap_or(requested_view);

        frames.insert(
            time,
            ImageFrame {
                time,
                image_url: image_url.to_string(),
                filename: row.get_str("filename").map(str::to_string),
                view: view.to_string(),
            },
        );
    }

    frames.into_values().collect()
}

#[must_use]
pub fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
