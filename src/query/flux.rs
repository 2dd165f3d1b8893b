//! Flux query text for the three dashboard queries.

use crate::common::TimeWindow;

pub const READING_MEASUREMENT: &str = "sensor_reading";
pub const IMAGE_MEASUREMENT: &str = "sensor_image";

/// Latest-reading lookback, independent of the selected window.
pub const LATEST_RANGE: &str = "-24h";

pub const LEVEL_FIELD: &str = "dist_cm";
pub const BATTERY_FIELD: &str = "bat_volt";
pub const SOLAR_FIELD: &str = "solar_volt";

/// Escape a value for use inside a Flux string literal.
#[must_use]
pub fn escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '$' => out.push_str("\\$"),
            _ => out.push(c),
        }
    }
    out
}

/// Last value of every field of a sensor within the fixed lookback.
#[must_use]
pub fn latest(bucket: &str, sensor_id: &str) -> String {
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: {LATEST_RANGE})
  |> filter(fn: (r) => r["_measurement"] == "{READING_MEASUREMENT}")
  |> filter(fn: (r) => r["sensor_id"] == "{sensor}")
  |> last()"#,
        bucket = escape(bucket),
        sensor = escape(sensor_id),
    )
}

/// Mean water level per aggregation bucket across the window.
#[must_use]
pub fn history(bucket: &str, sensor_id: &str, window: TimeWindow) -> String {
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: {start})
  |> filter(fn: (r) => r["_measurement"] == "{READING_MEASUREMENT}")
  |> filter(fn: (r) => r["sensor_id"] == "{sensor}")
  |> filter(fn: (r) => r["_field"] == "{LEVEL_FIELD}")
  |> aggregateWindow(every: {every}, fn: mean, createEmpty: false)
  |> yield(name: "mean")"#,
        bucket = escape(bucket),
        start = window.range_start(),
        sensor = escape(sensor_id),
        every = window.granularity(),
    )
}

/// Camera snapshots of one view, one row per timestamp.
#[must_use]
pub fn images(bucket: &str, sensor_id: &str, view: &str, window: TimeWindow) -> String {
    format!(
        r#"from(bucket: "{bucket}")
  |> range(start: {start})
  |> filter(fn: (r) => r["_measurement"] == "{IMAGE_MEASUREMENT}")
  |> filter(fn: (r) => r["sensor_id"] == "{sensor}")
  |> filter(fn: (r) => r["view"] == "{view}")
  |> pivot(rowKey: ["_time"], columnKey: ["_field"], valueColumn: "_value")
  |> sort(columns: ["_time"])"#,
        bucket = escape(bucket),
        start = window.range_start(),
        sensor = escape(sensor_id),
        view = escape(view),
    )
}
