//! Records decoded from InfluxDB annotated CSV.
//!
//! A query response is a sequence of tables. Each table starts with
//! annotation rows (`#datatype`, `#group`, `#default`), then a header row,
//! then data rows. The first CSV column is reserved for annotations and is
//! empty on header and data rows.
//!
//! ```text
//! #datatype,string,long,dateTime:RFC3339,double,string,string
//! #group,false,false,false,false,true,true
//! #default,_result,,,,,
//! ,result,table,_time,_value,_field,sensor_id
//! ,,0,2026-01-05T10:00:00Z,512,dist_cm,sensor-1
//! ```

use chrono::{DateTime, Utc};
use std::collections::HashMap;

use crate::error::{AppError, AppResult};

/// A single typed cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum FluxValue {
    Null,
    String(String),
    Double(f64),
    Long(i64),
    UnsignedLong(u64),
    Boolean(bool),
    Time(DateTime<Utc>),
}

impl FluxValue {
    /// Decode a raw cell according to its `#datatype` annotation.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Parse` if the cell does not match its datatype.
    pub fn parse(datatype: &str, raw: &str) -> AppResult<Self> {
        if raw.is_empty() && datatype != "string" {
            return Ok(Self::Null);
        }

        let parse_err = |e: &dyn std::fmt::Display| {
            AppError::Parse(format!("Invalid {datatype} value '{raw}': {e}"))
        };

        match datatype {
            "double" => match raw {
                "+Inf" => Ok(Self::Double(f64::INFINITY)),
                "-Inf" => Ok(Self::Double(f64::NEG_INFINITY)),
                _ => raw.parse().map(Self::Double).map_err(|e| parse_err(&e)),
            },
            "long" => raw.parse().map(Self::Long).map_err(|e| parse_err(&e)),
            "unsignedLong" => raw.parse().map(Self::UnsignedLong).map_err(|e| parse_err(&e)),
            "boolean" => match raw {
                "true" => Ok(Self::Boolean(true)),
                "false" => Ok(Self::Boolean(false)),
                _ => Err(parse_err(&"expected true or false")),
            },
            dt if dt.starts_with("dateTime") => DateTime::parse_from_rfc3339(raw)
                .map(|t| Self::Time(t.with_timezone(&Utc)))
                .map_err(|e| parse_err(&e)),
            // string, duration, base64Binary and unknown types stay textual
            _ => Ok(Self::String(raw.to_string())),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Numeric view of the value. Strings holding a number are accepted,
    /// since untyped fields are written as strings by some gateways.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Double(v) => Some(*v),
            Self::Long(v) => Some(*v as f64),
            Self::UnsignedLong(v) => Some(*v as f64),
            Self::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    pub fn as_time(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Time(t) => Some(*t),
            _ => None,
        }
    }
}

/// One data row, keyed by column name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FluxRecord {
    pub table: i64,
    pub values: HashMap<String, FluxValue>,
}

impl FluxRecord {
    pub fn get(&self, column: &str) -> Option<&FluxValue> {
        self.values.get(column)
    }

    pub fn get_str(&self, column: &str) -> Option<&str> {
        self.get(column).and_then(FluxValue::as_str)
    }

    pub fn get_f64(&self, column: &str) -> Option<f64> {
        self.get(column).and_then(FluxValue::as_f64)
    }

    /// The `_time` column.
    pub fn time(&self) -> Option<DateTime<Utc>> {
        self.get("_time").and_then(FluxValue::as_time)
    }

    /// The `_field` column.
    pub fn field(&self) -> Option<&str> {
        self.get_str("_field")
    }

    /// The `_value` column as a number.
    pub fn value(&self) -> Option<f64> {
        self.get_f64("_value")
    }

    /// Builder used by fakes and tests.
    #[must_use]
    pub fn with(mut self, column: &str, value: FluxValue) -> Self {
        self.values.insert(column.to_string(), value);
        self
    }
}

#[derive(Default)]
struct TableLayout {
    datatypes: Vec<String>,
    defaults: Vec<String>,
    columns: Option<Vec<String>>,
}

/// Parse an annotated CSV query response into records.
///
/// # Errors
///
/// Returns `AppError::Influx` if the response carries an error table, or
/// `AppError::Parse` if the CSV is malformed.
pub fn parse_annotated_csv(body: &str) -> AppResult<Vec<FluxRecord>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(body.as_bytes());

    let mut records = Vec::new();
    let mut layout = TableLayout::default();

    for row in reader.records() {
        let row = row?;
        let Some(first) = row.get(0) else {
            continue;
        };

        // A lone empty cell is the blank separator line between tables.
        if row.len() == 1 && first.trim().is_empty() {
            layout = TableLayout::default();
            continue;
        }

        match first {
            "#datatype" => {
                layout = TableLayout {
                    datatypes: row.iter().skip(1).map(str::to_string).collect(),
                    ..TableLayout::default()
                };
            }
            "#default" => {
                layout.defaults = row.iter().skip(1).map(str::to_string).collect();
            }
            a if a.starts_with('#') => {}
            _ => {
                let Some(columns) = &layout.columns else {
                    layout.columns = Some(row.iter().skip(1).map(str::to_string).collect());
                    continue;
                };

                if columns.first().map(String::as_str) == Some("error") {
                    let message = row.get(1).unwrap_or("unknown error");
                    return Err(AppError::Influx(format!("Query failed: {message}")));
                }

                records.push(decode_row(columns, &layout, &row)?);
            }
        }
    }

    Ok(records)
}

fn decode_row(
    columns: &[String],
    layout: &TableLayout,
    row: &csv::StringRecord,
) -> AppResult<FluxRecord> {
    let mut record = FluxRecord::default();

    for (i, column) in columns.iter().enumerate() {
        let mut raw = row.get(i + 1).unwrap_or_default();
        if raw.is_empty() {
            raw = layout.defaults.get(i).map_or("", String::as_str);
        }
        let datatype = layout.datatypes.get(i).map_or("string", String::as_str);

        let value = FluxValue::parse(datatype, raw)?;
        if column == "table" {
            if let FluxValue::Long(t) = value {
                record.table = t;
            }
        }
        record.values.insert(column.clone(), value);
    }

    Ok(record)
}
