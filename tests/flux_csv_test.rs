//! Tests for annotated CSV decoding and Flux query text.
//!
//! Run with: cargo test --test flux_csv_test

use chrono::{TimeZone, Utc};

use flood_monitor::common::TimeWindow;
use flood_monitor::error::AppError;
use flood_monitor::influx::{parse_annotated_csv, FluxValue};
use flood_monitor::query::flux;

const LATEST_RESPONSE: &str = "\
#datatype,string,long,dateTime:RFC3339,dateTime:RFC3339,dateTime:RFC3339,double,string,string,string
#group,false,false,true,true,false,false,true,true,true
#default,_result,,,,,,,,
,result,table,_start,_stop,_time,_value,_field,_measurement,sensor_id
,,0,2026-03-13T12:00:00Z,2026-03-14T12:00:00Z,2026-03-14T11:58:00Z,520,dist_cm,sensor_reading,sensor-2
,,1,2026-03-13T12:00:00Z,2026-03-14T12:00:00Z,2026-03-14T11:59:30.5Z,12.4,bat_volt,sensor_reading,sensor-2

#datatype,string,long,dateTime:RFC3339,dateTime:RFC3339,dateTime:RFC3339,long,string,string,string
#group,false,false,true,true,false,false,true,true,true
#default,_result,,,,,,,,
,result,table,_start,_stop,_time,_value,_field,_measurement,sensor_id
,,2,2026-03-13T12:00:00Z,2026-03-14T12:00:00Z,2026-03-14T11:57:00Z,13,solar_volt,sensor_reading,sensor-2
";

#[test]
fn decodes_multiple_tables_with_types_and_defaults() {
    let records = parse_annotated_csv(LATEST_RESPONSE).unwrap();
    assert_eq!(records.len(), 3);

    let level = &records[0];
    assert_eq!(level.table, 0);
    assert_eq!(level.field(), Some("dist_cm"));
    assert_eq!(level.value(), Some(520.0));
    assert_eq!(level.get_str("result"), Some("_result"));
    assert_eq!(
        level.time(),
        Some(Utc.with_ymd_and_hms(2026, 3, 14, 11, 58, 0).unwrap())
    );

    let battery = &records[1];
    assert_eq!(battery.get("_value"), Some(&FluxValue::Double(12.4)));
    assert_eq!(battery.time().unwrap().timestamp_subsec_millis(), 500);

    let solar = &records[2];
    assert_eq!(solar.table, 2);
    assert_eq!(solar.get("_value"), Some(&FluxValue::Long(13)));
    assert_eq!(solar.value(), Some(13.0));
}

#[test]
fn empty_body_yields_no_records() {
    assert!(parse_annotated_csv("").unwrap().is_empty());
    assert!(parse_annotated_csv("\r\n").unwrap().is_empty());
}

#[test]
fn empty_cells_become_null_for_typed_columns() {
    let body = "\
#datatype,string,long,dateTime:RFC3339,double,string
#group,false,false,false,false,true
#default,_result,,,,
,result,table,_time,_value,_field
,,0,,,dist_cm
";
    let records = parse_annotated_csv(body).unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].get("_value"), Some(&FluxValue::Null));
    assert_eq!(records[0].time(), None);
    assert_eq!(records[0].value(), None);
}

#[test]
fn error_table_is_reported_as_influx_error() {
    let body = "\
#datatype,string,string
#group,true,true
#default,,
,error,reference
,\"failed to initialize execute state: could not find bucket \"\"floods\"\"\",
";
    match parse_annotated_csv(body) {
        Err(AppError::Influx(msg)) => assert!(msg.contains("could not find bucket")),
        other => panic!("expected influx error, got {other:?}"),
    }
}

#[test]
fn malformed_typed_value_is_a_parse_error() {
    let body = "\
#datatype,string,long,double
#group,false,false,false
#default,_result,,
,result,table,_value
,,0,not-a-number
";
    assert!(matches!(parse_annotated_csv(body), Err(AppError::Parse(_))));
}

#[test]
fn numeric_strings_are_read_as_numbers() {
    assert_eq!(FluxValue::String(" 41.5 ".to_string()).as_f64(), Some(41.5));
    assert_eq!(FluxValue::String("R0845".to_string()).as_f64(), None);
    assert_eq!(FluxValue::Boolean(true).as_f64(), None);
}

#[test]
fn history_query_uses_window_granularity() {
    let expected = [
        (TimeWindow::OneHour, "-1h", "1m"),
        (TimeWindow::SixHours, "-6h", "5m"),
        (TimeWindow::Day, "-24h", "15m"),
        (TimeWindow::Week, "-7d", "1h"),
    ];
    for (window, start, every) in expected {
        let query = flux::history("floods", "sensor-1", window);
        assert!(query.contains(&format!("range(start: {start})")), "{query}");
        assert!(
            query.contains(&format!("aggregateWindow(every: {every}, fn: mean, createEmpty: false)")),
            "{query}"
        );
        assert!(query.contains(r#"r["_field"] == "dist_cm""#));
    }
}

#[test]
fn latest_query_has_fixed_lookback() {
    let query = flux::latest("floods", "sensor-1");
    assert!(query.contains("range(start: -24h)"));
    assert!(query.contains(r#"r["sensor_id"] == "sensor-1""#));
    assert!(query.trim_end().ends_with("|> last()"));
}

#[test]
fn images_query_filters_view_and_pivots() {
    let query = flux::images("floods", "sensor-1", "side", TimeWindow::SixHours);
    assert!(query.contains(r#"r["_measurement"] == "sensor_image""#));
    assert!(query.contains(r#"r["view"] == "side""#));
    assert!(query.contains("pivot(rowKey: [\"_time\"]"));
    assert!(query.contains("range(start: -6h)"));
}

#[test]
fn interpolated_values_are_escaped() {
    assert_eq!(flux::escape(r#"a"b\c${x}"#), r#"a\"b\\c\${x}"#);

    let query = flux::latest("floods", r#"x") |> drop(columns: ["_value"]"#);
    assert!(query.contains(r#"r["sensor_id"] == "x\") |> drop(columns: [\"_value\"]""#));
}
