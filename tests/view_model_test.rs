//! Tests for gauge, history chart and image timeline state.
//!
//! Run with: cargo test --test view_model_test

mod common;

use chrono::TimeDelta;

use flood_monitor::common::{ImageFrame, PollResult, Reading, SeriesPoint, TimeWindow};
use flood_monitor::sensors::{DefaultReading, Thresholds};
use flood_monitor::view::{
    fill_fraction, format, synthetic_series, GaugeDisplay, GaugeView, HistoryView, ImageTimeline,
    LevelBucket, NavKey, SYNTHETIC_POINTS,
};

use common::at;

const THRESHOLDS: Thresholds = Thresholds {
    low: 150.0,
    medium: 300.0,
    high: 500.0,
};

fn reading(level: f64, observed: bool) -> Reading {
    Reading {
        level,
        battery: 12.0,
        solar: 13.0,
        observed_at: observed.then(|| at(11, 58, 0)),
    }
}

fn frames(count: usize) -> Vec<ImageFrame> {
    (0..count)
        .map(|i| ImageFrame {
            time: at(12, 0, 0) + TimeDelta::minutes(10 * i as i64),
            image_url: format!("https://img.example/s1/{i}.jpg"),
            filename: Some(format!("{i}.jpg")),
            view: "front".to_string(),
        })
        .collect()
}

// Gauge

#[test]
fn thresholds_belong_to_the_higher_bucket() {
    let cases = [
        (0.0, LevelBucket::Normal),
        (299.9, LevelBucket::Normal),
        (300.0, LevelBucket::Elevated),
        (499.9, LevelBucket::Elevated),
        (500.0, LevelBucket::Critical),
        (900.0, LevelBucket::Critical),
    ];
    for (level, bucket) in cases {
        assert_eq!(LevelBucket::classify(level, &THRESHOLDS), bucket, "level {level}");
    }
    assert_eq!(LevelBucket::Critical.label(), "High Alert");
}

#[test]
fn fill_is_clamped_to_the_gauge() {
    assert_eq!(fill_fraction(520.0, 1000.0), 0.52);
    assert_eq!(fill_fraction(1500.0, 1000.0), 1.0);
    assert_eq!(fill_fraction(-20.0, 1000.0), 0.0);
    assert_eq!(fill_fraction(f64::NAN, 1000.0), 0.0);
}

#[test]
fn gauge_starts_loading_then_goes_live() {
    let mut gauge = GaugeView::new(THRESHOLDS, 1000.0);
    assert_eq!(gauge.display(), GaugeDisplay::Loading);
    assert_eq!(gauge.last_updated(at(12, 0, 0)), "Loading...");

    gauge.apply(PollResult::Fresh(reading(520.0, true)));
    assert_eq!(gauge.display(), GaugeDisplay::Live(LevelBucket::Critical));
    assert!((gauge.fill_percent() - 52.0).abs() < 1e-9);

    assert_eq!(gauge.last_updated(at(11, 58, 30)), "Just now");
    assert_eq!(gauge.last_updated(at(12, 0, 0)), "2 mins ago");
    assert_eq!(gauge.last_updated(at(14, 30, 0)), "2 hours ago");

    let snapshot = gauge.snapshot(at(12, 0, 0));
    assert_eq!(snapshot.status, "High Alert");
    assert_eq!(snapshot.level, 520.0);
}

#[test]
fn lost_sensor_keeps_last_level_and_goes_offline() {
    let mut gauge = GaugeView::new(THRESHOLDS, 1000.0);
    gauge.apply(PollResult::Fresh(reading(320.0, true)));
    gauge.apply(PollResult::Failed);

    assert_eq!(gauge.display(), GaugeDisplay::Offline);
    assert!(gauge.is_offline());
    assert_eq!(gauge.level(), 320.0);
    assert_eq!(gauge.last_updated(at(12, 0, 0)), format::OFFLINE_LABEL);

    gauge.apply(PollResult::Fresh(reading(320.0, true)));
    assert_eq!(gauge.display(), GaugeDisplay::Live(LevelBucket::Elevated));
}

#[test]
fn fallback_reading_is_shown_when_empty() {
    let fallback = DefaultReading {
        level: 245.0,
        battery: 12.6,
        solar: 14.2,
    };
    let mut gauge = GaugeView::new(THRESHOLDS, 1000.0).with_fallback(Some(fallback));
    gauge.apply(PollResult::Empty);

    assert_eq!(gauge.display(), GaugeDisplay::Offline);
    assert_eq!(gauge.reading(), Some(&fallback.to_reading()));
}

#[test]
fn reading_without_timestamp_is_offline() {
    let mut gauge = GaugeView::new(THRESHOLDS, 1000.0);
    gauge.apply(PollResult::Fresh(reading(100.0, false)));
    assert_eq!(gauge.display(), GaugeDisplay::Offline);
}

// History

#[test]
fn synthetic_series_spans_the_window_and_ends_now() {
    let now = at(12, 0, 0);
    let mut rng = fastrand::Rng::with_seed(42);
    let points = synthetic_series(TimeWindow::Day, now, &mut rng);

    assert_eq!(points.len(), SYNTHETIC_POINTS);
    assert_eq!(points[0].time, now - TimeDelta::hours(24));
    assert_eq!(points[SYNTHETIC_POINTS - 1].time, now);
    assert!(points.windows(2).all(|w| w[0].time < w[1].time));
    assert!(points.iter().all(|p| (300.0..=385.0).contains(&p.level)));

    let again = synthetic_series(TimeWindow::Day, now, &mut fastrand::Rng::with_seed(42));
    assert_eq!(points, again);
}

#[test]
fn history_switches_between_live_and_synthetic() {
    let mut rng = fastrand::Rng::with_seed(1);
    let mut history = HistoryView::new(TimeWindow::SixHours);
    assert!(history.is_loading());

    history.apply(PollResult::Failed, at(12, 0, 0), &mut rng);
    assert!(history.is_synthetic());
    assert_eq!(history.status_label(), "OFFLINE SIMULATION");
    assert_eq!(history.points().last().unwrap().time, at(12, 0, 0));

    let live = vec![SeriesPoint {
        time: at(11, 0, 0),
        level: 210.5,
    }];
    history.apply(PollResult::Fresh(live.clone()), at(12, 0, 0), &mut rng);
    assert!(!history.is_synthetic());
    assert!(!history.is_loading());
    assert_eq!(history.status_label(), "Live Sensor Data");
    assert_eq!(history.points(), live.as_slice());

    assert!(history.set_window(TimeWindow::Week));
    assert!(!history.set_window(TimeWindow::Week));
    assert!(history.is_loading());
    assert_eq!(history.points(), live.as_slice());
}

#[test]
fn axis_ticks_depend_on_window_length() {
    let history = HistoryView::new(TimeWindow::OneHour);
    assert_eq!(history.axis_tick(at(11, 58, 0)), "11:58");

    let history = HistoryView::new(TimeWindow::Week);
    assert_eq!(history.axis_tick(at(11, 58, 0)), "Mar 14");
}

// Timeline

#[test]
fn fresh_frames_select_the_most_recent() {
    let mut timeline = ImageTimeline::new(vec!["front".into(), "side".into()], TimeWindow::Day);
    assert_eq!(timeline.active_view(), "front");
    assert!(timeline.is_loading());

    timeline.apply(PollResult::Fresh(frames(5)));
    assert_eq!(timeline.active_index(), 4);
    assert_eq!(timeline.subtitle(), "front view · 5 images");
    assert_eq!(
        timeline.active_timestamp().as_deref(),
        Some("Mar 14, 2026 · 12:40:00")
    );
}

#[test]
fn navigation_is_clamped_to_the_ends() {
    let mut timeline = ImageTimeline::new(vec!["front".into()], TimeWindow::Day);
    timeline.apply(PollResult::Fresh(frames(5)));

    timeline.next();
    assert_eq!(timeline.active_index(), 4);

    for _ in 0..7 {
        timeline.handle_key(NavKey::Left);
    }
    assert_eq!(timeline.active_index(), 0);

    timeline.handle_key(NavKey::Right);
    assert_eq!(timeline.active_index(), 1);

    timeline.select(99);
    assert_eq!(timeline.active_index(), 4);
    timeline.select(2);
    assert_eq!(timeline.active_index(), 2);
}

#[test]
fn scrubber_maps_ratio_to_nearest_frame() {
    let mut timeline = ImageTimeline::new(vec!["front".into()], TimeWindow::Day);
    timeline.apply(PollResult::Fresh(frames(5)));

    let cases = [(0.0, 0), (0.5, 2), (0.6, 2), (0.9, 4), (1.0, 4), (7.0, 4), (-1.0, 0), (f64::NAN, 0)];
    for (ratio, index) in cases {
        timeline.scrub(ratio);
        assert_eq!(timeline.active_index(), index, "ratio {ratio}");
    }
}

#[test]
fn lightbox_opens_on_a_frame_and_closes_on_escape_or_backdrop() {
    let mut timeline = ImageTimeline::new(vec!["front".into()], TimeWindow::Day);
    timeline.open_lightbox();
    assert!(!timeline.is_lightbox_open(), "nothing to show yet");

    timeline.apply(PollResult::Fresh(frames(3)));
    timeline.open_lightbox();
    assert!(timeline.is_lightbox_open());
    timeline.handle_key(NavKey::Escape);
    assert!(!timeline.is_lightbox_open());

    timeline.open_lightbox();
    timeline.dismiss_backdrop();
    assert!(!timeline.is_lightbox_open());

    timeline.open_lightbox();
    timeline.apply(PollResult::Empty);
    assert!(!timeline.is_lightbox_open());
    assert!(timeline.is_empty());
    assert_eq!(timeline.active_index(), 0);
    assert_eq!(timeline.active_frame(), None);
}

#[test]
fn axis_labels_are_evenly_spaced_and_capped() {
    let mut timeline = ImageTimeline::new(vec!["front".into()], TimeWindow::Day);
    timeline.apply(PollResult::Fresh(frames(12)));

    let labels = timeline.axis_labels();
    assert_eq!(labels.len(), 6);
    assert_eq!(labels[0], at(12, 0, 0));
    assert_eq!(labels[1], at(12, 22, 0));
    assert_eq!(labels[5], at(13, 50, 0));
    assert_eq!(timeline.snapshot().axis_labels[0], "12:00");

    timeline.apply(PollResult::Fresh(frames(3)));
    assert_eq!(timeline.axis_labels().len(), 3);

    timeline.apply(PollResult::Fresh(frames(1)));
    assert!(timeline.axis_labels().is_empty());
}

#[test]
fn camera_view_must_exist_on_the_sensor() {
    let mut timeline = ImageTimeline::new(vec!["front".into(), "side".into()], TimeWindow::Day);

    assert!(timeline.set_view("side").unwrap());
    assert!(!timeline.set_view("side").unwrap());
    assert_eq!(timeline.active_view(), "side");
    assert!(timeline.set_view("top").is_err());

    assert!(timeline.set_window(TimeWindow::OneHour));
    assert!(!timeline.set_window(TimeWindow::OneHour));

    let no_camera = ImageTimeline::new(Vec::new(), TimeWindow::Day);
    assert_eq!(no_camera.active_view(), "front");
}
