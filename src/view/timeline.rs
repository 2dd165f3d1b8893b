use chrono::{DateTime, TimeDelta, Utc};
use serde::Serialize;

use crate::common::{ImageFrame, PollResult, TimeWindow};
use crate::error::{AppError, AppResult};
use crate::query::DEFAULT_VIEW;
use crate::view::format;

pub const MAX_AXIS_LABELS: usize = 6;

/// Keyboard input understood by the timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavKey {
    Left,
    Right,
    Escape,
}

/// Camera image carousel with scrubber and lightbox.
#[derive(Debug, Clone)]
pub struct ImageTimeline {
    views: Vec<String>,
    active_view: String,
    window: TimeWindow,
    frames: Vec<ImageFrame>,
    active_index: usize,
    lightbox_open: bool,
    loading: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct TimelineSnapshot {
    pub view: String,
    pub window: TimeWindow,
    pub frame_count: usize,
    pub active_index: usize,
    pub active_frame: Option<ImageFrame>,
    pub axis_labels: Vec<String>,
    pub lightbox_open: bool,
}

impl ImageTimeline {
    /// `views` are the sensor's camera views; the first one starts active.
    #[must_use]
    pub fn new(views: Vec<String>, window: TimeWindow) -> Self {
        let active_view = views
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_VIEW.to_string());
        Self {
            views,
            active_view,
            window,
            frames: Vec::new(),
            active_index: 0,
            lightbox_open: false,
            loading: true,
        }
    }

    /// Apply a poll outcome. Fresh frames jump to the most recent one;
    /// anything else clears the timeline.
    pub fn apply(&mut self, result: PollResult<Vec<ImageFrame>>) {
        match result {
            PollResult::Fresh(frames) if !frames.is_empty() => {
                self.active_index = frames.len() - 1;
                self.frames = frames;
            }
            _ => {
                self.frames.clear();
                self.active_index = 0;
                self.lightbox_open = false;
            }
        }
        self.loading = false;
    }

    /// Switch camera view.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidSelection` if the sensor has no such view.
    pub fn set_view(&mut self, view: &str) -> AppResult<bool> {
        if !self.views.iter().any(|v| v == view) {
            return Err(AppError::InvalidSelection(format!("Unknown camera view: {view}")));
        }
        if self.active_view == view {
            return Ok(false);
        }
        self.active_view = view.to_string();
        self.loading = true;
        Ok(true)
    }

    pub fn set_window(&mut self, window: TimeWindow) -> bool {
        if self.window == window {
            return false;
        }
        self.window = window;
        self.loading = true;
        true
    }

    /// Move by `delta` frames, clamped to the ends.
    pub fn step(&mut self, delta: isize) {
        let Some(last) = self.frames.len().checked_sub(1) else {
            return;
        };
        self.active_index = self.active_index.saturating_add_signed(delta).min(last);
    }

    pub fn previous(&mut self) {
        self.step(-1);
    }

    pub fn next(&mut self) {
        self.step(1);
    }

    /// Jump to a scrubber position in `[0, 1]`.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn scrub(&mut self, ratio: f64) {
        let Some(last) = self.frames.len().checked_sub(1) else {
            return;
        };
        let ratio = if ratio.is_nan() { 0.0 } else { ratio.clamp(0.0, 1.0) };
        self.active_index = ((ratio * last as f64).round() as usize).min(last);
    }

    /// Select a thumbnail.
    pub fn select(&mut self, index: usize) {
        if let Some(last) = self.frames.len().checked_sub(1) {
            self.active_index = index.min(last);
        }
    }

    pub fn handle_key(&mut self, key: NavKey) {
        match key {
            NavKey::Escape => self.close_lightbox(),
            NavKey::Left => self.previous(),
            NavKey::Right => self.next(),
        }
    }

    pub fn open_lightbox(&mut self) {
        if self.active_frame().is_some() {
            self.lightbox_open = true;
        }
    }

    pub fn close_lightbox(&mut self) {
        self.lightbox_open = false;
    }

    /// Click on the lightbox backdrop.
    pub fn dismiss_backdrop(&mut self) {
        self.close_lightbox();
    }

    #[must_use]
    pub fn is_lightbox_open(&self) -> bool {
        self.lightbox_open
    }

    #[must_use]
    pub fn frames(&self) -> &[ImageFrame] {
        &self.frames
    }

    #[must_use]
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_frame(&self) -> Option<&ImageFrame> {
        self.frames.get(self.active_index)
    }

    #[must_use]
    pub fn active_view(&self) -> &str {
        &self.active_view
    }

    #[must_use]
    pub fn views(&self) -> &[String] {
        &self.views
    }

    #[must_use]
    pub fn window(&self) -> TimeWindow {
        self.window
    }

    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.loading
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Up to six evenly spaced timestamps across the frame span. Empty with
    /// fewer than two frames.
    #[must_use]
    pub fn axis_labels(&self) -> Vec<DateTime<Utc>> {
        let (Some(first), Some(last)) = (self.frames.first(), self.frames.last()) else {
            return Vec::new();
        };
        if self.frames.len() < 2 {
            return Vec::new();
        }

        let count = MAX_AXIS_LABELS.min(self.frames.len());
        let span = (last.time - first.time).num_milliseconds();
        let gaps = (count - 1) as i64;

        (0..count as i64)
            .map(|i| first.time + TimeDelta::milliseconds(span * i / gaps))
            .collect()
    }

    /// "front view · 12 images"
    #[must_use]
    pub fn subtitle(&self) -> String {
        format!("{} view · {} images", self.active_view, self.frames.len())
    }

    /// Full timestamp of the active frame.
    pub fn active_timestamp(&self) -> Option<String> {
        self.active_frame().map(|f| format::full_timestamp(f.time))
    }

    #[must_use]
    pub fn snapshot(&self) -> TimelineSnapshot {
        TimelineSnapshot {
            view: self.active_view.clone(),
            window: self.window,
            frame_count: self.frames.len(),
            active_index: self.active_index,
            active_frame: self.active_frame().cloned(),
            axis_labels: self.axis_labels().into_iter().map(format::clock).collect(),
            lightbox_open: self.lightbox_open,
        }
    }
}
