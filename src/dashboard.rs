//! Selection state and the three pollers behind the dashboard.
//!
//! Pollers publish subject-tagged [`PollUpdate`]s on a channel. The
//! dashboard owner is the only writer of view-model state: it drains the
//! channel and drops any update whose subject is no longer current.

use chrono::Utc;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::common::{ImageFrame, PollResult, QueryKind, Reading, SensorSubject, SeriesPoint, TimeWindow};
use crate::config::PollIntervals;
use crate::error::AppResult;
use crate::influx::ReadApi;
use crate::poll::{IntervalTicker, KeyedPoller, TickerFactory};
use crate::query::QueryAdapter;
use crate::sensors::{SensorConfig, SensorRegistry};
use crate::view::{GaugeView, HistoryView, ImageTimeline, NavKey, DEFAULT_MAX_LEVEL};

/// One poll outcome, tagged with the subject it was issued for.
#[derive(Debug, Clone)]
pub enum PollUpdate {
    Latest {
        subject: SensorSubject,
        result: PollResult<Reading>,
    },
    History {
        subject: SensorSubject,
        result: PollResult<Vec<SeriesPoint>>,
    },
    Images {
        subject: SensorSubject,
        result: PollResult<Vec<ImageFrame>>,
    },
}

impl PollUpdate {
    #[must_use]
    pub fn kind(&self) -> QueryKind {
        match self {
            Self::Latest { .. } => QueryKind::Latest,
            Self::History { .. } => QueryKind::History,
            Self::Images { .. } => QueryKind::Images,
        }
    }

    #[must_use]
    pub fn subject(&self) -> &SensorSubject {
        match self {
            Self::Latest { subject, .. }
            | Self::History { subject, .. }
            | Self::Images { subject, .. } => subject,
        }
    }
}

/// Builder for configuring a [`Dashboard`].
pub struct DashboardBuilder<R> {
    registry: Arc<SensorRegistry>,
    adapter: QueryAdapter<R>,
    intervals: PollIntervals,
    gauge_max_level: f64,
    tickers: TickerFactory,
    sensor_id: Option<String>,
    rng: fastrand::Rng,
}

impl<R: ReadApi> DashboardBuilder<R> {
    #[must_use]
    pub fn intervals(mut self, intervals: PollIntervals) -> Self {
        self.intervals = intervals;
        self
    }

    #[must_use]
    pub fn gauge_max_level(mut self, max_level: f64) -> Self {
        self.gauge_max_level = max_level;
        self
    }

    #[must_use]
    pub fn ticker_factory(mut self, tickers: TickerFactory) -> Self {
        self.tickers = tickers;
        self
    }

    /// Initially selected sensor. Defaults to the first configured one.
    #[must_use]
    pub fn sensor(mut self, sensor_id: impl Into<String>) -> Self {
        self.sensor_id = Some(sensor_id.into());
        self
    }

    /// Noise source for synthetic history.
    #[must_use]
    pub fn rng(mut self, rng: fastrand::Rng) -> Self {
        self.rng = rng;
        self
    }

    /// Start polling for the selected sensor. Must be called within a tokio
    /// runtime.
    ///
    /// # Errors
    ///
    /// Returns `AppError::UnknownSensor` if the requested sensor is not configured.
    pub fn start(self) -> AppResult<Dashboard> {
        let sensor = match &self.sensor_id {
            Some(id) => self.registry.require(id)?.clone(),
            None => self.registry.first().clone(),
        };

        let (tx, updates) = mpsc::unbounded_channel();

        let latest = {
            let adapter = self.adapter.clone();
            let tx = tx.clone();
            KeyedPoller::new(
                self.intervals.latest,
                move |subject: SensorSubject| {
                    let adapter = adapter.clone();
                    async move { adapter.latest(&subject).await }
                },
                move |subject: &SensorSubject, result| {
                    let _ = tx.send(PollUpdate::Latest {
                        subject: subject.clone(),
                        result,
                    });
                },
            )
            .with_ticker_factory(Arc::clone(&self.tickers))
        };

        let history = {
            let adapter = self.adapter.clone();
            let tx = tx.clone();
            KeyedPoller::new(
                self.intervals.history,
                move |subject: SensorSubject| {
                    let adapter = adapter.clone();
                    async move { adapter.history(&subject).await }
                },
                move |subject: &SensorSubject, result| {
                    let _ = tx.send(PollUpdate::History {
                        subject: subject.clone(),
                        result,
                    });
                },
            )
            .with_ticker_factory(Arc::clone(&self.tickers))
        };

        let images = {
            let adapter = self.adapter.clone();
            KeyedPoller::new(
                self.intervals.images,
                move |subject: SensorSubject| {
                    let adapter = adapter.clone();
                    async move { adapter.images(&subject).await }
                },
                move |subject: &SensorSubject, result| {
                    let _ = tx.send(PollUpdate::Images {
                        subject: subject.clone(),
                        result,
                    });
                },
            )
            .with_ticker_factory(Arc::clone(&self.tickers))
        };

        tracing::info!(
            sensor_id = %sensor.id,
            latest_interval = ?self.intervals.latest,
            history_interval = ?self.intervals.history,
            images_interval = ?self.intervals.images,
            "Starting dashboard pollers"
        );

        let mut dashboard = Dashboard {
            registry: self.registry,
            gauge: gauge_for(&sensor, self.gauge_max_level),
            history: HistoryView::new(TimeWindow::default()),
            timeline: ImageTimeline::new(sensor.camera_views.clone(), TimeWindow::default()),
            sensor,
            gauge_max_level: self.gauge_max_level,
            latest,
            history_poller: history,
            images,
            updates,
            rng: self.rng,
        };
        dashboard.rekey_all();
        Ok(dashboard)
    }
}

fn gauge_for(sensor: &SensorConfig, max_level: f64) -> GaugeView {
    GaugeView::new(sensor.thresholds, max_level).with_fallback(sensor.default_reading)
}

/// Live dashboard state for one selected sensor.
pub struct Dashboard {
    registry: Arc<SensorRegistry>,
    sensor: SensorConfig,
    gauge_max_level: f64,
    gauge: GaugeView,
    history: HistoryView,
    timeline: ImageTimeline,
    latest: KeyedPoller<SensorSubject, Reading>,
    history_poller: KeyedPoller<SensorSubject, Vec<SeriesPoint>>,
    images: KeyedPoller<SensorSubject, Vec<ImageFrame>>,
    updates: mpsc::UnboundedReceiver<PollUpdate>,
    rng: fastrand::Rng,
}

impl Dashboard {
    pub fn builder<R: ReadApi>(
        registry: Arc<SensorRegistry>,
        adapter: QueryAdapter<R>,
    ) -> DashboardBuilder<R> {
        DashboardBuilder {
            registry,
            adapter,
            intervals: PollIntervals::default(),
            gauge_max_level: DEFAULT_MAX_LEVEL,
            tickers: IntervalTicker::factory(),
            sensor_id: None,
            rng: fastrand::Rng::new(),
        }
    }

    /// Select another sensor. All three pollers restart, even when the new
    /// sensor shares a station id with the old one.
    ///
    /// # Errors
    ///
    /// Returns `AppError::UnknownSensor` if the sensor is not configured.
    pub fn select_sensor(&mut self, sensor_id: &str) -> AppResult<()> {
        if self.sensor.id == sensor_id {
            return Ok(());
        }
        let sensor = self.registry.require(sensor_id)?.clone();

        tracing::info!(from = %self.sensor.id, to = %sensor.id, "Sensor selected");

        self.gauge = gauge_for(&sensor, self.gauge_max_level);
        self.history = HistoryView::new(self.history.window());
        self.timeline = ImageTimeline::new(sensor.camera_views.clone(), self.timeline.window());
        self.sensor = sensor;
        self.stop_pollers();
        self.rekey_all();
        Ok(())
    }

    pub fn set_history_window(&mut self, window: TimeWindow) {
        if self.history.set_window(window) {
            self.history_poller.set_subject(self.history_subject());
        }
    }

    /// Switch the camera view of the image timeline.
    ///
    /// # Errors
    ///
    /// Returns `AppError::InvalidSelection` if the sensor has no such view.
    pub fn set_image_view(&mut self, view: &str) -> AppResult<()> {
        if self.timeline.set_view(view)? {
            self.rekey_images();
        }
        Ok(())
    }

    pub fn set_image_window(&mut self, window: TimeWindow) {
        if self.timeline.set_window(window) {
            self.rekey_images();
        }
    }

    /// Wait for the next current update and apply it. Stale updates are
    /// skipped. Returns `None` once every poller is gone.
    pub async fn next_update(&mut self) -> Option<QueryKind> {
        loop {
            let update = self.updates.recv().await?;
            let kind = update.kind();
            if self.apply(update) {
                return Some(kind);
            }
        }
    }

    /// Apply every update already queued. Returns how many were applied.
    pub fn drain_pending(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(update) = self.updates.try_recv() {
            if self.apply(update) {
                applied += 1;
            }
        }
        applied
    }

    /// Apply one update if its subject is still current for its poller.
    pub fn apply(&mut self, update: PollUpdate) -> bool {
        let current = match &update {
            PollUpdate::Latest { .. } => self.latest.subject(),
            PollUpdate::History { .. } => self.history_poller.subject(),
            PollUpdate::Images { .. } => self.images.subject(),
        };
        if current != Some(update.subject()) {
            tracing::debug!(
                kind = update.kind().as_str(),
                subject = ?update.subject(),
                "Discarding update for superseded subject"
            );
            return false;
        }

        match update {
            PollUpdate::Latest { result, .. } => self.gauge.apply(result),
            PollUpdate::History { result, .. } => {
                self.history.apply(result, Utc::now(), &mut self.rng);
            }
            PollUpdate::Images { result, .. } => self.timeline.apply(result),
        }
        true
    }

    /// Stop all pollers.
    pub fn shutdown(&mut self) {
        self.stop_pollers();
        tracing::info!("Dashboard pollers stopped");
    }

    #[must_use]
    pub fn sensor(&self) -> &SensorConfig {
        &self.sensor
    }

    #[must_use]
    pub fn registry(&self) -> &SensorRegistry {
        &self.registry
    }

    #[must_use]
    pub fn gauge(&self) -> &GaugeView {
        &self.gauge
    }

    #[must_use]
    pub fn history(&self) -> &HistoryView {
        &self.history
    }

    #[must_use]
    pub fn timeline(&self) -> &ImageTimeline {
        &self.timeline
    }

    /// Move the active image by `delta` frames.
    pub fn step_image(&mut self, delta: isize) {
        self.timeline.step(delta);
    }

    /// Jump to a scrubber position in `[0, 1]`.
    pub fn scrub_images(&mut self, ratio: f64) {
        self.timeline.scrub(ratio);
    }

    /// Select a thumbnail.
    pub fn select_image(&mut self, index: usize) {
        self.timeline.select(index);
    }

    pub fn handle_image_key(&mut self, key: NavKey) {
        self.timeline.handle_key(key);
    }

    pub fn open_lightbox(&mut self) {
        self.timeline.open_lightbox();
    }

    pub fn close_lightbox(&mut self) {
        self.timeline.close_lightbox();
    }

    pub fn dismiss_lightbox_backdrop(&mut self) {
        self.timeline.dismiss_backdrop();
    }

    /// Current subject of the given poller, `None` if it is not running.
    pub fn subject(&self, kind: QueryKind) -> Option<&SensorSubject> {
        match kind {
            QueryKind::Latest => self.latest.subject(),
            QueryKind::History => self.history_poller.subject(),
            QueryKind::Images => self.images.subject(),
        }
    }

    fn stop_pollers(&mut self) {
        self.latest.stop();
        self.history_poller.stop();
        self.images.stop();
    }

    fn history_subject(&self) -> SensorSubject {
        SensorSubject::history(self.sensor.query_id(), self.history.window())
    }

    fn rekey_images(&mut self) {
        if self.sensor.has_camera() {
            let subject = SensorSubject::images(
                self.sensor.query_id(),
                self.timeline.active_view(),
                self.timeline.window(),
            );
            self.images.set_subject(subject);
        } else {
            self.images.stop();
        }
    }

    fn rekey_all(&mut self) {
        self.latest
            .set_subject(SensorSubject::latest(self.sensor.query_id()));
        self.history_poller.set_subject(self.history_subject());
        self.rekey_images();
    }
}
