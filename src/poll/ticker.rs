//! Scheduling primitives for pollers.

use futures::future::BoxFuture;
use futures::FutureExt;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Source of poll ticks. The poller queries once on start, then once per
/// completed `tick()`.
pub trait Ticker: Send + 'static {
    fn tick(&mut self) -> BoxFuture<'_, ()>;
}

impl Ticker for Box<dyn Ticker> {
    fn tick(&mut self) -> BoxFuture<'_, ()> {
        (**self).tick()
    }
}

/// Builds a ticker for a given period. Used when a poller is re-keyed.
pub type TickerFactory = Arc<dyn Fn(Duration) -> Box<dyn Ticker> + Send + Sync>;

/// Fixed-rate ticker backed by `tokio::time::Interval`.
///
/// Ticks that fall due while the poller is busy are skipped rather than
/// bunched up, so the schedule stays anchored to the start time.
pub struct IntervalTicker {
    period: Duration,
    interval: Option<Interval>,
}

impl IntervalTicker {
    #[must_use]
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            interval: None,
        }
    }

    #[must_use]
    pub fn factory() -> TickerFactory {
        Arc::new(|period| Box::new(Self::new(period)) as Box<dyn Ticker>)
    }
}

impl Ticker for IntervalTicker {
    fn tick(&mut self) -> BoxFuture<'_, ()> {
        let period = self.period;
        let interval = self.interval.get_or_insert_with(|| {
            // First tick one period out; the poller already ran its initial query.
            let mut interval = interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            interval
        });
        async move {
            interval.tick().await;
        }
        .boxed()
    }
}

/// Ticker driven by hand through a [`TickTrigger`].
///
/// Once every trigger is dropped, `tick()` never completes again.
pub struct ManualTicker {
    rx: mpsc::UnboundedReceiver<()>,
}

/// Fires ticks on the paired [`ManualTicker`].
#[derive(Clone)]
pub struct TickTrigger {
    tx: mpsc::UnboundedSender<()>,
}

impl TickTrigger {
    /// Queue one tick. Returns `false` if the ticker is gone.
    pub fn fire(&self) -> bool {
        self.tx.send(()).is_ok()
    }
}

#[must_use]
pub fn manual() -> (TickTrigger, ManualTicker) {
    let (tx, rx) = mpsc::unbounded_channel();
    (TickTrigger { tx }, ManualTicker { rx })
}

impl Ticker for ManualTicker {
    fn tick(&mut self) -> BoxFuture<'_, ()> {
        async move {
            if self.rx.recv().await.is_none() {
                std::future::pending::<()>().await;
            }
        }
        .boxed()
    }
}
