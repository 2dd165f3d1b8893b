use futures::future::BoxFuture;
use std::fmt::Debug;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use crate::common::PollResult;
use crate::poll::poller::{PollHandle, Poller, PollerState, QueryFn};
use crate::poll::ticker::{IntervalTicker, TickerFactory};

type SharedCallback<S, T> = Arc<dyn Fn(&S, PollResult<T>) + Send + Sync>;

/// Keeps exactly one poller running for the current subject.
///
/// Setting a different subject cancels the running poller before the new one
/// starts, so a late result for the old subject is never delivered.
pub struct KeyedPoller<S, T> {
    period: Duration,
    query: QueryFn<S, T>,
    on_result: SharedCallback<S, T>,
    tickers: TickerFactory,
    active: Option<PollHandle<S>>,
}

impl<S, T> KeyedPoller<S, T>
where
    S: Clone + Debug + PartialEq + Send + Sync + 'static,
    T: Send + 'static,
{
    pub fn new<Q, Fut, C>(period: Duration, query: Q, on_result: C) -> Self
    where
        Q: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PollResult<T>> + Send + 'static,
        C: Fn(&S, PollResult<T>) + Send + Sync + 'static,
    {
        Self {
            period,
            query: Arc::new(move |subject| -> BoxFuture<'static, PollResult<T>> {
                Box::pin(query(subject))
            }),
            on_result: Arc::new(on_result),
            tickers: IntervalTicker::factory(),
            active: None,
        }
    }

    /// Replace the interval ticker, e.g. with manual tickers in tests.
    #[must_use]
    pub fn with_ticker_factory(mut self, tickers: TickerFactory) -> Self {
        self.tickers = tickers;
        self
    }

    #[must_use]
    pub fn period(&self) -> Duration {
        self.period
    }

    pub fn subject(&self) -> Option<&S> {
        self.active.as_ref().map(PollHandle::subject)
    }

    #[must_use]
    pub fn state(&self) -> PollerState {
        self.active.as_ref().map_or(PollerState::Idle, PollHandle::state)
    }

    /// Track `subject`. Returns `false` (and keeps the running poller) if it
    /// is already the current subject.
    pub fn set_subject(&mut self, subject: S) -> bool {
        if self.subject() == Some(&subject) {
            return false;
        }

        if let Some(previous) = self.active.take() {
            tracing::debug!(from = ?previous.subject(), to = ?subject, "Re-keying poller");
            previous.cancel();
        }

        let callback = Arc::clone(&self.on_result);
        let poller = Poller::from_parts(
            subject,
            Arc::clone(&self.query),
            Box::new(move |s: &S, result| callback(s, result)),
        );
        self.active = Some(poller.start((self.tickers)(self.period)));
        true
    }

    /// Cancel the running poller, if any.
    pub fn stop(&mut self) {
        if let Some(previous) = self.active.take() {
            previous.cancel();
        }
    }
}
