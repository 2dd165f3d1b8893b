use futures::future::BoxFuture;
use std::fmt::Debug;
use std::future::Future;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::common::PollResult;
use crate::poll::ticker::Ticker;

/// Query run by a poller for its subject.
pub type QueryFn<S, T> = Arc<dyn Fn(S) -> BoxFuture<'static, PollResult<T>> + Send + Sync>;

type ResultCallback<S, T> = Box<dyn FnMut(&S, PollResult<T>) + Send>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollerState {
    Idle,
    Active,
    Cancelled,
}

/// A configured but not yet started poller.
///
/// `start` moves it to `Active` and returns the [`PollHandle`] that controls
/// it. Every outcome, including `Empty` and `Failed`, goes to the callback.
pub struct Poller<S, T> {
    subject: S,
    query: QueryFn<S, T>,
    on_result: ResultCallback<S, T>,
}

impl<S, T> Poller<S, T>
where
    S: Clone + Debug + Send + Sync + 'static,
    T: Send + 'static,
{
    pub fn new<Q, Fut, C>(subject: S, query: Q, on_result: C) -> Self
    where
        Q: Fn(S) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = PollResult<T>> + Send + 'static,
        C: FnMut(&S, PollResult<T>) + Send + 'static,
    {
        let query: QueryFn<S, T> =
            Arc::new(move |subject| -> BoxFuture<'static, PollResult<T>> { Box::pin(query(subject)) });
        Self::from_parts(subject, query, Box::new(on_result))
    }

    pub(crate) fn from_parts(
        subject: S,
        query: QueryFn<S, T>,
        on_result: ResultCallback<S, T>,
    ) -> Self {
        Self {
            subject,
            query,
            on_result,
        }
    }

    #[must_use]
    pub fn subject(&self) -> &S {
        &self.subject
    }

    #[must_use]
    pub fn state(&self) -> PollerState {
        PollerState::Idle
    }

    /// Spawn the poll loop. The first query is issued immediately; later
    /// ones follow `ticker`. Must be called within a tokio runtime.
    pub fn start<K: Ticker>(self, ticker: K) -> PollHandle<S> {
        let (stop_tx, stop_rx) = watch::channel(false);
        let gate = Arc::new(Mutex::new(false));

        tracing::debug!(subject = ?self.subject, "Starting poller");

        let handle = PollHandle {
            subject: self.subject.clone(),
            stop_tx,
            gate: Arc::clone(&gate),
        };

        tokio::spawn(run(
            self.subject,
            self.query,
            self.on_result,
            ticker,
            stop_rx,
            gate,
        ));

        handle
    }
}

/// Controls a running poller. Dropping the handle cancels the poller.
pub struct PollHandle<S> {
    subject: S,
    stop_tx: watch::Sender<bool>,
    /// `true` once cancelled. Held while the callback runs.
    gate: Arc<Mutex<bool>>,
}

impl<S> PollHandle<S> {
    #[must_use]
    pub fn subject(&self) -> &S {
        &self.subject
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner)
    }

    #[must_use]
    pub fn state(&self) -> PollerState {
        if self.is_cancelled() {
            PollerState::Cancelled
        } else {
            PollerState::Active
        }
    }

    /// Stop polling. Once this returns the callback will not be invoked
    /// again, even for a query already in flight.
    ///
    /// Must not be called from inside this poller's own callback.
    pub fn cancel(&self) {
        if self.close() {
            tracing::debug!("Poller cancelled");
        }
    }

    fn close(&self) -> bool {
        let mut cancelled = self.gate.lock().unwrap_or_else(PoisonError::into_inner);
        if *cancelled {
            return false;
        }
        *cancelled = true;
        let _ = self.stop_tx.send(true);
        true
    }
}

impl<S> Drop for PollHandle<S> {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run<S, T, K>(
    subject: S,
    query: QueryFn<S, T>,
    mut on_result: ResultCallback<S, T>,
    mut ticker: K,
    mut stop_rx: watch::Receiver<bool>,
    gate: Arc<Mutex<bool>>,
) where
    S: Clone + Debug + Send + Sync + 'static,
    T: Send + 'static,
    K: Ticker,
{
    let (result_tx, mut result_rx) = mpsc::channel::<PollResult<T>>(1);
    let mut in_flight: Option<JoinHandle<()>> = Some(issue(&query, &subject, &result_tx));

    loop {
        tokio::select! {
            biased;

            _ = stop_rx.changed() => break,

            Some(result) = result_rx.recv() => {
                in_flight = None;
                if !deliver(&gate, &subject, result, &mut on_result) {
                    tracing::debug!(subject = ?subject, "Discarding result for cancelled poller");
                    break;
                }
            }

            () = ticker.tick() => {
                if in_flight.as_ref().is_some_and(|h| !h.is_finished()) {
                    tracing::debug!(subject = ?subject, "Previous query still running, skipping tick");
                    continue;
                }
                in_flight = Some(issue(&query, &subject, &result_tx));
            }
        }
    }

    if let Some(task) = in_flight {
        task.abort();
    }
    tracing::debug!(subject = ?subject, "Poller stopped");
}

/// Invoke the callback unless the poller has been cancelled. The gate stays
/// locked for the duration of the callback so `cancel()` cannot interleave.
fn deliver<S, T>(
    gate: &Mutex<bool>,
    subject: &S,
    result: PollResult<T>,
    on_result: &mut ResultCallback<S, T>,
) -> bool {
    let cancelled = gate.lock().unwrap_or_else(PoisonError::into_inner);
    if *cancelled {
        return false;
    }
    on_result(subject, result);
    true
}

fn issue<S, T>(
    query: &QueryFn<S, T>,
    subject: &S,
    result_tx: &mpsc::Sender<PollResult<T>>,
) -> JoinHandle<()>
where
    S: Clone + Send + 'static,
    T: Send + 'static,
{
    let fut = query(subject.clone());
    let tx = result_tx.clone();
    tokio::spawn(async move {
        let result = fut.await;
        let _ = tx.send(result).await;
    })
}
