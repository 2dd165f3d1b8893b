//! Periodic, cancellable polling of one subject.

mod keyed;
mod poller;
pub mod ticker;

pub use keyed::KeyedPoller;
pub use poller::{PollHandle, Poller, PollerState, QueryFn};
pub use ticker::{manual, IntervalTicker, ManualTicker, TickTrigger, Ticker, TickerFactory};
