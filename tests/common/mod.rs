//! Shared fakes for integration tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use std::sync::{Arc, Mutex};

use flood_monitor::error::{AppError, AppResult};
use flood_monitor::influx::{FluxRecord, FluxValue, ReadApi};
use flood_monitor::poll::{manual, Ticker, TickerFactory};

#[derive(Clone)]
pub enum Reply {
    Rows(Vec<FluxRecord>),
    Fail(&'static str),
}

/// `ReadApi` answering by substring match on the Flux text. Unmatched
/// queries return zero rows.
#[derive(Default)]
pub struct FakeApi {
    routes: Vec<(Vec<String>, Reply)>,
    queries: Mutex<Vec<String>>,
}

impl FakeApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(mut self, needles: &[&str], reply: Reply) -> Self {
        self.routes
            .push((needles.iter().map(|n| (*n).to_string()).collect(), reply));
        self
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

impl ReadApi for FakeApi {
    async fn query(&self, flux: &str) -> AppResult<Vec<FluxRecord>> {
        self.queries.lock().unwrap().push(flux.to_string());

        let reply = self
            .routes
            .iter()
            .find(|(needles, _)| needles.iter().all(|n| flux.contains(n.as_str())))
            .map(|(_, reply)| reply.clone());

        match reply {
            Some(Reply::Rows(rows)) => Ok(rows),
            Some(Reply::Fail(msg)) => Err(AppError::Influx(msg.to_string())),
            None => Ok(Vec::new()),
        }
    }
}

pub fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 14, h, m, s).unwrap()
}

pub fn reading_row(field: &str, value: f64, time: Option<DateTime<Utc>>) -> FluxRecord {
    let row = FluxRecord::default()
        .with("_field", FluxValue::String(field.to_string()))
        .with("_value", FluxValue::Double(value));
    match time {
        Some(t) => row.with("_time", FluxValue::Time(t)),
        None => row,
    }
}

pub fn level_row(time: DateTime<Utc>, value: f64) -> FluxRecord {
    reading_row("dist_cm", value, Some(time))
}

pub fn image_row(time: DateTime<Utc>, url: &str, view: &str) -> FluxRecord {
    FluxRecord::default()
        .with("_time", FluxValue::Time(time))
        .with("image_url", FluxValue::String(url.to_string()))
        .with("filename", FluxValue::String(url.rsplit('/').next().unwrap().to_string()))
        .with("view", FluxValue::String(view.to_string()))
}

/// Tickers that never fire; pollers only run their initial query.
pub fn idle_tickers() -> TickerFactory {
    Arc::new(|_| Box::new(manual().1) as Box<dyn Ticker>)
}

pub async fn settle() {
    for _ in 0..50 {
        tokio::task::yield_now().await;
    }
}
