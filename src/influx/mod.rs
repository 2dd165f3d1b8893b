//! InfluxDB v2 read API.
//!
//! `ReadApi` is the seam between the query adapter and the database. The
//! production implementation is [`InfluxClient`]; tests substitute fakes.

mod client;
mod models;

pub use client::InfluxClient;
pub use models::{parse_annotated_csv, FluxRecord, FluxValue};

use std::future::Future;

use crate::error::AppResult;

/// Executes a Flux query and returns its rows.
pub trait ReadApi: Send + Sync + 'static {
    fn query(&self, flux: &str) -> impl Future<Output = AppResult<Vec<FluxRecord>>> + Send;
}
