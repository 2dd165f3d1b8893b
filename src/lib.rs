//! Flood Monitor - polling and data-shaping core for the flood-sensor dashboard
//!
//! This library exposes the core modules for testing and reuse.

pub mod common;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod influx;
pub mod poll;
pub mod query;
pub mod sensors;
pub mod view;
