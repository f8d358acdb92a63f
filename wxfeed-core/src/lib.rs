//! Core library for the `wxfeed` weather station.
//!
//! This crate defines:
//! - Configuration of the location, credentials and unit system
//! - Fetching current conditions and the 3-hourly forecast over HTTP
//! - Best-effort decoding into fixed-size records
//! - Imperial conversion and the pressure trend
//!
//! [`Station::refresh`] drives one refresh cycle; everything else is a step of it.

pub mod config;
pub mod decode;
pub mod error;
pub mod fetch;
pub mod model;
pub mod normalize;
pub mod station;

pub use config::{Config, Units};
pub use error::{Error, Result};
pub use fetch::{Fetcher, HttpResponse, HttpTransport, Transport};
pub use model::{
    CurrentConditions, ForecastPeriod, MAX_READINGS, RequestKind, STEP_HOURS, Trend,
    WeatherRecords,
};
pub use station::{MAX_ATTEMPTS, Station};
