//! Live aggregation of one gas-injection device's telemetry into chartable time series.

extern crate async_trait;
extern crate chrono;
extern crate config as config_rs;
extern crate failure;
extern crate futures;
extern crate itertools;
extern crate reqwest;
extern crate serde;
#[macro_use]
extern crate serde_derive;
extern crate serde_json;
#[macro_use]
extern crate slog;
extern crate tokio;

pub mod chart;
pub mod config;
pub mod decode;
pub mod feed;
pub mod hydration;
pub mod model;
pub mod poller;
pub mod publish;
pub mod schema;
pub mod series;
pub mod util;
