// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Data shapes flowing through the adapter.
//!
//! Samples come in on the write path and are turned into backend write units. Read requests
//! carry matchers, and come back as time series results keyed by their canonical series key.

pub mod constants;
pub mod matcher;
pub mod metric_point;
pub mod request;
pub mod sample;
pub mod series_key;
pub mod time_series;
