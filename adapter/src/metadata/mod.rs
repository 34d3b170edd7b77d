// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Backend metadata used to expand non-equality matchers.
//!
//! Metric names, tag names and tag values are listed from the backend and kept for a short
//! time-to-live, so that a read with regex or negative matchers does not need a metadata round
//! trip per request. Concurrent misses on the same category share a single backend fetch.

pub mod cache;
pub mod filter;
