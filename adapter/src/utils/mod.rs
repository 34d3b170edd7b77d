// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Utilities shared across the adapter.

pub mod config;
pub mod error;
pub mod io;
pub(crate) mod sync;
