// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Fan-out of remote-write batches to the backend.

pub mod pool;
