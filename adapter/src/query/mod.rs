// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Translation of remote-read queries into backend sub-queries, and of their results back
//! into time series.

pub mod merger;
pub mod planner;
pub mod sub_query;
