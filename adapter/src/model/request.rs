// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use super::matcher::Matcher;
use super::time_series::TimeSeriesResult;

/// A decoded remote read request.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadRequest {
  pub queries: Vec<Query>,
}

/// One query of a read request: an absolute time range and the matchers selecting series.
#[derive(Clone, Debug, PartialEq)]
pub struct Query {
  pub start_ms: i64,
  pub end_ms: i64,
  pub matchers: Vec<Matcher>,
}

/// Response to a read request, with one result per query, in request order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ReadResponse {
  pub results: Vec<QueryResult>,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct QueryResult {
  pub timeseries: Vec<TimeSeriesResult>,
}
