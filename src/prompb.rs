// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! Messages of the Prometheus remote storage protocol, limited to the fields the adapter uses.
//! Unknown fields, such as read hints and metadata, are skipped when decoding.

#[derive(Clone, PartialEq, prost::Message)]
pub struct WriteRequest {
  #[prost(message, repeated, tag = "1")]
  pub timeseries: Vec<TimeSeries>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct TimeSeries {
  #[prost(message, repeated, tag = "1")]
  pub labels: Vec<Label>,
  #[prost(message, repeated, tag = "2")]
  pub samples: Vec<Sample>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Label {
  #[prost(string, tag = "1")]
  pub name: String,
  #[prost(string, tag = "2")]
  pub value: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Sample {
  #[prost(double, tag = "1")]
  pub value: f64,
  #[prost(int64, tag = "2")]
  pub timestamp: i64,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ReadRequest {
  #[prost(message, repeated, tag = "1")]
  pub queries: Vec<Query>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct Query {
  #[prost(int64, tag = "1")]
  pub start_timestamp_ms: i64,
  #[prost(int64, tag = "2")]
  pub end_timestamp_ms: i64,
  #[prost(message, repeated, tag = "3")]
  pub matchers: Vec<LabelMatcher>,
}

/// Kept as a raw number so that an unknown matcher type reaches the read path and fails
/// there, instead of failing the decoding.
#[derive(Clone, PartialEq, prost::Message)]
pub struct LabelMatcher {
  #[prost(int32, tag = "1")]
  pub r#type: i32,
  #[prost(string, tag = "2")]
  pub name: String,
  #[prost(string, tag = "3")]
  pub value: String,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct ReadResponse {
  /// In the same order as the queries of the request.
  #[prost(message, repeated, tag = "1")]
  pub results: Vec<QueryResult>,
}

#[derive(Clone, PartialEq, prost::Message)]
pub struct QueryResult {
  #[prost(message, repeated, tag = "1")]
  pub timeseries: Vec<TimeSeries>,
}
