// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::collections::{BTreeMap, BTreeSet};

/// One concrete query sent to the backend: a metric name, the accepted values per tag name
/// (values of the same tag are OR-ed), and an absolute time range in milliseconds.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SubQuery {
  metric_name: String,
  tags: BTreeMap<String, BTreeSet<String>>,
  start_ms: i64,
  end_ms: i64,
}

impl SubQuery {
  pub fn new(
    metric_name: &str,
    tags: BTreeMap<String, BTreeSet<String>>,
    start_ms: i64,
    end_ms: i64,
  ) -> Self {
    SubQuery {
      metric_name: metric_name.to_owned(),
      tags,
      start_ms,
      end_ms,
    }
  }

  pub fn get_metric_name(&self) -> &str {
    &self.metric_name
  }

  pub fn get_tags(&self) -> &BTreeMap<String, BTreeSet<String>> {
    &self.tags
  }

  pub fn get_start_ms(&self) -> i64 {
    self.start_ms
  }

  pub fn get_end_ms(&self) -> i64 {
    self.end_ms
  }
}
