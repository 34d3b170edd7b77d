// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::constants::{METRIC_NAME_LABEL, UNKNOWN_METRIC_NAME};

/// A name/value pair attached to a sample or a series.
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Deserialize, Serialize)]
pub struct Label {
  pub name: String,
  pub value: String,
}

impl Label {
  pub fn new(name: &str, value: &str) -> Self {
    Label {
      name: name.to_owned(),
      value: value.to_owned(),
    }
  }
}

/// A single decoded sample from the write path.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
  pub labels: Vec<Label>,
  pub timestamp_ms: i64,
  pub value: f64,
}

impl Sample {
  pub fn new(labels: Vec<Label>, timestamp_ms: i64, value: f64) -> Self {
    Sample {
      labels,
      timestamp_ms,
      value,
    }
  }

  /// Convert this sample to a backend write unit. Returns None if the value is NaN
  /// or infinite, since the backend cannot store such values.
  pub fn to_metric_push(&self) -> Option<MetricPush> {
    if !self.value.is_finite() {
      return None;
    }

    let mut name = UNKNOWN_METRIC_NAME.to_owned();
    let mut tags = BTreeMap::new();
    for label in &self.labels {
      if label.name == METRIC_NAME_LABEL {
        name = label.value.clone();
      } else {
        tags.insert(label.name.clone(), label.value.clone());
      }
    }

    Some(MetricPush {
      name,
      tags,
      timestamp_ms: self.timestamp_ms,
      value: self.value,
    })
  }
}

/// One unit written to the backend: a metric name, its tags and a single datapoint.
#[derive(Clone, Debug, PartialEq)]
pub struct MetricPush {
  pub name: String,
  pub tags: BTreeMap<String, String>,
  pub timestamp_ms: i64,
  pub value: f64,
}
