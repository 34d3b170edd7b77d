// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use super::constants::METRIC_NAME_LABEL;
use super::metric_point::MetricPoint;
use super::sample::Label;

/// A series returned by the read path: its labels and its points, strictly increasing by time.
#[derive(Clone, Debug, PartialEq)]
pub struct TimeSeriesResult {
  labels: Vec<Label>,
  metric_points: Vec<MetricPoint>,
}

impl TimeSeriesResult {
  /// Create a time series with the given labels and metric points, sorted by time.
  pub fn new(labels: Vec<Label>, metric_points: Vec<MetricPoint>) -> Self {
    TimeSeriesResult {
      labels,
      metric_points,
    }
  }

  pub fn get_labels(&self) -> &[Label] {
    &self.labels
  }

  pub fn get_metric_points(&self) -> &[MetricPoint] {
    &self.metric_points
  }

  pub(crate) fn set_metric_points(&mut self, metric_points: Vec<MetricPoint>) {
    self.metric_points = metric_points;
  }

  pub(crate) fn take_metric_points(&mut self) -> Vec<MetricPoint> {
    std::mem::take(&mut self.metric_points)
  }

  /// Get the value of the reserved metric name label.
  pub fn get_metric_name(&self) -> Option<&str> {
    self.get_label_value(METRIC_NAME_LABEL)
  }

  pub fn get_label_value(&self, name: &str) -> Option<&str> {
    self
      .labels
      .iter()
      .find(|label| label.name == name)
      .map(|label| label.value.as_str())
  }
}
