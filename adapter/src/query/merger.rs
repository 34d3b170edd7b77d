// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::backend::BackendSeries;
use crate::model::constants::METRIC_NAME_LABEL;
use crate::model::metric_point::MetricPoint;
use crate::model::sample::Label;
use crate::model::series_key::SeriesKey;
use crate::model::time_series::TimeSeriesResult;

/// Merge two sequences of metric points, each sorted by ascending time.
///
/// The output is sorted by strictly ascending time. When both sequences hold a point with the
/// same time, the point from `first` is kept.
pub fn merge_metric_points(first: Vec<MetricPoint>, second: Vec<MetricPoint>) -> Vec<MetricPoint> {
  let mut merged = Vec::with_capacity(first.len() + second.len());
  let mut first = first.into_iter().peekable();
  let mut second = second.into_iter().peekable();

  loop {
    let ordering = match (first.peek(), second.peek()) {
      (Some(a), Some(b)) => a.get_time().cmp(&b.get_time()),
      (Some(_), None) => Ordering::Less,
      (None, Some(_)) => Ordering::Greater,
      (None, None) => break,
    };

    match ordering {
      Ordering::Less => merged.extend(first.next()),
      Ordering::Greater => merged.extend(second.next()),
      Ordering::Equal => {
        merged.extend(first.next());
        second.next();
      }
    }
  }

  merged
}

/// Sort the points by time and collapse duplicate times, keeping the first occurrence.
fn normalize(mut metric_points: Vec<MetricPoint>) -> Vec<MetricPoint> {
  // Stable sort, so the first occurrence of a time stays first.
  metric_points.sort_by_key(|metric_point| metric_point.get_time());
  metric_points.dedup_by_key(|metric_point| metric_point.get_time());
  metric_points
}

/// Build the label set of a backend series. Each non-empty value of a tag becomes one label.
fn labels_for(series: &BackendSeries) -> Vec<Label> {
  let mut labels = vec![Label::new(METRIC_NAME_LABEL, &series.name)];
  for (name, values) in &series.tags {
    for value in values.iter().filter(|value| !value.is_empty()) {
      labels.push(Label::new(name, value));
    }
  }
  labels.sort();
  labels.dedup();
  labels
}

/// Fold the series returned by one sub-query into the accumulated results, grouping them by
/// series key.
pub fn merge_results(
  results: &mut HashMap<SeriesKey, TimeSeriesResult>,
  backend_series: Vec<BackendSeries>,
) {
  for series in backend_series {
    let labels = labels_for(&series);
    let key = SeriesKey::from_labels(&labels);
    let metric_points = normalize(series.metric_points);

    match results.get_mut(&key) {
      Some(existing) => {
        let current = existing.take_metric_points();
        existing.set_metric_points(merge_metric_points(current, metric_points));
      }
      None => {
        results.insert(
          key,
          TimeSeriesResult::new(labels, metric_points),
        );
      }
    }
  }
}
