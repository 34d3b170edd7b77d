// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! In-process backend used by unit tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::model::sample::MetricPush;
use crate::query::sub_query::SubQuery;
use crate::utils::error::BackendError;
use crate::utils::sync::Mutex;

use super::{Backend, BackendSeries};

#[derive(Default)]
pub(crate) struct MockBackend {
  metric_names: Vec<String>,
  tag_names: Vec<String>,
  tag_values: Vec<String>,
  series: HashMap<String, Vec<BackendSeries>>,
  fetch_delay: Option<Duration>,
  fail_metadata: AtomicBool,
  fail_push_for: Option<String>,
  healthy: bool,

  metadata_fetches: AtomicUsize,
  pushes: Mutex<Vec<MetricPush>>,
  queries: Mutex<Vec<SubQuery>>,
}

impl MockBackend {
  pub fn new() -> Self {
    MockBackend {
      healthy: true,
      ..Default::default()
    }
  }

  pub fn with_metric_names(mut self, names: &[&str]) -> Self {
    self.metric_names = names.iter().map(|name| name.to_string()).collect();
    self
  }

  pub fn with_tag_names(mut self, names: &[&str]) -> Self {
    self.tag_names = names.iter().map(|name| name.to_string()).collect();
    self
  }

  pub fn with_tag_values(mut self, values: &[&str]) -> Self {
    self.tag_values = values.iter().map(|value| value.to_string()).collect();
    self
  }

  /// Series returned by every sub-query for the given metric name.
  pub fn with_series(mut self, metric_name: &str, series: Vec<BackendSeries>) -> Self {
    self.series.insert(metric_name.to_owned(), series);
    self
  }

  pub fn with_fetch_delay(mut self, delay: Duration) -> Self {
    self.fetch_delay = Some(delay);
    self
  }

  pub fn with_failing_push_for(mut self, metric_name: &str) -> Self {
    self.fail_push_for = Some(metric_name.to_owned());
    self
  }

  pub fn with_healthy(mut self, healthy: bool) -> Self {
    self.healthy = healthy;
    self
  }

  pub fn set_fail_metadata(&self, fail: bool) {
    self.fail_metadata.store(fail, Ordering::SeqCst);
  }

  pub fn get_metadata_fetches(&self) -> usize {
    self.metadata_fetches.load(Ordering::SeqCst)
  }

  pub fn get_pushes(&self) -> Vec<MetricPush> {
    self.pushes.lock().clone()
  }

  pub fn get_queries(&self) -> Vec<SubQuery> {
    self.queries.lock().clone()
  }

  async fn fetch(&self, values: &[String]) -> Result<Vec<String>, BackendError> {
    self.metadata_fetches.fetch_add(1, Ordering::SeqCst);
    if let Some(delay) = self.fetch_delay {
      tokio::time::sleep(delay).await;
    }
    if self.fail_metadata.load(Ordering::SeqCst) {
      return Err(BackendError::RequestError("connection refused".to_owned()));
    }
    Ok(values.to_vec())
  }
}

#[async_trait]
impl Backend for MockBackend {
  fn name(&self) -> &str {
    "mock"
  }

  async fn fetch_metric_names(&self) -> Result<Vec<String>, BackendError> {
    self.fetch(&self.metric_names).await
  }

  async fn fetch_tag_names(&self) -> Result<Vec<String>, BackendError> {
    self.fetch(&self.tag_names).await
  }

  async fn fetch_tag_values(&self) -> Result<Vec<String>, BackendError> {
    self.fetch(&self.tag_values).await
  }

  async fn run_query(&self, sub_query: &SubQuery) -> Result<Vec<BackendSeries>, BackendError> {
    self.queries.lock().push(sub_query.clone());
    match self.series.get(sub_query.get_metric_name()) {
      Some(series) => Ok(series.clone()),
      None => Err(BackendError::QueryErrors(vec![format!(
        "unknown metric {}",
        sub_query.get_metric_name()
      )])),
    }
  }

  async fn push_samples(&self, batch: &[MetricPush]) -> Result<(), BackendError> {
    // Record first, so that failed pushes are still observed.
    self.pushes.lock().extend_from_slice(batch);
    tokio::task::yield_now().await;

    if let Some(failing) = &self.fail_push_for {
      if batch.iter().any(|push| &push.name == failing) {
        return Err(BackendError::UnexpectedStatus(400, "rejected".to_owned()));
      }
    }
    Ok(())
  }

  async fn health_check(&self) -> bool {
    self.healthy
  }
}
