// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::fmt;
use std::time::Duration;

use log::debug;
use tokio::time::Instant;

use crate::backend::Backend;
use crate::utils::error::{BackendError, PlanningError};
use crate::utils::sync::{Arc, TokioMutex};

use super::filter::{compile_anchored, filter_matching, filter_not_equal, RegexAnchor};

/// The closed set of metadata lists fetched from the backend.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MetadataCategory {
  MetricNames,
  TagNames,
  TagValues,
}

impl fmt::Display for MetadataCategory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let name = match self {
      MetadataCategory::MetricNames => "metric_names",
      MetadataCategory::TagNames => "tag_names",
      MetadataCategory::TagValues => "tag_values",
    };
    write!(f, "{}", name)
  }
}

struct CacheEntry {
  values: Arc<Vec<String>>,
  retrieved_at: Instant,
}

/// Cache of backend metadata, one slot per category.
///
/// Each slot sits behind an async mutex that is held for the duration of a backend fetch.
/// A caller that finds the slot locked waits for the in-flight fetch and then reads its
/// result, instead of issuing its own. A failed fetch leaves the previous (stale) entry in
/// place, and the next caller retries.
pub struct MetadataCache {
  backend: Arc<dyn Backend>,
  ttl: Duration,
  regex_anchor: RegexAnchor,
  metric_names: TokioMutex<Option<CacheEntry>>,
  tag_names: TokioMutex<Option<CacheEntry>>,
  tag_values: TokioMutex<Option<CacheEntry>>,
}

impl MetadataCache {
  pub fn new(backend: Arc<dyn Backend>, ttl: Duration, regex_anchor: RegexAnchor) -> Self {
    MetadataCache {
      backend,
      ttl,
      regex_anchor,
      metric_names: TokioMutex::new(None),
      tag_names: TokioMutex::new(None),
      tag_values: TokioMutex::new(None),
    }
  }

  fn slot(&self, category: MetadataCategory) -> &TokioMutex<Option<CacheEntry>> {
    match category {
      MetadataCategory::MetricNames => &self.metric_names,
      MetadataCategory::TagNames => &self.tag_names,
      MetadataCategory::TagValues => &self.tag_values,
    }
  }

  async fn fetch(&self, category: MetadataCategory) -> Result<Vec<String>, BackendError> {
    match category {
      MetadataCategory::MetricNames => self.backend.fetch_metric_names().await,
      MetadataCategory::TagNames => self.backend.fetch_tag_names().await,
      MetadataCategory::TagValues => self.backend.fetch_tag_values().await,
    }
  }

  /// Get the values for the given category, from the cache if the entry is younger than the
  /// time-to-live, from the backend otherwise.
  pub async fn get(&self, category: MetadataCategory) -> Result<Arc<Vec<String>>, BackendError> {
    let mut slot = self.slot(category).lock().await;

    if let Some(entry) = slot.as_ref() {
      if entry.retrieved_at.elapsed() < self.ttl {
        return Ok(entry.values.clone());
      }
    }

    debug!("Metadata {} missing or stale, fetching from backend", category);
    let values = Arc::new(self.fetch(category).await?);
    *slot = Some(CacheEntry {
      values: values.clone(),
      retrieved_at: Instant::now(),
    });

    Ok(values)
  }

  /// All metric names except the given one.
  pub async fn metric_names_not_equal(&self, name: &str) -> Result<Vec<String>, PlanningError> {
    let names = self.get(MetadataCategory::MetricNames).await?;
    Ok(filter_not_equal(&names, name))
  }

  /// Metric names matching the pattern, or not matching it when `negate` is set.
  pub async fn metric_names_matching(
    &self,
    pattern: &str,
    negate: bool,
  ) -> Result<Vec<String>, PlanningError> {
    self
      .matching(MetadataCategory::MetricNames, pattern, negate)
      .await
  }

  /// Tag names matching the pattern, or not matching it when `negate` is set.
  pub async fn tag_names_matching(
    &self,
    pattern: &str,
    negate: bool,
  ) -> Result<Vec<String>, PlanningError> {
    self
      .matching(MetadataCategory::TagNames, pattern, negate)
      .await
  }

  /// All tag values except the given one.
  pub async fn tag_values_not_equal(&self, value: &str) -> Result<Vec<String>, PlanningError> {
    let values = self.get(MetadataCategory::TagValues).await?;
    Ok(filter_not_equal(&values, value))
  }

  /// Tag values matching the pattern, or not matching it when `negate` is set.
  pub async fn tag_values_matching(
    &self,
    pattern: &str,
    negate: bool,
  ) -> Result<Vec<String>, PlanningError> {
    self
      .matching(MetadataCategory::TagValues, pattern, negate)
      .await
  }

  async fn matching(
    &self,
    category: MetadataCategory,
    pattern: &str,
    negate: bool,
  ) -> Result<Vec<String>, PlanningError> {
    // Compile first: an invalid pattern should not cost a backend call.
    let regex = compile_anchored(pattern, self.regex_anchor)?;
    let values = self.get(category).await?;
    Ok(filter_matching(&values, &regex, negate))
  }
}
