// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! The time series backend the adapter translates to.
//!
//! The core only talks to the backend through the [`Backend`] trait: metadata listing for
//! matcher expansion, one query per planned sub-query, ingestion of write units and a health
//! check. [`kairosdb::KairosDBClient`] implements it over the KairosDB HTTP/JSON API.

pub mod kairosdb;
mod kairosdb_json;

#[cfg(test)]
pub(crate) mod mock;

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::model::metric_point::MetricPoint;
use crate::model::sample::MetricPush;
use crate::query::sub_query::SubQuery;
use crate::utils::error::BackendError;

/// A series as reported by the backend for one sub-query. A tag may carry several values
/// (or none) when the backend folds several stored series into one result.
#[derive(Clone, Debug, PartialEq)]
pub struct BackendSeries {
  pub name: String,
  pub tags: BTreeMap<String, Vec<String>>,
  pub metric_points: Vec<MetricPoint>,
}

#[async_trait]
pub trait Backend: Send + Sync + 'static {
  /// Name of the backend, reported by the health endpoint.
  fn name(&self) -> &str;

  /// List all distinct metric names.
  async fn fetch_metric_names(&self) -> Result<Vec<String>, BackendError>;

  /// List all distinct tag names.
  async fn fetch_tag_names(&self) -> Result<Vec<String>, BackendError>;

  /// List all distinct tag values, across all tag names.
  async fn fetch_tag_values(&self) -> Result<Vec<String>, BackendError>;

  /// Run one sub-query and return the series it matched.
  async fn run_query(&self, sub_query: &SubQuery) -> Result<Vec<BackendSeries>, BackendError>;

  /// Ingest the given write units.
  async fn push_samples(&self, batch: &[MetricPush]) -> Result<(), BackendError>;

  /// Whether the backend reports itself as healthy. Transport failures count as unhealthy.
  async fn health_check(&self) -> bool;
}
