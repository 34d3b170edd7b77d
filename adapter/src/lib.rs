// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

pub mod backend;
pub mod metadata;
pub mod model;
pub mod query;
pub mod utils;
pub mod write;

use std::collections::HashMap;

use log::{debug, info, warn};

use crate::backend::kairosdb::KairosDBClient;
use crate::backend::Backend;
use crate::metadata::cache::MetadataCache;
use crate::model::request::{QueryResult, ReadRequest, ReadResponse};
use crate::model::sample::Sample;
use crate::query::merger::merge_results;
use crate::query::planner::QueryPlanner;
use crate::utils::config::{AdapterSettings, Settings};
use crate::utils::error::AdapterError;
use crate::utils::sync::Arc;
use crate::write::pool::WritePool;

/// Translates remote read and write requests into calls to a time series backend.
pub struct Adapter {
  backend: Arc<dyn Backend>,
  planner: QueryPlanner,
  write_pool: WritePool,
}

impl Adapter {
  /// Create an adapter talking to the KairosDB instance specified in the settings.
  /// Must be called from within a tokio runtime, as it starts the write workers.
  pub fn new(settings: &Settings) -> Result<Self, AdapterError> {
    let kairosdb_settings = settings.get_kairosdb_settings();
    let client = KairosDBClient::new(kairosdb_settings).map_err(|e| {
      AdapterError::InvalidConfiguration(format!(
        "Could not create KairosDB client for {}: {}",
        kairosdb_settings.get_url(),
        e
      ))
    })?;

    info!("Using KairosDB at {}", kairosdb_settings.get_url());
    Ok(Self::with_backend(
      Arc::new(client),
      settings.get_adapter_settings(),
    ))
  }

  /// Create an adapter over an arbitrary backend.
  pub fn with_backend(backend: Arc<dyn Backend>, settings: &AdapterSettings) -> Self {
    let metadata_cache = MetadataCache::new(
      backend.clone(),
      settings.get_metadata_cache_ttl(),
      settings.get_regex_anchor(),
    );
    let planner = QueryPlanner::new(Arc::new(metadata_cache));
    let write_pool = WritePool::new(
      backend.clone(),
      settings.get_workers(),
      settings.get_queue_size(),
    );

    Adapter {
      backend,
      planner,
      write_pool,
    }
  }

  /// Answer a read request with one result per query, in request order.
  ///
  /// Sub-queries run one at a time. The first planning or backend failure fails the whole
  /// request.
  pub async fn read(&self, request: &ReadRequest) -> Result<ReadResponse, AdapterError> {
    let mut results = Vec::with_capacity(request.queries.len());

    for query in &request.queries {
      let sub_queries = self
        .planner
        .plan(query.start_ms, query.end_ms, &query.matchers)
        .await
        .map_err(|e| {
          warn!("Could not plan query {:?}: {}", query, e);
          e
        })?;

      let mut series = HashMap::new();
      for sub_query in &sub_queries {
        let backend_series = self.backend.run_query(sub_query).await.map_err(|e| {
          warn!(
            "Query for metric {} failed: {}",
            sub_query.get_metric_name(),
            e
          );
          e
        })?;
        merge_results(&mut series, backend_series);
      }

      debug!(
        "Query over [{}, {}] ran {} sub-queries and matched {} series",
        query.start_ms,
        query.end_ms,
        sub_queries.len(),
        series.len()
      );
      results.push(QueryResult {
        timeseries: series.into_values().collect(),
      });
    }

    Ok(ReadResponse { results })
  }

  /// Push the samples to the backend and wait until every one of them has been attempted.
  /// Samples with a non-finite value are skipped. Push failures are logged, not returned.
  pub async fn write(&self, samples: Vec<Sample>) {
    let total = samples.len();
    let batch: Vec<_> = samples
      .iter()
      .filter_map(|sample| {
        let push = sample.to_metric_push();
        if push.is_none() {
          debug!(
            "Skipping sample with non-finite value {} at {}",
            sample.value, sample.timestamp_ms
          );
        }
        push
      })
      .collect();

    debug!("Writing {} of {} samples", batch.len(), total);
    self.write_pool.submit_batch(batch).await;
  }

  /// Whether the backend reports itself as healthy.
  pub async fn healthy(&self) -> bool {
    self.backend.health_check().await
  }

  /// Name of the backend.
  pub fn name(&self) -> &str {
    self.backend.name()
  }

  /// Stop accepting writes and wait for queued ones to complete.
  pub async fn shutdown(&self) {
    self.write_pool.shutdown().await;
  }
}
