// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! JSON bodies exchanged with the KairosDB REST API.

use std::collections::{BTreeMap, BTreeSet};
use std::convert::TryFrom;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::metric_point::MetricPoint;
use crate::model::sample::MetricPush;
use crate::query::sub_query::SubQuery;
use crate::utils::error::BackendError;

use super::BackendSeries;

/// Data type under which pushed datapoints are stored.
const DOUBLE_TYPE: &str = "double";

/// Body of `POST /api/v1/datapoints`, one entry per write unit.
#[derive(Debug, Serialize)]
pub(super) struct MetricBody<'a> {
  name: &'a str,
  tags: &'a BTreeMap<String, String>,
  #[serde(rename = "type")]
  data_type: &'static str,
  datapoints: [(i64, f64); 1],
}

impl<'a> From<&'a MetricPush> for MetricBody<'a> {
  fn from(push: &'a MetricPush) -> Self {
    MetricBody {
      name: &push.name,
      tags: &push.tags,
      data_type: DOUBLE_TYPE,
      datapoints: [(push.timestamp_ms, push.value)],
    }
  }
}

/// Body of `POST /api/v1/datapoints/query`.
#[derive(Debug, Serialize)]
pub(super) struct QueryBody<'a> {
  start_absolute: i64,
  end_absolute: i64,
  metrics: [QueryMetric<'a>; 1],
}

#[derive(Debug, Serialize)]
struct QueryMetric<'a> {
  name: &'a str,
  #[serde(skip_serializing_if = "is_unconstrained")]
  tags: &'a BTreeMap<String, BTreeSet<String>>,
}

fn is_unconstrained(tags: &&BTreeMap<String, BTreeSet<String>>) -> bool {
  tags.is_empty()
}

impl<'a> From<&'a SubQuery> for QueryBody<'a> {
  fn from(sub_query: &'a SubQuery) -> Self {
    QueryBody {
      start_absolute: sub_query.get_start_ms(),
      end_absolute: sub_query.get_end_ms(),
      metrics: [QueryMetric {
        name: sub_query.get_metric_name(),
        tags: sub_query.get_tags(),
      }],
    }
  }
}

/// Response of the metadata listing endpoints.
#[derive(Debug, Deserialize)]
pub(super) struct ListResponse {
  #[serde(default)]
  pub results: Vec<String>,
}

/// Error body returned by KairosDB on failed requests.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorResponse {
  #[serde(default)]
  pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct QueryResponse {
  #[serde(default)]
  pub queries: Vec<QueryResponseQuery>,

  #[serde(default)]
  pub errors: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct QueryResponseQuery {
  #[serde(default)]
  pub results: Vec<QueryResponseResult>,
}

#[derive(Debug, Deserialize)]
pub(super) struct QueryResponseResult {
  pub name: String,

  #[serde(default)]
  pub tags: BTreeMap<String, Vec<String>>,

  #[serde(default)]
  pub values: Vec<(i64, Value)>,
}

impl TryFrom<QueryResponseResult> for BackendSeries {
  type Error = BackendError;

  fn try_from(result: QueryResponseResult) -> Result<Self, Self::Error> {
    let mut metric_points = Vec::with_capacity(result.values.len());
    for (time, value) in result.values {
      let value = value.as_f64().ok_or_else(|| {
        BackendError::InvalidDataPoint(format!(
          "metric {} has non-numeric value {} at {}",
          result.name, value, time
        ))
      })?;
      metric_points.push(MetricPoint::new(time, value));
    }

    Ok(BackendSeries {
      name: result.name,
      tags: result.tags,
      metric_points,
    })
  }
}
