// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::collections::{BTreeMap, BTreeSet, HashSet};

use log::debug;

use crate::metadata::cache::MetadataCache;
use crate::model::matcher::{MatchType, Matcher};
use crate::utils::error::PlanningError;
use crate::utils::sync::Arc;

use super::sub_query::SubQuery;

/// Expands the matchers of a read query into concrete backend sub-queries.
pub struct QueryPlanner {
  metadata_cache: Arc<MetadataCache>,
}

impl QueryPlanner {
  pub fn new(metadata_cache: Arc<MetadataCache>) -> Self {
    QueryPlanner { metadata_cache }
  }

  /// Plan one sub-query per resolved metric name, each carrying all the tag filters.
  ///
  /// Equality matchers use their literal value. Other matchers are expanded against the
  /// cached backend metadata: metric names for the reserved name label, tag values otherwise.
  /// Any metadata fetch failure aborts planning.
  pub async fn plan(
    &self,
    start_ms: i64,
    end_ms: i64,
    matchers: &[Matcher],
  ) -> Result<Vec<SubQuery>, PlanningError> {
    let mut metric_names: Vec<String> = Vec::new();
    let mut seen_metric_names: HashSet<String> = HashSet::new();
    let mut tags: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();

    for matcher in matchers {
      if matcher.is_metric_name_matcher() {
        for name in self.resolve_metric_names(matcher).await? {
          if seen_metric_names.insert(name.clone()) {
            metric_names.push(name);
          }
        }
        continue;
      }

      let values = self.resolve_tag_values(matcher).await?;
      let accumulated = tags.entry(matcher.name.clone()).or_default();
      accumulated.extend(values.into_iter().filter(|value| !value.is_empty()));
    }

    // A tag name without any concrete value is left unconstrained.
    tags.retain(|_, values| !values.is_empty());

    debug!(
      "Planned metric names {:?} with tag filters {:?} for range [{}, {}]",
      metric_names, tags, start_ms, end_ms
    );

    Ok(
      metric_names
        .iter()
        .map(|name| SubQuery::new(name, tags.clone(), start_ms, end_ms))
        .collect(),
    )
  }

  async fn resolve_metric_names(&self, matcher: &Matcher) -> Result<Vec<String>, PlanningError> {
    match matcher.match_type {
      MatchType::Equal => Ok(vec![matcher.value.clone()]),
      MatchType::NotEqual => {
        self
          .metadata_cache
          .metric_names_not_equal(&matcher.value)
          .await
      }
      MatchType::RegexMatch => {
        self
          .metadata_cache
          .metric_names_matching(&matcher.value, false)
          .await
      }
      MatchType::RegexNoMatch => {
        self
          .metadata_cache
          .metric_names_matching(&matcher.value, true)
          .await
      }
    }
  }

  async fn resolve_tag_values(&self, matcher: &Matcher) -> Result<Vec<String>, PlanningError> {
    match matcher.match_type {
      MatchType::Equal => Ok(vec![matcher.value.clone()]),
      MatchType::NotEqual => {
        self
          .metadata_cache
          .tag_values_not_equal(&matcher.value)
          .await
      }
      MatchType::RegexMatch => {
        self
          .metadata_cache
          .tag_values_matching(&matcher.value, false)
          .await
      }
      MatchType::RegexNoMatch => {
        self
          .metadata_cache
          .tag_values_matching(&matcher.value, true)
          .await
      }
    }
  }
}
