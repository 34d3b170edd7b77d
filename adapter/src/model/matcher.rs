// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::convert::TryFrom;

use crate::utils::error::PlanningError;

use super::constants::METRIC_NAME_LABEL;

/// Operator of a label matcher. The discriminants follow the remote-read protocol numbering.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MatchType {
  Equal = 0,
  NotEqual = 1,
  RegexMatch = 2,
  RegexNoMatch = 3,
}

impl TryFrom<i32> for MatchType {
  type Error = PlanningError;

  fn try_from(value: i32) -> Result<Self, Self::Error> {
    match value {
      0 => Ok(MatchType::Equal),
      1 => Ok(MatchType::NotEqual),
      2 => Ok(MatchType::RegexMatch),
      3 => Ok(MatchType::RegexNoMatch),
      _ => Err(PlanningError::UnknownMatchType(value)),
    }
  }
}

/// A predicate over the value of one label.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Matcher {
  pub name: String,
  pub match_type: MatchType,
  pub value: String,
}

impl Matcher {
  pub fn new(name: &str, match_type: MatchType, value: &str) -> Self {
    Matcher {
      name: name.to_owned(),
      match_type,
      value: value.to_owned(),
    }
  }

  /// Whether this matcher selects metric names rather than tag values.
  pub fn is_metric_name_matcher(&self) -> bool {
    self.name == METRIC_NAME_LABEL
  }
}
