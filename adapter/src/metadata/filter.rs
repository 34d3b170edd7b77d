// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use regex::Regex;
use serde::Deserialize;

use crate::utils::error::PlanningError;

/// How a regex matcher is anchored against metadata values.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum RegexAnchor {
  /// The pattern must match at the start of the value: `^(?:pattern)`.
  #[default]
  Prefix,

  /// The pattern must match the whole value: `^(?:pattern)$`.
  Full,
}

/// Compile a matcher pattern with the given anchoring.
pub(crate) fn compile_anchored(pattern: &str, anchor: RegexAnchor) -> Result<Regex, PlanningError> {
  let invalid = |err: regex::Error| PlanningError::InvalidRegex(pattern.to_owned(), err.to_string());

  // The bare pattern must be valid on its own, or it could close the anchoring group.
  Regex::new(pattern).map_err(invalid)?;

  let anchored = match anchor {
    RegexAnchor::Prefix => format!("^(?:{})", pattern),
    RegexAnchor::Full => format!("^(?:{})$", pattern),
  };

  Regex::new(&anchored).map_err(invalid)
}

/// All values except the excluded one, preserving order.
pub(crate) fn filter_not_equal(values: &[String], excluded: &str) -> Vec<String> {
  values
    .iter()
    .filter(|value| value.as_str() != excluded)
    .cloned()
    .collect()
}

/// Values matching the regex, or not matching it when `negate` is set, preserving order.
pub(crate) fn filter_matching(values: &[String], regex: &Regex, negate: bool) -> Vec<String> {
  values
    .iter()
    .filter(|value| regex.is_match(value) != negate)
    .cloned()
    .collect()
}
