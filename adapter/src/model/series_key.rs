// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use super::constants::SERIES_KEY_SEPARATOR;
use super::sample::Label;

/// Canonical identity of a series, built from its full label set (metric name included).
///
/// Labels are sorted by name and value before being joined, so the key does not depend on
/// the order in which the backend reported the tags. Names and values are separated by a
/// byte that cannot appear in valid UTF-8, so different name/value splits never collide.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct SeriesKey(Vec<u8>);

impl SeriesKey {
  pub fn from_labels(labels: &[Label]) -> Self {
    let mut sorted: Vec<&Label> = labels.iter().collect();
    sorted.sort();

    let capacity = sorted
      .iter()
      .map(|label| label.name.len() + label.value.len() + 2)
      .sum();
    let mut key = Vec::with_capacity(capacity);
    for (i, label) in sorted.iter().enumerate() {
      if i > 0 {
        key.push(SERIES_KEY_SEPARATOR);
      }
      key.extend_from_slice(label.name.as_bytes());
      key.push(SERIES_KEY_SEPARATOR);
      key.extend_from_slice(label.value.as_bytes());
    }

    SeriesKey(key)
  }

  #[cfg(test)]
  pub(crate) fn as_bytes(&self) -> &[u8] {
    &self.0
  }
}
