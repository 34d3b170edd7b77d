// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

/// The reserved label holding the metric name.
pub const METRIC_NAME_LABEL: &str = "__name__";

/// Metric name used for samples that carry no metric name label.
pub const UNKNOWN_METRIC_NAME: &str = "none";

/// Separator used when building series keys. The byte 0xFF never occurs in valid UTF-8,
/// so it cannot collide with any label name or value.
pub(crate) const SERIES_KEY_SEPARATOR: u8 = 0xFF;
