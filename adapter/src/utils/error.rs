// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use thiserror::Error;

#[derive(Debug, Error)]
/// Enum for errors surfaced by the adapter.
pub enum AdapterError {
  #[error("Invalid configuration. {0}")]
  InvalidConfiguration(String),

  #[error("Planning error: {0}")]
  PlanningError(PlanningError),

  #[error("Backend error: {0}")]
  BackendError(BackendError),
}

#[derive(Debug, Error)]
/// Errors raised while expanding matchers into backend sub-queries.
pub enum PlanningError {
  #[error("Unknown match type {0}.")]
  UnknownMatchType(i32),

  #[error("Invalid regex {0}: {1}")]
  InvalidRegex(String, String),

  #[error("Could not fetch metadata. {0}")]
  MetadataFetchError(BackendError),
}

#[derive(Debug, Error, Clone, Eq, PartialEq)]
/// Errors raised while talking to the time series backend.
pub enum BackendError {
  #[error("Request failed: {0}")]
  RequestError(String),

  #[error("Unexpected status {0}: {1}")]
  UnexpectedStatus(u16, String),

  #[error("{}", .0.join("\n"))]
  QueryErrors(Vec<String>),

  #[error("Invalid response: {0}")]
  InvalidResponse(String),

  #[error("Invalid data point: {0}")]
  InvalidDataPoint(String),
}

impl From<PlanningError> for AdapterError {
  fn from(error: PlanningError) -> Self {
    AdapterError::PlanningError(error)
  }
}

impl From<BackendError> for AdapterError {
  fn from(error: BackendError) -> Self {
    AdapterError::BackendError(error)
  }
}

impl From<BackendError> for PlanningError {
  fn from(error: BackendError) -> Self {
    PlanningError::MetadataFetchError(error)
  }
}

impl From<reqwest::Error> for BackendError {
  fn from(error: reqwest::Error) -> Self {
    if error.is_decode() {
      BackendError::InvalidResponse(error.to_string())
    } else {
      BackendError::RequestError(error.to_string())
    }
  }
}
