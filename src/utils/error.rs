// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use hyper::StatusCode;
use thiserror::Error;

use adapter::utils::error::{AdapterError, PlanningError};

#[derive(Debug, Error)]
/// Collection of error messages in the adapter server.
pub enum ServerError {
  #[error("Invalid configuration: {0}.")]
  InvalidConfiguration(String),

  #[error("Could not decompress snappy payload: {0}.")]
  SnappyError(String),

  #[error("Could not decode protobuf payload: {0}.")]
  DecodeError(String),

  #[error("Invalid query: {0}.")]
  InvalidQuery(#[from] PlanningError),

  #[error("{0}")]
  ReadError(#[from] AdapterError),
}

impl ServerError {
  /// Http status reported to the client for this error.
  pub fn status_code(&self) -> StatusCode {
    match self {
      ServerError::SnappyError(_) | ServerError::DecodeError(_) => StatusCode::BAD_REQUEST,
      _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl From<ServerError> for (StatusCode, String) {
  fn from(error: ServerError) -> Self {
    (error.status_code(), error.to_string())
  }
}
