// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::convert::TryFrom;
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use reqwest::{Client, Response, StatusCode};

use crate::model::sample::MetricPush;
use crate::query::sub_query::SubQuery;
use crate::utils::config::KairosDBSettings;
use crate::utils::error::BackendError;

use super::kairosdb_json::{ErrorResponse, ListResponse, MetricBody, QueryBody, QueryResponse};
use super::{Backend, BackendSeries};

const BACKEND_NAME: &str = "kairosdb";

const DATAPOINTS_ENDPOINT: &str = "/api/v1/datapoints";
const QUERY_ENDPOINT: &str = "/api/v1/datapoints/query";
const HEALTH_ENDPOINT: &str = "/api/v1/health/check";
const METRIC_NAMES_ENDPOINT: &str = "/api/v1/metricnames";
const TAG_NAMES_ENDPOINT: &str = "/api/v1/tagnames";
const TAG_VALUES_ENDPOINT: &str = "/api/v1/tagvalues";

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);
const TCP_KEEPALIVE: Duration = Duration::from_secs(30);
const POOL_IDLE_TIMEOUT: Duration = Duration::from_secs(90);
const POOL_MAX_IDLE_PER_HOST: usize = 100;

/// Client for the KairosDB REST API.
pub struct KairosDBClient {
  base_url: String,
  client: Client,
}

impl KairosDBClient {
  /// Create a client for the KairosDB instance described in the settings.
  pub fn new(settings: &KairosDBSettings) -> Result<Self, BackendError> {
    let client = Client::builder()
      .connect_timeout(CONNECT_TIMEOUT)
      .tcp_keepalive(TCP_KEEPALIVE)
      .pool_idle_timeout(POOL_IDLE_TIMEOUT)
      .pool_max_idle_per_host(POOL_MAX_IDLE_PER_HOST)
      .danger_accept_invalid_certs(settings.get_skip_insecure())
      .build()?;

    Ok(Self::with_client(settings.get_url(), client))
  }

  /// Create a client using an already configured http client.
  pub fn with_client(base_url: &str, client: Client) -> Self {
    KairosDBClient {
      base_url: base_url.trim_end_matches('/').to_owned(),
      client,
    }
  }

  fn url(&self, endpoint: &str) -> String {
    format!("{}{}", self.base_url, endpoint)
  }

  async fn get_list(&self, endpoint: &str) -> Result<Vec<String>, BackendError> {
    let response = self
      .client
      .get(self.url(endpoint))
      .header(reqwest::header::ACCEPT, "application/json")
      .send()
      .await?;

    let response = check_status(response).await?;
    let list: ListResponse = response.json().await?;
    debug!("Fetched {} entries from {}", list.results.len(), endpoint);

    Ok(list.results)
  }
}

/// Turn a non-success response into an error, using the error list reported by KairosDB if any.
async fn check_status(response: Response) -> Result<Response, BackendError> {
  let status = response.status();
  if status.is_success() {
    return Ok(response);
  }

  let body = response.text().await.unwrap_or_default();
  let errors = serde_json::from_str::<ErrorResponse>(&body)
    .map(|error_response| error_response.errors)
    .unwrap_or_default();
  let message = if errors.is_empty() {
    body
  } else {
    errors.join("\n")
  };

  Err(BackendError::UnexpectedStatus(status.as_u16(), message))
}

#[async_trait]
impl Backend for KairosDBClient {
  fn name(&self) -> &str {
    BACKEND_NAME
  }

  async fn fetch_metric_names(&self) -> Result<Vec<String>, BackendError> {
    self.get_list(METRIC_NAMES_ENDPOINT).await
  }

  async fn fetch_tag_names(&self) -> Result<Vec<String>, BackendError> {
    self.get_list(TAG_NAMES_ENDPOINT).await
  }

  async fn fetch_tag_values(&self) -> Result<Vec<String>, BackendError> {
    self.get_list(TAG_VALUES_ENDPOINT).await
  }

  async fn run_query(&self, sub_query: &SubQuery) -> Result<Vec<BackendSeries>, BackendError> {
    let response = self
      .client
      .post(self.url(QUERY_ENDPOINT))
      .json(&QueryBody::from(sub_query))
      .send()
      .await?;

    // KairosDB reports query errors in the body along with a 400, so look at the body first.
    let status = response.status();
    let body = response.text().await?;
    let query_response: QueryResponse = match serde_json::from_str(&body) {
      Ok(query_response) => query_response,
      Err(err) if status.is_success() => {
        return Err(BackendError::InvalidResponse(err.to_string()));
      }
      Err(_) => return Err(BackendError::UnexpectedStatus(status.as_u16(), body)),
    };

    if !query_response.errors.is_empty() {
      return Err(BackendError::QueryErrors(query_response.errors));
    }
    if !status.is_success() {
      return Err(BackendError::UnexpectedStatus(status.as_u16(), body));
    }

    let mut series = Vec::new();
    for query in query_response.queries {
      for result in query.results {
        series.push(BackendSeries::try_from(result)?);
      }
    }

    Ok(series)
  }

  async fn push_samples(&self, batch: &[MetricPush]) -> Result<(), BackendError> {
    let body: Vec<MetricBody> = batch.iter().map(MetricBody::from).collect();
    let response = self
      .client
      .post(self.url(DATAPOINTS_ENDPOINT))
      .json(&body)
      .send()
      .await?;

    check_status(response).await?;
    Ok(())
  }

  async fn health_check(&self) -> bool {
    let result = self
      .client
      .get(self.url(HEALTH_ENDPOINT))
      .header(reqwest::header::ACCEPT, "application/json")
      .send()
      .await;

    match result {
      Ok(response) => {
        let status = response.status();
        if status == StatusCode::NO_CONTENT || status == StatusCode::OK {
          true
        } else {
          warn!("KairosDB health check returned status {}", status);
          false
        }
      }
      Err(err) => {
        warn!("KairosDB health check failed: {}", err);
        false
      }
    }
  }
}
