// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

//! The KairosDB remote storage adapter server.
//!
//! The server is an [Axum](https://docs.rs/axum/latest/axum/) web application exposing the
//! Prometheus remote write and remote read endpoints. Write requests are pushed to KairosDB as
//! individual datapoints, and read requests are translated into KairosDB queries whose results
//! are merged back into Prometheus time series.

mod codec;
mod prompb;
mod utils;

use std::env;
use std::net::SocketAddr;
use std::result::Result;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{ConnectInfo, DefaultBodyLimit, State};
use axum::http::header::{CONTENT_ENCODING, CONTENT_TYPE};
use axum::http::HeaderMap;
use axum::response::IntoResponse;
use axum::{routing::get, routing::post, Json, Router};
use chrono::Utc;
use crossbeam::atomic::AtomicCell;
use hyper::StatusCode;
use lazy_static::lazy_static;
use log::{debug, error, info, warn};
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use adapter::utils::config::Settings as AdapterSettings;
use adapter::Adapter;

use crate::codec::{decode_read_request, decode_write_request, encode_read_response, to_read_request};
use crate::utils::error::ServerError;
use crate::utils::settings::{load_env, Settings};
use crate::utils::shutdown::shutdown_signal;

const CONFIG_DIR_PATH_ENV_VAR: &str = "KAIROS_ADAPTER_CONFIG_DIR_PATH";
const DEFAULT_CONFIG_DIR_PATH: &str = "config";
const PROTOBUF_CONTENT_TYPE: &str = "application/x-protobuf";
const SNAPPY_CONTENT_ENCODING: &str = "snappy";
const X_FORWARDED_FOR: &str = "x-forwarded-for";

// Make the default for body to be 32MB (instead of 2MB http default.)
const MAX_BODY_SIZE: usize = 32 * 1024 * 1024;

lazy_static! {
  static ref IS_SHUTDOWN: AtomicCell<bool> = AtomicCell::new(false);
}

/// Represents application state.
struct AppState {
  adapter: Adapter,
  settings: Settings,
}

/// Axum application for the adapter server.
async fn app(config_dir_path: &str) -> Result<(Router, Arc<AppState>), ServerError> {
  let settings = Settings::new(config_dir_path)
    .map_err(|e| ServerError::InvalidConfiguration(e.to_string()))?;
  let adapter_settings = AdapterSettings::new(config_dir_path)
    .map_err(|e| ServerError::InvalidConfiguration(e.to_string()))?;

  let adapter = Adapter::new(&adapter_settings)
    .map_err(|e| ServerError::InvalidConfiguration(e.to_string()))?;

  let shared_state = Arc::new(AppState { adapter, settings });

  let router: Router = Router::new()
    .route("/health", get(health))
    .route("/write", post(write))
    .route("/read", post(read))
    .with_state(shared_state.clone())
    .layer(TraceLayer::new_for_http())
    .layer(DefaultBodyLimit::max(MAX_BODY_SIZE));

  Ok((router, shared_state))
}

async fn run_server(config_dir_path: &str) -> Result<(), ServerError> {
  let (app, shared_state) = app(config_dir_path).await?;

  let server_settings = shared_state.settings.get_server_settings();
  let connection_string = &format!(
    "{}:{}",
    server_settings.get_host(),
    server_settings.get_port()
  );
  let listener = TcpListener::bind(connection_string).await.map_err(|e| {
    ServerError::InvalidConfiguration(format!("Could not listen using {}: {}", connection_string, e))
  })?;

  info!(
    "Starting KairosDB adapter on {}. Use Ctrl-C or SIGTERM to gracefully exit...",
    connection_string
  );

  let result = axum::serve(
    listener,
    app.into_make_service_with_connect_info::<SocketAddr>(),
  )
  .with_graceful_shutdown(async {
    shutdown_signal().await;
    IS_SHUTDOWN.store(true);
  })
  .await;

  if let Err(err) = result {
    error!("Server terminated with error: {}", err);
  }

  info!("Waiting for pending writes to complete...");
  shared_state.adapter.shutdown().await;

  info!("Completed KairosDB adapter shutdown");
  Ok(())
}

/// Set up logging from the server settings. RUST_LOG, when set, takes precedence over the
/// configured log level.
fn init_logging(settings: &Settings) {
  let server_settings = settings.get_server_settings();
  let env_filter = EnvFilter::try_from_default_env()
    .unwrap_or_else(|_| EnvFilter::new(server_settings.get_log_level()));

  let builder = tracing_subscriber::fmt()
    .with_env_filter(env_filter)
    .with_ansi(!server_settings.get_no_color());

  if server_settings.get_log_json() {
    builder.json().init();
  } else {
    builder.init();
  }
}

/// Program entry point.
fn main() {
  // Load environment variables from ".env" and ".env-creds" file.
  load_env();

  // Config directory path is relative to the current directory.
  let config_dir_path =
    env::var(CONFIG_DIR_PATH_ENV_VAR).unwrap_or_else(|_| DEFAULT_CONFIG_DIR_PATH.to_owned());

  let settings = match Settings::new(&config_dir_path) {
    Ok(settings) => settings,
    Err(err) => {
      eprintln!("Could not read configuration from {}: {}", config_dir_path, err);
      std::process::exit(1);
    }
  };
  init_logging(&settings);

  // Set the number of threads to be 1 less than the number of CPUs (or 1 if there are fewer than 2 CPUs).
  let num_threads = std::cmp::max(1, num_cpus::get().saturating_sub(1));

  let runtime = match tokio::runtime::Builder::new_multi_thread()
    .worker_threads(num_threads)
    .enable_all()
    .build()
  {
    Ok(runtime) => runtime,
    Err(err) => {
      error!("Could not start tokio runtime: {}", err);
      std::process::exit(1);
    }
  };

  if let Err(err) = runtime.block_on(run_server(&config_dir_path)) {
    error!("{}", err);
    std::process::exit(1);
  }
}

/// First address of the X-Forwarded-For header, else the peer address.
fn remote_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
  headers
    .get(X_FORWARDED_FOR)
    .and_then(|value| value.to_str().ok())
    .and_then(|value| value.split(',').next())
    .map(|ip| ip.trim().to_owned())
    .filter(|ip| !ip.is_empty())
    .or_else(|| peer.map(|addr| addr.ip().to_string()))
    .unwrap_or_else(|| "unknown".to_owned())
}

/// Report the health of the adapter and of KairosDB.
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
  let healthy = state.adapter.healthy().await;
  let (status_code, status) = if healthy {
    (StatusCode::OK, "ok")
  } else {
    (StatusCode::INTERNAL_SERVER_ERROR, "ko")
  };

  let body: Value = json!({
    "adapter": "ok",
    "tsdb": {
      "name": state.adapter.name(),
      "status": status,
    }
  });

  (status_code, Json(body))
}

/// Remote write: push every sample of the request to KairosDB.
async fn write(
  State(state): State<Arc<AppState>>,
  connect_info: Option<ConnectInfo<SocketAddr>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<(), (StatusCode, String)> {
  let start_time = Utc::now().timestamp_millis();

  if IS_SHUTDOWN.load() {
    return Err((
      StatusCode::SERVICE_UNAVAILABLE,
      "Server is shutting down".to_owned(),
    ));
  }

  let samples = decode_write_request(&body).map_err(|e| {
    warn!("Could not decode write request: {}", e);
    e
  })?;
  let num_samples = samples.len();
  state.adapter.write(samples).await;

  debug!(
    "Wrote {} samples from {} in {} ms",
    num_samples,
    remote_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr)),
    Utc::now().timestamp_millis() - start_time
  );

  Ok(())
}

/// Remote read: answer the queries of the request from KairosDB.
async fn read(
  State(state): State<Arc<AppState>>,
  connect_info: Option<ConnectInfo<SocketAddr>>,
  headers: HeaderMap,
  body: Bytes,
) -> Result<impl IntoResponse, (StatusCode, String)> {
  let start_time = Utc::now().timestamp_millis();

  let request = decode_read_request(&body).map_err(|e| {
    warn!("Could not decode read request: {}", e);
    e
  })?;
  let request = to_read_request(request).map_err(ServerError::from)?;

  let response = state.adapter.read(&request).await.map_err(|e| {
    warn!("Could not answer read request: {}", e);
    ServerError::from(e)
  })?;
  let encoded = encode_read_response(&response)?;

  debug!(
    "Answered {} queries from {} in {} ms",
    request.queries.len(),
    remote_ip(&headers, connect_info.map(|ConnectInfo(addr)| addr)),
    Utc::now().timestamp_millis() - start_time
  );

  Ok((
    [
      (CONTENT_TYPE, PROTOBUF_CONTENT_TYPE),
      (CONTENT_ENCODING, SNAPPY_CONTENT_ENCODING),
    ],
    encoded,
  ))
}

#[cfg(test)]
mod tests {
  use std::fs::File;
  use std::io::Write;
  use std::sync::Mutex;

  use axum::{
    body::{to_bytes, Body},
    http::{self, Request},
  };
  use prost::Message;
  use tempdir::TempDir;
  use test_case::test_case;
  use tower::Service;

  use adapter::model::constants::METRIC_NAME_LABEL;
  use adapter::utils::config::config_test_logger;
  use adapter::utils::io::get_joined_path;

  use crate::codec::{snappy_compress, snappy_decompress};

  use super::*;

  /// Requests received by the fake KairosDB.
  #[derive(Default)]
  struct FakeKairosDB {
    pushes: Mutex<Vec<Value>>,
    queries: Mutex<Vec<Value>>,
  }

  async fn fake_push(State(fake): State<Arc<FakeKairosDB>>, Json(body): Json<Value>) -> StatusCode {
    fake.pushes.lock().unwrap().push(body);
    StatusCode::NO_CONTENT
  }

  async fn fake_query(State(fake): State<Arc<FakeKairosDB>>, Json(body): Json<Value>) -> Json<Value> {
    let name = body["metrics"][0]["name"].as_str().unwrap_or_default().to_owned();
    fake.queries.lock().unwrap().push(body);

    let results = if name == "cpu" {
      json!([
        {"name": "cpu", "tags": {"host": ["a"]}, "values": [[20, 2.0], [10, 1.0]]},
        {"name": "cpu", "tags": {"host": ["a"], "dc": [""]}, "values": [[15, 1.5], [20, 9.0]]},
      ])
    } else {
      json!([{"name": name, "tags": {}, "values": []}])
    };

    Json(json!({"queries": [{"sample_size": 0, "results": results}]}))
  }

  /// Start a fake KairosDB on an ephemeral port and return its url.
  async fn start_fake_kairosdb(fake: Arc<FakeKairosDB>) -> String {
    let router = Router::new()
      .route("/api/v1/health/check", get(|| async { StatusCode::NO_CONTENT }))
      .route(
        "/api/v1/metricnames",
        get(|| async { Json(json!({"results": ["cpu", "mem"]})) }),
      )
      .route(
        "/api/v1/tagnames",
        get(|| async { Json(json!({"results": ["host", "dc"]})) }),
      )
      .route(
        "/api/v1/tagvalues",
        get(|| async { Json(json!({"results": ["a", "b", ""]})) }),
      )
      .route("/api/v1/datapoints", post(fake_push))
      .route("/api/v1/datapoints/query", post(fake_query))
      .with_state(fake);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
      axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
  }

  /// Url of a port that nothing listens on.
  async fn closed_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
  }

  /// Helper function to create a test configuration.
  fn create_test_config(config_dir_path: &str, kairosdb_url: &str) {
    config_test_logger();

    let config_file_path =
      get_joined_path(config_dir_path, Settings::get_default_config_file_name());
    {
      let url_line = format!("url = \"{}\"\n", kairosdb_url);

      let mut file = File::create(config_file_path).unwrap();

      // Write server section.
      file.write_all(b"[server]\n").unwrap();
      file.write_all(b"port = 9201\n").unwrap();
      file.write_all(b"host = \"0.0.0.0\"\n").unwrap();

      // Write kairosdb section.
      file.write_all(b"[kairosdb]\n").unwrap();
      file.write_all(url_line.as_bytes()).unwrap();

      // Write adapter section.
      file.write_all(b"[adapter]\n").unwrap();
      file.write_all(b"workers = 2\n").unwrap();
      file.write_all(b"queue_size = 10\n").unwrap();
    }
  }

  async fn create_app(kairosdb_url: &str) -> (Router, Arc<AppState>, TempDir) {
    let config_dir = TempDir::new("config_test").unwrap();
    let config_dir_path = config_dir.path().to_str().unwrap();
    create_test_config(config_dir_path, kairosdb_url);

    let (app, state) = app(config_dir_path).await.unwrap();
    (app, state, config_dir)
  }

  fn label(name: &str, value: &str) -> prompb::Label {
    prompb::Label {
      name: name.to_owned(),
      value: value.to_owned(),
    }
  }

  fn post_request(uri: &str, body: Vec<u8>) -> Request<Body> {
    Request::builder()
      .method(http::Method::POST)
      .uri(uri)
      .header(CONTENT_TYPE, PROTOBUF_CONTENT_TYPE)
      .header(CONTENT_ENCODING, SNAPPY_CONTENT_ENCODING)
      .body(Body::from(body))
      .unwrap()
  }

  fn read_body(matchers: Vec<prompb::LabelMatcher>) -> Vec<u8> {
    let request = prompb::ReadRequest {
      queries: vec![prompb::Query {
        start_timestamp_ms: 0,
        end_timestamp_ms: 100,
        matchers,
      }],
    };
    snappy_compress(&request.encode_to_vec()).unwrap()
  }

  fn matcher(r#type: i32, name: &str, value: &str) -> prompb::LabelMatcher {
    prompb::LabelMatcher {
      r#type,
      name: name.to_owned(),
      value: value.to_owned(),
    }
  }

  #[test]
  fn test_remote_ip() {
    let peer: SocketAddr = "10.0.0.1:4000".parse().unwrap();

    let mut headers = HeaderMap::new();
    assert_eq!(remote_ip(&headers, Some(peer)), "10.0.0.1");
    assert_eq!(remote_ip(&headers, None), "unknown");

    headers.insert(X_FORWARDED_FOR, "192.168.1.7, 10.0.0.2".parse().unwrap());
    assert_eq!(remote_ip(&headers, Some(peer)), "192.168.1.7");
  }

  #[tokio::test]
  async fn test_health() {
    let fake = Arc::new(FakeKairosDB::default());
    let url = start_fake_kairosdb(fake).await;
    let (mut app, state, _config_dir) = create_app(&url).await;

    let response = app
      .call(
        Request::builder()
          .method(http::Method::GET)
          .uri("/health")
          .body(Body::from(""))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
      response.headers()[CONTENT_TYPE],
      mime::APPLICATION_JSON.as_ref()
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(
      body,
      json!({"adapter": "ok", "tsdb": {"name": "kairosdb", "status": "ok"}})
    );

    state.adapter.shutdown().await;
  }

  #[tokio::test]
  async fn test_health_backend_down() {
    let url = closed_url().await;
    let (mut app, state, _config_dir) = create_app(&url).await;

    let response = app
      .call(
        Request::builder()
          .method(http::Method::GET)
          .uri("/health")
          .body(Body::from(""))
          .unwrap(),
      )
      .await
      .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(body["tsdb"]["status"], "ko");

    state.adapter.shutdown().await;
  }

  #[tokio::test]
  async fn test_write() {
    let fake = Arc::new(FakeKairosDB::default());
    let url = start_fake_kairosdb(fake.clone()).await;
    let (mut app, state, _config_dir) = create_app(&url).await;

    let request = prompb::WriteRequest {
      timeseries: vec![prompb::TimeSeries {
        labels: vec![label(METRIC_NAME_LABEL, "cpu"), label("host", "a")],
        samples: vec![
          prompb::Sample {
            value: f64::NAN,
            timestamp: 1000,
          },
          prompb::Sample {
            value: 3.14,
            timestamp: 2000,
          },
        ],
      }],
    };
    let body = snappy_compress(&request.encode_to_vec()).unwrap();

    let response = app.call(post_request("/write", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    // The response is sent once every sample has been pushed.
    let pushes = fake.pushes.lock().unwrap().clone();
    assert_eq!(
      pushes,
      vec![json!([{
        "name": "cpu",
        "tags": {"host": "a"},
        "type": "double",
        "datapoints": [[2000, 3.14]],
      }])]
    );

    state.adapter.shutdown().await;
  }

  #[test_case(b"definitely not snappy".to_vec(); "invalid snappy")]
  #[test_case(snappy_compress(&[0x0a, 0xff]).unwrap(); "invalid protobuf")]
  #[tokio::test]
  async fn test_invalid_body(body: Vec<u8>) {
    let url = closed_url().await;
    let (mut app, state, _config_dir) = create_app(&url).await;

    let response = app.call(post_request("/write", body.clone())).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app.call(post_request("/read", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    state.adapter.shutdown().await;
  }

  #[tokio::test]
  async fn test_read() {
    let fake = Arc::new(FakeKairosDB::default());
    let url = start_fake_kairosdb(fake.clone()).await;
    let (mut app, state, _config_dir) = create_app(&url).await;

    // Metric names matching "c.*" only resolve to "cpu".
    let body = read_body(vec![
      matcher(2, METRIC_NAME_LABEL, "c.*"),
      matcher(0, "host", "a"),
    ]);
    let response = app.call(post_request("/read", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], PROTOBUF_CONTENT_TYPE);
    assert_eq!(
      response.headers()[CONTENT_ENCODING],
      SNAPPY_CONTENT_ENCODING
    );

    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let decoded =
      prompb::ReadResponse::decode(snappy_decompress(&body).unwrap().as_slice()).unwrap();

    assert_eq!(decoded.results.len(), 1);
    let timeseries = &decoded.results[0].timeseries;
    assert_eq!(timeseries.len(), 1);
    assert_eq!(
      timeseries[0].labels,
      vec![label(METRIC_NAME_LABEL, "cpu"), label("host", "a")]
    );
    let samples: Vec<(i64, f64)> = timeseries[0]
      .samples
      .iter()
      .map(|sample| (sample.timestamp, sample.value))
      .collect();
    assert_eq!(samples, vec![(10, 1.0), (15, 1.5), (20, 2.0)]);

    let queries = fake.queries.lock().unwrap().clone();
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0]["metrics"][0]["name"], "cpu");
    assert_eq!(queries[0]["metrics"][0]["tags"], json!({"host": ["a"]}));

    state.adapter.shutdown().await;
  }

  #[tokio::test]
  async fn test_read_failures() {
    // Unknown matcher type.
    let fake = Arc::new(FakeKairosDB::default());
    let url = start_fake_kairosdb(fake).await;
    let (mut app, state, _config_dir) = create_app(&url).await;

    let body = read_body(vec![matcher(7, METRIC_NAME_LABEL, "cpu")]);
    let response = app.call(post_request("/read", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    state.adapter.shutdown().await;

    // KairosDB unreachable.
    let url = closed_url().await;
    let (mut app, state, _config_dir) = create_app(&url).await;

    let body = read_body(vec![matcher(0, METRIC_NAME_LABEL, "cpu")]);
    let response = app.call(post_request("/read", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    state.adapter.shutdown().await;
  }
}
