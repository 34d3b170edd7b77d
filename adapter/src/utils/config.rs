// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::env;
use std::time::Duration;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::metadata::filter::RegexAnchor;

const DEFAULT_CONFIG_FILE_NAME: &str = "default.toml";
const DEFAULT_WORKERS: usize = 5;
const DEFAULT_QUEUE_SIZE: usize = 100;
const DEFAULT_METADATA_CACHE_TTL_SECONDS: u64 = 30;

/// Prefix for environment variables overriding the config files. Nested keys are
/// separated by `__`, e.g. `KAIROS_ADAPTER_KAIROSDB__URL`.
pub const ENV_PREFIX: &str = "kairos_adapter";

#[derive(Debug, Deserialize)]
/// Settings for the KairosDB backend.
pub struct KairosDBSettings {
  url: String,

  #[serde(default)]
  skip_insecure: bool,
}

impl KairosDBSettings {
  /// Get the base url of KairosDB, without a trailing '/'.
  pub fn get_url(&self) -> &str {
    self.url.trim_end_matches('/')
  }

  /// Whether invalid TLS certificates are accepted.
  pub fn get_skip_insecure(&self) -> bool {
    self.skip_insecure
  }
}

#[derive(Debug, Deserialize)]
/// Settings for the read and write paths of the adapter.
pub struct AdapterSettings {
  #[serde(default = "default_workers")]
  workers: i64,

  #[serde(default = "default_queue_size")]
  queue_size: usize,

  #[serde(default = "default_metadata_cache_ttl_seconds")]
  metadata_cache_ttl_seconds: u64,

  #[serde(default)]
  regex_anchor: RegexAnchor,
}

fn default_workers() -> i64 {
  DEFAULT_WORKERS as i64
}

fn default_queue_size() -> usize {
  DEFAULT_QUEUE_SIZE
}

fn default_metadata_cache_ttl_seconds() -> u64 {
  DEFAULT_METADATA_CACHE_TTL_SECONDS
}

impl AdapterSettings {
  /// Create adapter settings with the given number of write workers and queue size.
  pub fn new(workers: i64, queue_size: usize, metadata_cache_ttl_seconds: u64) -> Self {
    AdapterSettings {
      workers,
      queue_size,
      metadata_cache_ttl_seconds,
      regex_anchor: RegexAnchor::default(),
    }
  }

  /// Set how regex matchers are anchored against metadata values.
  pub fn with_regex_anchor(mut self, regex_anchor: RegexAnchor) -> Self {
    self.regex_anchor = regex_anchor;
    self
  }

  /// Get the number of concurrent write workers. Non-positive values fall back to the default.
  pub fn get_workers(&self) -> usize {
    if self.workers <= 0 {
      DEFAULT_WORKERS
    } else {
      self.workers as usize
    }
  }

  /// Get the capacity of the write queue.
  pub fn get_queue_size(&self) -> usize {
    std::cmp::max(1, self.queue_size)
  }

  /// Get the time-to-live of cached backend metadata.
  pub fn get_metadata_cache_ttl(&self) -> Duration {
    Duration::from_secs(self.metadata_cache_ttl_seconds)
  }

  /// Get the anchoring applied to regex matchers.
  pub fn get_regex_anchor(&self) -> RegexAnchor {
    self.regex_anchor
  }
}

impl Default for AdapterSettings {
  fn default() -> Self {
    AdapterSettings::new(
      default_workers(),
      default_queue_size(),
      default_metadata_cache_ttl_seconds(),
    )
  }
}

#[derive(Debug, Deserialize)]
/// Settings for the adapter, read from config file.
pub struct Settings {
  kairosdb: KairosDBSettings,

  #[serde(default)]
  adapter: AdapterSettings,
}

impl Settings {
  /// Create Settings from given configuration directory path.
  pub fn new(config_dir_path: &str) -> Result<Self, ConfigError> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
    let config_default_file_name = format!("{}/{}", config_dir_path, DEFAULT_CONFIG_FILE_NAME);
    let config_environment_file_name = format!("{}/{}.toml", config_dir_path, run_mode);

    let config = Config::builder()
      // Start off by merging in the "default" configuration file
      .add_source(File::with_name(&config_default_file_name))
      // Add in the current environment file
      // Default to 'development' env
      // Note that this file is _optional_
      .add_source(File::with_name(&config_environment_file_name).required(false))
      .add_source(
        Environment::with_prefix(ENV_PREFIX)
          .prefix_separator("_")
          .separator("__"),
      )
      .build()?;

    let settings: Settings = config.try_deserialize()?;
    if settings.kairosdb.get_url().is_empty() {
      return Err(ConfigError::Message("kairosdb.url must be set".to_owned()));
    }

    Ok(settings)
  }

  /// Get KairosDB settings.
  pub fn get_kairosdb_settings(&self) -> &KairosDBSettings {
    &self.kairosdb
  }

  /// Get adapter settings.
  pub fn get_adapter_settings(&self) -> &AdapterSettings {
    &self.adapter
  }

  /// Get the default config file name.
  pub fn get_default_config_file_name() -> &'static str {
    DEFAULT_CONFIG_FILE_NAME
  }
}

/// Initialize the logger for tests. Safe to call more than once.
pub fn config_test_logger() {
  let _ = env_logger::builder().is_test(true).try_init();
}

#[cfg(test)]
mod tests {
  use super::*;

  use std::fs::File;
  use std::io::Write;

  use tempdir::TempDir;

  use crate::utils::io::get_joined_path;

  #[test]
  fn test_settings() {
    let config_dir = TempDir::new("config_test").unwrap();
    let config_dir_path = config_dir.path().to_str().unwrap();

    // Reading from an empty directory should be an error.
    assert!(Settings::new(config_dir_path).is_err());

    // Only the kairosdb url is mandatory.
    let config_file_path = get_joined_path(config_dir_path, DEFAULT_CONFIG_FILE_NAME);
    {
      let mut file = File::create(&config_file_path).unwrap();
      file.write_all(b"[kairosdb]\n").unwrap();
      file
        .write_all(b"url = \"http://localhost:8080/\"\n")
        .unwrap();
    }

    let settings = Settings::new(config_dir_path).unwrap();
    let kairosdb_settings = settings.get_kairosdb_settings();
    assert_eq!(kairosdb_settings.get_url(), "http://localhost:8080");
    assert!(!kairosdb_settings.get_skip_insecure());

    let adapter_settings = settings.get_adapter_settings();
    assert_eq!(adapter_settings.get_workers(), 5);
    assert_eq!(adapter_settings.get_queue_size(), 100);
    assert_eq!(
      adapter_settings.get_metadata_cache_ttl(),
      Duration::from_secs(30)
    );
    assert_eq!(adapter_settings.get_regex_anchor(), RegexAnchor::Prefix);

    // Explicit values, including a non-positive worker count.
    {
      let mut file = File::create(&config_file_path).unwrap();
      file.write_all(b"[kairosdb]\n").unwrap();
      file.write_all(b"url = \"https://kairos:8443\"\n").unwrap();
      file.write_all(b"skip_insecure = true\n").unwrap();
      file.write_all(b"[adapter]\n").unwrap();
      file.write_all(b"workers = 0\n").unwrap();
      file.write_all(b"queue_size = 10\n").unwrap();
      file.write_all(b"metadata_cache_ttl_seconds = 5\n").unwrap();
      file.write_all(b"regex_anchor = \"full\"\n").unwrap();
    }

    let settings = Settings::new(config_dir_path).unwrap();
    assert!(settings.get_kairosdb_settings().get_skip_insecure());
    let adapter_settings = settings.get_adapter_settings();
    assert_eq!(adapter_settings.get_workers(), 5);
    assert_eq!(adapter_settings.get_queue_size(), 10);
    assert_eq!(
      adapter_settings.get_metadata_cache_ttl(),
      Duration::from_secs(5)
    );
    assert_eq!(adapter_settings.get_regex_anchor(), RegexAnchor::Full);
  }

  #[test]
  fn test_empty_url_is_rejected() {
    let config_dir = TempDir::new("config_test").unwrap();
    let config_dir_path = config_dir.path().to_str().unwrap();
    let config_file_path = get_joined_path(config_dir_path, DEFAULT_CONFIG_FILE_NAME);
    {
      let mut file = File::create(config_file_path).unwrap();
      file.write_all(b"[kairosdb]\n").unwrap();
      file.write_all(b"url = \"\"\n").unwrap();
    }

    assert!(Settings::new(config_dir_path).is_err());
  }
}
