// This code is licensed under Elastic License 2.0
// https://www.elastic.co/licensing/elastic-license

use std::env;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use adapter::utils::config::ENV_PREFIX;

const DEFAULT_CONFIG_FILE_NAME: &str = "default.toml";
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_LOG_LEVEL: &str = "info";

/// Environment variable overriding the configured port.
const PORT_ENV_VAR: &str = "PORT";

/// Load environment variables from the `.env` and `.env-creds` files, when present.
pub fn load_env() {
  for file_name in [".env", ".env-creds"] {
    dotenv::from_filename(file_name).ok();
  }
}

#[derive(Debug, Deserialize)]
/// Settings for the http server.
pub struct ServerSettings {
  #[serde(default = "default_host")]
  host: String,

  #[serde(default = "default_port")]
  port: u16,

  #[serde(default = "default_log_level")]
  log_level: String,

  #[serde(default)]
  log_json: bool,

  #[serde(default)]
  no_color: bool,
}

fn default_host() -> String {
  DEFAULT_HOST.to_owned()
}

fn default_port() -> u16 {
  DEFAULT_PORT
}

fn default_log_level() -> String {
  DEFAULT_LOG_LEVEL.to_owned()
}

impl Default for ServerSettings {
  fn default() -> Self {
    ServerSettings {
      host: default_host(),
      port: default_port(),
      log_level: default_log_level(),
      log_json: false,
      no_color: false,
    }
  }
}

impl ServerSettings {
  /// Get the port.
  pub fn get_port(&self) -> u16 {
    self.port
  }

  /// Get the host.
  pub fn get_host(&self) -> &str {
    &self.host
  }

  /// Get the log level used when RUST_LOG is not set.
  pub fn get_log_level(&self) -> &str {
    &self.log_level
  }

  /// Whether logs are written as json.
  pub fn get_log_json(&self) -> bool {
    self.log_json
  }

  /// Whether ansi colors are disabled in logs.
  pub fn get_no_color(&self) -> bool {
    self.no_color
  }
}

#[derive(Debug, Deserialize)]
/// Settings for the server, read from config file.
pub struct Settings {
  #[serde(default)]
  server: ServerSettings,
}

impl Settings {
  /// Create Settings from given configuration directory path.
  pub fn new(config_dir_path: &str) -> Result<Self, ConfigError> {
    let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
    let config_default_file_name = format!("{}/{}", config_dir_path, DEFAULT_CONFIG_FILE_NAME);
    let config_environment_file_name = format!("{}/{}.toml", config_dir_path, run_mode);

    let config = Config::builder()
      .add_source(File::with_name(&config_default_file_name))
      // Optional, per run mode.
      .add_source(File::with_name(&config_environment_file_name).required(false))
      .add_source(
        Environment::with_prefix(ENV_PREFIX)
          .prefix_separator("_")
          .separator("__"),
      )
      .set_override_option("server.port", env::var(PORT_ENV_VAR).ok())?
      .build()?;

    config.try_deserialize()
  }

  /// Get server settings.
  pub fn get_server_settings(&self) -> &ServerSettings {
    &self.server
  }

  #[cfg(test)]
  /// Get the default config file name.
  pub fn get_default_config_file_name() -> &'static str {
    DEFAULT_CONFIG_FILE_NAME
  }
}
