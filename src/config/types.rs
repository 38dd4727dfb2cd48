//! Exporter configuration: defaults, the optional YAML file and `WALDUR_*`
//! environment variables, layered with figment.

use std::time::Duration;

use figment::providers::{Env, Format, Serialized, Yaml};
use figment::Figment;
use schemars::{schema_for, JsonSchema};
use serde::{Deserialize, Serialize};

use super::logging::LoggingConfig;

/// Environment variable that overrides the location of the YAML config file.
pub const CONFIG_PATH_ENV: &str = "WALDUR_EXPORTER_CONFIG";
pub const DEFAULT_CONFIG_PATH: &str = "./config.yaml";
/// Every environment variable with this prefix is mapped onto a config key,
/// e.g. `WALDUR_API_URL` -> `api_url`, `WALDUR_LOGGING__LEVEL` -> `logging.level`.
pub const ENV_PREFIX: &str = "WALDUR_";

/// What happens to label combinations that disappear from the API between cycles.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Default, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum StaleSeriesPolicy {
    /// Leave vanished series at their last published value.
    #[default]
    Keep,
    /// Reset a labeled gauge before repopulating it from a fresh fetch.
    Clear,
}

/// Exporter configuration.
#[derive(Deserialize, Serialize, Debug, Clone, JsonSchema)]
pub struct Config {
    /// Base URL of the Waldur API, with or without the trailing `/api/`.
    pub api_url: String,
    /// Waldur API token, sent as `Authorization: Token <api_token>`.
    pub api_token: String,
    #[serde(default = "default_api_timeout_secs")]
    pub api_timeout_secs: u64,
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    #[serde(default)]
    pub stale_series: StaleSeriesPolicy,
    /// Registration methods reported by `waldur_users_by_registration_method`.
    #[serde(default = "default_registration_methods")]
    pub registration_methods: Vec<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn api_timeout(&self) -> Duration {
        Duration::from_secs(self.api_timeout_secs)
    }
}

fn default_api_timeout_secs() -> u64 {
    30
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_poll_interval_secs() -> u64 {
    10
}

fn default_registration_methods() -> Vec<String> {
    vec![
        "default".to_string(),
        "saml2".to_string(),
        "eduteams".to_string(),
    ]
}

/// Keys whose environment value is taken verbatim instead of being parsed
/// into a number or boolean, e.g. a token made only of digits.
const VERBATIM_ENV_KEYS: &[&str] = &["api_url", "api_token"];

/// Layers the optional YAML file at `path` under the `WALDUR_*` environment.
pub fn figment(path: &str) -> Figment {
    let mut figment = Figment::new()
        .merge(Yaml::file(path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"));
    for key in VERBATIM_ENV_KEYS {
        let var = format!("{}{}", ENV_PREFIX, key.to_uppercase());
        if let Ok(value) = std::env::var(&var) {
            figment = figment.merge(Serialized::default(key, value));
        }
    }
    figment
}

/// Load the config from `./config.yaml` (or `$WALDUR_EXPORTER_CONFIG`) and the environment.
///
/// Fails when `WALDUR_API_URL` or `WALDUR_API_TOKEN` is not set anywhere.
pub fn load_config() -> Result<Config, figment::Error> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    figment(&path).extract()
}

/// Render the JSON schema for the configuration.
pub fn config_schema() -> Result<String, serde_json::Error> {
    let schema = schema_for!(Config);
    serde_json::to_string_pretty(&schema)
}
