//! Tries to create an `AppConfig` from config files and the environment.
//! Layers `config/base.toml`, `config/{environment}.toml` and `APP_` prefixed env variables.
//! Gets initialized with `OnceLock` so it only needs to get initialized once.

mod error;
mod structs;

use std::sync::OnceLock;

use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use secrecy::SecretString;
use tracing::info;

// Re-export config structs
pub use error::{ConfigError, ConfigResult};
pub use structs::{AppConfig, Environment, NetConfig, StoreConfig};

/// The env variable holding the JSON encoded service account key.
pub const SERVICE_ACCOUNT_KEY_ENV: &str = "FIREBASE_SERVICE_ACCOUNT_KEY";

/// Allocates a static `OnceLock` containing `AppConfig`.
/// This ensures configuration only gets initialized the first time we call this function.
/// Every other caller gets a &'static ref to AppConfig.
/// Panics if anything goes wrong.
pub fn get_or_init_config() -> &'static AppConfig {
    static CONFIG_INIT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG_INIT.get_or_init(|| {
        info!(
            "{:<20} - Initializing the configuration",
            "get_or_init_config"
        );
        let environment: Environment = std::env::var("APP_ENVIRONMENT")
            .unwrap_or_else(|_| "local".into())
            .try_into()
            .unwrap_or_else(|er| panic!("Fatal Error: Parsing APP_ENVIRONMENT: {er}"));

        let base_path = std::env::current_dir()
            .unwrap_or_else(|er| panic!("Fatal Error: Determining the current DIR: {er}"));

        let mut config = AppConfig::load(&base_path.join("config"), &environment)
            .unwrap_or_else(|er| panic!("Fatal Error: Building config: {er}"));

        config.service_account_key = service_account_key_from_env();
        if config.service_account_key.is_none() {
            tracing::warn!(
                "{:<20} - {SERVICE_ACCOUNT_KEY_ENV} is not set, writes will be rejected",
                "get_or_init_config"
            );
        }

        config
    })
}

impl AppConfig {
    /// Builds the config from `{config_dir}/base.toml`, `{config_dir}/{environment}.toml`
    /// and the `APP_` prefixed env variables, in that order of precedence.
    /// Nested keys in env variables are separated with `__`.
    pub fn load(config_dir: &std::path::Path, environment: &Environment) -> ConfigResult<Self> {
        let environment_filename = format!("{}.toml", environment.as_ref().to_lowercase());

        let config = Figment::new()
            .merge(Toml::file(config_dir.join("base.toml")))
            .merge(Toml::file(config_dir.join(environment_filename)))
            .merge(Env::prefixed("APP_").ignore(&["ENVIRONMENT"]).split("__"))
            .extract()?;

        Ok(config)
    }
}

/// The key is a JSON blob, so it is read raw instead of through `figment`,
/// which would try to parse it into a dictionary.
fn service_account_key_from_env() -> Option<SecretString> {
    std::env::var(SERVICE_ACCOUNT_KEY_ENV)
        .ok()
        .filter(|key| !key.trim().is_empty())
        .map(SecretString::from)
}
