//! Configuration Loader
//!
//! Environment-aware loading on top of the `config` crate. Sources are
//! layered in increasing priority:
//!
//! 1. built-in defaults ([`ShiguConfig::default`])
//! 2. `{config_dir}/shigu.toml`
//! 3. `{config_dir}/shigu.{environment}.toml`
//! 4. `SHIGU__SECTION__KEY` environment variables
//!
//! Missing files are skipped; an unreadable or malformed file is an error.

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use config::{Config, Environment, File};
use tracing::{debug, info};

use super::error::{ConfigResult, ConfigurationError};
use super::ShiguConfig;
use crate::constants::system::ENV_PREFIX;

#[derive(Debug)]
pub struct ConfigManager {
    config: ShiguConfig,
    environment: String,
    config_directory: PathBuf,
}

impl ConfigManager {
    /// Load configuration with environment auto-detection
    pub fn load() -> ConfigResult<Arc<ConfigManager>> {
        Self::load_from_directory(None)
    }

    pub fn load_from_directory(config_dir: Option<PathBuf>) -> ConfigResult<Arc<ConfigManager>> {
        let environment = Self::detect_environment();
        Self::load_from_directory_with_env(config_dir, &environment)
    }

    /// Load from a directory with an explicit environment, reading overrides
    /// from the process environment
    pub fn load_from_directory_with_env(
        config_dir: Option<PathBuf>,
        environment: &str,
    ) -> ConfigResult<Arc<ConfigManager>> {
        Self::load_with_overrides(config_dir, environment, None)
    }

    /// Like [`load_from_directory_with_env`](Self::load_from_directory_with_env)
    /// but takes the `SHIGU__*` variables from `env_overrides` instead of the
    /// process environment when given. Useful in tests.
    pub fn load_with_overrides(
        config_dir: Option<PathBuf>,
        environment: &str,
        env_overrides: Option<HashMap<String, String>>,
    ) -> ConfigResult<Arc<ConfigManager>> {
        let config_directory = config_dir.unwrap_or_else(Self::default_config_directory);

        debug!(
            environment = environment,
            directory = %config_directory.display(),
            "Loading configuration"
        );

        let config = Self::build(&config_directory, environment, env_overrides)?;
        config.validate()?;

        info!(
            environment = environment,
            backend = ?config.database.backend,
            bind_address = %config.server.bind_address,
            step = config.sequencing.step,
            rebalance_window = config.sequencing.rebalance_window,
            "Configuration loaded successfully"
        );

        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory,
        }))
    }

    /// Wrap an already built configuration after validating it
    pub fn from_config(config: ShiguConfig, environment: &str) -> ConfigResult<Arc<ConfigManager>> {
        config.validate()?;
        Ok(Arc::new(ConfigManager {
            config,
            environment: environment.to_string(),
            config_directory: Self::default_config_directory(),
        }))
    }

    fn build(
        config_directory: &Path,
        environment: &str,
        env_overrides: Option<HashMap<String, String>>,
    ) -> ConfigResult<ShiguConfig> {
        let to_error = |e: config::ConfigError| ConfigurationError::load_error(environment, e);

        let defaults = Config::try_from(&ShiguConfig::default()).map_err(to_error)?;
        let base_file = config_directory.join("shigu.toml");
        let env_file = config_directory.join(format!("shigu.{environment}.toml"));

        for path in [&base_file, &env_file] {
            if path.is_file() {
                debug!(file = %path.display(), "Applying configuration file");
            }
        }

        Config::builder()
            .add_source(defaults)
            .add_source(File::from(base_file).required(false))
            .add_source(File::from(env_file).required(false))
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true)
                    .source(env_overrides),
            )
            .build()
            .map_err(to_error)?
            .try_deserialize::<ShiguConfig>()
            .map_err(to_error)
    }

    pub fn config(&self) -> &ShiguConfig {
        &self.config
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn config_directory(&self) -> &Path {
        &self.config_directory
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// `SHIGU_ENV`, then `APP_ENV`, defaulting to `development`
    pub fn detect_environment() -> String {
        env::var("SHIGU_ENV")
            .or_else(|_| env::var("APP_ENV"))
            .unwrap_or_else(|_| "development".to_string())
            .to_lowercase()
    }

    /// `SHIGU_CONFIG_DIR` when set, otherwise `./config`
    fn default_config_directory() -> PathBuf {
        env::var("SHIGU_CONFIG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("config"))
    }
}
