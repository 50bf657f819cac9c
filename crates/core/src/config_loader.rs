use crate::config::AppConfig;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};

/// Default location of the base configuration file.
pub const DEFAULT_CONFIG_PATH: &str = "config/Config.toml";

/// Prefix for environment overrides, e.g. `EXPIRY_STRATEGY__THRESHOLD=-200`.
pub const ENV_PREFIX: &str = "EXPIRY_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by merging defaults, TOML, environment variables, and JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load() -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH, None)
    }

    /// Loads configuration with a specific profile layered over the base file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        Self::load_from(DEFAULT_CONFIG_PATH, Some(profile))
    }

    /// Loads configuration from an explicit base file. A profile file named
    /// `Config.{profile}.toml` is looked up next to it.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be read or parsed, or if
    /// the merged values fail validation.
    pub fn load_from(path: &str, profile: Option<&str>) -> Result<AppConfig> {
        let mut figment = Figment::from(figment::providers::Serialized::defaults(
            AppConfig::default(),
        ))
        .merge(Toml::file(path));

        if let Some(profile) = profile {
            let dir = std::path::Path::new(path)
                .parent()
                .unwrap_or_else(|| std::path::Path::new("."));
            figment = figment.merge(Toml::file(dir.join(format!("Config.{profile}.toml"))));
        }

        let json_path = std::path::Path::new(path).with_extension("json");
        let config: AppConfig = figment
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .join(Json::file(json_path))
            .extract()?;

        config.validate()?;
        tracing::debug!(
            path,
            profile = profile.unwrap_or("default"),
            policy = ?config.strategy.ranking_policy,
            "Configuration loaded"
        );

        Ok(config)
    }
}
