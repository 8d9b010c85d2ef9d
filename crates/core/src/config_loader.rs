use crate::config::AppConfig;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Toml},
    Figment,
};
use std::path::Path;

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads configuration by merging the default TOML file, `APP_` environment
    /// variables, and JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or fail validation.
    pub fn load() -> Result<AppConfig> {
        Self::load_from("config/Config.toml")
    }

    /// Loads configuration from a specific TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or fail validation.
    pub fn load_from(path: impl AsRef<Path>) -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("APP_").split("__"))
            .join(Json::file("config/Config.json"))
            .extract()
            .with_context(|| format!("Failed to load config from {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Loads configuration with a specific profile layered over the base file.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or fail validation.
    pub fn load_with_profile(profile: &str) -> Result<AppConfig> {
        let config: AppConfig = Figment::new()
            .merge(Toml::file("config/Config.toml"))
            .merge(Toml::file(format!("config/Config.{profile}.toml")))
            .merge(Env::prefixed("APP_").split("__"))
            .join(Json::file("config/Config.json"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SignalSource;
    use std::io::Write;

    #[test]
    fn missing_file_yields_defaults() {
        let config = ConfigLoader::load_from("does/not/exist.toml").unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn toml_overrides_weights_and_params() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[engine]
lookback_days = 45
weight_context = "crypto"

[engine.params]
mixed_threshold = 0.5

[weights]
version = "test"

[weights.default]
congress = 1.0
ark = 1.0
darkpool = 1.0
institutional = 1.0
insider = 2.0
short_interest = 1.0
superinvestor = 1.0

[weights.contexts.crypto]
ark = 3.0
"#
        )
        .unwrap();

        let config = ConfigLoader::load_from(file.path()).unwrap();
        assert_eq!(config.engine.lookback_days, 45);
        assert!((config.engine.params.mixed_threshold - 0.5).abs() < f64::EPSILON);
        assert!((config.engine.params.multiplier_cap - 1.5).abs() < f64::EPSILON);
        assert!((config.weights.weight(SignalSource::Ark, "crypto").unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn incomplete_weight_table_is_rejected() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            r#"
[weights]
version = "partial"

[weights.default]
congress = 1.0
"#
        )
        .unwrap();

        assert!(ConfigLoader::load_from(file.path()).is_err());
    }
}
