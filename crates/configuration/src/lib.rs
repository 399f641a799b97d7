use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_logging;
pub use settings::{
    Config, EngineSettings, LoggingSettings, ProviderSettings, DEFAULT_EXPOSURE_TOLERANCE,
};

/// Prefix for environment overrides, e.g. `EXANTE__ENGINE__WEIGHT_POLICY=fully_invested`.
const ENV_PREFIX: &str = "EXANTE";

/// Loads the application configuration from a TOML file, overlaid with
/// `EXANTE__*` environment variables.
///
/// A missing file is not an error: every section falls back to its defaults.
pub fn load_config(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from(path.as_ref()).required(false))
        .add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    finish(builder)
}

/// Parses configuration from an in-memory TOML document, without environment overrides.
pub fn load_config_from_str(toml: &str) -> Result<Config, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?;

    finish(builder)
}

fn finish(builder: config::Config) -> Result<Config, ConfigError> {
    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::WeightPolicy;

    #[test]
    fn empty_document_uses_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.engine.weight_policy, WeightPolicy::NoLeverage);
        assert_eq!(config.engine.exposure_tolerance, DEFAULT_EXPOSURE_TOLERANCE);
        assert_eq!(config.provider.interval, "1d");
        assert!(config.provider.adjusted);
        assert!(config.logging.directory.is_none());
    }

    #[test]
    fn sections_override_defaults() {
        let config = load_config_from_str(
            r#"
            [engine]
            weight_policy = "fully_invested"
            exposure_tolerance = 0.0001

            [provider]
            interval = "1wk"
            adjusted = false

            [logging]
            level = "debug"
            directory = "logs"
            "#,
        )
        .unwrap();

        assert_eq!(config.engine.weight_policy, WeightPolicy::FullyInvested);
        assert_eq!(config.engine.exposure_tolerance, 0.0001);
        assert_eq!(config.provider.interval, "1wk");
        assert!(!config.provider.adjusted);
        assert_eq!(config.provider.base_url, "https://query1.finance.yahoo.com");
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.logging.directory.as_deref(), Some(Path::new("logs")));
    }

    #[test]
    fn negative_tolerance_is_rejected() {
        let err = load_config_from_str("[engine]\nexposure_tolerance = -0.5\n").unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn unknown_policy_fails_to_load() {
        let err = load_config_from_str("[engine]\nweight_policy = \"levered\"\n").unwrap_err();
        assert!(matches!(err, ConfigError::LoadError(_)));
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let config = load_config("definitely-not-here.toml").unwrap();
        assert_eq!(config.engine.exposure_tolerance, DEFAULT_EXPOSURE_TOLERANCE);
    }
}
