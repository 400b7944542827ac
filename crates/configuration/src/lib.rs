use crate::error::ConfigError;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod analysis_config;
pub mod error;

// Re-export the core types to provide a clean public API.
pub use analysis_config::{
    AnalysisConfig, Filters, MetricSpec, MissingMetricPolicy, Normalization, Objective,
    RankingSettings, SensitivityAggregate, SensitivitySettings, SuggestionSettings,
};

/// Prefix for environment overrides, e.g. `PASSLENS__FILTERS__MIN_TOTAL_TRADES=20`.
pub const ENV_PREFIX: &str = "PASSLENS";

/// Loads the analysis configuration from a TOML file.
///
/// The file is layered under environment overrides, deserialized into the
/// strongly-typed `AnalysisConfig` and validated before it is returned.
pub fn load_analysis_config(path: &Path) -> Result<AnalysisConfig, ConfigError> {
    tracing::debug!(path = %path.display(), "Loading analysis configuration");
    let builder = config::Config::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Toml))
        .add_source(environment());
    finish(builder)
}

/// Parses the analysis configuration from TOML text, with the same
/// environment overrides and validation as `load_analysis_config`.
pub fn analysis_config_from_toml(contents: &str) -> Result<AnalysisConfig, ConfigError> {
    let builder = config::Config::builder()
        .add_source(config::File::from_str(contents, config::FileFormat::Toml))
        .add_source(environment());
    finish(builder)
}

fn environment() -> config::Environment {
    config::Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("__")
        .separator("__")
        .try_parsing(true)
}

fn finish(
    builder: config::ConfigBuilder<config::builder::DefaultState>,
) -> Result<AnalysisConfig, ConfigError> {
    // Attempt to deserialize the entire configuration into our `AnalysisConfig` struct
    let config = builder.build()?.try_deserialize::<AnalysisConfig>()?;
    config.validate()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::Direction;
    use std::io::Write;

    const SAMPLE: &str = r#"
missing_metric_policy = "exclude"

[[metrics]]
metric = "Profit"
weight = 1.0

[[metrics]]
metric = "Equity DD %"
weight = 0.5
direction = "lower-is-better"
normalization = "z-score"

[[objectives]]
metric = "Profit"

[[objectives]]
metric = "Equity DD %"
direction = "lower-is-better"

[filters]
min_total_trades = 20

[sensitivity]
aggregate = "median"
"#;

    #[test]
    fn parses_toml_and_fills_missing_sections() {
        let config = analysis_config_from_toml(SAMPLE).unwrap();
        assert_eq!(config.metrics.len(), 2);
        assert_eq!(config.metrics[0].direction, Direction::HigherIsBetter);
        assert_eq!(config.metrics[0].normalization, Normalization::MinMax);
        assert_eq!(config.metrics[1].direction, Direction::LowerIsBetter);
        assert_eq!(config.metrics[1].normalization, Normalization::ZScore);
        assert_eq!(config.objectives[1].direction, Direction::LowerIsBetter);
        assert_eq!(config.missing_metric_policy, MissingMetricPolicy::Exclude);
        assert_eq!(config.filters.min_total_trades, 20);
        assert_eq!(config.filters.trades_metric, "Trades");
        assert_eq!(config.sensitivity.aggregate, SensitivityAggregate::Median);
        assert_eq!(config.suggestions, SuggestionSettings::default());
    }

    #[test]
    fn empty_file_yields_defaults() {
        let config = analysis_config_from_toml("").unwrap();
        assert_eq!(config.metrics, AnalysisConfig::default().metrics);
    }

    #[test]
    fn loads_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let config = load_analysis_config(file.path()).unwrap();
        assert_eq!(config.metrics[1].metric, "Equity DD %");
    }

    #[test]
    fn environment_overrides_file_values() {
        let vars: config::Map<String, String> = [
            ("PASSLENS__FILTERS__MIN_TOTAL_TRADES", "7"),
            ("PASSLENS__SENSITIVITY__AGGREGATE", "mean"),
            ("OTHER__FILTERS__MIN_TOTAL_TRADES", "99"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
        let builder = config::Config::builder()
            .add_source(config::File::from_str(SAMPLE, config::FileFormat::Toml))
            .add_source(environment().source(Some(vars)));

        let config = finish(builder).unwrap();
        assert_eq!(config.filters.min_total_trades, 7);
        assert_eq!(config.sensitivity.aggregate, SensitivityAggregate::Mean);
        // Untouched keys keep their file values.
        assert_eq!(config.missing_metric_policy, MissingMetricPolicy::Exclude);
    }

    #[test]
    fn invalid_weights_fail_validation() {
        let toml = r#"
[[metrics]]
metric = "Profit"
weight = 0.0
"#;
        let err = analysis_config_from_toml(toml).unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }
}
