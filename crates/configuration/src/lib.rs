use crate::error::ConfigError;
use crate::settings::Config;
use std::path::Path;

// Declare the modules that make up this crate.
pub mod error;
pub mod logging;
pub mod optimizer_config;
pub mod settings;

// Re-export the core types to provide a clean public API.
pub use logging::init_tracing;
pub use optimizer_config::OptimizerConfig;
pub use settings::{Backtest, CbsSettings, Filter, Logging, Storage, Strategies};

/// Prefix of environment variables that override file settings,
/// e.g. `ADVISER__BACKTEST__FROM`.
const ENV_PREFIX: &str = "ADVISER";

/// Loads the application configuration.
///
/// Reads `path` (or `config.toml` in the working directory when `None`), then
/// layers `ADVISER__*` environment variables on top. A `.env` file, when
/// present, is loaded into the environment first. The result is validated
/// before it is returned.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();

    let file = match path {
        Some(path) => config::File::from(path),
        None => config::File::with_name("config.toml"),
    };

    let builder = config::Config::builder()
        .add_source(file)
        .add_source(config::Environment::with_prefix(ENV_PREFIX).separator("__"))
        .build()?;

    // Attempt to deserialize the entire configuration into our `Config` struct
    let config = builder.try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

/// Parses and validates a configuration held in memory as TOML text.
pub fn parse_config(toml: &str) -> Result<Config, ConfigError> {
    let config = config::Config::builder()
        .add_source(config::File::from_str(toml, config::FileFormat::Toml))
        .build()?
        .try_deserialize::<Config>()?;
    config.validate()?;

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::StrategyId;
    use rust_decimal_macros::dec;

    const MINIMAL: &str = r#"
        [backtest]
        from = "2021-01-04T00:00:00Z"
        to = "2021-02-01T00:00:00Z"

        [storage]
        params_path = "data/params"
        advices_path = "data/advices"
        candles_path = "data/candles"

        [[instruments]]
        id = 1
        symbol = "AAPL"
        name = "Apple"
    "#;

    #[test]
    fn minimal_config_gets_defaults() {
        let config = parse_config(MINIMAL).unwrap();
        assert_eq!(config.backtest.max_expiration_hours, 720);
        assert_eq!(config.backtest.channel_capacity, 256);
        assert!(config.filter.enabled);
        assert_eq!(config.filter.trading_start_hour, 1);
        assert_eq!(config.filter.trading_end_hour, 21);
        assert_eq!(config.instruments.len(), 1);
        assert_eq!(config.instruments[0].symbol, "AAPL");
        assert_eq!(config.optimizer.strategy, StrategyId::CbsScaled);
        assert_eq!(config.optimizer.rate, dec!(1));
        assert!(config.strategies.cbs.stability_window.is_none());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn optimizer_section_is_read() {
        let toml = format!(
            "{MINIMAL}\n[optimizer]\nstrategy = \"ft\"\nrate = \"0.25\"\nmin_frequency = \"5\"\n"
        );
        let config = parse_config(&toml).unwrap();
        assert_eq!(config.optimizer.strategy, StrategyId::Ft);
        assert_eq!(config.optimizer.rate, dec!(0.25));
        assert_eq!(config.optimizer.min_frequency, dec!(5));
    }

    #[test]
    fn inverted_period_is_rejected() {
        let toml = MINIMAL.replace("2021-02-01", "2020-12-01");
        assert!(matches!(parse_config(&toml), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn out_of_range_rate_is_rejected() {
        let toml = format!("{MINIMAL}\n[optimizer]\nrate = \"1.5\"\n");
        assert!(matches!(parse_config(&toml), Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn mismatched_bounds_are_rejected() {
        let toml = format!(
            "{MINIMAL}\n[optimizer]\nmin_params = [\"1\", \"2\"]\nmax_params = [\"3\"]\n"
        );
        assert!(matches!(parse_config(&toml), Err(ConfigError::ValidationError(_))));
    }
}
