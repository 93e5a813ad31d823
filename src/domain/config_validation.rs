//! Configuration validation.
//!
//! Validates all config fields before a run starts.

use crate::domain::error::FvgError;
use crate::domain::registry::{DEFAULT_PRUNE_RETAIN, DEFAULT_PRUNE_THRESHOLD};
use crate::domain::trend::{DEFAULT_FAST_PERIOD, DEFAULT_SLOW_PERIOD};
use crate::ports::config_port::ConfigPort;
use chrono::NaiveDate;

pub const DATA_SOURCES: &[&str] = &["csv", "sqlite"];

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), FvgError> {
    validate_periods(config)?;
    validate_prune_limits(config)?;
    Ok(())
}

pub fn validate_market_config(config: &dyn ConfigPort) -> Result<(), FvgError> {
    validate_required(config, "market", "exchange")?;
    validate_required(config, "market", "symbol")?;
    validate_dates(config)?;
    Ok(())
}

pub fn validate_data_config(config: &dyn ConfigPort) -> Result<(), FvgError> {
    let source = config
        .get_string("data", "source")
        .unwrap_or_else(|| "csv".to_string());
    let source = source.trim().to_lowercase();

    if !DATA_SOURCES.contains(&source.as_str()) {
        return Err(FvgError::ConfigInvalid {
            section: "data".to_string(),
            key: "source".to_string(),
            reason: format!("unknown source '{}', expected one of: {}", source, DATA_SOURCES.join(", ")),
        });
    }

    match source.as_str() {
        "csv" => validate_required(config, "data", "csv_dir"),
        _ => validate_required(config, "sqlite", "path"),
    }
}

fn validate_periods(config: &dyn ConfigPort) -> Result<(), FvgError> {
    let fast = config.get_int("engine", "fast_period", DEFAULT_FAST_PERIOD as i64);
    let slow = config.get_int("engine", "slow_period", DEFAULT_SLOW_PERIOD as i64);

    if fast < 1 {
        return Err(FvgError::ConfigInvalid {
            section: "engine".to_string(),
            key: "fast_period".to_string(),
            reason: "fast_period must be at least 1".to_string(),
        });
    }
    if slow < 1 {
        return Err(FvgError::ConfigInvalid {
            section: "engine".to_string(),
            key: "slow_period".to_string(),
            reason: "slow_period must be at least 1".to_string(),
        });
    }
    if fast >= slow {
        return Err(FvgError::ConfigInvalid {
            section: "engine".to_string(),
            key: "fast_period".to_string(),
            reason: "fast_period must be shorter than slow_period".to_string(),
        });
    }
    Ok(())
}

fn validate_prune_limits(config: &dyn ConfigPort) -> Result<(), FvgError> {
    let threshold = config.get_int("engine", "prune_threshold", DEFAULT_PRUNE_THRESHOLD as i64);
    let retain = config.get_int("engine", "prune_retain", DEFAULT_PRUNE_RETAIN as i64);

    if threshold < 1 {
        return Err(FvgError::ConfigInvalid {
            section: "engine".to_string(),
            key: "prune_threshold".to_string(),
            reason: "prune_threshold must be at least 1".to_string(),
        });
    }
    if retain < 1 || retain > threshold {
        return Err(FvgError::ConfigInvalid {
            section: "engine".to_string(),
            key: "prune_retain".to_string(),
            reason: "prune_retain must be between 1 and prune_threshold".to_string(),
        });
    }
    Ok(())
}

fn validate_required(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), FvgError> {
    match config.get_string(section, key) {
        Some(s) if !s.trim().is_empty() => Ok(()),
        _ => Err(FvgError::ConfigMissing {
            section: section.to_string(),
            key: key.to_string(),
        }),
    }
}

/// End date is inclusive, so a single-day range is allowed.
pub fn validate_dates(config: &dyn ConfigPort) -> Result<(), FvgError> {
    let start = parse_date(config.get_string("market", "start_date").as_deref(), "start_date")?;
    let end = parse_date(config.get_string("market", "end_date").as_deref(), "end_date")?;

    if let (Some(start), Some(end)) = (start, end) {
        if start > end {
            return Err(FvgError::ConfigInvalid {
                section: "market".to_string(),
                key: "start_date".to_string(),
                reason: "start_date must not be after end_date".to_string(),
            });
        }
    }
    Ok(())
}

/// Dates are optional; a present date must be YYYY-MM-DD.
pub fn parse_date(value: Option<&str>, field: &str) -> Result<Option<NaiveDate>, FvgError> {
    match value.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(|_| FvgError::ConfigInvalid {
                section: "market".to_string(),
                key: field.to_string(),
                reason: format!("invalid {} format, expected YYYY-MM-DD", field),
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;

    fn make_config(content: &str) -> FileConfigAdapter {
        FileConfigAdapter::from_string(content).unwrap()
    }

    #[test]
    fn defaults_pass_engine_validation() {
        let config = make_config("[engine]\n");
        assert!(validate_engine_config(&config).is_ok());
    }

    #[test]
    fn valid_engine_config_passes() {
        let config = make_config(
            r#"
[engine]
fast_period = 5
slow_period = 20
prune_threshold = 200
prune_retain = 100
"#,
        );
        assert!(validate_engine_config(&config).is_ok());
    }

    #[test]
    fn fast_period_zero_fails() {
        let config = make_config("[engine]\nfast_period = 0\n");
        let err = validate_engine_config(&config).unwrap_err();
        assert!(matches!(err, FvgError::ConfigInvalid { key, .. } if key == "fast_period"));
    }

    #[test]
    fn slow_period_zero_fails() {
        let config = make_config("[engine]\nfast_period = 1\nslow_period = 0\n");
        let err = validate_engine_config(&config).unwrap_err();
        assert!(matches!(err, FvgError::ConfigInvalid { key, .. } if key == "slow_period"));
    }

    #[test]
    fn fast_not_shorter_than_slow_fails() {
        let config = make_config("[engine]\nfast_period = 21\nslow_period = 21\n");
        let err = validate_engine_config(&config).unwrap_err();
        assert!(matches!(err, FvgError::ConfigInvalid { key, .. } if key == "fast_period"));
    }

    #[test]
    fn retain_above_threshold_fails() {
        let config = make_config("[engine]\nprune_threshold = 10\nprune_retain = 11\n");
        let err = validate_engine_config(&config).unwrap_err();
        assert!(matches!(err, FvgError::ConfigInvalid { key, .. } if key == "prune_retain"));
    }

    #[test]
    fn retain_zero_fails() {
        let config = make_config("[engine]\nprune_retain = 0\n");
        let err = validate_engine_config(&config).unwrap_err();
        assert!(matches!(err, FvgError::ConfigInvalid { key, .. } if key == "prune_retain"));
    }

    #[test]
    fn threshold_zero_fails() {
        let config = make_config("[engine]\nprune_threshold = 0\n");
        let err = validate_engine_config(&config).unwrap_err();
        assert!(matches!(err, FvgError::ConfigInvalid { key, .. } if key == "prune_threshold"));
    }

    #[test]
    fn valid_market_config_passes() {
        let config = make_config(
            "[market]\nexchange = Binance\nsymbol = BTC-USDT\nstart_date = 2026-01-01\nend_date = 2026-02-01\n",
        );
        assert!(validate_market_config(&config).is_ok());
    }

    #[test]
    fn market_dates_are_optional() {
        let config = make_config("[market]\nexchange = Binance\nsymbol = BTC-USDT\n");
        assert!(validate_market_config(&config).is_ok());
    }

    #[test]
    fn missing_symbol_fails() {
        let config = make_config("[market]\nexchange = Binance\n");
        let err = validate_market_config(&config).unwrap_err();
        assert!(matches!(err, FvgError::ConfigMissing { key, .. } if key == "symbol"));
    }

    #[test]
    fn missing_exchange_fails() {
        let config = make_config("[market]\nsymbol = BTC-USDT\n");
        let err = validate_market_config(&config).unwrap_err();
        assert!(matches!(err, FvgError::ConfigMissing { key, .. } if key == "exchange"));
    }

    #[test]
    fn invalid_date_format_fails() {
        let config = make_config(
            "[market]\nexchange = Binance\nsymbol = BTC-USDT\nstart_date = 2026/01/01\n",
        );
        let err = validate_market_config(&config).unwrap_err();
        assert!(matches!(err, FvgError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn start_after_end_fails() {
        let config = make_config(
            "[market]\nexchange = Binance\nsymbol = BTC-USDT\nstart_date = 2026-03-01\nend_date = 2026-01-01\n",
        );
        let err = validate_market_config(&config).unwrap_err();
        assert!(matches!(err, FvgError::ConfigInvalid { key, .. } if key == "start_date"));
    }

    #[test]
    fn csv_source_requires_dir() {
        let config = make_config("[data]\nsource = csv\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, FvgError::ConfigMissing { key, .. } if key == "csv_dir"));

        let config = make_config("[data]\nsource = csv\ncsv_dir = /tmp/candles\n");
        assert!(validate_data_config(&config).is_ok());
    }

    #[test]
    fn sqlite_source_requires_path() {
        let config = make_config("[data]\nsource = sqlite\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(
            matches!(err, FvgError::ConfigMissing { section, key } if section == "sqlite" && key == "path")
        );
    }

    #[test]
    fn unknown_source_fails() {
        let config = make_config("[data]\nsource = parquet\n");
        let err = validate_data_config(&config).unwrap_err();
        assert!(matches!(err, FvgError::ConfigInvalid { key, .. } if key == "source"));
    }
}
