//! CSV file data adapter.
//!
//! One file per stream: `{base}/{exchange}_{symbol}_{timeframe}.csv` with a
//! `timestamp,open,high,low,close,volume` header and millisecond timestamps.

use crate::domain::candle::{Candle, MarketKey};
use crate::domain::error::FvgError;
use crate::ports::data_port::DataPort;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    fn csv_path(&self, key: &MarketKey) -> PathBuf {
        self.base_path
            .join(format!("{}_{}_{}.csv", key.exchange, key.symbol, key.timeframe))
    }

    fn read_all(&self, key: &MarketKey) -> Result<Vec<Candle>, FvgError> {
        let path = self.csv_path(key);
        let content = fs::read_to_string(&path).map_err(|e| FvgError::Database {
            reason: format!("failed to read {}: {}", path.display(), e),
        })?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut candles = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| FvgError::Database {
                reason: format!("CSV parse error: {}", e),
            })?;

            candles.push(Candle {
                timestamp: parse_field(&record, 0, "timestamp")?,
                open: parse_price(&record, 1, "open")?,
                high: parse_price(&record, 2, "high")?,
                low: parse_price(&record, 3, "low")?,
                close: parse_price(&record, 4, "close")?,
                volume: parse_price(&record, 5, "volume")?,
            });
        }

        candles.sort_by_key(|c| c.timestamp);
        Ok(candles)
    }
}

/// `NaN` and infinities parse as `f64` but would poison the averages.
fn parse_price(record: &csv::StringRecord, index: usize, name: &str) -> Result<f64, FvgError> {
    let value: f64 = parse_field(record, index, name)?;
    if !value.is_finite() {
        return Err(FvgError::Database {
            reason: format!("invalid {} value: {} is not finite", name, value),
        });
    }
    Ok(value)
}

fn parse_field<T>(record: &csv::StringRecord, index: usize, name: &str) -> Result<T, FvgError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    record
        .get(index)
        .ok_or_else(|| FvgError::Database {
            reason: format!("missing {} column", name),
        })?
        .trim()
        .parse()
        .map_err(|e| FvgError::Database {
            reason: format!("invalid {} value: {}", name, e),
        })
}

impl DataPort for CsvAdapter {
    fn fetch_candles(
        &self,
        key: &MarketKey,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Candle>, FvgError> {
        let mut candles = self.read_all(key)?;
        candles.retain(|c| c.timestamp >= start_ms && c.timestamp <= end_ms);
        Ok(candles)
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, FvgError> {
        let entries = fs::read_dir(&self.base_path).map_err(|e| FvgError::Database {
            reason: format!(
                "failed to read directory {}: {}",
                self.base_path.display(),
                e
            ),
        })?;

        let prefix = format!("{}_", exchange);
        let mut symbols = Vec::new();

        for entry in entries {
            let entry = entry.map_err(|e| FvgError::Database {
                reason: format!("directory entry error: {}", e),
            })?;

            let name = entry.file_name();
            let name_str = name.to_string_lossy();

            let Some(stem) = name_str
                .strip_prefix(&prefix)
                .and_then(|rest| rest.strip_suffix(".csv"))
            else {
                continue;
            };
            if let Some((symbol, _timeframe)) = stem.rsplit_once('_') {
                symbols.push(symbol.to_string());
            }
        }

        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    fn get_data_range(&self, key: &MarketKey) -> Result<Option<(i64, i64, usize)>, FvgError> {
        if !self.csv_path(key).exists() {
            return Ok(None);
        }
        let candles = self.read_all(key)?;
        match (candles.first(), candles.last()) {
            (Some(first), Some(last)) => {
                Ok(Some((first.timestamp, last.timestamp, candles.len())))
            }
            _ => Ok(None),
        }
    }
}
