#![allow(dead_code)]

use fvgtrader::domain::candle::{Candle, MarketKey};
use fvgtrader::domain::chart::ChartOutput;
use fvgtrader::domain::error::FvgError;
use fvgtrader::ports::chart_port::ChartPort;
use fvgtrader::ports::data_port::DataPort;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const MINUTE_MS: i64 = 60_000;

pub struct MockDataPort {
    pub data: HashMap<MarketKey, Vec<Candle>>,
    pub errors: HashMap<MarketKey, String>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
            errors: HashMap::new(),
        }
    }

    pub fn with_candles(mut self, key: &MarketKey, candles: Vec<Candle>) -> Self {
        self.data.insert(key.clone(), candles);
        self
    }

    pub fn with_error(mut self, key: &MarketKey, reason: &str) -> Self {
        self.errors.insert(key.clone(), reason.to_string());
        self
    }

    fn check_error(&self, key: &MarketKey) -> Result<(), FvgError> {
        match self.errors.get(key) {
            Some(reason) => Err(FvgError::Database {
                reason: reason.clone(),
            }),
            None => Ok(()),
        }
    }
}

impl DataPort for MockDataPort {
    fn fetch_candles(
        &self,
        key: &MarketKey,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Candle>, FvgError> {
        self.check_error(key)?;
        Ok(self
            .data
            .get(key)
            .map(|candles| {
                candles
                    .iter()
                    .filter(|c| c.timestamp >= start_ms && c.timestamp <= end_ms)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, FvgError> {
        let mut symbols: Vec<String> = self
            .data
            .keys()
            .filter(|k| k.exchange == exchange)
            .map(|k| k.symbol.clone())
            .collect();
        symbols.sort();
        symbols.dedup();
        Ok(symbols)
    }

    fn get_data_range(&self, key: &MarketKey) -> Result<Option<(i64, i64, usize)>, FvgError> {
        self.check_error(key)?;
        match self.data.get(key) {
            Some(candles) if !candles.is_empty() => {
                let first = candles.iter().map(|c| c.timestamp).min().unwrap();
                let last = candles.iter().map(|c| c.timestamp).max().unwrap();
                Ok(Some((first, last, candles.len())))
            }
            _ => Ok(None),
        }
    }
}

pub struct MockChartPort {
    pub calls: RefCell<Vec<(ChartOutput, PathBuf)>>,
}

impl MockChartPort {
    pub fn new() -> Self {
        Self {
            calls: RefCell::new(Vec::new()),
        }
    }
}

impl ChartPort for MockChartPort {
    fn write(&self, chart: &ChartOutput, output_path: &Path) -> Result<(), FvgError> {
        self.calls
            .borrow_mut()
            .push((chart.clone(), output_path.to_path_buf()));
        Ok(())
    }
}

pub fn make_candle(timestamp: i64, high: f64, low: f64, close: f64) -> Candle {
    Candle {
        timestamp,
        open: close,
        high,
        low,
        close,
        volume: 10.0,
    }
}

/// `count` one-minute candles, closes rising by `step` from `start_close`,
/// each spanning +/- 2 around its close. With `step > 4` every step leaves
/// a bullish gap behind it.
pub fn ramp(count: usize, start_close: f64, step: f64) -> Vec<Candle> {
    ramp_from(0, count, start_close, step)
}

pub fn ramp_from(first_index: usize, count: usize, start_close: f64, step: f64) -> Vec<Candle> {
    (0..count)
        .map(|i| {
            let close = start_close + step * i as f64;
            make_candle(
                (first_index + i) as i64 * MINUTE_MS,
                close + 2.0,
                close - 2.0,
                close,
            )
        })
        .collect()
}

pub fn write_csv(dir: &Path, key: &MarketKey, candles: &[Candle]) -> PathBuf {
    let path = dir.join(format!("{}_{}_{}.csv", key.exchange, key.symbol, key.timeframe));
    let mut content = String::from("timestamp,open,high,low,close,volume\n");
    for c in candles {
        content.push_str(&format!(
            "{},{},{},{},{},{}\n",
            c.timestamp, c.open, c.high, c.low, c.close, c.volume
        ));
    }
    fs::write(&path, content).unwrap();
    path
}

pub fn btc_key() -> MarketKey {
    MarketKey::new("Binance", "BTC-USDT", "1m")
}
