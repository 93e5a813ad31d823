//! Market-data access port trait.

use crate::domain::candle::{Candle, MarketKey};
use crate::domain::error::FvgError;

pub trait DataPort {
    /// Candles for `key` with `start_ms <= timestamp <= end_ms`, oldest first.
    fn fetch_candles(
        &self,
        key: &MarketKey,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Candle>, FvgError>;

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, FvgError>;

    /// First timestamp, last timestamp and candle count, if any data exists.
    fn get_data_range(&self, key: &MarketKey) -> Result<Option<(i64, i64, usize)>, FvgError>;
}
