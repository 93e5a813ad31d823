//! SQLite candle store adapter.
//!
//! Table `candle`, one row per (exchange, symbol, timeframe, timestamp).

use crate::domain::candle::{Candle, MarketKey};
use crate::domain::error::FvgError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;

pub struct SqliteAdapter {
    pool: Pool<SqliteConnectionManager>,
}

fn query_err(e: rusqlite::Error) -> FvgError {
    FvgError::DatabaseQuery {
        reason: e.to_string(),
    }
}

impl SqliteAdapter {
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, FvgError> {
        let db_path =
            config
                .get_non_empty("sqlite", "path")
                .ok_or_else(|| FvgError::ConfigMissing {
                    section: "sqlite".into(),
                    key: "path".into(),
                })?;

        let pool_size = config.get_int("sqlite", "pool_size", 4).max(1) as u32;

        let manager = SqliteConnectionManager::file(&db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(|e: r2d2::Error| FvgError::Database {
                reason: e.to_string(),
            })?;

        tracing::info!(path = %db_path, pool_size, "opened sqlite candle store");
        Ok(Self { pool })
    }

    pub fn in_memory() -> Result<Self, FvgError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(|e: r2d2::Error| FvgError::Database {
                reason: e.to_string(),
            })?;

        Ok(Self { pool })
    }

    fn conn(&self) -> Result<PooledConnection<SqliteConnectionManager>, FvgError> {
        self.pool.get().map_err(|e: r2d2::Error| FvgError::Database {
            reason: e.to_string(),
        })
    }

    pub fn initialize_schema(&self) -> Result<(), FvgError> {
        self.conn()?
            .execute_batch(
                "CREATE TABLE IF NOT EXISTS candle (
                    exchange TEXT NOT NULL,
                    symbol TEXT NOT NULL,
                    timeframe TEXT NOT NULL,
                    timestamp INTEGER NOT NULL,
                    open REAL NOT NULL,
                    high REAL NOT NULL,
                    low REAL NOT NULL,
                    close REAL NOT NULL,
                    volume REAL NOT NULL,
                    PRIMARY KEY (exchange, symbol, timeframe, timestamp)
                );
                CREATE INDEX IF NOT EXISTS idx_candle_exchange ON candle(exchange);",
            )
            .map_err(query_err)
    }

    /// Existing rows win; returns how many candles were actually inserted.
    pub fn insert_candles(&self, key: &MarketKey, candles: &[Candle]) -> Result<usize, FvgError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction().map_err(query_err)?;

        let mut inserted = 0;
        for candle in candles {
            inserted += tx
                .execute(
                    "INSERT INTO candle
                        (exchange, symbol, timeframe, timestamp, open, high, low, close, volume)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                     ON CONFLICT (exchange, symbol, timeframe, timestamp) DO NOTHING",
                    params![
                        key.exchange,
                        key.symbol,
                        key.timeframe,
                        candle.timestamp,
                        candle.open,
                        candle.high,
                        candle.low,
                        candle.close,
                        candle.volume
                    ],
                )
                .map_err(query_err)?;
        }

        tx.commit().map_err(query_err)?;
        Ok(inserted)
    }
}

impl DataPort for SqliteAdapter {
    fn fetch_candles(
        &self,
        key: &MarketKey,
        start_ms: i64,
        end_ms: i64,
    ) -> Result<Vec<Candle>, FvgError> {
        let conn = self.conn()?;

        let query = "SELECT timestamp, open, high, low, close, volume
                     FROM candle
                     WHERE exchange = ?1 AND symbol = ?2 AND timeframe = ?3
                       AND timestamp >= ?4 AND timestamp <= ?5
                     ORDER BY timestamp ASC";

        let mut stmt = conn.prepare(query).map_err(query_err)?;

        let rows = stmt
            .query_map(
                params![key.exchange, key.symbol, key.timeframe, start_ms, end_ms],
                |row| {
                    Ok(Candle {
                        timestamp: row.get(0)?,
                        open: row.get(1)?,
                        high: row.get(2)?,
                        low: row.get(3)?,
                        close: row.get(4)?,
                        volume: row.get(5)?,
                    })
                },
            )
            .map_err(query_err)?;

        rows.collect::<Result<Vec<_>, _>>().map_err(query_err)
    }

    fn list_symbols(&self, exchange: &str) -> Result<Vec<String>, FvgError> {
        let conn = self.conn()?;

        let mut stmt = conn
            .prepare("SELECT DISTINCT symbol FROM candle WHERE exchange = ?1 ORDER BY symbol")
            .map_err(query_err)?;

        let rows = stmt
            .query_map(params![exchange], |row| row.get(0))
            .map_err(query_err)?;

        rows.collect::<Result<Vec<String>, _>>().map_err(query_err)
    }

    fn get_data_range(&self, key: &MarketKey) -> Result<Option<(i64, i64, usize)>, FvgError> {
        let conn = self.conn()?;

        let query = "SELECT MIN(timestamp), MAX(timestamp), COUNT(*) FROM candle
                     WHERE exchange = ?1 AND symbol = ?2 AND timeframe = ?3";

        let result: (Option<i64>, Option<i64>, i64) = conn
            .query_row(
                query,
                params![key.exchange, key.symbol, key.timeframe],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .map_err(query_err)?;

        match result {
            (Some(first), Some(last), count) if count > 0 => {
                Ok(Some((first, last, count as usize)))
            }
            _ => Ok(None),
        }
    }
}
