//! Exponential Moving Average indicator.
//!
//! k = 2/(n+1), seed with first SMA, then EMA[i] = C[i]*k + EMA[i-1]*(1-k).
//! Warmup: first (n-1) candles are invalid.

use crate::domain::candle::Candle;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType};

pub fn calculate_ema(candles: &[Candle], period: usize) -> IndicatorSeries {
    let mut state = EmaState::new(period);
    let values = if period == 0 {
        Vec::new()
    } else {
        candles
            .iter()
            .map(|candle| match state.update(candle.close) {
                Some(ema) => IndicatorPoint {
                    timestamp: candle.timestamp,
                    valid: true,
                    value: ema,
                },
                None => IndicatorPoint {
                    timestamp: candle.timestamp,
                    valid: false,
                    value: 0.0,
                },
            })
            .collect()
    };

    IndicatorSeries {
        indicator_type: IndicatorType::Ema(period),
        values,
    }
}

/// Incremental EMA, fed one close at a time.
///
/// Produces the same sequence as [`calculate_ema`] over the same closes.
#[derive(Debug, Clone)]
pub struct EmaState {
    period: usize,
    k: f64,
    seen: usize,
    sum: f64,
    ema: Option<f64>,
}

impl EmaState {
    pub fn new(period: usize) -> Self {
        Self {
            period,
            k: 2.0 / (period as f64 + 1.0),
            seen: 0,
            sum: 0.0,
            ema: None,
        }
    }

    pub fn period(&self) -> usize {
        self.period
    }

    /// Current value, `None` during warmup.
    pub fn value(&self) -> Option<f64> {
        self.ema
    }

    pub fn update(&mut self, close: f64) -> Option<f64> {
        if self.period == 0 {
            return None;
        }
        self.seen += 1;
        self.ema = match self.ema {
            Some(prev) => Some(close * self.k + prev * (1.0 - self.k)),
            None => {
                self.sum += close;
                if self.seen == self.period {
                    Some(self.sum / self.period as f64)
                } else {
                    None
                }
            }
        };
        self.ema
    }
}
