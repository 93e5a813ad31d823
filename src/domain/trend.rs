//! Trend signal from a fast/slow EMA pair.

use crate::domain::indicator::ema::EmaState;
use serde::Serialize;
use std::fmt;

pub const DEFAULT_FAST_PERIOD: usize = 9;
pub const DEFAULT_SLOW_PERIOD: usize = 21;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendState {
    Bullish,
    Bearish,
}

impl fmt::Display for TrendState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendState::Bullish => write!(f, "bullish"),
            TrendState::Bearish => write!(f, "bearish"),
        }
    }
}

/// Both averages at the latest candle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrendSignal {
    pub fast: f64,
    pub slow: f64,
}

impl TrendSignal {
    /// `None` until both averages are defined.
    pub fn from_averages(fast: Option<f64>, slow: Option<f64>) -> Option<Self> {
        Some(Self {
            fast: fast?,
            slow: slow?,
        })
    }

    /// Equality resolves to bearish.
    pub fn current_trend(&self) -> TrendState {
        if self.fast > self.slow {
            TrendState::Bullish
        } else {
            TrendState::Bearish
        }
    }

    pub fn trend_changed(&self, previous: Option<TrendState>) -> bool {
        match previous {
            None => false,
            Some(prev) => prev != self.current_trend(),
        }
    }
}

/// Streams closes into both averages and remembers the previous step's trend.
///
/// The previous trend only moves when [`TrendTracker::advance`] is called,
/// which the engine does after the registry has finished with the step.
#[derive(Debug, Clone)]
pub struct TrendTracker {
    fast: EmaState,
    slow: EmaState,
    previous: Option<TrendState>,
}

impl TrendTracker {
    pub fn new(fast_period: usize, slow_period: usize) -> Self {
        Self {
            fast: EmaState::new(fast_period),
            slow: EmaState::new(slow_period),
            previous: None,
        }
    }

    pub fn update(&mut self, close: f64) -> Option<TrendSignal> {
        let fast = self.fast.update(close);
        let slow = self.slow.update(close);
        TrendSignal::from_averages(fast, slow)
    }

    pub fn signal(&self) -> Option<TrendSignal> {
        TrendSignal::from_averages(self.fast.value(), self.slow.value())
    }

    pub fn previous(&self) -> Option<TrendState> {
        self.previous
    }

    pub fn advance(&mut self, trend: TrendState) {
        self.previous = Some(trend);
    }

    /// Closes needed before both averages are defined.
    pub fn warmup_len(&self) -> usize {
        self.fast.period().max(self.slow.period())
    }
}
