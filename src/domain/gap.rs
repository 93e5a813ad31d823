//! Fair value gaps and the three-candle detector.

use crate::domain::candle::Candle;
use crate::domain::trend::TrendState;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GapKind {
    Bullish,
    Bearish,
}

impl GapKind {
    /// Whether a gap of this kind agrees with the given trend.
    pub fn aligned_with(self, trend: TrendState) -> bool {
        matches!(
            (self, trend),
            (GapKind::Bullish, TrendState::Bullish) | (GapKind::Bearish, TrendState::Bearish)
        )
    }
}

impl fmt::Display for GapKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GapKind::Bullish => write!(f, "bullish"),
            GapKind::Bearish => write!(f, "bearish"),
        }
    }
}

/// A price range left unfilled across three consecutive candles.
///
/// `valid` goes from true to false at most once, and `end_time` is stamped
/// at that moment. Only the registry can flip it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Gap {
    kind: GapKind,
    top: f64,
    bottom: f64,
    start_time: i64,
    end_time: Option<i64>,
    valid: bool,
}

impl Gap {
    /// Panics if `top < bottom`; the detector never produces such a gap.
    pub fn new(kind: GapKind, top: f64, bottom: f64, start_time: i64) -> Self {
        assert!(
            top >= bottom,
            "invalid gap geometry: top {top} below bottom {bottom}"
        );
        Self {
            kind,
            top,
            bottom,
            start_time,
            end_time: None,
            valid: true,
        }
    }

    pub fn kind(&self) -> GapKind {
        self.kind
    }

    pub fn top(&self) -> f64 {
        self.top
    }

    pub fn bottom(&self) -> f64 {
        self.bottom
    }

    pub fn start_time(&self) -> i64 {
        self.start_time
    }

    pub fn end_time(&self) -> Option<i64> {
        self.end_time
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Whether a close on the far side of the gap fills it.
    pub fn closed_through(&self, close: f64) -> bool {
        match self.kind {
            GapKind::Bullish => close < self.bottom,
            GapKind::Bearish => close > self.top,
        }
    }

    /// Returns false if the gap was already invalid; the first stamp is kept.
    pub(crate) fn invalidate(&mut self, at: i64) -> bool {
        if !self.valid {
            return false;
        }
        self.valid = false;
        self.end_time = Some(at);
        true
    }
}

/// Looks at the last three candles of `history` (oldest first).
///
/// Returns `None` with fewer than three candles or when no gap is present.
/// A bullish gap is checked first.
pub fn detect(history: &[Candle]) -> Option<Gap> {
    let [c2, c1, c0] = history.last_chunk::<3>()?;

    if c2.high < c0.low {
        return Some(Gap::new(GapKind::Bullish, c0.low, c2.high, c1.timestamp));
    }
    if c2.low > c0.high {
        return Some(Gap::new(GapKind::Bearish, c2.low, c0.high, c1.timestamp));
    }
    None
}
