//! Position directives derived from the trend.
//!
//! Sizing and order placement belong to the broker side; this only says
//! which way to lean and when an open position has lost its trend.

use crate::domain::trend::TrendState;
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PositionSide {
    Long,
    Short,
}

impl fmt::Display for PositionSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PositionSide::Long => write!(f, "long"),
            PositionSide::Short => write!(f, "short"),
        }
    }
}

pub fn entry_side(trend: TrendState) -> PositionSide {
    match trend {
        TrendState::Bullish => PositionSide::Long,
        TrendState::Bearish => PositionSide::Short,
    }
}

pub fn should_liquidate(open: PositionSide, trend: TrendState) -> bool {
    entry_side(trend) != open
}
