//! Chart-facing records: EMA line series, gap rectangles, status.
//!
//! Everything here is plain data. Timestamps arrive in milliseconds and
//! leave in seconds.

use crate::domain::candle::{Candle, ms_to_secs};
use crate::domain::gap::{Gap, GapKind};
use crate::domain::indicator::ema::calculate_ema;
use crate::domain::indicator::IndicatorType;
use crate::domain::trend::TrendState;
use serde::Serialize;

pub const FAST_LINE_COLOR: &str = "#2196F3";
pub const SLOW_LINE_COLOR: &str = "#FF9800";

const BULLISH_RGB: (u8, u8, u8) = (38, 166, 154);
const BEARISH_RGB: (u8, u8, u8) = (239, 83, 80);
const BULLISH_BORDER: &str = "#26a69a";
const BEARISH_BORDER: &str = "#ef5350";
const VALID_ALPHA: f64 = 0.3;
const INVALID_ALPHA: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinePoint {
    pub time: i64,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineSeries {
    pub name: String,
    pub color: String,
    pub data: Vec<LinePoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Shape {
    #[serde(rename = "type")]
    pub shape_type: &'static str,
    pub fvg_type: GapKind,
    pub top: f64,
    pub bottom: f64,
    pub start_time: i64,
    pub end_time: i64,
    pub valid: bool,
    pub color: String,
    pub border_color: String,
}

/// Snapshot for a monitoring display.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatusSummary {
    pub fast_ema: f64,
    pub slow_ema: f64,
    pub trend: TrendState,
    pub active_gaps: usize,
}

impl StatusSummary {
    /// Label/value rows in display order.
    pub fn watch_list(&self) -> Vec<(&'static str, String)> {
        vec![
            ("Fast EMA", format!("{:.4}", self.fast_ema)),
            ("Slow EMA", format!("{:.4}", self.slow_ema)),
            ("Trend", self.trend.to_string()),
            ("Active FVGs", self.active_gaps.to_string()),
        ]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChartOutput {
    pub lines: Vec<LineSeries>,
    pub shapes: Vec<Shape>,
    pub status: Option<StatusSummary>,
}

fn line_series(candles: &[Candle], period: usize, color: &str) -> Option<LineSeries> {
    let series = calculate_ema(candles, period);
    let data: Vec<LinePoint> = series
        .valid_points()
        .map(|p| LinePoint {
            time: ms_to_secs(p.timestamp),
            value: p.value,
        })
        .collect();

    if data.is_empty() {
        return None;
    }
    Some(LineSeries {
        name: IndicatorType::Ema(period).to_string(),
        color: color.to_string(),
        data,
    })
}

/// Fast and slow EMA lines. A series with no defined point is left out.
pub fn draw_lines(candles: &[Candle], fast_period: usize, slow_period: usize) -> Vec<LineSeries> {
    [
        line_series(candles, fast_period, FAST_LINE_COLOR),
        line_series(candles, slow_period, SLOW_LINE_COLOR),
    ]
    .into_iter()
    .flatten()
    .collect()
}

fn fill_color(kind: GapKind, valid: bool) -> String {
    let (r, g, b) = match kind {
        GapKind::Bullish => BULLISH_RGB,
        GapKind::Bearish => BEARISH_RGB,
    };
    let alpha = if valid { VALID_ALPHA } else { INVALID_ALPHA };
    format!("rgba({r}, {g}, {b}, {alpha})")
}

fn border_color(kind: GapKind) -> &'static str {
    match kind {
        GapKind::Bullish => BULLISH_BORDER,
        GapKind::Bearish => BEARISH_BORDER,
    }
}

/// One rectangle per gap. Gaps without an end stamp extend to `current_time`
/// (milliseconds, normally the latest candle).
pub fn draw_shapes(gaps: &[Gap], current_time: i64) -> Vec<Shape> {
    gaps.iter()
        .map(|gap| Shape {
            shape_type: "rectangle",
            fvg_type: gap.kind(),
            top: gap.top(),
            bottom: gap.bottom(),
            start_time: ms_to_secs(gap.start_time()),
            end_time: ms_to_secs(gap.end_time().unwrap_or(current_time)),
            valid: gap.is_valid(),
            color: fill_color(gap.kind(), gap.is_valid()),
            border_color: border_color(gap.kind()).to_string(),
        })
        .collect()
}
