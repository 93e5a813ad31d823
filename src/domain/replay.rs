//! Replays a stored candle sequence through a fresh engine.

use crate::domain::candle::Candle;
use crate::domain::chart::{ChartOutput, StatusSummary, draw_lines};
use crate::domain::engine::{EngineConfig, FvgEngine, StepOutcome};
use crate::domain::error::FvgError;
use crate::domain::gap::Gap;
use crate::domain::signal::PositionSide;
use crate::domain::trend::TrendState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReplayCounters {
    pub warmup_steps: usize,
    pub evaluated_steps: usize,
    pub trend_changes: usize,
    pub gaps_detected: usize,
    pub gaps_admitted: usize,
    pub gaps_discarded: usize,
    pub invalidated_by_trend: usize,
    pub invalidated_by_close: usize,
    pub pruned: usize,
    pub long_exits: usize,
    pub short_exits: usize,
}

#[derive(Debug, Clone)]
pub struct ReplayResult {
    pub counters: ReplayCounters,
    pub final_trend: Option<TrendState>,
    pub status: Option<StatusSummary>,
    pub gaps: Vec<Gap>,
    pub chart: ChartOutput,
}

pub fn run_replay(candles: &[Candle], config: &EngineConfig) -> Result<ReplayResult, FvgError> {
    let mut engine = FvgEngine::new(*config);
    let mut counters = ReplayCounters::default();

    for candle in candles {
        match engine.on_candle(*candle)? {
            StepOutcome::Warmup { .. } => counters.warmup_steps += 1,
            StepOutcome::Evaluated(report) => {
                counters.evaluated_steps += 1;
                if report.trend_changed {
                    counters.trend_changes += 1;
                }
                if report.candidate.is_some() {
                    counters.gaps_detected += 1;
                    if report.admitted {
                        counters.gaps_admitted += 1;
                    } else {
                        counters.gaps_discarded += 1;
                    }
                }
                counters.invalidated_by_trend += report.invalidated.trend_flip;
                counters.invalidated_by_close += report.invalidated.close_through;
                counters.pruned += report.pruned;
                match report.exit {
                    Some(PositionSide::Long) => counters.long_exits += 1,
                    Some(PositionSide::Short) => counters.short_exits += 1,
                    None => {}
                }
            }
        }
    }

    let chart = ChartOutput {
        lines: draw_lines(candles, config.fast_period, config.slow_period),
        shapes: engine.shapes(),
        status: engine.status(),
    };

    Ok(ReplayResult {
        counters,
        final_trend: engine.trend(),
        status: engine.status(),
        gaps: engine.registry().snapshot(),
        chart,
    })
}
