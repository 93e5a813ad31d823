//! Per-candle gap pipeline.
//!
//! Order of one step: trend → invalidation → detection/admission → prune →
//! advance previous trend. Nothing runs until the slow EMA is defined.

use crate::domain::candle::Candle;
use crate::domain::chart::{Shape, StatusSummary, draw_shapes};
use crate::domain::error::FvgError;
use crate::domain::gap::{Gap, GapKind, detect};
use crate::domain::registry::{GapRegistry, InvalidationTally, PruneLimits};
use crate::domain::signal::{PositionSide, entry_side, should_liquidate};
use crate::domain::trend::{
    DEFAULT_FAST_PERIOD, DEFAULT_SLOW_PERIOD, TrendSignal, TrendState, TrendTracker,
};
use parking_lot::RwLock;
use std::collections::VecDeque;
use std::sync::Arc;

const DETECTION_WINDOW: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    pub fast_period: usize,
    pub slow_period: usize,
    pub prune: PruneLimits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fast_period: DEFAULT_FAST_PERIOD,
            slow_period: DEFAULT_SLOW_PERIOD,
            prune: PruneLimits::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepReport {
    pub timestamp: i64,
    pub signal: TrendSignal,
    pub trend: TrendState,
    pub trend_changed: bool,
    pub invalidated: InvalidationTally,
    pub candidate: Option<GapKind>,
    pub admitted: bool,
    pub pruned: usize,
    /// Side whose open position the new trend no longer supports.
    pub exit: Option<PositionSide>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StepOutcome {
    /// Averages not yet defined; the pipeline was skipped.
    Warmup { have: usize, need: usize },
    Evaluated(StepReport),
}

#[derive(Debug, Clone)]
pub struct FvgEngine {
    tracker: TrendTracker,
    window: VecDeque<Candle>,
    registry: GapRegistry,
    candles_seen: usize,
}

impl FvgEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            tracker: TrendTracker::new(config.fast_period, config.slow_period),
            window: VecDeque::with_capacity(DETECTION_WINDOW),
            registry: GapRegistry::new(config.prune),
            candles_seen: 0,
        }
    }

    /// Feeds the next candle. Timestamps must be strictly increasing; an
    /// out-of-order candle is rejected and leaves the engine untouched.
    pub fn on_candle(&mut self, candle: Candle) -> Result<StepOutcome, FvgError> {
        if let Some(last) = self.window.back() {
            if candle.timestamp <= last.timestamp {
                return Err(FvgError::OutOfOrderCandle {
                    previous: last.timestamp,
                    timestamp: candle.timestamp,
                });
            }
        }

        if self.window.len() == DETECTION_WINDOW {
            self.window.pop_front();
        }
        self.window.push_back(candle);
        self.candles_seen += 1;

        let Some(signal) = self.tracker.update(candle.close) else {
            return Ok(StepOutcome::Warmup {
                have: self.candles_seen,
                need: self.tracker.warmup_len(),
            });
        };

        let trend = signal.current_trend();
        let trend_changed = signal.trend_changed(self.tracker.previous());

        let invalidated = self.registry.invalidate(trend, trend_changed, &candle);

        let window = self.window.make_contiguous();
        let candidate = detect(window);
        let candidate_kind = candidate.as_ref().map(Gap::kind);
        let admitted = candidate.is_some_and(|gap| self.registry.admit(gap, trend));

        let pruned = self.registry.prune();

        let exit = self
            .tracker
            .previous()
            .map(entry_side)
            .filter(|&side| should_liquidate(side, trend));

        self.tracker.advance(trend);

        tracing::debug!(
            timestamp = candle.timestamp,
            %trend,
            trend_changed,
            invalidated = invalidated.total(),
            candidate = ?candidate_kind,
            admitted,
            pruned,
            exit = ?exit,
            "step evaluated"
        );

        Ok(StepOutcome::Evaluated(StepReport {
            timestamp: candle.timestamp,
            signal,
            trend,
            trend_changed,
            invalidated,
            candidate: candidate_kind,
            admitted,
            pruned,
            exit,
        }))
    }

    pub fn registry(&self) -> &GapRegistry {
        &self.registry
    }

    pub fn gaps(&self) -> &[Gap] {
        self.registry.gaps()
    }

    pub fn valid_gap_count(&self) -> usize {
        self.registry.valid_count()
    }

    /// Trend of the last evaluated step.
    pub fn trend(&self) -> Option<TrendState> {
        self.tracker.previous()
    }

    pub fn last_candle(&self) -> Option<&Candle> {
        self.window.back()
    }

    /// `None` until the first evaluated step.
    pub fn status(&self) -> Option<StatusSummary> {
        let signal = self.tracker.signal()?;
        Some(StatusSummary {
            fast_ema: signal.fast,
            slow_ema: signal.slow,
            trend: signal.current_trend(),
            active_gaps: self.registry.valid_count(),
        })
    }

    /// Gap rectangles as of the latest candle.
    pub fn shapes(&self) -> Vec<Shape> {
        let now = self.last_candle().map(|c| c.timestamp).unwrap_or(0);
        draw_shapes(self.gaps(), now)
    }
}

/// Engine behind a lock, for a driver and concurrent monitoring readers.
///
/// Readers get owned copies; a step holds the write lock for its duration.
#[derive(Debug, Clone)]
pub struct SharedEngine {
    inner: Arc<RwLock<FvgEngine>>,
}

impl SharedEngine {
    pub fn new(engine: FvgEngine) -> Self {
        Self {
            inner: Arc::new(RwLock::new(engine)),
        }
    }

    pub fn on_candle(&self, candle: Candle) -> Result<StepOutcome, FvgError> {
        self.inner.write().on_candle(candle)
    }

    pub fn gaps_snapshot(&self) -> Vec<Gap> {
        self.inner.read().registry().snapshot()
    }

    pub fn valid_gap_count(&self) -> usize {
        self.inner.read().valid_gap_count()
    }

    pub fn status(&self) -> Option<StatusSummary> {
        self.inner.read().status()
    }

    pub fn shapes(&self) -> Vec<Shape> {
        self.inner.read().shapes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(timestamp: i64, high: f64, low: f64, close: f64) -> Candle {
        Candle {
            timestamp,
            open: close,
            high,
            low,
            close,
            volume: 1.0,
        }
    }

    fn flat(timestamp: i64, close: f64) -> Candle {
        candle(timestamp, close + 0.5, close - 0.5, close)
    }

    /// fast=1, slow=2: trend is bullish whenever close rises against the
    /// previous slow EMA, which keeps scenarios short.
    fn small_engine() -> FvgEngine {
        FvgEngine::new(EngineConfig {
            fast_period: 1,
            slow_period: 2,
            prune: PruneLimits::default(),
        })
    }

    #[test]
    fn warmup_until_slow_period() {
        let mut engine = FvgEngine::new(EngineConfig::default());
        for i in 0..20 {
            let outcome = engine.on_candle(flat(i * 60_000, 100.0 + i as f64)).unwrap();
            assert_eq!(
                outcome,
                StepOutcome::Warmup {
                    have: i as usize + 1,
                    need: 21
                }
            );
        }
        assert!(engine.status().is_none());
        assert!(engine.trend().is_none());

        let outcome = engine.on_candle(flat(20 * 60_000, 120.0)).unwrap();
        assert!(matches!(outcome, StepOutcome::Evaluated(_)));
        assert!(engine.status().is_some());
    }

    #[test]
    fn first_evaluated_step_has_no_trend_change() {
        let mut engine = small_engine();
        engine.on_candle(flat(0, 10.0)).unwrap();
        match engine.on_candle(flat(1, 5.0)).unwrap() {
            StepOutcome::Evaluated(report) => {
                assert_eq!(report.trend, TrendState::Bearish);
                assert!(!report.trend_changed);
            }
            other => panic!("expected evaluation, got {other:?}"),
        }
    }

    #[test]
    fn rejects_out_of_order_candle() {
        let mut engine = small_engine();
        engine.on_candle(flat(100, 10.0)).unwrap();
        let err = engine.on_candle(flat(100, 11.0)).unwrap_err();
        assert!(matches!(
            err,
            FvgError::OutOfOrderCandle {
                previous: 100,
                timestamp: 100
            }
        ));
        assert_eq!(engine.last_candle().map(|c| c.close), Some(10.0));
        assert!(engine.on_candle(flat(50, 11.0)).is_err());
        assert!(engine.on_candle(flat(200, 11.0)).is_ok());
    }

    #[test]
    fn bullish_gap_admitted_in_bullish_trend_then_closed_through() {
        let mut engine = small_engine();
        engine.on_candle(candle(0, 10.0, 8.0, 9.0)).unwrap();
        engine.on_candle(candle(1, 14.0, 9.0, 13.0)).unwrap();
        let outcome = engine.on_candle(candle(2, 17.0, 15.0, 16.0)).unwrap();

        let StepOutcome::Evaluated(report) = outcome else {
            panic!("expected evaluation");
        };
        assert_eq!(report.trend, TrendState::Bullish);
        assert_eq!(report.candidate, Some(GapKind::Bullish));
        assert!(report.admitted);
        assert_eq!(report.exit, None);
        assert_eq!(engine.valid_gap_count(), 1);
        let gap = &engine.gaps()[0];
        assert_eq!((gap.top(), gap.bottom(), gap.start_time()), (15.0, 10.0, 1));

        engine.on_candle(candle(3, 10.0, 8.5, 9.0)).unwrap();
        let gap = &engine.gaps()[0];
        assert!(!gap.is_valid());
        assert_eq!(gap.end_time(), Some(3));
        assert_eq!(engine.valid_gap_count(), 0);
    }

    #[test]
    fn bullish_candidate_discarded_in_bearish_trend() {
        let mut engine = small_engine();
        engine.on_candle(candle(0, 10.0, 8.0, 30.0)).unwrap();
        engine.on_candle(candle(1, 14.0, 9.0, 25.0)).unwrap();
        // c2.high 10 < c0.low 15, but close keeps falling: bearish trend.
        let outcome = engine.on_candle(candle(2, 17.0, 15.0, 16.0)).unwrap();
        let StepOutcome::Evaluated(report) = outcome else {
            panic!("expected evaluation");
        };
        assert_eq!(report.trend, TrendState::Bearish);
        assert_eq!(report.candidate, Some(GapKind::Bullish));
        assert!(!report.admitted);
        assert!(engine.gaps().is_empty());
    }

    #[test]
    fn trend_flip_invalidates_and_advances_after_step() {
        let mut engine = small_engine();
        engine.on_candle(candle(0, 10.0, 8.0, 9.0)).unwrap();
        engine.on_candle(candle(1, 14.0, 9.0, 13.0)).unwrap();
        engine.on_candle(candle(2, 17.0, 15.0, 16.0)).unwrap();
        assert_eq!(engine.trend(), Some(TrendState::Bullish));

        // Close 12 stays above the gap bottom (10) but drops below the slow EMA.
        let outcome = engine.on_candle(candle(3, 16.5, 11.0, 12.0)).unwrap();
        let StepOutcome::Evaluated(report) = outcome else {
            panic!("expected evaluation");
        };
        assert_eq!(report.trend, TrendState::Bearish);
        assert!(report.trend_changed);
        assert_eq!(report.invalidated.trend_flip, 1);
        assert_eq!(report.invalidated.close_through, 0);
        assert_eq!(report.exit, Some(PositionSide::Long));
        assert_eq!(engine.gaps()[0].end_time(), Some(3));
        assert_eq!(engine.trend(), Some(TrendState::Bearish));
    }

    #[test]
    fn status_and_watch_list() {
        let mut engine = small_engine();
        assert!(engine.status().is_none());
        engine.on_candle(flat(0, 10.0)).unwrap();
        engine.on_candle(flat(60_000, 12.0)).unwrap();

        let status = engine.status().unwrap();
        assert_eq!(status.fast_ema, 12.0);
        assert_eq!(status.slow_ema, 11.0);
        assert_eq!(status.trend, TrendState::Bullish);
        assert_eq!(status.active_gaps, 0);
        assert_eq!(status.watch_list().len(), 4);
    }

    #[test]
    fn shapes_use_latest_candle_time() {
        let mut engine = small_engine();
        engine.on_candle(candle(0, 10.0, 8.0, 9.0)).unwrap();
        engine.on_candle(candle(60_000, 14.0, 9.0, 13.0)).unwrap();
        engine.on_candle(candle(120_000, 17.0, 15.0, 16.0)).unwrap();
        engine.on_candle(candle(180_000, 18.0, 13.0, 17.0)).unwrap();

        let shapes = engine.shapes();
        assert_eq!(shapes.len(), 1);
        assert_eq!(shapes[0].start_time, 60);
        assert_eq!(shapes[0].end_time, 180);
    }

    #[test]
    fn shared_engine_snapshots() {
        let shared = SharedEngine::new(small_engine());
        let reader = shared.clone();

        shared.on_candle(candle(0, 10.0, 8.0, 9.0)).unwrap();
        shared.on_candle(candle(1, 14.0, 9.0, 13.0)).unwrap();
        shared.on_candle(candle(2, 17.0, 15.0, 16.0)).unwrap();

        let snapshot = reader.gaps_snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(reader.valid_gap_count(), 1);

        shared.on_candle(candle(3, 10.0, 8.5, 9.0)).unwrap();
        // The earlier snapshot is detached from later steps.
        assert!(snapshot[0].is_valid());
        assert_eq!(reader.valid_gap_count(), 0);
        assert_eq!(reader.status().map(|s| s.active_gaps), Some(0));
        assert_eq!(reader.shapes().len(), 1);
    }

    #[test]
    fn shared_engine_across_threads() {
        let shared = SharedEngine::new(small_engine());
        let reader = shared.clone();

        let handle = std::thread::spawn(move || {
            for i in 0..50 {
                shared.on_candle(flat(i, 100.0 + (i % 7) as f64)).unwrap();
            }
        });
        for _ in 0..50 {
            assert!(reader.gaps_snapshot().len() <= 100);
        }
        handle.join().unwrap();
    }
}
