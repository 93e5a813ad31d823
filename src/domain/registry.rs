//! Gap registry: ordered ownership of gaps plus the per-step lifecycle.
//!
//! Each step the engine calls, in order, [`GapRegistry::invalidate`],
//! [`GapRegistry::admit`] and [`GapRegistry::prune`].

use crate::domain::candle::Candle;
use crate::domain::gap::Gap;
use crate::domain::trend::TrendState;

pub const DEFAULT_PRUNE_THRESHOLD: usize = 100;
pub const DEFAULT_PRUNE_RETAIN: usize = 50;

/// Once the registry holds more than `threshold` entries it is cut back to
/// the newest `retain`. Invalid gaps count toward the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PruneLimits {
    pub threshold: usize,
    pub retain: usize,
}

impl Default for PruneLimits {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_PRUNE_THRESHOLD,
            retain: DEFAULT_PRUNE_RETAIN,
        }
    }
}

/// Gaps invalidated in one pass, by cause.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InvalidationTally {
    pub trend_flip: usize,
    pub close_through: usize,
}

impl InvalidationTally {
    pub fn total(&self) -> usize {
        self.trend_flip + self.close_through
    }
}

#[derive(Debug, Clone, Default)]
pub struct GapRegistry {
    gaps: Vec<Gap>,
    limits: PruneLimits,
}

impl GapRegistry {
    pub fn new(limits: PruneLimits) -> Self {
        Self {
            gaps: Vec::new(),
            limits,
        }
    }

    /// Trend-flip check first; a gap it invalidates is not checked again
    /// against the close.
    pub fn invalidate(
        &mut self,
        trend: TrendState,
        trend_changed: bool,
        candle: &Candle,
    ) -> InvalidationTally {
        let mut tally = InvalidationTally::default();

        for gap in self.gaps.iter_mut().filter(|g| g.is_valid()) {
            if trend_changed && !gap.kind().aligned_with(trend) {
                gap.invalidate(candle.timestamp);
                tally.trend_flip += 1;
                continue;
            }
            if gap.closed_through(candle.close) {
                gap.invalidate(candle.timestamp);
                tally.close_through += 1;
            }
        }

        tally
    }

    /// Stores `candidate` only when its kind matches `trend`.
    pub fn admit(&mut self, candidate: Gap, trend: TrendState) -> bool {
        if !candidate.kind().aligned_with(trend) {
            return false;
        }
        self.gaps.push(candidate);
        true
    }

    /// Returns the number of entries dropped. A `retain` above `threshold`
    /// is clamped to `threshold`, so the cap always holds after a prune.
    pub fn prune(&mut self) -> usize {
        if self.gaps.len() <= self.limits.threshold {
            return 0;
        }
        let keep = self.limits.retain.min(self.limits.threshold);
        let excess = self.gaps.len() - keep;
        self.gaps.drain(..excess);
        excess
    }

    pub fn gaps(&self) -> &[Gap] {
        &self.gaps
    }

    /// Owned copy for readers that must not hold a borrow across steps.
    pub fn snapshot(&self) -> Vec<Gap> {
        self.gaps.clone()
    }

    pub fn valid_count(&self) -> usize {
        self.gaps.iter().filter(|g| g.is_valid()).count()
    }

    pub fn len(&self) -> usize {
        self.gaps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gaps.is_empty()
    }
}
