//! Confluence aggregation.
//!
//! Combines the per-source subscores of one ticker into a composite score.
//! Corroboration is rewarded through a saturating multiplier on the best
//! coalition of sources that agree with the net direction, and opposing
//! evidence dampens the result in proportion to its weight.

use confluence_core::{ConfluenceParams, ConfluenceResult, Sign, SignalSource, SourceScore, SourceWeightTable};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Output of one aggregation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aggregate {
    /// Composite score in [0, 100].
    pub composite_score: f64,
    /// Σ weight × subscore over bullish sources.
    pub positive_weighted_sum: f64,
    /// Σ weight × subscore over bearish sources.
    pub negative_weighted_sum: f64,
    /// Sources with a nonzero sign.
    pub participating: usize,
    /// Sources in the winning coalition.
    pub agreeing: usize,
    /// Multiplier applied to the winning coalition.
    pub multiplier: f64,
}

impl Aggregate {
    /// Aggregate of a ticker with no participating sources.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            composite_score: 0.0,
            positive_weighted_sum: 0.0,
            negative_weighted_sum: 0.0,
            participating: 0,
            agreeing: 0,
            multiplier: 1.0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Weighted {
    weight: f64,
    subscore: f64,
}

#[derive(Debug, Clone, Copy)]
struct Coalition {
    score: f64,
    size: usize,
    multiplier: f64,
}

/// Aggregates normalized scores with a fixed weight table and context.
#[derive(Debug, Clone)]
pub struct ConfluenceAggregator {
    weights: Arc<SourceWeightTable>,
    context: String,
    params: ConfluenceParams,
}

impl ConfluenceAggregator {
    #[must_use]
    pub fn new(weights: Arc<SourceWeightTable>, context: impl Into<String>, params: ConfluenceParams) -> Self {
        Self {
            weights,
            context: context.into(),
            params,
        }
    }

    #[must_use]
    pub fn params(&self) -> &ConfluenceParams {
        &self.params
    }

    /// Combines the scores of one ticker.
    ///
    /// Adding an opposing source never raises the score as long as the
    /// dominant side stays dominant. An opposing source heavy enough to flip
    /// the dominant side is scored as the new majority and can raise it.
    ///
    /// # Errors
    ///
    /// Returns `UnknownSourceWeight` or `UnknownWeightContext` if a
    /// participating source has no weight in the configured context.
    pub fn aggregate(
        &self,
        ticker: &str,
        scores: &BTreeMap<SignalSource, SourceScore>,
    ) -> ConfluenceResult<Aggregate> {
        let mut bullish = Vec::new();
        let mut bearish = Vec::new();

        for score in scores.values().filter(|s| s.participates()) {
            let weight = self.weights.weight(score.source, &self.context)?;
            let entry = Weighted {
                weight,
                subscore: score.subscore,
            };
            match score.sign {
                Sign::Bullish => bullish.push(entry),
                Sign::Bearish => bearish.push(entry),
                Sign::Neutral => {}
            }
        }

        let participating = bullish.len() + bearish.len();
        if participating == 0 {
            return Ok(Aggregate::empty());
        }

        let positive = weighted_sum(&bullish);
        let negative = weighted_sum(&bearish);

        let (coalition, dominant, opposing) = if positive > negative {
            (self.best_coalition(&bullish), positive, negative)
        } else if negative > positive {
            (self.best_coalition(&bearish), negative, positive)
        } else {
            let up = self.best_coalition(&bullish);
            let down = self.best_coalition(&bearish);
            let best = if down.score > up.score { down } else { up };
            (best, positive, negative)
        };

        let agreement = dominant / (dominant + opposing);
        let composite_score = (coalition.score * agreement).clamp(0.0, 100.0);

        debug!(
            ticker,
            positive,
            negative,
            coalition = coalition.score,
            agreement,
            composite_score,
            "Aggregated sources"
        );

        Ok(Aggregate {
            composite_score,
            positive_weighted_sum: positive,
            negative_weighted_sum: negative,
            participating,
            agreeing: coalition.size,
            multiplier: coalition.multiplier,
        })
    }

    /// Best `weighted_avg(B) × multiplier(|B|)` over non-empty subsets of one side.
    ///
    /// A side has at most one entry per known source, so exhaustive search is
    /// at most 127 subsets.
    fn best_coalition(&self, side: &[Weighted]) -> Coalition {
        let mut best = Coalition {
            score: 0.0,
            size: 0,
            multiplier: 1.0,
        };

        let n = side.len().min(SignalSource::ALL.len());
        for mask in 1u32..(1u32 << n) {
            let mut total_weight = 0.0;
            let mut total = 0.0;
            let mut size = 0;
            for (i, entry) in side.iter().take(n).enumerate() {
                if mask & (1 << i) != 0 {
                    total_weight += entry.weight;
                    total += entry.weight * entry.subscore;
                    size += 1;
                }
            }
            if total_weight <= 0.0 {
                continue;
            }

            let multiplier = self.params.multiplier(size);
            let score = total / total_weight * multiplier;
            if score > best.score {
                best = Coalition {
                    score,
                    size,
                    multiplier,
                };
            }
        }

        best
    }
}

fn weighted_sum(side: &[Weighted]) -> f64 {
    side.iter().map(|e| e.weight * e.subscore).sum()
}
