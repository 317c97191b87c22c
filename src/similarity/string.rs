// Character-level similarity engines.
//
// Both variants score with the sequence matcher ratio. They differ in how the
// text is prepared first:
//   basic: lowercase and trim only
//   fuzzy: full normalization, plus a bonus when one value contains the other

use async_trait::async_trait;

use super::matcher;
use super::normalize::{fold_case, normalize};
use super::traits::{resolve_missing, BothMissingPolicy, PairScore, Prepared, SimilarityEngine};
use crate::dataset::Cell;

/// Default bonus added when one normalized value contains the other.
pub const DEFAULT_SUBSTRING_BONUS: f64 = 0.2;

/// Sequence-matcher similarity with configurable preparation.
#[derive(Debug, Clone)]
pub struct StringEngine {
    /// Apply full normalization instead of case folding
    pub normalize: bool,
    /// Added to the ratio when one string contains the other (capped at 1.0)
    pub substring_bonus: Option<f64>,
    pub both_missing: BothMissingPolicy,
}

impl StringEngine {
    /// Lowercase + trim, no bonus.
    pub fn basic(both_missing: BothMissingPolicy) -> Self {
        Self {
            normalize: false,
            substring_bonus: None,
            both_missing,
        }
    }

    /// Full normalization with the default substring bonus.
    pub fn fuzzy(both_missing: BothMissingPolicy) -> Self {
        Self {
            normalize: true,
            substring_bonus: Some(DEFAULT_SUBSTRING_BONUS),
            both_missing,
        }
    }

    pub fn with_substring_bonus(mut self, bonus: Option<f64>) -> Self {
        self.substring_bonus = bonus.filter(|b| *b > 0.0);
        self
    }

    fn prepare(&self, cell: &Cell) -> Option<String> {
        let text = cell.as_text()?;
        Some(if self.normalize {
            normalize(&text)
        } else {
            fold_case(&text)
        })
    }

    /// Synchronous scoring; the trait methods delegate here.
    pub fn similarity(&self, a: &Cell, b: &Cell) -> f64 {
        let (a, b) = match resolve_missing(self.prepare(a), self.prepare(b), self.both_missing) {
            Prepared::Decided(score) => return score,
            Prepared::Both(a, b) => (a, b),
        };

        let base = matcher::symmetric_ratio(&a, &b);
        match self.substring_bonus {
            Some(bonus) if a.contains(b.as_str()) || b.contains(a.as_str()) => {
                (base + bonus).min(1.0)
            }
            _ => base,
        }
    }
}

#[async_trait]
impl SimilarityEngine for StringEngine {
    fn name(&self) -> &'static str {
        if self.normalize {
            "fuzzy"
        } else {
            "basic"
        }
    }

    async fn compare(&self, a: &Cell, b: &Cell) -> PairScore {
        PairScore::ok(self.similarity(a, b))
    }

    async fn compare_batch(&self, pairs: &[(&Cell, &Cell)]) -> Vec<PairScore> {
        pairs
            .iter()
            .map(|(a, b)| PairScore::ok(self.similarity(a, b)))
            .collect()
    }
}
