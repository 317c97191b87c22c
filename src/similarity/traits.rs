// Similarity engine trait and the types every engine shares.
//
// The batch scorer only sees this trait, so the string matchers and the
// embedding-based engine are interchangeable.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::dataset::Cell;

/// What to score when both cells of a pair are missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BothMissingPolicy {
    /// Two blanks are the same value: 1.0.
    Identical,
    /// No information, no similarity: 0.0.
    #[default]
    Unrelated,
}

impl BothMissingPolicy {
    pub fn score(self) -> f64 {
        match self {
            BothMissingPolicy::Identical => 1.0,
            BothMissingPolicy::Unrelated => 0.0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BothMissingPolicy::Identical => "identical",
            BothMissingPolicy::Unrelated => "unrelated",
        }
    }
}

impl fmt::Display for BothMissingPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BothMissingPolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "identical" => Ok(BothMissingPolicy::Identical),
            "unrelated" => Ok(BothMissingPolicy::Unrelated),
            other => anyhow::bail!(
                "Unknown both-missing policy '{other}' (expected 'identical' or 'unrelated')"
            ),
        }
    }
}

/// The outcome of comparing one pair of cells.
#[derive(Debug, Clone, PartialEq)]
pub struct PairScore {
    /// Similarity from 0.0 (unrelated) to 1.0 (identical)
    pub score: f64,
    /// Set when the engine failed on this pair and fell back to 0.0
    pub error: Option<String>,
}

impl PairScore {
    /// A successful score, clamped into [0, 1]. NaN becomes 0.0.
    pub fn ok(score: f64) -> Self {
        let score = if score.is_nan() {
            0.0
        } else {
            score.clamp(0.0, 1.0)
        };
        Self { score, error: None }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            score: 0.0,
            error: Some(message.into()),
        }
    }
}

/// Outcome of the missing-value check shared by every engine.
pub(crate) enum Prepared {
    /// At least one side is missing; this is the final score.
    Decided(f64),
    Both(String, String),
}

/// Apply the missing-value rules to two prepared texts.
///
/// A side is missing when it is `None` or blank after preparation.
pub(crate) fn resolve_missing(
    a: Option<String>,
    b: Option<String>,
    policy: BothMissingPolicy,
) -> Prepared {
    let a = a.filter(|s| !s.trim().is_empty());
    let b = b.filter(|s| !s.trim().is_empty());
    match (a, b) {
        (None, None) => Prepared::Decided(policy.score()),
        (Some(_), None) | (None, Some(_)) => Prepared::Decided(0.0),
        (Some(a), Some(b)) => Prepared::Both(a, b),
    }
}

/// Trait for scoring how alike two cell values are. Async because the
/// embedding engine offloads model inference to a blocking thread.
#[async_trait]
pub trait SimilarityEngine: Send + Sync {
    /// Short engine name for logs and output.
    fn name(&self) -> &'static str;

    /// Score a single pair.
    async fn compare(&self, a: &Cell, b: &Cell) -> PairScore;

    /// Score multiple pairs, returning results in the same order.
    /// Default implementation calls compare sequentially; engines can
    /// override for batching if they support it.
    async fn compare_batch(&self, pairs: &[(&Cell, &Cell)]) -> Vec<PairScore> {
        let mut results = Vec::with_capacity(pairs.len());
        for (a, b) in pairs {
            results.push(self.compare(a, b).await);
        }
        results
    }
}
