// Summary statistics, histogram bins, and threshold filtering over a score
// vector. All pure functions of their input.

use serde::Serialize;

use crate::output::format_percent;

/// Number of histogram bins over [0, 1] shown by default.
pub const DEFAULT_HISTOGRAM_BINS: usize = 20;

/// Aggregate statistics for one scoring run, formatted as percentages.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SummaryStats {
    pub average: String,
    pub median: String,
    pub min: String,
    pub max: String,
}

impl SummaryStats {
    /// (label, value) pairs in display order.
    pub fn entries(&self) -> [(&'static str, &str); 4] {
        [
            ("Average Similarity", self.average.as_str()),
            ("Median Similarity", self.median.as_str()),
            ("Min Similarity", self.min.as_str()),
            ("Max Similarity", self.max.as_str()),
        ]
    }
}

/// Summarize a score vector. Returns `None` for an empty vector; there is
/// nothing meaningful to report for zero rows.
pub fn summarize(scores: &[f64]) -> Option<SummaryStats> {
    if scores.is_empty() {
        return None;
    }

    let mut sorted = scores.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    let average = sorted.iter().sum::<f64>() / n as f64;
    let median = if n % 2 == 1 {
        sorted[n / 2]
    } else {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    };

    Some(SummaryStats {
        average: format_percent(average),
        median: format_percent(median),
        min: format_percent(sorted[0]),
        max: format_percent(sorted[n - 1]),
    })
}

/// Count scores into `bins` equal-width buckets over [0, 1].
///
/// 1.0 lands in the last bucket. Out-of-range values are clamped.
pub fn histogram(scores: &[f64], bins: usize) -> Vec<usize> {
    let bins = bins.max(1);
    let mut counts = vec![0usize; bins];
    for &s in scores {
        let s = if s.is_nan() { 0.0 } else { s.clamp(0.0, 1.0) };
        let idx = ((s * bins as f64) as usize).min(bins - 1);
        counts[idx] += 1;
    }
    counts
}

/// Indices of rows whose score is at least `threshold`, in row order.
pub fn filter_by_threshold(scores: &[f64], threshold: f64) -> Vec<usize> {
    scores
        .iter()
        .enumerate()
        .filter(|(_, &s)| s >= threshold)
        .map(|(i, _)| i)
        .collect()
}
