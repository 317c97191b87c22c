// Embedding-based similarity.
//
// Texts are trimmed but otherwise left alone (the model handles case and
// punctuation itself), embedded, and compared by cosine. Cosine lives in
// [-1, 1], so it is rescaled with (cos + 1) / 2.
//
// Failures never abort a run: a pair whose embedding fails scores 0.0 and
// carries the error message back to the caller.

use std::collections::HashMap;

use async_trait::async_trait;
use tracing::{debug, warn};

use super::embeddings::{cosine_similarity, Embedder};
use super::traits::{resolve_missing, BothMissingPolicy, PairScore, Prepared, SimilarityEngine};
use crate::dataset::Cell;

/// Texts per embedding call when scoring a batch.
pub const EMBED_CHUNK_SIZE: usize = 32;

/// Map cosine similarity from [-1, 1] onto [0, 1].
pub fn rescale_cosine(cosine: f64) -> f64 {
    ((cosine + 1.0) / 2.0).clamp(0.0, 1.0)
}

pub struct SemanticEngine {
    embedder: Box<dyn Embedder>,
    both_missing: BothMissingPolicy,
}

impl SemanticEngine {
    pub fn new(embedder: Box<dyn Embedder>, both_missing: BothMissingPolicy) -> Self {
        Self {
            embedder,
            both_missing,
        }
    }

    fn prepare(cell: &Cell) -> Option<String> {
        cell.as_text().map(|t| t.trim().to_string())
    }

    /// Embed every distinct text, chunk by chunk. A failed chunk is retried
    /// one text at a time so only the texts that actually fail are lost.
    async fn embed_all(&self, texts: Vec<String>) -> HashMap<String, Result<Vec<f64>, String>> {
        let mut out = HashMap::with_capacity(texts.len());

        for chunk in texts.chunks(EMBED_CHUNK_SIZE) {
            match self.embedder.embed_batch(chunk).await {
                Ok(vectors) if vectors.len() == chunk.len() => {
                    for (text, vector) in chunk.iter().zip(vectors) {
                        out.insert(text.clone(), Ok(vector));
                    }
                }
                outcome => {
                    let reason = match outcome {
                        Err(e) => e.to_string(),
                        Ok(v) => format!("embedder returned {} vectors for {} texts", v.len(), chunk.len()),
                    };
                    debug!(chunk = chunk.len(), %reason, "Batch embedding failed, retrying per text");
                    for text in chunk {
                        out.insert(text.clone(), self.embed_one(text).await);
                    }
                }
            }
        }

        out
    }

    async fn embed_one(&self, text: &str) -> Result<Vec<f64>, String> {
        match self.embedder.embed_batch(&[text.to_string()]).await {
            Ok(mut vectors) if vectors.len() == 1 => Ok(vectors.remove(0)),
            Ok(vectors) => Err(format!(
                "embedder returned {} vectors for 1 text",
                vectors.len()
            )),
            Err(e) => Err(format!("{e:#}")),
        }
    }
}

/// Score two embedding lookups.
fn score_vectors(a: &Result<Vec<f64>, String>, b: &Result<Vec<f64>, String>) -> PairScore {
    match (a, b) {
        (Ok(va), Ok(vb)) => match cosine_similarity(va, vb) {
            Some(cos) => PairScore::ok(rescale_cosine(cos)),
            None => PairScore::failed("Embedding vectors are empty, zero, or mismatched"),
        },
        (Err(e), _) | (_, Err(e)) => PairScore::failed(format!("Embedding failed: {e}")),
    }
}

#[async_trait]
impl SimilarityEngine for SemanticEngine {
    fn name(&self) -> &'static str {
        "semantic"
    }

    async fn compare(&self, a: &Cell, b: &Cell) -> PairScore {
        let (a, b) = match resolve_missing(Self::prepare(a), Self::prepare(b), self.both_missing) {
            Prepared::Decided(score) => return PairScore::ok(score),
            Prepared::Both(a, b) => (a, b),
        };

        let result = match self.embedder.embed_batch(&[a, b]).await {
            Ok(vectors) if vectors.len() == 2 => {
                score_vectors(&Ok(vectors[0].clone()), &Ok(vectors[1].clone()))
            }
            Ok(vectors) => PairScore::failed(format!(
                "Embedding failed: embedder returned {} vectors for 2 texts",
                vectors.len()
            )),
            Err(e) => PairScore::failed(format!("Embedding failed: {e:#}")),
        };

        if let Some(err) = &result.error {
            warn!(error = %err, "Semantic comparison failed, scoring 0.0");
        }
        result
    }

    /// Embeds each distinct text once for the whole batch instead of once per
    /// pair, then scores pairs from the cached vectors.
    async fn compare_batch(&self, pairs: &[(&Cell, &Cell)]) -> Vec<PairScore> {
        let prepared: Vec<Prepared> = pairs
            .iter()
            .map(|(a, b)| resolve_missing(Self::prepare(a), Self::prepare(b), self.both_missing))
            .collect();

        let mut distinct: Vec<String> = Vec::new();
        let mut seen = std::collections::HashSet::new();
        for p in &prepared {
            if let Prepared::Both(a, b) = p {
                for t in [a, b] {
                    if seen.insert(t.as_str()) {
                        distinct.push(t.clone());
                    }
                }
            }
        }

        let vectors = self.embed_all(distinct).await;

        let results: Vec<PairScore> = prepared
            .iter()
            .map(|p| match p {
                Prepared::Decided(score) => PairScore::ok(*score),
                Prepared::Both(a, b) => match (vectors.get(a), vectors.get(b)) {
                    (Some(va), Some(vb)) => score_vectors(va, vb),
                    _ => PairScore::failed("Embedding missing for text"),
                },
            })
            .collect();

        let failed = results.iter().filter(|r| r.error.is_some()).count();
        if failed > 0 {
            warn!(failed, total = pairs.len(), "Some semantic comparisons failed, scored 0.0");
        }

        results
    }
}
