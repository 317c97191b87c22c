// Similarity engines: trait-based abstraction over interchangeable scorers.
//
// Every engine maps a pair of cells to a score in [0, 1]. The string engines
// are pure functions of their input; the semantic engine goes through an
// injectable Embedder so tests never need the real model.

pub mod download;
pub mod embeddings;
pub mod matcher;
pub mod normalize;
pub mod semantic;
pub mod string;
pub mod traits;

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use self::embeddings::LazyEmbedder;
use self::semantic::SemanticEngine;
use self::string::StringEngine;
use self::traits::{BothMissingPolicy, SimilarityEngine};

/// Which similarity engine to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineKind {
    /// Lowercase + trim, then sequence-matcher ratio
    Basic,
    /// Full normalization, ratio, and substring bonus (default)
    #[default]
    Fuzzy,
    /// Multilingual sentence embeddings compared by cosine
    Semantic,
}

impl EngineKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EngineKind::Basic => "basic",
            EngineKind::Fuzzy => "fuzzy",
            EngineKind::Semantic => "semantic",
        }
    }
}

impl fmt::Display for EngineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EngineKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "basic" => Ok(EngineKind::Basic),
            "fuzzy" => Ok(EngineKind::Fuzzy),
            "semantic" => Ok(EngineKind::Semantic),
            other => anyhow::bail!(
                "Unknown engine '{other}' (expected 'basic', 'fuzzy' or 'semantic')"
            ),
        }
    }
}

/// Settings that shape an engine, independent of where they came from.
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub kind: EngineKind,
    pub both_missing: BothMissingPolicy,
    /// Only used by the fuzzy engine; `None` or 0 disables the bonus
    pub substring_bonus: Option<f64>,
}

/// Build the engine described by `settings`.
///
/// The semantic engine gets a LazyEmbedder over the embedding model
/// subdirectory of `model_dir`; nothing is loaded until the first comparison.
pub fn create_engine(settings: &EngineSettings, model_dir: &Path) -> Box<dyn SimilarityEngine> {
    match settings.kind {
        EngineKind::Basic => Box::new(StringEngine::basic(settings.both_missing)),
        EngineKind::Fuzzy => Box::new(
            StringEngine::fuzzy(settings.both_missing)
                .with_substring_bonus(settings.substring_bonus),
        ),
        EngineKind::Semantic => {
            let embedder = LazyEmbedder::new(download::embedding_model_dir(model_dir));
            Box::new(SemanticEngine::new(
                Box::new(embedder),
                settings.both_missing,
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_kind_parse_and_display() {
        for kind in [EngineKind::Basic, EngineKind::Fuzzy, EngineKind::Semantic] {
            assert_eq!(kind.to_string().parse::<EngineKind>().unwrap(), kind);
        }
        assert_eq!(" FUZZY ".parse::<EngineKind>().unwrap(), EngineKind::Fuzzy);
        assert!("levenshtein".parse::<EngineKind>().is_err());
    }

    #[test]
    fn test_create_engine_names() {
        let dir = std::env::temp_dir();
        for kind in [EngineKind::Basic, EngineKind::Fuzzy, EngineKind::Semantic] {
            let settings = EngineSettings {
                kind,
                both_missing: BothMissingPolicy::Unrelated,
                substring_bonus: Some(0.2),
            };
            assert_eq!(create_engine(&settings, &dir).name(), kind.as_str());
        }
    }
}
