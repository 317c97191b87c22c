use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::similarity::download;
use crate::similarity::string::DEFAULT_SUBSTRING_BONUS;
use crate::similarity::traits::BothMissingPolicy;
use crate::similarity::{EngineKind, EngineSettings};

/// Default path for the processed workbook.
pub const DEFAULT_OUTPUT_PATH: &str = "processed_data.xlsx";

/// Central configuration loaded from environment variables.
///
/// The .env file is loaded automatically at startup via dotenvy. Command-line
/// flags override these values per invocation.
#[derive(Debug, Clone)]
pub struct Config {
    /// Which similarity engine to use (default: Fuzzy)
    pub engine: EngineKind,
    /// Score for pairs where both cells are missing (default: Unrelated)
    pub both_missing: BothMissingPolicy,
    /// Fuzzy-engine bonus when one value contains the other (default 0.2)
    pub substring_bonus: f64,
    /// Directory containing the ONNX model files
    pub model_dir: PathBuf,
    /// Where the processed workbook is written
    pub output_path: PathBuf,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Everything has a default; invalid values are reported rather than
    /// silently ignored.
    pub fn load() -> Result<Self> {
        let engine = match env::var("COLSIM_ENGINE") {
            Ok(v) => v.parse().context("Invalid COLSIM_ENGINE")?,
            Err(_) => EngineKind::default(),
        };

        let both_missing = match env::var("COLSIM_BOTH_MISSING") {
            Ok(v) => v.parse().context("Invalid COLSIM_BOTH_MISSING")?,
            Err(_) => BothMissingPolicy::default(),
        };

        let substring_bonus = match env::var("COLSIM_SUBSTRING_BONUS") {
            Ok(v) => parse_bonus(&v).context("Invalid COLSIM_SUBSTRING_BONUS")?,
            Err(_) => DEFAULT_SUBSTRING_BONUS,
        };

        let model_dir = env::var("COLSIM_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| download::default_model_dir());

        let output_path = env::var("COLSIM_OUTPUT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_OUTPUT_PATH));

        Ok(Self {
            engine,
            both_missing,
            substring_bonus,
            model_dir,
            output_path,
        })
    }

    /// Engine settings derived from this config.
    pub fn engine_settings(&self) -> EngineSettings {
        EngineSettings {
            kind: self.engine,
            both_missing: self.both_missing,
            substring_bonus: Some(self.substring_bonus),
        }
    }

    /// Validate that the chosen engine has what it needs.
    /// For Semantic: model files must exist (or user should run download-model).
    pub fn require_engine(&self) -> Result<()> {
        if self.engine == EngineKind::Semantic
            && !download::embedding_files_present(&self.model_dir)
        {
            anyhow::bail!(
                "Embedding model files not found in {}\n\
                 Run `colsim download-model` to download them.\n\
                 Or use --engine fuzzy for character-level matching instead.",
                download::embedding_model_dir(&self.model_dir).display()
            );
        }
        Ok(())
    }
}

/// Parse a substring bonus, which must be a finite number in [0, 1].
pub fn parse_bonus(raw: &str) -> Result<f64> {
    let bonus: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("'{raw}' is not a number"))?;
    if !bonus.is_finite() || !(0.0..=1.0).contains(&bonus) {
        anyhow::bail!("Substring bonus must be between 0 and 1, got {bonus}");
    }
    Ok(bonus)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(engine: EngineKind, model_dir: PathBuf) -> Config {
        Config {
            engine,
            both_missing: BothMissingPolicy::Unrelated,
            substring_bonus: DEFAULT_SUBSTRING_BONUS,
            model_dir,
            output_path: PathBuf::from(DEFAULT_OUTPUT_PATH),
        }
    }

    #[test]
    fn test_parse_bonus() {
        assert_eq!(parse_bonus("0.3").unwrap(), 0.3);
        assert_eq!(parse_bonus(" 0 ").unwrap(), 0.0);
        assert!(parse_bonus("1.5").is_err());
        assert!(parse_bonus("-0.1").is_err());
        assert!(parse_bonus("NaN").is_err());
        assert!(parse_bonus("lots").is_err());
    }

    #[test]
    fn test_require_engine_string_engines_need_nothing() {
        let dir = std::env::temp_dir().join("colsim-test-nonexistent");
        assert!(config(EngineKind::Fuzzy, dir.clone()).require_engine().is_ok());
        assert!(config(EngineKind::Basic, dir).require_engine().is_ok());
    }

    #[test]
    fn test_require_engine_semantic_needs_model() {
        let dir = std::env::temp_dir().join("colsim-test-nonexistent");
        let err = config(EngineKind::Semantic, dir)
            .require_engine()
            .unwrap_err()
            .to_string();
        assert!(err.contains("colsim download-model"), "got: {err}");
    }

    #[test]
    fn test_engine_settings_carries_bonus() {
        let dir = std::env::temp_dir();
        let settings = config(EngineKind::Fuzzy, dir).engine_settings();
        assert_eq!(settings.substring_bonus, Some(DEFAULT_SUBSTRING_BONUS));
        assert_eq!(settings.kind, EngineKind::Fuzzy);
    }
}
