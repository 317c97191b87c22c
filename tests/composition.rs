// Composition tests: verifying that the stages chain together correctly.
//
// These tests exercise the data flow between modules:
//   Dataset -> Engine -> score_columns -> summarize / histogram / writers
// without downloading or loading a real embedding model.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;

use colsim::dataset::reader::{self, InputFormat};
use colsim::dataset::writer;
use colsim::dataset::{Cell, Dataset};
use colsim::scoring::stats::{filter_by_threshold, histogram, summarize};
use colsim::scoring::{score_columns, SCORE_COLUMN};
use colsim::similarity::embeddings::Embedder;
use colsim::similarity::semantic::SemanticEngine;
use colsim::similarity::string::StringEngine;
use colsim::similarity::traits::{BothMissingPolicy, SimilarityEngine};
use colsim::similarity::{create_engine, EngineKind, EngineSettings};

fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

fn fruit_dataset() -> Dataset {
    Dataset::new(
        vec!["A".to_string(), "B".to_string()],
        vec![
            vec![text("Apple"), text("apple")],
            vec![text("Banana"), text("Orange")],
            vec![text(""), text("")],
        ],
    )
}

// ============================================================
// Chain: Dataset -> fuzzy engine -> scores -> stats
// ============================================================

#[tokio::test]
async fn fruit_example_scores_under_both_policies() {
    for (policy, blank_score) in [
        (BothMissingPolicy::Unrelated, 0.0),
        (BothMissingPolicy::Identical, 1.0),
    ] {
        let mut ds = fruit_dataset();
        let engine = StringEngine::fuzzy(policy);
        let run = score_columns(&mut ds, "A", "B", &engine).await.unwrap();

        assert_eq!(run.scores.len(), 3);
        assert_eq!(run.scores[0], 1.0);
        assert!(run.scores[1] < 0.5, "Banana/Orange should be low: {}", run.scores[1]);
        assert_eq!(run.scores[2], blank_score);
        assert!(run.failures.is_empty());

        // Row count unchanged, score column index-aligned
        assert_eq!(ds.row_count(), 3);
        let score_idx = ds.column_index(SCORE_COLUMN).unwrap();
        for (row, score) in ds.rows().iter().zip(&run.scores) {
            assert_eq!(row[score_idx], Cell::Number(*score));
        }
    }
}

#[tokio::test]
async fn summary_of_scored_run() {
    let mut ds = Dataset::new(
        vec!["A".to_string(), "B".to_string()],
        vec![
            vec![text("same"), text("same")],
            vec![text("abcd"), text("abxy")],
            vec![text("abc"), text("xyz")],
        ],
    );
    let engine = StringEngine::basic(BothMissingPolicy::Unrelated);
    let run = score_columns(&mut ds, "A", "B", &engine).await.unwrap();
    assert_eq!(run.scores, vec![1.0, 0.5, 0.0]);

    let stats = summarize(&run.scores).unwrap();
    assert_eq!(stats.average, "50.00%");
    assert_eq!(stats.median, "50.00%");
    assert_eq!(stats.min, "0.00%");
    assert_eq!(stats.max, "100.00%");

    let bins = histogram(&run.scores, 20);
    assert_eq!(bins.iter().sum::<usize>(), 3);
    assert_eq!(filter_by_threshold(&run.scores, 0.5), vec![0, 1]);
}

#[tokio::test]
async fn empty_dataset_has_no_summary() {
    let mut ds = Dataset::new(vec!["A".to_string(), "B".to_string()], vec![]);
    let engine = StringEngine::fuzzy(BothMissingPolicy::Unrelated);
    let run = score_columns(&mut ds, "A", "B", &engine).await.unwrap();
    assert!(run.scores.is_empty());
    assert!(summarize(&run.scores).is_none());
}

// ============================================================
// Chain: CSV file -> engine -> workbook -> read back
// ============================================================

#[tokio::test]
async fn csv_in_workbook_out() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("input.csv");
    std::fs::write(
        &input,
        "Product,Listing,Similarity_Score\nHello World,\"hello, world!\",stale\nCat,The cat sat,stale\n",
    )
    .unwrap();

    let mut ds = reader::load(Some(&input)).unwrap();
    let engine = create_engine(
        &EngineSettings {
            kind: EngineKind::Fuzzy,
            both_missing: BothMissingPolicy::Unrelated,
            substring_bonus: Some(0.2),
        },
        dir.path(),
    );
    let run = score_columns(&mut ds, "Product", "Listing", engine.as_ref())
        .await
        .unwrap();
    assert_eq!(run.scores[0], 1.0);

    // Pre-existing score column is overwritten, not duplicated
    assert_eq!(ds.columns(), &["Product", "Listing", SCORE_COLUMN]);

    let output = dir.path().join("processed_data.xlsx");
    writer::write_xlsx(&ds, &output).unwrap();
    let back = reader::read_dataset(&output, InputFormat::Xlsx).unwrap();
    assert_eq!(back.rows()[0][2], Cell::Number(1.0));
    assert_eq!(back.rows()[1][2], Cell::Number(run.scores[1]));
}

// ============================================================
// Semantic engine with a stub embedder
// ============================================================

/// Maps known words onto fixed directions; anything else fails.
struct StubEmbedder {
    calls: Arc<AtomicUsize>,
}

impl StubEmbedder {
    fn vector(text: &str) -> Option<Vec<f64>> {
        match text {
            "dog" | "perro" => Some(vec![1.0, 0.0]),
            "cat" | "gato" => Some(vec![0.0, 1.0]),
            "not a dog" => Some(vec![-1.0, 0.0]),
            _ => None,
        }
    }
}

#[async_trait]
impl Embedder for StubEmbedder {
    async fn embed_batch(&self, texts: &[String]) -> anyhow::Result<Vec<Vec<f64>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        texts
            .iter()
            .map(|t| {
                Self::vector(t).ok_or_else(|| anyhow::anyhow!("no embedding for '{t}'"))
            })
            .collect()
    }
}

#[tokio::test]
async fn semantic_engine_scores_and_degrades_per_row() {
    let calls = Arc::new(AtomicUsize::new(0));
    let engine = SemanticEngine::new(
        Box::new(StubEmbedder {
            calls: Arc::clone(&calls),
        }),
        BothMissingPolicy::Unrelated,
    );

    let mut ds = Dataset::new(
        vec!["en".to_string(), "es".to_string()],
        vec![
            vec![text(" dog "), text("perro")],
            vec![text("cat"), text("perro")],
            vec![text("dog"), text("not a dog")],
            vec![text("zebra"), text("cebra")],
            vec![Cell::Empty, text("gato")],
        ],
    );

    let run = score_columns(&mut ds, "en", "es", &engine).await.unwrap();

    assert_eq!(run.scores.len(), 5);
    assert!((run.scores[0] - 1.0).abs() < 1e-10);
    assert!((run.scores[1] - 0.5).abs() < 1e-10);
    assert!(run.scores[2].abs() < 1e-10);
    // unknown words fail, but only their own row
    assert_eq!(run.scores[3], 0.0);
    assert_eq!(run.scores[4], 0.0);

    assert_eq!(run.failures.len(), 1);
    assert_eq!(run.failures[0].row, 3);
    assert!(run.failures[0].message.contains("zebra"));

    // one failed batch call, then one retry per text in the chunk
    assert!(calls.load(Ordering::SeqCst) > 1);
}

#[tokio::test]
async fn semantic_engine_without_model_degrades_to_zero() {
    let dir = tempfile::tempdir().unwrap();
    let engine = create_engine(
        &EngineSettings {
            kind: EngineKind::Semantic,
            both_missing: BothMissingPolicy::Identical,
            substring_bonus: None,
        },
        dir.path(),
    );

    let result = engine.compare(&text("hola"), &text("hello")).await;
    assert_eq!(result.score, 0.0);
    assert!(result.error.unwrap().contains("download-model"));

    // Missing pairs never reach the model
    let blank = engine.compare(&Cell::Empty, &Cell::Empty).await;
    assert_eq!(blank.score, 1.0);
    assert!(blank.error.is_none());
}
