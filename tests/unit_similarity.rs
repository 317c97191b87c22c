// Unit tests for the similarity engines.
//
// Tests the properties every engine must hold: identity, symmetry, range,
// missing-value handling, normalization, and the substring bonus.

use colsim::dataset::Cell;
use colsim::similarity::matcher::{ratio, symmetric_ratio};
use colsim::similarity::normalize::normalize;
use colsim::similarity::string::StringEngine;
use colsim::similarity::traits::BothMissingPolicy;

fn text(s: &str) -> Cell {
    Cell::Text(s.to_string())
}

fn engines() -> Vec<StringEngine> {
    vec![
        StringEngine::basic(BothMissingPolicy::Unrelated),
        StringEngine::fuzzy(BothMissingPolicy::Unrelated),
        StringEngine::basic(BothMissingPolicy::Identical),
        StringEngine::fuzzy(BothMissingPolicy::Identical),
    ]
}

const SAMPLES: [&str; 10] = [
    "Apple",
    "apple pie",
    "Banana",
    "Orange",
    "the cat sat",
    "cat",
    "Hello, World!",
    "Straße 12",
    "  spaced   out  ",
    "1234",
];

// ============================================================
// Identity, symmetry, range
// ============================================================

#[test]
fn identity_holds_for_every_engine() {
    for engine in engines() {
        for s in SAMPLES {
            assert_eq!(
                engine.similarity(&text(s), &text(s)),
                1.0,
                "{} on {s:?}",
                if engine.normalize { "fuzzy" } else { "basic" }
            );
        }
    }
}

#[test]
fn symmetry_holds_for_every_engine() {
    for engine in engines() {
        for a in SAMPLES {
            for b in SAMPLES {
                assert_eq!(
                    engine.similarity(&text(a), &text(b)),
                    engine.similarity(&text(b), &text(a)),
                    "{a:?} vs {b:?}"
                );
            }
        }
    }
}

#[test]
fn scores_stay_in_unit_range() {
    for engine in engines() {
        for a in SAMPLES {
            for b in SAMPLES {
                let s = engine.similarity(&text(a), &text(b));
                assert!((0.0..=1.0).contains(&s), "{a:?} vs {b:?} = {s}");
            }
        }
    }
}

#[test]
fn symmetric_ratio_matches_one_raw_order() {
    let s = symmetric_ratio("tide", "diet");
    assert!(s == ratio("tide", "diet") || s == ratio("diet", "tide"));
}

// ============================================================
// Missing values
// ============================================================

#[test]
fn exactly_one_missing_scores_zero() {
    for engine in engines() {
        assert_eq!(engine.similarity(&Cell::Empty, &text("x")), 0.0);
        assert_eq!(engine.similarity(&text("x"), &Cell::Empty), 0.0);
        assert_eq!(engine.similarity(&text("   "), &text("x")), 0.0);
    }
}

#[test]
fn both_missing_follows_policy() {
    let unrelated = StringEngine::fuzzy(BothMissingPolicy::Unrelated);
    let identical = StringEngine::fuzzy(BothMissingPolicy::Identical);
    assert_eq!(unrelated.similarity(&text(""), &text("")), 0.0);
    assert_eq!(identical.similarity(&text(""), &text("")), 1.0);
    assert_eq!(identical.similarity(&Cell::Empty, &text("  ")), 1.0);
}

// ============================================================
// Normalization and substring bonus
// ============================================================

#[test]
fn normalization_is_punctuation_case_space_insensitive() {
    let engine = StringEngine::fuzzy(BothMissingPolicy::Unrelated);
    assert_eq!(
        engine.similarity(&text("Hello, World!"), &text("hello world")),
        1.0
    );
    assert_eq!(normalize("\tHELLO,\n   world!!"), "hello world");
}

#[test]
fn substring_bonus_raises_score_but_caps_at_one() {
    let engine = StringEngine::fuzzy(BothMissingPolicy::Unrelated);
    let plain = StringEngine::fuzzy(BothMissingPolicy::Unrelated).with_substring_bonus(None);

    let boosted = engine.similarity(&text("cat"), &text("the cat sat"));
    let base = plain.similarity(&text("cat"), &text("the cat sat"));
    assert!(boosted > base);
    assert!(boosted <= 1.0);

    // Nearly identical strings with containment hit the cap
    let capped = engine.similarity(&text("apple"), &text("apples"));
    assert_eq!(capped, 1.0);
}

#[test]
fn no_bonus_without_containment() {
    let engine = StringEngine::fuzzy(BothMissingPolicy::Unrelated);
    let s = engine.similarity(&text("Banana"), &text("Orange"));
    assert!((s - ratio("banana", "orange")).abs() < 1e-12);
}

#[test]
fn non_text_cells_compare_by_text_form() {
    let engine = StringEngine::basic(BothMissingPolicy::Unrelated);
    assert_eq!(engine.similarity(&Cell::Number(7.0), &text("7")), 1.0);
    assert_eq!(engine.similarity(&Cell::Bool(true), &text("TRUE")), 1.0);
    assert!(engine.similarity(&Cell::Number(7.5), &text("7")) < 1.0);
}
