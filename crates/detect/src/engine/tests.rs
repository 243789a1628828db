use super::*;

use chrono::Utc;
use signals::{DocumentSignals, LibraryEntry};

fn entry(id: &str, name: &str, number: Option<&str>, filename: &str) -> LibraryEntry {
    LibraryEntry {
        id: id.to_string(),
        name: name.to_string(),
        short_title: None,
        document_number: number.map(str::to_string),
        filename: filename.to_string(),
        opr: None,
        updated_at: Utc::now(),
        current_version_id: format!("{id}-v1"),
    }
}

fn upload(title: &str, number: Option<&str>, refs: &[&str], filename: &str) -> DocumentSignals {
    DocumentSignals {
        title: title.to_string(),
        document_number: number.map(str::to_string),
        supersedes_refs: refs.iter().map(|r| r.to_string()).collect(),
        filename: filename.to_string(),
        opr: None,
    }
}

#[test]
fn exact_lineage_scores_high_with_both_signals() {
    // Scenario: the upload both names the prior document in its
    // supersedes clause and carries the same publication number.
    let library = vec![
        entry(
            "doc-grooming",
            "Grooming Standards Policy",
            Some("DAFI 36-2903"),
            "dafi36-2903.pdf",
        ),
        entry(
            "doc-fitness",
            "Fitness Program",
            Some("DAFMAN 36-2905"),
            "dafman36-2905.pdf",
        ),
    ];
    let signals = upload(
        "Grooming Standards Policy",
        Some("DAFI 36-2903"),
        &["DAFI 36-2903, 10 February 2020"],
        "dafi36-2903_v2.pdf",
    );

    let result = detect(&signals, &library).expect("detection should succeed");
    let top = result.matches.first().expect("expected a top match");

    assert_eq!(top.document_id, "doc-grooming");
    assert!(top.score >= 0.75, "score was {}", top.score);
    assert_eq!(top.confidence, Confidence::High);
    assert!(top.has_signal(SignalKind::Supersedes));
    assert!(top.has_signal(SignalKind::DocumentNumber));
    assert_eq!(result.extracted_doc_number.as_deref(), Some("DAFI 36-2903"));
}

#[test]
fn no_overlap_yields_empty_matches() {
    let library = vec![
        entry(
            "doc-grooming",
            "Grooming Standards Policy",
            Some("DAFI 36-2903"),
            "dafi36-2903.pdf",
        ),
        entry(
            "doc-fitness",
            "Fitness Program",
            Some("DAFMAN 36-2905"),
            "dafman36-2905.pdf",
        ),
    ];
    let signals = upload(
        "Quarterly Budget Execution Review",
        Some("XYZ 99-1"),
        &[],
        "budget_q3.xlsx",
    );

    let result = detect(&signals, &library).expect("detection should succeed");
    assert!(
        result.matches.is_empty(),
        "expected no matches, got {:?}",
        result.matches
    );
}

#[test]
fn supersedes_contribution_never_lowers_a_score() {
    let library = vec![entry(
        "doc-grooming",
        "Grooming Standards Policy",
        Some("DAFI 36-2903"),
        "dafi36-2903.pdf",
    )];
    let without = upload(
        "Grooming Standards Policy",
        Some("DAFI 36-2903"),
        &[],
        "dafi36-2903.pdf",
    );
    let with = upload(
        "Grooming Standards Policy",
        Some("DAFI 36-2903"),
        &["DAFI 36-2903"],
        "dafi36-2903.pdf",
    );

    let base = detect(&without, &library).expect("detect").matches[0].score;
    let boosted = detect(&with, &library).expect("detect").matches[0].score;
    assert!(
        boosted >= base,
        "supersedes must be monotone: {base} -> {boosted}"
    );
}

#[test]
fn supersedes_matches_by_title_when_number_is_absent() {
    let library = vec![entry(
        "doc-dress",
        "Dress and Appearance Standards",
        None,
        "dress_standards.pdf",
    )];
    let signals = upload(
        "Updated Appearance Guidance",
        None,
        &["Supersedes: Dress and Appearance Standards, 2019"],
        "appearance_2026.pdf",
    );

    let result = detect(&signals, &library).expect("detection should succeed");
    let top = result.matches.first().expect("expected a match");
    assert!(top.has_signal(SignalKind::Supersedes));
    assert!(top.score >= 0.75);
}

#[test]
fn candidates_below_floor_are_excluded_entirely() {
    let cfg = DetectConfig {
        score_floor: 0.2,
        ..DetectConfig::default()
    };
    let detector = Detector::new(cfg).expect("valid config");
    let library = vec![entry(
        "doc-remote",
        "Installation Traffic Safety Program",
        Some("AFI 91-207"),
        "afi91-207.pdf",
    )];
    // Filename only vaguely similar; nothing else overlaps.
    let signals = upload("Records Disposition Schedule", None, &[], "afi33-322.pdf");

    let result = detector
        .detect(&signals, &library)
        .expect("detection should succeed");
    for m in &result.matches {
        assert!(m.score >= 0.2, "floor violated: {m:?}");
    }
}

#[test]
fn results_sorted_descending_and_capped() {
    let cfg = DetectConfig {
        max_results: 2,
        ..DetectConfig::default()
    };
    let detector = Detector::new(cfg).expect("valid config");
    let library = vec![
        entry("doc-a", "Grooming Standards", Some("DAFI 36-2903"), "a.pdf"),
        entry("doc-b", "Grooming Standards Policy", None, "b.pdf"),
        entry("doc-c", "Grooming Standards Policy Manual", None, "c.pdf"),
    ];
    let signals = upload(
        "Grooming Standards Policy",
        Some("DAFI 36-2903"),
        &[],
        "grooming.pdf",
    );

    let result = detector
        .detect(&signals, &library)
        .expect("detection should succeed");
    assert!(result.matches.len() <= 2);
    for pair in result.matches.windows(2) {
        assert!(pair[0].score >= pair[1].score);
    }
    assert_eq!(result.matches[0].document_id, "doc-a");
}

#[test]
fn equal_scores_break_ties_by_signal_precedence() {
    // Build two candidates that score identically, one via a
    // document-number hit and one via an OPR hit plus padding weight.
    let cfg = DetectConfig {
        document_number_weight: 0.5,
        opr_weight: 0.5,
        title_weight: 0.0,
        filename_weight: 0.0,
        score_floor: 0.1,
        ..DetectConfig::default()
    };
    let detector = Detector::new(cfg).expect("valid config");

    let mut by_number = entry("doc-number", "Unrelated Alpha", Some("AFI 10-1"), "x.pdf");
    by_number.opr = None;
    let mut by_opr = entry("doc-opr", "Unrelated Bravo", None, "y.pdf");
    by_opr.opr = Some("AF/A1".into());

    let signals = DocumentSignals {
        title: "Completely Different Title".into(),
        document_number: Some("AFI 10-1".into()),
        supersedes_refs: Vec::new(),
        filename: "nothing-alike.pdf".into(),
        opr: Some("AF/A1".into()),
    };

    let result = detector
        .detect(&signals, &[by_opr, by_number])
        .expect("detection should succeed");
    assert_eq!(result.matches.len(), 2);
    assert_eq!(result.matches[0].score, result.matches[1].score);
    // document_number outranks opr at equal score.
    assert_eq!(result.matches[0].document_id, "doc-number");
}

#[test]
fn blank_signals_are_rejected() {
    let signals = DocumentSignals {
        title: "  ".into(),
        document_number: None,
        supersedes_refs: Vec::new(),
        filename: String::new(),
        opr: None,
    };
    let err = detect(&signals, &[]).expect_err("blank signals must fail");
    assert!(matches!(err, DetectError::InvalidSignals(_)));
}

#[test]
fn empty_library_is_a_valid_input() {
    let signals = upload("Anything", None, &[], "anything.pdf");
    let result = detect(&signals, &[]).expect("detection should succeed");
    assert!(result.matches.is_empty());
}

#[test]
fn score_is_capped_at_one() {
    let library = vec![{
        let mut e = entry(
            "doc-all",
            "Grooming Standards Policy",
            Some("DAFI 36-2903"),
            "dafi36-2903.pdf",
        );
        e.opr = Some("AF/A1".into());
        e
    }];
    let mut signals = upload(
        "Grooming Standards Policy",
        Some("DAFI 36-2903"),
        &["DAFI 36-2903"],
        "dafi36-2903.pdf",
    );
    signals.opr = Some("AF/A1".into());

    let result = detect(&signals, &library).expect("detection should succeed");
    let top = &result.matches[0];
    assert!(top.score <= 1.0);
    assert_eq!(top.score, 1.0);
    assert!(top.signals.len() >= 4);
}

#[test]
fn detection_is_deterministic_for_fixed_inputs() {
    let library = vec![
        entry("doc-a", "Grooming Standards", Some("DAFI 36-2903"), "a.pdf"),
        entry("doc-b", "Grooming Standards Policy", None, "b.pdf"),
    ];
    let signals = upload("Grooming Standards", Some("DAFI 36-2903"), &[], "a.pdf");

    let first = detect(&signals, &library).expect("detect");
    let second = detect(&signals, &library).expect("detect");
    assert_eq!(first.matches, second.matches);
}
