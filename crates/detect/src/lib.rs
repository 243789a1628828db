//! # Lineage Detect (`detect`)
//!
//! ## Purpose
//!
//! `detect` decides whether an uploaded document is a brand-new policy
//! or a new version of something already in the library. It scores the
//! upload's extracted [`DocumentSignals`](signals::DocumentSignals)
//! against a read-only library snapshot and explains every match with
//! the individual signals that produced it.
//!
//! ## Scoring model
//!
//! Each candidate accumulates independent contributions:
//!
//! - `supersedes`: the upload's supersedes clause names the candidate
//!   (binary, highest weight)
//! - `document_number`: publication numbers equal after normalization
//! - `opr`: office of primary responsibility matches
//! - `title` / `filename`: continuous similarity times the base weight
//!
//! `score = min(1.0, Σ contributions)`, bucketed into a
//! [`Confidence`] tier. Candidates below the configured floor are
//! dropped; survivors are sorted descending with a fixed signal-
//! precedence tie-break and capped to `max_results`.
//!
//! Detection is pure and deterministic for fixed inputs and
//! parallelizes across library candidates internally.
//!
//! ## Example
//!
//! ```no_run
//! use detect::{Detector, DetectConfig};
//! use signals::DocumentSignals;
//!
//! let detector = Detector::new(DetectConfig::default()).expect("valid config");
//! let upload = DocumentSignals {
//!     title: "Grooming Standards Policy".into(),
//!     document_number: Some("DAFI 36-2903".into()),
//!     supersedes_refs: vec!["DAFI 36-2903, 10 February 2020".into()],
//!     filename: "dafi36-2903_v3.pdf".into(),
//!     opr: Some("AF/A1".into()),
//! };
//! let library = Vec::new();
//! let result = detector.detect(&upload, &library).expect("detect");
//! if result.matches.is_empty() {
//!     println!("treat as new document");
//! }
//! ```

pub mod engine;
pub mod types;

pub use crate::engine::{detect, Detector};
pub use crate::types::{
    Confidence, DetectConfig, DetectError, DocumentMatch, MatchDetectionResult, MatchSignal,
    SignalKind,
};
