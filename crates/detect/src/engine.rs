use std::time::Instant;

use rayon::prelude::*;
use signals::{
    normalize_filename, normalize_reference, normalize_title, similarity_upper_bound,
    string_similarity, DocumentSignals, LibraryEntry,
};
use tracing::debug;

use crate::types::{
    Confidence, DetectConfig, DetectError, DocumentMatch, MatchDetectionResult, MatchSignal,
    SignalKind,
};

#[cfg(test)]
mod tests;

/// Similarity signals below this are treated as noise and not reported.
/// Combined with the length-disparity upper bound it also lets the
/// engine skip the edit-distance DP for candidates with no overlap
/// potential.
const MIN_SIMILARITY: f64 = 0.25;

/// Detector for classifying an upload against an existing library.
///
/// Detection is a pure function over the supplied snapshot: the
/// detector holds only configuration, never library state, so one
/// instance is safe to share across concurrent requests.
pub struct Detector {
    cfg: DetectConfig,
}

impl Detector {
    /// Construct a detector with an explicit, validated configuration.
    pub fn new(cfg: DetectConfig) -> Result<Self, DetectError> {
        cfg.validate()?;
        Ok(Self { cfg })
    }

    /// Construct a detector with the default weights and thresholds.
    pub fn with_defaults() -> Self {
        Self {
            cfg: DetectConfig::default(),
        }
    }

    pub fn config(&self) -> &DetectConfig {
        &self.cfg
    }

    /// Score the upload's signals against every library entry and
    /// return surviving candidates sorted by descending score.
    ///
    /// An empty match list is a valid outcome: the upload should be
    /// treated as a brand-new document.
    pub fn detect(
        &self,
        signals: &DocumentSignals,
        library: &[LibraryEntry],
    ) -> Result<MatchDetectionResult, DetectError> {
        if signals.is_blank() {
            return Err(DetectError::InvalidSignals(
                "upload carries no scoreable signal (title, number, filename, or OPR)".into(),
            ));
        }

        let start = Instant::now();
        let keys = UploadKeys::from_signals(signals);

        // Candidates are independent; score them in parallel and order
        // afterwards so the result stays deterministic.
        let mut matches: Vec<DocumentMatch> = library
            .par_iter()
            .filter_map(|entry| score_candidate(&keys, entry, &self.cfg))
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| b.tie_break_key().cmp(&a.tie_break_key()))
                .then_with(|| a.document_id.cmp(&b.document_id))
        });
        matches.truncate(self.cfg.max_results);

        let analysis_time_ms = start.elapsed().as_millis() as u64;
        debug!(
            candidates = library.len(),
            matches = matches.len(),
            analysis_time_ms,
            "match detection complete"
        );

        Ok(MatchDetectionResult {
            matches,
            extracted_title: non_blank(&signals.title),
            extracted_doc_number: signals.document_number.as_deref().and_then(non_blank),
            analysis_time_ms,
        })
    }
}

/// One-shot detection with the default configuration.
pub fn detect(
    signals: &DocumentSignals,
    library: &[LibraryEntry],
) -> Result<MatchDetectionResult, DetectError> {
    Detector::with_defaults().detect(signals, library)
}

/// Normalized forms of the upload's signals, computed once per call and
/// shared read-only across candidate scoring.
struct UploadKeys {
    title: String,
    filename: String,
    number: Option<String>,
    opr: Option<String>,
    /// Supersedes clauses in both normal forms, paired with the raw
    /// clause text for signal detail.
    refs: Vec<SupersedesRef>,
}

struct SupersedesRef {
    raw: String,
    reference: String,
    title: String,
}

impl UploadKeys {
    fn from_signals(signals: &DocumentSignals) -> Self {
        let refs = signals
            .supersedes_refs
            .iter()
            .filter(|r| !r.trim().is_empty())
            .map(|r| SupersedesRef {
                raw: r.trim().to_string(),
                reference: normalize_reference(r),
                title: normalize_title(r),
            })
            .collect();
        Self {
            title: normalize_title(&signals.title),
            filename: normalize_filename(&signals.filename),
            number: signals
                .document_number
                .as_deref()
                .map(normalize_reference)
                .filter(|n| !n.is_empty()),
            opr: signals
                .opr
                .as_deref()
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty()),
            refs,
        }
    }
}

fn score_candidate(
    keys: &UploadKeys,
    entry: &LibraryEntry,
    cfg: &DetectConfig,
) -> Option<DocumentMatch> {
    let mut signals: Vec<MatchSignal> = Vec::new();

    let entry_number = entry
        .document_number
        .as_deref()
        .map(normalize_reference)
        .filter(|n| !n.is_empty());
    let entry_title = normalize_title(&entry.name);
    let entry_short_title = entry
        .short_title
        .as_deref()
        .map(normalize_title)
        .filter(|t| !t.is_empty());

    if let Some(clause) = supersedes_hit(keys, entry_number.as_deref(), &entry_title, entry_short_title.as_deref())
    {
        signals.push(MatchSignal {
            kind: SignalKind::Supersedes,
            weight: cfg.supersedes_weight,
            similarity: None,
            detail: Some(format!("supersedes clause names this document: {clause}")),
        });
    }

    if let (Some(upload), Some(candidate)) = (keys.number.as_deref(), entry_number.as_deref()) {
        if upload == candidate {
            signals.push(MatchSignal {
                kind: SignalKind::DocumentNumber,
                weight: cfg.document_number_weight,
                similarity: None,
                detail: entry.document_number.clone(),
            });
        }
    }

    if let (Some(upload), Some(candidate)) = (keys.opr.as_deref(), entry.opr.as_deref()) {
        if upload.eq_ignore_ascii_case(candidate.trim()) {
            signals.push(MatchSignal {
                kind: SignalKind::Opr,
                weight: cfg.opr_weight,
                similarity: None,
                detail: Some(candidate.trim().to_string()),
            });
        }
    }

    let title_sim = best_similarity(
        &keys.title,
        [Some(entry_title.as_str()), entry_short_title.as_deref()],
    );
    if title_sim >= MIN_SIMILARITY {
        signals.push(MatchSignal {
            kind: SignalKind::Title,
            weight: title_sim * cfg.title_weight,
            similarity: Some(title_sim),
            detail: None,
        });
    }

    let filename_sim = best_similarity(
        &keys.filename,
        [Some(normalize_filename(&entry.filename).as_str())],
    );
    if filename_sim >= MIN_SIMILARITY {
        signals.push(MatchSignal {
            kind: SignalKind::Filename,
            weight: filename_sim * cfg.filename_weight,
            similarity: Some(filename_sim),
            detail: None,
        });
    }

    let score = signals.iter().map(|s| s.weight).sum::<f64>().min(1.0);
    if score < cfg.score_floor {
        return None;
    }

    Some(DocumentMatch {
        document_id: entry.id.clone(),
        score,
        confidence: Confidence::from_score(score, cfg),
        signals,
    })
}

/// Does any supersedes clause name this candidate, by normalized
/// publication number or normalized title? Clauses usually carry
/// trailing dates or descriptive text, so containment is checked rather
/// than strict equality.
fn supersedes_hit<'a>(
    keys: &'a UploadKeys,
    entry_number: Option<&str>,
    entry_title: &str,
    entry_short_title: Option<&str>,
) -> Option<&'a str> {
    for clause in &keys.refs {
        if let Some(number) = entry_number {
            if clause.reference.contains(number) {
                return Some(&clause.raw);
            }
        }
        if !entry_title.is_empty() && clause.title.contains(entry_title) {
            return Some(&clause.raw);
        }
        if let Some(short) = entry_short_title {
            if clause.title.contains(short) {
                return Some(&clause.raw);
            }
        }
    }
    None
}

/// Best similarity of the upload string against the candidate variants,
/// skipping the edit-distance DP whenever the length-disparity bound
/// already rules the pair out.
fn best_similarity<'a>(upload: &str, candidates: impl IntoIterator<Item = Option<&'a str>>) -> f64 {
    if upload.is_empty() {
        return 0.0;
    }
    let upload_len = upload.chars().count();
    let mut best = 0.0f64;
    for candidate in candidates.into_iter().flatten() {
        if candidate.is_empty() {
            continue;
        }
        let bound = similarity_upper_bound(upload_len, candidate.chars().count());
        if bound < MIN_SIMILARITY || bound <= best {
            continue;
        }
        best = best.max(string_similarity(upload, candidate));
    }
    best
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
