use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of evidence one [`MatchSignal`] contributes.
///
/// Declaration order is the tie-break precedence when two candidates
/// score identically: an explicit supersedes clause outranks a number
/// match, which outranks OPR, title, and filename evidence.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SignalKind {
    /// The upload's supersedes clause names the candidate.
    Supersedes,
    /// Publication numbers match after normalization.
    DocumentNumber,
    /// Office of primary responsibility matches.
    Opr,
    /// Title similarity.
    Title,
    /// Filename similarity.
    Filename,
}

impl SignalKind {
    pub(crate) const ALL: [SignalKind; 5] = [
        SignalKind::Supersedes,
        SignalKind::DocumentNumber,
        SignalKind::Opr,
        SignalKind::Title,
        SignalKind::Filename,
    ];
}

/// One contributing signal in a match explanation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchSignal {
    pub kind: SignalKind,
    /// Contribution to the candidate's score, in `[0, 1]`. For binary
    /// signals this is the configured weight; for similarity signals it
    /// is `similarity × base weight`.
    pub weight: f64,
    /// Raw similarity in `[0, 1]` for continuous signals; `None` for
    /// binary ones.
    #[serde(default)]
    pub similarity: Option<f64>,
    /// Human-readable evidence, e.g. the matching supersedes clause.
    #[serde(default)]
    pub detail: Option<String>,
}

/// Coarse confidence bucket derived from a continuous match score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Pure function of score and thresholds; nothing else feeds in.
    pub fn from_score(score: f64, cfg: &DetectConfig) -> Self {
        if score >= cfg.high_confidence {
            Confidence::High
        } else if score >= cfg.medium_confidence {
            Confidence::Medium
        } else {
            Confidence::Low
        }
    }
}

/// One library candidate the detector considers a plausible prior
/// version of the upload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentMatch {
    /// Library id of the candidate document.
    pub document_id: String,
    /// Capped weighted sum of `signals`, in `[0, 1]`.
    pub score: f64,
    pub confidence: Confidence,
    pub signals: Vec<MatchSignal>,
}

impl DocumentMatch {
    pub fn has_signal(&self, kind: SignalKind) -> bool {
        self.signals.iter().any(|s| s.kind == kind)
    }

    /// Signal-presence mask in precedence order, used to break exact
    /// score ties deterministically.
    pub(crate) fn tie_break_key(&self) -> [bool; 5] {
        let mut key = [false; 5];
        for (slot, kind) in key.iter_mut().zip(SignalKind::ALL) {
            *slot = self.has_signal(kind);
        }
        key
    }
}

/// Outcome of scoring one upload against the library snapshot.
///
/// An empty `matches` list is a valid, non-error outcome meaning
/// "treat as a brand-new document".
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MatchDetectionResult {
    /// Surviving candidates, sorted descending by score.
    pub matches: Vec<DocumentMatch>,
    /// Echo of the upload's extracted title, when present.
    #[serde(default)]
    pub extracted_title: Option<String>,
    /// Echo of the upload's extracted publication number, when present.
    #[serde(default)]
    pub extracted_doc_number: Option<String>,
    /// Wall-clock cost of this detection call.
    pub analysis_time_ms: u64,
}

/// Tunable weights and thresholds for match detection.
///
/// The defaults are policy, not law: every number is exposed here so
/// deployments can retune without touching the algorithm, and tests pin
/// the values they depend on explicitly.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DetectConfig {
    /// Weight of an explicit supersedes-clause hit.
    #[serde(default = "DetectConfig::default_supersedes_weight")]
    pub supersedes_weight: f64,
    /// Weight of a normalized publication-number match.
    #[serde(default = "DetectConfig::default_document_number_weight")]
    pub document_number_weight: f64,
    /// Weight of an OPR match.
    #[serde(default = "DetectConfig::default_opr_weight")]
    pub opr_weight: f64,
    /// Base weight multiplied by title similarity.
    #[serde(default = "DetectConfig::default_title_weight")]
    pub title_weight: f64,
    /// Base weight multiplied by filename similarity.
    #[serde(default = "DetectConfig::default_filename_weight")]
    pub filename_weight: f64,
    /// Scores at or above this classify as [`Confidence::High`].
    #[serde(default = "DetectConfig::default_high_confidence")]
    pub high_confidence: f64,
    /// Scores at or above this (and below `high_confidence`) classify
    /// as [`Confidence::Medium`].
    #[serde(default = "DetectConfig::default_medium_confidence")]
    pub medium_confidence: f64,
    /// Candidates scoring below this are dropped from the result.
    #[serde(default = "DetectConfig::default_score_floor")]
    pub score_floor: f64,
    /// Cap on returned matches.
    #[serde(default = "DetectConfig::default_max_results")]
    pub max_results: usize,
}

impl DetectConfig {
    pub(crate) fn default_supersedes_weight() -> f64 {
        0.9
    }

    pub(crate) fn default_document_number_weight() -> f64 {
        0.8
    }

    pub(crate) fn default_opr_weight() -> f64 {
        0.5
    }

    pub(crate) fn default_title_weight() -> f64 {
        0.4
    }

    pub(crate) fn default_filename_weight() -> f64 {
        0.3
    }

    pub(crate) fn default_high_confidence() -> f64 {
        0.75
    }

    pub(crate) fn default_medium_confidence() -> f64 {
        0.45
    }

    pub(crate) fn default_score_floor() -> f64 {
        0.2
    }

    pub(crate) fn default_max_results() -> usize {
        5
    }

    /// Validate the configuration for a detection call.
    pub fn validate(&self) -> Result<(), DetectError> {
        let weights = [
            ("supersedes_weight", self.supersedes_weight),
            ("document_number_weight", self.document_number_weight),
            ("opr_weight", self.opr_weight),
            ("title_weight", self.title_weight),
            ("filename_weight", self.filename_weight),
            ("high_confidence", self.high_confidence),
            ("medium_confidence", self.medium_confidence),
            ("score_floor", self.score_floor),
        ];
        for (name, value) in weights {
            if !(0.0..=1.0).contains(&value) {
                return Err(DetectError::InvalidConfig(format!(
                    "{name} must be within [0.0, 1.0], got {value}"
                )));
            }
        }
        if self.medium_confidence > self.high_confidence {
            return Err(DetectError::InvalidConfig(
                "medium_confidence must not exceed high_confidence".into(),
            ));
        }
        if self.score_floor > self.medium_confidence {
            return Err(DetectError::InvalidConfig(
                "score_floor must not exceed medium_confidence".into(),
            ));
        }
        if self.max_results == 0 {
            return Err(DetectError::InvalidConfig(
                "max_results must be greater than zero".into(),
            ));
        }
        Ok(())
    }
}

impl Default for DetectConfig {
    fn default() -> Self {
        Self {
            supersedes_weight: Self::default_supersedes_weight(),
            document_number_weight: Self::default_document_number_weight(),
            opr_weight: Self::default_opr_weight(),
            title_weight: Self::default_title_weight(),
            filename_weight: Self::default_filename_weight(),
            high_confidence: Self::default_high_confidence(),
            medium_confidence: Self::default_medium_confidence(),
            score_floor: Self::default_score_floor(),
            max_results: Self::default_max_results(),
        }
    }
}

/// Errors produced by the detection layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DetectError {
    /// Invalid configuration (weights, thresholds, limits).
    #[error("invalid detect config: {0}")]
    InvalidConfig(String),
    /// The upload's signals carry nothing scoreable.
    #[error("invalid document signals: {0}")]
    InvalidSignals(String),
}
