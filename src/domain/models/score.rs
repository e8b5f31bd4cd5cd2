//! Evaluation dimensions, per-dimension scores, and risk tags.
//!
//! Scores are plain serializable value types. The scoring rules that produce
//! them live in [`crate::services::scoring`]; the gate policy that consumes
//! them lives in [`crate::services::critic`]. Two conventions matter for
//! checkpoint compatibility:
//!
//! - Dimension identifiers serialize as `"L1"`..`"L5"`.
//! - All scores are rounded to 4 decimal places on serialization.

use serde::{Deserialize, Serialize, Serializer};

/// One of the five fixed evaluation axes.
///
/// The declaration order matches the lexical order of the identifiers, so
/// the derived `Ord` sorts `L1 < L2 < ... < L5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dimension {
    /// L1: visual perception (composition, color, form).
    #[serde(rename = "L1")]
    VisualPerception,
    /// L2: technical analysis (medium, process, craft).
    #[serde(rename = "L2")]
    TechnicalAnalysis,
    /// L3: cultural context (tradition, terminology, lineage).
    #[serde(rename = "L3")]
    CulturalContext,
    /// L4: critical interpretation (meaning, reference, argument).
    #[serde(rename = "L4")]
    CriticalInterpretation,
    /// L5: philosophical / aesthetic judgment.
    #[serde(rename = "L5")]
    Aesthetic,
}

impl Dimension {
    /// All dimensions in canonical (lexical) order.
    pub const ALL: [Dimension; 5] = [
        Dimension::VisualPerception,
        Dimension::TechnicalAnalysis,
        Dimension::CulturalContext,
        Dimension::CriticalInterpretation,
        Dimension::Aesthetic,
    ];

    /// The stable identifier used on the wire and in checkpoints.
    pub fn id(self) -> &'static str {
        match self {
            Dimension::VisualPerception => "L1",
            Dimension::TechnicalAnalysis => "L2",
            Dimension::CulturalContext => "L3",
            Dimension::CriticalInterpretation => "L4",
            Dimension::Aesthetic => "L5",
        }
    }

    /// Position in the canonical order, for weight-vector indexing.
    pub fn index(self) -> usize {
        match self {
            Dimension::VisualPerception => 0,
            Dimension::TechnicalAnalysis => 1,
            Dimension::CulturalContext => 2,
            Dimension::CriticalInterpretation => 3,
            Dimension::Aesthetic => 4,
        }
    }

    /// Parse a wire identifier back into a dimension.
    pub fn from_id(id: &str) -> Option<Dimension> {
        Dimension::ALL.into_iter().find(|d| d.id() == id)
    }
}

impl std::fmt::Display for Dimension {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

/// Severity of a risk tag. Ordering is ascending (`Low < ... < Critical`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// A named risk attached to a scored candidate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTag {
    pub name: String,
    pub severity: RiskSeverity,
}

impl RiskTag {
    pub fn new(name: impl Into<String>, severity: RiskSeverity) -> Self {
        Self {
            name: name.into(),
            severity,
        }
    }
}

/// Round a score to 4 decimal places (checkpoint rounding convention).
pub fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

fn serialize_round4<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_f64(round4(*value))
}

/// The score a candidate earned on a single dimension.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DimensionScore {
    pub dimension_id: Dimension,
    /// Score in `[0.0, 1.0]`.
    #[serde(serialize_with = "serialize_round4")]
    pub score: f64,
    /// Why the rule-based scorer arrived at this score.
    pub rationale: String,
}

impl DimensionScore {
    pub fn new(dimension_id: Dimension, score: f64, rationale: impl Into<String>) -> Self {
        Self {
            dimension_id,
            score: score.clamp(0.0, 1.0),
            rationale: rationale.into(),
        }
    }
}

/// The full evaluation of one candidate: per-dimension scores, the weighted
/// total, risk tags, and the gate verdict.
///
/// `weighted_total` is always `Σ weight[d] * score[d]` over the resolved
/// weight vector for the round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub candidate_id: String,
    pub dimension_scores: Vec<DimensionScore>,
    #[serde(serialize_with = "serialize_round4")]
    pub weighted_total: f64,
    pub risk_tags: Vec<RiskTag>,
    pub gate_passed: bool,
    pub rejected_reasons: Vec<String>,
}

impl CandidateScore {
    /// Look up this candidate's score on one dimension.
    pub fn score_for(&self, dimension: Dimension) -> Option<f64> {
        self.dimension_scores
            .iter()
            .find(|s| s.dimension_id == dimension)
            .map(|s| s.score)
    }

    /// Whether any attached risk tag has critical severity.
    pub fn has_critical_risk(&self) -> bool {
        self.risk_tags
            .iter()
            .any(|t| t.severity == RiskSeverity::Critical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_ids_are_lexically_ordered() {
        let ids: Vec<&str> = Dimension::ALL.iter().map(|d| d.id()).collect();
        let mut sorted = ids.clone();
        sorted.sort_unstable();
        assert_eq!(ids, sorted);
    }

    #[test]
    fn test_dimension_ord_matches_id_order() {
        assert!(Dimension::VisualPerception < Dimension::TechnicalAnalysis);
        assert!(Dimension::CriticalInterpretation < Dimension::Aesthetic);
    }

    #[test]
    fn test_dimension_serde_uses_layer_ids() {
        assert_eq!(
            serde_json::to_string(&Dimension::CulturalContext).unwrap(),
            "\"L3\""
        );
        let parsed: Dimension = serde_json::from_str("\"L5\"").unwrap();
        assert_eq!(parsed, Dimension::Aesthetic);
    }

    #[test]
    fn test_dimension_from_id_roundtrip() {
        for d in Dimension::ALL {
            assert_eq!(Dimension::from_id(d.id()), Some(d));
        }
        assert_eq!(Dimension::from_id("L9"), None);
    }

    #[test]
    fn test_risk_severity_ordering() {
        assert!(RiskSeverity::Low < RiskSeverity::Medium);
        assert!(RiskSeverity::High < RiskSeverity::Critical);
    }

    #[test]
    fn test_scores_round_to_four_decimals_on_serialization() {
        let score = DimensionScore::new(Dimension::VisualPerception, 0.123_456_789, "r");
        let json = serde_json::to_value(&score).unwrap();
        assert_eq!(json["score"], serde_json::json!(0.1235));
    }

    #[test]
    fn test_dimension_score_clamps_to_unit_interval() {
        assert_eq!(
            DimensionScore::new(Dimension::Aesthetic, 1.7, "r").score,
            1.0
        );
        assert_eq!(
            DimensionScore::new(Dimension::Aesthetic, -0.2, "r").score,
            0.0
        );
    }

    #[test]
    fn test_candidate_score_helpers() {
        let cs = CandidateScore {
            candidate_id: "c1".to_string(),
            dimension_scores: vec![DimensionScore::new(Dimension::CulturalContext, 0.4, "r")],
            weighted_total: 0.4,
            risk_tags: vec![RiskTag::new("taboo_violation:x", RiskSeverity::Critical)],
            gate_passed: false,
            rejected_reasons: vec!["critical risk".to_string()],
        };
        assert_eq!(cs.score_for(Dimension::CulturalContext), Some(0.4));
        assert_eq!(cs.score_for(Dimension::Aesthetic), None);
        assert!(cs.has_critical_risk());
    }
}
