//! Evidence supplied by the scout collaborator.
//!
//! The pipeline treats evidence as an opaque input: how it was retrieved
//! (keyword search, semantic index) is the scout's concern. The scoring and
//! risk engine only reads the three collections below.

use serde::{Deserialize, Serialize};

use super::score::RiskSeverity;

/// A reference work that matched the subject under the tradition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleMatch {
    pub title: String,
    pub excerpt: String,
    /// Retrieval relevance in `[0.0, 1.0]`.
    pub relevance: f64,
}

/// A tradition-specific term that applies to the subject.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminologyHit {
    pub term: String,
    pub meaning: Option<String>,
}

/// A taboo the tradition attaches to this subject.
///
/// `pattern` is the phrase the risk engine matches against candidate
/// generation text; matching is script-aware (see
/// [`crate::services::scoring`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabooViolation {
    pub pattern: String,
    pub severity: RiskSeverity,
    pub description: String,
}

/// Everything the scout found for `(subject, tradition)`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvidencePack {
    pub sample_matches: Vec<SampleMatch>,
    pub terminology_hits: Vec<TerminologyHit>,
    pub taboo_violations: Vec<TabooViolation>,
}

impl EvidencePack {
    /// Whether the scout found nothing at all for the subject.
    pub fn is_empty(&self) -> bool {
        self.sample_matches.is_empty()
            && self.terminology_hits.is_empty()
            && self.taboo_violations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_pack() {
        assert!(EvidencePack::default().is_empty());
    }

    #[test]
    fn test_pack_with_terminology_is_not_empty() {
        let pack = EvidencePack {
            terminology_hits: vec![TerminologyHit {
                term: "liubai".to_string(),
                meaning: Some("intentional blank space".to_string()),
            }],
            ..Default::default()
        };
        assert!(!pack.is_empty());
    }
}
