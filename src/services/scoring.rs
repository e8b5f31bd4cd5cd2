//! Rule-based candidate scoring and risk tagging.
//!
//! Pure evaluation: no external calls, no mutable state. Given the same
//! candidate, evidence, and tradition profile, `score` and `tag_risk`
//! always produce the same output. The rules read only the candidate's
//! generation parameters and the evidence pack.

use crate::domain::models::candidate::Candidate;
use crate::domain::models::evidence::EvidencePack;
use crate::domain::models::score::{Dimension, DimensionScore, RiskSeverity, RiskTag};
use crate::domain::models::tradition::TraditionProfile;

/// Composition vocabulary the visual-perception rule looks for.
const COMPOSITION_CUES: [&str; 6] = [
    "composition",
    "balance",
    "contrast",
    "perspective",
    "depth",
    "framing",
];

/// Samplers the technical rule considers well-behaved.
const KNOWN_SAMPLERS: [&str; 4] = ["euler_a", "ddim", "dpmpp_2m", "heun"];

/// Rule-based scoring and risk engine.
#[derive(Debug, Clone, Default)]
pub struct ScoringEngine;

impl ScoringEngine {
    pub fn new() -> Self {
        Self
    }

    /// Score a candidate on every dimension. Always returns exactly five
    /// entries, in canonical dimension order.
    pub fn score(
        &self,
        candidate: &Candidate,
        evidence: &EvidencePack,
        profile: &TraditionProfile,
    ) -> Vec<DimensionScore> {
        vec![
            self.score_visual(candidate),
            self.score_technical(candidate),
            self.score_cultural(candidate, evidence),
            self.score_interpretation(candidate, evidence),
            self.score_aesthetic(candidate, profile),
        ]
    }

    /// Attach risk tags to a candidate.
    ///
    /// Taboo patterns from the evidence are matched against the candidate's
    /// prompt with script-aware matching (see [`matches_pattern`]) and
    /// propagate with their evidence severity. Coverage and style rules add
    /// the fixed medium/low tags.
    pub fn tag_risk(
        &self,
        candidate: &Candidate,
        evidence: &EvidencePack,
        profile: &TraditionProfile,
    ) -> Vec<RiskTag> {
        let prompt = &candidate.generation_parameters.prompt;
        let mut tags = Vec::new();

        for violation in &evidence.taboo_violations {
            if matches_pattern(prompt, &violation.pattern) {
                tags.push(RiskTag::new(
                    format!("taboo_violation:{}", violation.pattern),
                    violation.severity,
                ));
            }
        }

        if evidence.sample_matches.is_empty() && evidence.terminology_hits.is_empty() {
            tags.push(RiskTag::new("low_evidence_coverage", RiskSeverity::Medium));
        } else if evidence.terminology_hits.is_empty() {
            tags.push(RiskTag::new("no_terminology_match", RiskSeverity::Low));
        }

        if !profile.style_keywords.is_empty()
            && !profile
                .style_keywords
                .iter()
                .any(|k| matches_pattern(prompt, k))
        {
            tags.push(RiskTag::new("style_mismatch", RiskSeverity::Medium));
        }

        tags
    }

    fn score_visual(&self, candidate: &Candidate) -> DimensionScore {
        let params = &candidate.generation_parameters;
        let mut score = 0.5;
        let mut notes = vec![format!("{}x{}", params.width, params.height)];

        if params.width >= 768 || params.height >= 768 {
            score += 0.15;
            notes.push("high resolution".to_string());
        }
        let prompt = params.prompt.to_lowercase();
        if COMPOSITION_CUES.iter().any(|cue| prompt.contains(cue)) {
            score += 0.15;
            notes.push("composition cues present".to_string());
        }
        if !params.negative_prompt.is_empty() {
            score += 0.1;
            notes.push("artifact suppression via negative prompt".to_string());
        }

        DimensionScore::new(Dimension::VisualPerception, score, notes.join("; "))
    }

    fn score_technical(&self, candidate: &Candidate) -> DimensionScore {
        let params = &candidate.generation_parameters;
        let mut score = 0.35 + 0.5 * f64::from(params.steps) / 50.0;
        let mut notes = vec![format!("{} sampling steps", params.steps)];

        if KNOWN_SAMPLERS.contains(&params.sampler.as_str()) {
            score += 0.1;
            notes.push(format!("known sampler {}", params.sampler));
        }

        DimensionScore::new(Dimension::TechnicalAnalysis, score, notes.join("; "))
    }

    fn score_cultural(&self, candidate: &Candidate, evidence: &EvidencePack) -> DimensionScore {
        let prompt = &candidate.generation_parameters.prompt;

        if evidence.terminology_hits.is_empty() {
            return DimensionScore::new(
                Dimension::CulturalContext,
                0.4,
                "no terminology evidence to match against",
            );
        }

        let matched = evidence
            .terminology_hits
            .iter()
            .filter(|hit| matches_pattern(prompt, &hit.term))
            .count();
        let coverage = matched as f64 / evidence.terminology_hits.len() as f64;
        let mut score = 0.3 + 0.55 * coverage;
        let mut notes = vec![format!(
            "{matched}/{} terminology hits in prompt",
            evidence.terminology_hits.len()
        )];

        if !evidence.sample_matches.is_empty() {
            score += 0.1;
            notes.push("reference works available".to_string());
        }

        DimensionScore::new(Dimension::CulturalContext, score, notes.join("; "))
    }

    fn score_interpretation(
        &self,
        candidate: &Candidate,
        evidence: &EvidencePack,
    ) -> DimensionScore {
        if evidence.sample_matches.is_empty() {
            return DimensionScore::new(
                Dimension::CriticalInterpretation,
                0.35,
                "no reference works to interpret against",
            );
        }

        let mean_relevance = evidence
            .sample_matches
            .iter()
            .map(|s| s.relevance.clamp(0.0, 1.0))
            .sum::<f64>()
            / evidence.sample_matches.len() as f64;
        let mut score = 0.3 + 0.5 * mean_relevance;
        let mut notes = vec![format!(
            "mean reference relevance {mean_relevance:.2} over {} works",
            evidence.sample_matches.len()
        )];

        if candidate.generation_parameters.prompt.len() > 120 {
            score += 0.1;
            notes.push("interpretively rich prompt".to_string());
        }

        DimensionScore::new(Dimension::CriticalInterpretation, score, notes.join("; "))
    }

    fn score_aesthetic(&self, candidate: &Candidate, profile: &TraditionProfile) -> DimensionScore {
        if profile.style_keywords.is_empty() {
            return DimensionScore::new(
                Dimension::Aesthetic,
                0.6,
                "tradition defines no stylistic vocabulary",
            );
        }

        let prompt = &candidate.generation_parameters.prompt;
        let matched = profile
            .style_keywords
            .iter()
            .filter(|k| matches_pattern(prompt, k))
            .count();
        let fraction = matched as f64 / profile.style_keywords.len() as f64;
        let mut score = 0.3 + 0.6 * fraction;
        let mut notes = vec![format!(
            "{matched}/{} stylistic keywords present",
            profile.style_keywords.len()
        )];

        if matched >= 3 {
            score += 0.1;
            notes.push("strong stylistic grounding".to_string());
        }

        DimensionScore::new(Dimension::Aesthetic, score, notes.join("; "))
    }
}

/// Script-aware phrase matching.
///
/// Logographic patterns (any CJK codepoint) match by exact substring, since
/// those scripts have no word delimiters. Alphabetic patterns match
/// case-insensitively at word boundaries, so a short pattern never matches
/// inside a longer unrelated word ("ink" does not match "thinker").
pub fn matches_pattern(text: &str, pattern: &str) -> bool {
    if pattern.is_empty() {
        return false;
    }
    if is_logographic(pattern) {
        return text.contains(pattern);
    }

    let text = text.to_lowercase();
    let pattern = pattern.to_lowercase();
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(&pattern) {
        let start = search_from + offset;
        let end = start + pattern.len();
        let boundary_before = text[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let boundary_after = text[end..].chars().next().is_none_or(|c| !c.is_alphanumeric());
        if boundary_before && boundary_after {
            return true;
        }
        search_from = start + pattern.chars().next().map_or(1, char::len_utf8);
    }
    false
}

/// Whether a pattern contains CJK codepoints.
fn is_logographic(pattern: &str) -> bool {
    pattern.chars().any(|c| {
        matches!(c,
            '\u{2E80}'..='\u{9FFF}'
            | '\u{F900}'..='\u{FAFF}'
            | '\u{20000}'..='\u{2FA1F}'
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::candidate::{GenerationParameters, Provenance};
    use crate::domain::models::evidence::{SampleMatch, TabooViolation, TerminologyHit};
    use crate::domain::models::tradition::TraditionCatalog;

    fn candidate(prompt: &str) -> Candidate {
        Candidate {
            candidate_id: "c0".to_string(),
            generation_parameters: GenerationParameters {
                prompt: prompt.to_string(),
                negative_prompt: "lowres".to_string(),
                seed: 7,
                width: 512,
                height: 768,
                steps: 30,
                sampler: "euler_a".to_string(),
                mask_hint: None,
            },
            provenance: Provenance {
                provider: "mock".to_string(),
                seed: 7,
                model_ref: "mock-v1".to_string(),
            },
            artifact_location: "mock/a.png".to_string(),
        }
    }

    fn evidence() -> EvidencePack {
        EvidencePack {
            sample_matches: vec![SampleMatch {
                title: "Dwelling in the Fuchun Mountains".to_string(),
                excerpt: "handscroll, ink on paper".to_string(),
                relevance: 0.8,
            }],
            terminology_hits: vec![
                TerminologyHit {
                    term: "liubai".to_string(),
                    meaning: None,
                },
                TerminologyHit {
                    term: "xieyi".to_string(),
                    meaning: None,
                },
            ],
            taboo_violations: vec![TabooViolation {
                pattern: "断头".to_string(),
                severity: RiskSeverity::Critical,
                description: "proscribed imagery".to_string(),
            }],
        }
    }

    fn profile() -> TraditionProfile {
        TraditionCatalog::builtin().resolve("chinese_ink").clone()
    }

    #[test]
    fn test_score_returns_all_dimensions_in_order() {
        let scores = ScoringEngine::new().score(&candidate("a prompt"), &evidence(), &profile());
        let dims: Vec<Dimension> = scores.iter().map(|s| s.dimension_id).collect();
        assert_eq!(dims, Dimension::ALL.to_vec());
    }

    #[test]
    fn test_scoring_is_deterministic() {
        let engine = ScoringEngine::new();
        let c = candidate("crane over pines, ink wash, liubai, balance");
        let first = engine.score(&c, &evidence(), &profile());
        let second = engine.score(&c, &evidence(), &profile());
        assert_eq!(first, second);
    }

    #[test]
    fn test_terminology_coverage_raises_cultural_score() {
        let engine = ScoringEngine::new();
        let none = engine.score(&candidate("plain text"), &evidence(), &profile());
        let full = engine.score(
            &candidate("study with liubai and xieyi brushwork"),
            &evidence(),
            &profile(),
        );
        let dim = Dimension::CulturalContext.index();
        assert!(full[dim].score > none[dim].score);
    }

    #[test]
    fn test_taboo_violation_propagates_severity() {
        let tags = ScoringEngine::new().tag_risk(
            &candidate("战场断头图"),
            &evidence(),
            &profile(),
        );
        assert!(tags
            .iter()
            .any(|t| t.name == "taboo_violation:断头" && t.severity == RiskSeverity::Critical));
    }

    #[test]
    fn test_no_evidence_yields_medium_coverage_tag() {
        let tags = ScoringEngine::new().tag_risk(
            &candidate("anything"),
            &EvidencePack::default(),
            &profile(),
        );
        assert!(tags
            .iter()
            .any(|t| t.name == "low_evidence_coverage" && t.severity == RiskSeverity::Medium));
    }

    #[test]
    fn test_missing_terminology_alone_yields_low_tag() {
        let pack = EvidencePack {
            sample_matches: evidence().sample_matches,
            terminology_hits: vec![],
            taboo_violations: vec![],
        };
        let tags = ScoringEngine::new().tag_risk(&candidate("anything"), &pack, &profile());
        assert!(tags
            .iter()
            .any(|t| t.name == "no_terminology_match" && t.severity == RiskSeverity::Low));
        assert!(!tags.iter().any(|t| t.name == "low_evidence_coverage"));
    }

    #[test]
    fn test_style_mismatch_when_no_keywords_present() {
        let tags =
            ScoringEngine::new().tag_risk(&candidate("a plain photo"), &evidence(), &profile());
        assert!(tags
            .iter()
            .any(|t| t.name == "style_mismatch" && t.severity == RiskSeverity::Medium));

        let tags = ScoringEngine::new().tag_risk(
            &candidate("ink wash landscape"),
            &evidence(),
            &profile(),
        );
        assert!(!tags.iter().any(|t| t.name == "style_mismatch"));
    }

    #[test]
    fn test_alphabetic_matching_respects_word_boundaries() {
        assert!(matches_pattern("an ink wash study", "ink"));
        assert!(!matches_pattern("a thinker at dusk", "ink"));
        assert!(matches_pattern("Ink, then color", "ink"));
        assert!(matches_pattern("gold leaf and lapis", "gold leaf"));
        assert!(!matches_pattern("marigold leafage", "gold leaf"));
    }

    #[test]
    fn test_logographic_matching_is_substring() {
        assert!(matches_pattern("山水断头図巻", "断头"));
        assert!(!matches_pattern("山水図巻", "断头"));
    }

    #[test]
    fn test_empty_pattern_never_matches() {
        assert!(!matches_pattern("anything", ""));
    }
}
