//! Generated candidates and their provenance.

use serde::{Deserialize, Serialize};

/// The concrete parameters one candidate was generated with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParameters {
    pub prompt: String,
    pub negative_prompt: String,
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub sampler: String,
    /// Masking hint for targeted repair, if the round was driven by a
    /// fix-it plan.
    pub mask_hint: Option<String>,
}

/// Where a candidate came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Provenance {
    pub provider: String,
    pub seed: u64,
    pub model_ref: String,
}

/// One generated artifact. Never mutated after creation; a repaired
/// candidate is a new `Candidate` with a new id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub candidate_id: String,
    pub generation_parameters: GenerationParameters,
    pub provenance: Provenance,
    pub artifact_location: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_candidate_serde_roundtrip() {
        let candidate = Candidate {
            candidate_id: "t-1-r1-c0".to_string(),
            generation_parameters: GenerationParameters {
                prompt: "crane over pines, ink wash".to_string(),
                negative_prompt: "photorealistic".to_string(),
                seed: 42,
                width: 512,
                height: 768,
                steps: 30,
                sampler: "euler_a".to_string(),
                mask_hint: None,
            },
            provenance: Provenance {
                provider: "mock".to_string(),
                seed: 42,
                model_ref: "mock-v1".to_string(),
            },
            artifact_location: "mock/000000000000002a.png".to_string(),
        };
        let json = serde_json::to_string(&candidate).unwrap();
        let parsed: Candidate = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, candidate);
    }
}
