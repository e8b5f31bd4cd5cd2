//! Gate policy scenarios driven through the critic stage.

use std::sync::Arc;

use atelier::adapters::MemoryCheckpointStore;
use atelier::CheckpointStore;
use atelier::domain::models::{
    Candidate, CritiqueConfig, CritiqueInput, EvidencePack, TraditionCatalog, WeightingConfig,
};
use atelier::services::{CriticStage, CritiqueContext, WeightingEngine};

fn critic(config: CritiqueConfig) -> (CriticStage, Arc<MemoryCheckpointStore>) {
    let catalog = Arc::new(TraditionCatalog::builtin());
    let checkpoints = Arc::new(MemoryCheckpointStore::new());
    let stage = CriticStage::new(
        WeightingEngine::new(Arc::clone(&catalog), WeightingConfig::default()),
        catalog,
        config,
        Arc::clone(&checkpoints) as _,
    );
    (stage, checkpoints)
}

fn candidate(id: &str, prompt: &str) -> Candidate {
    use atelier::domain::models::candidate::{GenerationParameters, Provenance};
    Candidate {
        candidate_id: id.to_string(),
        generation_parameters: GenerationParameters {
            prompt: prompt.to_string(),
            negative_prompt: "lowres".to_string(),
            seed: 7,
            width: 512,
            height: 512,
            steps: 30,
            sampler: "euler_a".to_string(),
            mask_hint: None,
        },
        provenance: Provenance {
            provider: "mock".to_string(),
            seed: 7,
            model_ref: "mock-v1".to_string(),
        },
        artifact_location: format!("mock/{id}.png"),
    }
}

fn rich_prompt() -> String {
    // Hits the full stylistic and terminology vocabulary for chinese_ink.
    "mountain hermitage, ink wash, xieyi, liubai, brushwork, rice paper, literati, \
     balanced composition with depth"
        .to_string()
}

fn evidence() -> EvidencePack {
    let catalog = TraditionCatalog::builtin();
    let profile = catalog.resolve("chinese_ink");
    EvidencePack {
        sample_matches: vec![atelier::domain::models::SampleMatch {
            title: "Travelers Among Mountains and Streams".to_string(),
            excerpt: "monumental landscape, towering peak".to_string(),
            relevance: 0.9,
        }],
        terminology_hits: profile
            .style_keywords
            .iter()
            .map(|term| atelier::domain::models::TerminologyHit {
                term: term.clone(),
                meaning: None,
            })
            .collect(),
        taboo_violations: profile.taboos.clone(),
    }
}

fn input(candidates: Vec<Candidate>) -> CritiqueInput {
    CritiqueInput {
        task_id: "t-gate".to_string(),
        subject: "mountain hermitage".to_string(),
        tradition: "chinese_ink".to_string(),
        round: 1,
        evidence: evidence(),
        candidates,
    }
}

#[tokio::test]
async fn test_empty_candidate_list_yields_failure_result_and_checkpoint() {
    let (stage, checkpoints) = critic(CritiqueConfig::default());
    let output = stage.run(&input(vec![]), &CritiqueContext::default()).await;

    assert!(!output.success);
    assert!(output.scored_candidates.is_empty());
    assert!(output.best_candidate_id.is_none());
    // Failure results are still checkpointed.
    assert_eq!(checkpoints.stage_count().await, 1);
    assert!(checkpoints
        .load("t-gate", "critique")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_critical_taboo_blocks_regardless_of_total() {
    let (stage, _) = critic(CritiqueConfig::default());
    let tainted = format!("{} with 断头 imagery", rich_prompt());
    let output = stage
        .run(
            &input(vec![candidate("c-taboo", &tainted)]),
            &CritiqueContext::default(),
        )
        .await;

    let scored = &output.scored_candidates[0];
    assert!(scored.weighted_total >= 0.7, "high-scoring by construction");
    assert!(!scored.gate_passed);
    assert!(scored
        .rejected_reasons
        .iter()
        .any(|r| r.contains("critical risk")));
    assert!(output.best_candidate_id.is_none());
}

#[tokio::test]
async fn test_critical_taboo_passes_when_blocking_disabled() {
    let (stage, _) = critic(CritiqueConfig {
        critical_risk_blocks: false,
        ..CritiqueConfig::default()
    });
    let tainted = format!("{} with 断头 imagery", rich_prompt());
    let output = stage
        .run(
            &input(vec![candidate("c-taboo", &tainted)]),
            &CritiqueContext::default(),
        )
        .await;

    let scored = &output.scored_candidates[0];
    assert!(scored.has_critical_risk());
    assert!(scored.gate_passed);
    assert_eq!(output.best_candidate_id.as_deref(), Some("c-taboo"));
}

#[tokio::test]
async fn test_weighted_total_matches_resolved_weights() {
    let (stage, _) = critic(CritiqueConfig::default());
    let output = stage
        .run(
            &input(vec![
                candidate("c-a", &rich_prompt()),
                candidate("c-b", "a plain photograph"),
            ]),
            &CritiqueContext::default(),
        )
        .await;

    assert!((output.weights.values().sum::<f64>() - 1.0).abs() < 1e-6);
    for scored in &output.scored_candidates {
        let expected: f64 = scored
            .dimension_scores
            .iter()
            .map(|s| output.weights[s.dimension_id.id()] * s.score)
            .sum();
        assert!((scored.weighted_total - expected).abs() < 1e-9);
    }
}

#[tokio::test]
async fn test_ranking_is_stable_with_id_tiebreak() {
    let (stage, _) = critic(CritiqueConfig::default());
    // Identical prompts score identically; ids break the tie.
    let output = stage
        .run(
            &input(vec![
                candidate("c-b", &rich_prompt()),
                candidate("c-a", &rich_prompt()),
                candidate("c-c", &rich_prompt()),
            ]),
            &CritiqueContext::default(),
        )
        .await;

    let order: Vec<&str> = output
        .scored_candidates
        .iter()
        .map(|s| s.candidate_id.as_str())
        .collect();
    assert_eq!(order, vec!["c-a", "c-b", "c-c"]);
    assert_eq!(output.best_candidate_id.as_deref(), Some("c-a"));
}

#[tokio::test]
async fn test_top_k_truncates_after_ranking() {
    let (stage, _) = critic(CritiqueConfig {
        top_k: 2,
        ..CritiqueConfig::default()
    });
    let output = stage
        .run(
            &input(vec![
                candidate("c-a", &rich_prompt()),
                candidate("c-b", &rich_prompt()),
                candidate("c-c", "a plain photograph"),
            ]),
            &CritiqueContext::default(),
        )
        .await;

    assert_eq!(output.scored_candidates.len(), 2);
    // The weak candidate is the one truncated away.
    assert!(output
        .scored_candidates
        .iter()
        .all(|s| s.candidate_id != "c-c"));
}

#[tokio::test]
async fn test_weak_round_produces_repair_plan_not_hint() {
    let (stage, _) = critic(CritiqueConfig::default());
    // No evidence: cultural and interpretive scores sag below the repair
    // threshold but stay above the collapse threshold, so the round gets a
    // fix-it plan while the rerun hint stays empty.
    let mut weak_input = input(vec![candidate("c-weak", "bare text")]);
    weak_input.evidence = EvidencePack::default();
    let output = stage.run(&weak_input, &CritiqueContext::default()).await;

    assert!(output.best_candidate_id.is_none());
    assert!(output.rerun_hint.is_empty());
    let plan = output.fixit_plan.expect("failing round plans repairs");
    assert!(!plan.items.is_empty());
    // Most urgent item first.
    let priorities: Vec<u8> = plan.items.iter().map(|i| i.priority).collect();
    let mut sorted = priorities.clone();
    sorted.sort_unstable();
    assert_eq!(priorities, sorted);
}
