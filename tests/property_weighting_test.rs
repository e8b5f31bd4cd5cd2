//! Property tests for the weighting engine's laws.

use std::sync::Arc;

use proptest::prelude::*;

use atelier::domain::models::{Dimension, TraditionCatalog, WeightingConfig};
use atelier::services::{CrossLayerSignal, CrossLayerSignalKind, WeightingEngine};

fn engine() -> WeightingEngine {
    WeightingEngine::new(
        Arc::new(TraditionCatalog::builtin()),
        WeightingConfig::default(),
    )
}

fn tradition_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("chinese_ink".to_string()),
        Just("japanese_ukiyoe".to_string()),
        Just("european_oil".to_string()),
        Just("persian_miniature".to_string()),
        Just("default".to_string()),
        // Unknown keys resolve to the default profile.
        "[a-z_]{1,16}",
    ]
}

fn signals_strategy() -> impl Strategy<Value = Vec<CrossLayerSignal>> {
    prop::collection::vec(
        (0usize..5, 0usize..3).prop_map(|(d, k)| CrossLayerSignal {
            dimension: Dimension::ALL[d],
            kind: match k {
                0 => CrossLayerSignalKind::Reinterpret,
                1 => CrossLayerSignalKind::Conflict,
                _ => CrossLayerSignalKind::EvidenceGap,
            },
        }),
        0..6,
    )
}

proptest! {
    #[test]
    fn prop_resolved_weights_sum_to_one(tradition in tradition_strategy()) {
        let weights = engine().resolve(&tradition);
        prop_assert!((weights.sum() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn prop_modulated_weights_sum_to_one(
        tradition in tradition_strategy(),
        confidences in prop::array::uniform5(0.0f64..=1.0),
        round in 1u32..=20,
        signals in signals_strategy(),
    ) {
        let engine = engine();
        let base = engine.resolve(&tradition);
        let modulated = engine.modulate(base, confidences, round, &signals);

        prop_assert!((modulated.0.iter().sum::<f64>() - 1.0).abs() < 1e-9);
        prop_assert!(modulated.0.iter().all(|w| *w > 0.0));
    }

    #[test]
    fn prop_modulate_is_pure(
        tradition in tradition_strategy(),
        confidences in prop::array::uniform5(0.0f64..=1.0),
        round in 1u32..=20,
        signals in signals_strategy(),
    ) {
        let engine = engine();
        let base = engine.resolve(&tradition);
        let first = engine.modulate(base, confidences, round, &signals);
        let second = engine.modulate(base, confidences, round, &signals);

        // Bit-identical, not merely approximately equal.
        for (a, b) in first.0.iter().zip(second.0.iter()) {
            prop_assert_eq!(a.to_bits(), b.to_bits());
        }
    }

    #[test]
    fn prop_weighted_total_stays_in_unit_interval_and_is_monotone(
        scores in prop::array::uniform5(0.0f64..=1.0),
        confidences in prop::array::uniform5(0.0f64..=1.0),
        round in 1u32..=10,
        bump_index in 0usize..5,
    ) {
        let engine = engine();
        let weights = engine.modulate(engine.resolve("chinese_ink"), confidences, round, &[]);

        let total: f64 = Dimension::ALL
            .into_iter()
            .map(|d| weights.get(d) * scores[d.index()])
            .sum();
        prop_assert!((0.0..=1.0 + 1e-9).contains(&total));

        // Raising one dimension's score can only raise the total.
        let mut bumped = scores;
        bumped[bump_index] = 1.0;
        let bumped_total: f64 = Dimension::ALL
            .into_iter()
            .map(|d| weights.get(d) * bumped[d.index()])
            .sum();
        prop_assert!(bumped_total + 1e-12 >= total);
    }
}
