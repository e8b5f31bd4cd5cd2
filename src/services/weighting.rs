//! Tradition weight resolution and per-round modulation.
//!
//! The engine owns no mutable state: `resolve` is a catalog lookup and
//! `modulate` is a pure function of its inputs. Reproducibility tests rely
//! on identical inputs producing bit-identical output vectors.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::domain::models::score::Dimension;
use crate::domain::models::tradition::{TraditionCatalog, WeightVector};
use crate::domain::models::WeightingConfig;

/// Minimum weight a dimension can be clamped down to.
const WEIGHT_FLOOR: f64 = 0.01;

/// Kinds of cross-layer signals that boost a dimension's weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossLayerSignalKind {
    /// A later layer reinterpreted an earlier layer's finding.
    Reinterpret,
    /// Two layers disagree about the same candidate.
    Conflict,
    /// The evidence base is too thin for the layer to judge.
    EvidenceGap,
}

/// A cross-layer signal flagging one dimension for extra weight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrossLayerSignal {
    pub kind: CrossLayerSignalKind,
    pub dimension: Dimension,
}

/// Resolves and modulates dimension-weight vectors.
#[derive(Debug, Clone)]
pub struct WeightingEngine {
    catalog: Arc<TraditionCatalog>,
    config: WeightingConfig,
}

impl WeightingEngine {
    pub fn new(catalog: Arc<TraditionCatalog>, config: WeightingConfig) -> Self {
        Self { catalog, config }
    }

    /// The static base weights for a tradition. Unknown traditions resolve
    /// to the default profile.
    pub fn resolve(&self, tradition: &str) -> WeightVector {
        self.catalog.resolve(tradition).weights
    }

    /// Modulate base weights for one round.
    ///
    /// Per dimension, in order:
    ///
    /// 1. boost by `1 + alpha * (1 - confidence)` — uncertain dimensions
    ///    get more scrutiny;
    /// 2. blend toward the uniform vector by a round-dependent decay
    ///    factor, `decay = max(0.5, 1 - decay_rate * (round - 1))`;
    /// 3. multiply by `signal_boost` for each dimension flagged by an
    ///    active cross-layer signal;
    /// 4. clamp into `[base - max_deviation, base + max_deviation]`,
    ///    floored at 0.01;
    /// 5. renormalize to sum 1.0, or return the uniform vector if the
    ///    total mass underflowed.
    pub fn modulate(
        &self,
        base: WeightVector,
        confidences: [f64; 5],
        round: u32,
        signals: &[CrossLayerSignal],
    ) -> WeightVector {
        let decay = (1.0 - self.config.decay_rate * f64::from(round.saturating_sub(1))).max(0.5);
        let uniform = WeightVector::uniform();

        let mut weights = [0.0_f64; 5];
        for dimension in Dimension::ALL {
            let i = dimension.index();
            let confidence = confidences[i].clamp(0.0, 1.0);
            let mut w = base.0[i] * (1.0 + self.config.alpha * (1.0 - confidence));
            w = decay * w + (1.0 - decay) * uniform.0[i];
            if signals.iter().any(|s| s.dimension == dimension) {
                w *= self.config.signal_boost;
            }
            let lo = (base.0[i] - self.config.max_deviation).max(WEIGHT_FLOOR);
            let hi = base.0[i] + self.config.max_deviation;
            weights[i] = w.clamp(lo, hi);
        }

        let total: f64 = weights.iter().sum();
        if total < 1e-9 {
            return uniform;
        }
        for w in &mut weights {
            *w /= total;
        }
        WeightVector(weights)
    }

    /// Convert a checkpointed confidence map (wire id → score) into the
    /// positional array `modulate` takes, defaulting absent dimensions to
    /// 0.5.
    pub fn confidences_from_map(map: Option<&BTreeMap<String, f64>>) -> [f64; 5] {
        let mut confidences = [0.5_f64; 5];
        if let Some(map) = map {
            for dimension in Dimension::ALL {
                if let Some(value) = map.get(dimension.id()) {
                    confidences[dimension.index()] = *value;
                }
            }
        }
        confidences
    }
}
