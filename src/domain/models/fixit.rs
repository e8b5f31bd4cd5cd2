//! Structured repair plans passed from the critic to the generation stage.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::score::Dimension;

/// How the next round should use the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixItStrategy {
    /// Patch the prompt and regenerate with a mask hint.
    TargetedRepair,
    /// Too much is wrong; regenerate from scratch.
    FullRegenerate,
}

/// One repair instruction.
///
/// `priority` is ascending: 1 is the most urgent item. The generation stage
/// merges `prompt_delta` values in ascending priority order and takes the
/// `region_hint` of the lowest-priority-value item as the mask hint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixItem {
    pub target_layer: Dimension,
    pub issue: String,
    pub prompt_delta: String,
    pub region_hint: Option<String>,
    pub priority: u8,
}

/// An ordered set of repair instructions plus the scores that motivated it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixItPlan {
    pub items: Vec<FixItem>,
    pub overall_strategy: FixItStrategy,
    /// Per-dimension scores (by wire id) of the candidate the plan was
    /// derived from.
    pub source_scores: BTreeMap<String, f64>,
}

impl FixItPlan {
    /// Items sorted by ascending priority (most urgent first). The sort is
    /// stable, so items sharing a priority keep their plan order.
    pub fn items_by_priority(&self) -> Vec<&FixItem> {
        let mut items: Vec<&FixItem> = self.items.iter().collect();
        items.sort_by_key(|item| item.priority);
        items
    }

    /// The region hint of the most urgent item that carries one.
    pub fn primary_region_hint(&self) -> Option<&str> {
        self.items_by_priority()
            .into_iter()
            .find_map(|item| item.region_hint.as_deref())
    }

    /// The dimensions this plan targets, deduplicated, in canonical order.
    pub fn target_layers(&self) -> Vec<Dimension> {
        let mut layers: Vec<Dimension> = self.items.iter().map(|i| i.target_layer).collect();
        layers.sort_unstable();
        layers.dedup();
        layers
    }
}
