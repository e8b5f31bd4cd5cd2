//! Cultural tradition profiles and the weight vectors they carry.
//!
//! The catalog is an immutable configuration object constructed once at
//! orchestrator setup. There is no process-wide registry: components that
//! need tradition knowledge receive a reference to the catalog they were
//! built with. A `"default"` profile is always present, and unknown
//! tradition keys resolve to it.

use std::collections::BTreeMap;
use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::evidence::TabooViolation;
use super::score::{Dimension, RiskSeverity};

/// A per-dimension weight vector, indexed in canonical dimension order.
///
/// Valid vectors sum to 1.0 (± 1e-6). Construction does not enforce this;
/// [`WeightVector::normalized`] and the weighting engine do.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeightVector(pub [f64; 5]);

impl WeightVector {
    /// The uniform vector (0.2 on every dimension).
    pub fn uniform() -> Self {
        WeightVector([0.2; 5])
    }

    pub fn get(&self, dimension: Dimension) -> f64 {
        self.0[dimension.index()]
    }

    pub fn sum(&self) -> f64 {
        self.0.iter().sum()
    }

    /// Rescale so the vector sums to 1.0. Returns the uniform vector if the
    /// total mass is too small to divide by.
    pub fn normalized(&self) -> Self {
        let total = self.sum();
        if total < 1e-9 {
            return Self::uniform();
        }
        let mut out = self.0;
        for w in &mut out {
            *w /= total;
        }
        WeightVector(out)
    }

    /// Map keyed by wire dimension id, for checkpoint payloads.
    pub fn to_map(&self) -> BTreeMap<String, f64> {
        Dimension::ALL
            .into_iter()
            .map(|d| (d.id().to_string(), self.get(d)))
            .collect()
    }
}

/// The evaluative profile of one cultural tradition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraditionProfile {
    pub name: String,
    /// Base dimension weights (must sum to 1.0).
    pub weights: WeightVector,
    /// Stylistic vocabulary expected in generation text for this tradition.
    pub style_keywords: Vec<String>,
    /// Subject-independent taboos the in-process scout can surface.
    pub taboos: Vec<TabooViolation>,
}

/// Immutable lookup table of tradition profiles.
#[derive(Debug, Clone)]
pub struct TraditionCatalog {
    profiles: HashMap<String, TraditionProfile>,
}

pub const DEFAULT_TRADITION: &str = "default";

impl TraditionCatalog {
    /// Build a catalog from explicit profiles. A `"default"` profile is
    /// inserted if the caller did not provide one.
    pub fn new(profiles: Vec<TraditionProfile>) -> Self {
        let mut map: HashMap<String, TraditionProfile> = profiles
            .into_iter()
            .map(|p| (p.name.clone(), p))
            .collect();
        map.entry(DEFAULT_TRADITION.to_string())
            .or_insert_with(default_profile);
        Self { profiles: map }
    }

    /// The built-in catalog shipped with the crate.
    pub fn builtin() -> Self {
        Self::new(builtin_profiles())
    }

    /// Resolve a tradition key, falling back to the default profile for
    /// unknown keys.
    pub fn resolve(&self, tradition: &str) -> &TraditionProfile {
        self.profiles
            .get(tradition)
            .unwrap_or_else(|| &self.profiles[DEFAULT_TRADITION])
    }

    pub fn known_traditions(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for TraditionCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

fn default_profile() -> TraditionProfile {
    TraditionProfile {
        name: DEFAULT_TRADITION.to_string(),
        weights: WeightVector::uniform(),
        style_keywords: vec![],
        taboos: vec![],
    }
}

fn builtin_profiles() -> Vec<TraditionProfile> {
    vec![
        TraditionProfile {
            name: "chinese_ink".to_string(),
            // Cultural context and aesthetics dominate literati evaluation.
            weights: WeightVector([0.15, 0.15, 0.30, 0.15, 0.25]),
            style_keywords: [
                "ink wash",
                "xieyi",
                "liubai",
                "brushwork",
                "rice paper",
                "literati",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            taboos: vec![TabooViolation {
                pattern: "断头".to_string(),
                severity: RiskSeverity::Critical,
                description: "severed-head imagery is proscribed in this tradition".to_string(),
            }],
        },
        TraditionProfile {
            name: "japanese_ukiyoe".to_string(),
            weights: WeightVector([0.25, 0.25, 0.20, 0.10, 0.20]),
            style_keywords: [
                "woodblock",
                "ukiyo-e",
                "flat color",
                "bokashi",
                "keyblock line",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            taboos: vec![],
        },
        TraditionProfile {
            name: "european_oil".to_string(),
            weights: WeightVector([0.30, 0.25, 0.10, 0.20, 0.15]),
            style_keywords: [
                "oil on canvas",
                "chiaroscuro",
                "impasto",
                "glazing",
                "sfumato",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            taboos: vec![],
        },
        TraditionProfile {
            name: "persian_miniature".to_string(),
            weights: WeightVector([0.20, 0.20, 0.30, 0.15, 0.15]),
            style_keywords: [
                "miniature",
                "illumination",
                "gold leaf",
                "flattened perspective",
                "arabesque",
            ]
            .iter()
            .map(ToString::to_string)
            .collect(),
            taboos: vec![TabooViolation {
                pattern: "prophet depiction".to_string(),
                severity: RiskSeverity::Critical,
                description: "figurative depiction of prophets is proscribed".to_string(),
            }],
        },
    ]
}
