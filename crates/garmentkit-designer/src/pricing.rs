//! Flat two-tier pricing by printed sides.

use garmentkit_settings::{Config, PriceTier};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// How many sides a quote covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricedSides {
    One,
    Both,
}

/// Price for a design, in minor currency units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub subtotal: u32,
    pub sides: PricedSides,
}

/// Price lookup by garment type and number of printed sides.
#[derive(Debug, Clone)]
pub struct PricingResolver {
    tiers: BTreeMap<String, PriceTier>,
}

impl PricingResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            tiers: config
                .garments
                .iter()
                .map(|(name, spec)| (name.clone(), spec.price))
                .collect(),
        }
    }

    /// Quote a garment. `None` when neither side has content (checkout must
    /// be blocked) or the garment type has no price.
    pub fn price(&self, garment: &str, has_front: bool, has_back: bool) -> Option<Quote> {
        let tier = self.tiers.get(garment)?;
        match (has_front, has_back) {
            (true, true) => Some(Quote {
                subtotal: tier.both_sides,
                sides: PricedSides::Both,
            }),
            (true, false) | (false, true) => Some(Quote {
                subtotal: tier.one_side,
                sides: PricedSides::One,
            }),
            (false, false) => None,
        }
    }
}
