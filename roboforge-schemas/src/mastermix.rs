use crate::reagent::Reagent;
use serde::{Deserialize, Serialize};

/// A named, ordered collection of reagents built into one mastermix well set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Mastermix {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub reagents: Vec<Reagent>,
}

impl Mastermix {
    /// Reagents in pipetting order: by `order_index`, ties and unindexed
    /// reagents keeping their list position.
    pub fn ordered_reagents(&self) -> Vec<&Reagent> {
        let mut reagents: Vec<&Reagent> = self.reagents.iter().collect();
        reagents.sort_by_key(|r| r.order_index.unwrap_or(u32::MAX));
        reagents
    }
}
