use crate::reagent::LiquidType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Destination PCR plate format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub enum PcrPlateSize {
    Wells96,
    Wells384,
}

impl PcrPlateSize {
    pub fn wells(&self) -> u32 {
        match self {
            PcrPlateSize::Wells96 => 96,
            PcrPlateSize::Wells384 => 384,
        }
    }
}

impl TryFrom<u32> for PcrPlateSize {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            96 => Ok(PcrPlateSize::Wells96),
            384 => Ok(PcrPlateSize::Wells384),
            other => Err(format!("unsupported PCR plate size {other}, expected 96 or 384")),
        }
    }
}

impl From<PcrPlateSize> for u32 {
    fn from(value: PcrPlateSize) -> Self {
        value.wells()
    }
}

impl fmt::Display for PcrPlateSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.wells())
    }
}

fn default_sample_liquid_type() -> LiquidType {
    LiquidType::Template
}

/// The sample plan of a NAAT experiment. These fields alone drive the
/// total-volume math.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NaatExperiment {
    #[serde(default)]
    pub name_of_experimental_plan: String,
    pub num_of_sample_concentrations: u32,
    pub num_of_technical_replicates: u32,
    pub mastermix_volume_per_reaction: f64,
    pub sample_volume_per_reaction: f64,
    pub pcr_plate_size: PcrPlateSize,
    #[serde(default)]
    pub deck_layout_id: String,
    #[serde(default = "default_sample_liquid_type")]
    pub sample_liquid_type: LiquidType,
}

impl NaatExperiment {
    /// Reaction wells each mastermix is aliquoted into, saturating at
    /// `u32::MAX`.
    pub fn wells_per_mastermix(&self) -> u32 {
        self.num_of_sample_concentrations
            .saturating_mul(self.num_of_technical_replicates)
    }

    /// `None` when the product does not fit in a `u32`.
    pub fn checked_wells_per_mastermix(&self) -> Option<u32> {
        self.num_of_sample_concentrations
            .checked_mul(self.num_of_technical_replicates)
    }
}
