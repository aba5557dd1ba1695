//! Robot liquid-class naming and tip selection.

use roboforge_schemas::reagent::{DispenseType, LiquidType};
use std::fmt;

pub const LIQUID_CLASS_PREFIX: &str = "RoboNAAT_tip";

/// The 20 µL mastermix class is calibrated on a single tip and dispense mode.
pub const MASTERMIX_20UL_LIQUID_CLASS: &str = "RoboNAAT_tip300_20uL_MM__JetEmpty_Part";

/// Disposable tip sizes loaded on the deck, smallest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TipSize {
    Tip50,
    Tip300,
    Tip1000,
}

impl TipSize {
    pub const ALL: [TipSize; 3] = [TipSize::Tip50, TipSize::Tip300, TipSize::Tip1000];

    pub fn microlitres(self) -> u32 {
        match self {
            TipSize::Tip50 => 50,
            TipSize::Tip300 => 300,
            TipSize::Tip1000 => 1000,
        }
    }

    pub fn capacity_ul(self) -> f64 {
        f64::from(self.microlitres())
    }

    pub fn largest() -> TipSize {
        TipSize::Tip1000
    }

    /// Smallest tip that holds `volume_ul`, or the largest tip when none does.
    pub fn smallest_for(volume_ul: f64) -> TipSize {
        Self::ALL
            .into_iter()
            .find(|tip| volume_ul <= tip.capacity_ul())
            .unwrap_or_else(Self::largest)
    }
}

impl fmt::Display for TipSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.microlitres())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TipSelection {
    pub tip: TipSize,
    pub max_capacity_ul: f64,
    /// The volume does not fit even the largest tip. The caller splits it.
    pub is_overflow: bool,
}

pub fn resolve_tip_type(liquid_type: &LiquidType, volume_ul: f64) -> TipSelection {
    let tip = match liquid_type {
        LiquidType::Water => TipSize::largest(),
        _ => TipSize::smallest_for(volume_ul),
    };
    let max_capacity_ul = TipSize::largest().capacity_ul();
    TipSelection {
        tip,
        max_capacity_ul,
        is_overflow: volume_ul > max_capacity_ul,
    }
}

pub fn resolve_liquid_class(
    liquid_type: &LiquidType,
    dispense_type: DispenseType,
    tip: TipSize,
) -> String {
    if *liquid_type == LiquidType::Mastermix {
        return MASTERMIX_20UL_LIQUID_CLASS.to_string();
    }
    format!(
        "{}{}_{}_{}",
        LIQUID_CLASS_PREFIX,
        tip,
        liquid_type,
        dispense_type.class_fragment()
    )
}

/// Class used by the mixing and aliquoting steps, which move whole mastermix.
pub fn high_volume_liquid_class(liquid_type: &LiquidType) -> String {
    format!("RoboNAAT_HighVolume_{}_DispenseSurface_Empty", liquid_type)
}

pub fn lfa_liquid_class(liquid_class: &str, tip: TipSize, dispense_type: &str) -> String {
    format!("ivl_tip{}_{}_{}", tip, liquid_class, dispense_type)
}
