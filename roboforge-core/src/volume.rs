//! Mastermix and per-reagent volume math.
//!
//! Volumes are in µL and rounded half-up to one decimal, the resolution the
//! robot's pipetting accepts. Two independent splits compose here: a volume
//! above [`MAX_VOLUME_PER_WELL_UL`] is spread over several source wells, and
//! each per-well share that does not fit its tip becomes several transfers.

use crate::error::VolumeError;
use crate::liquid_class::{resolve_liquid_class, resolve_tip_type, TipSize};
use roboforge_schemas::reagent::{DispenseType, LiquidType};
use tracing::warn;

/// Largest mastermix volume built in a single well.
pub const MAX_VOLUME_PER_WELL_UL: f64 = 600.0;

/// One pipetting event produced by the calculator.
#[derive(Debug, Clone, PartialEq)]
pub struct VolumeStep {
    pub volume_ul: f64,
    pub tip: TipSize,
    pub liquid_class: String,
    /// Zero-based index of the mastermix well this transfer fills.
    pub well_index: u32,
}

/// Rounds half-up to one decimal place.
pub fn round_to_tenth(value: f64) -> f64 {
    ((value + f64::EPSILON) * 10.0).round() / 10.0
}

fn finite(value: f64) -> Result<f64, VolumeError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(VolumeError::NonFinite(value))
    }
}

pub fn mastermix_volume(
    num_samples: u32,
    num_replicates: u32,
    volume_per_reaction: f64,
    holdover_factor: f64,
) -> f64 {
    f64::from(num_samples) * f64::from(num_replicates) * volume_per_reaction * holdover_factor
}

/// Reaction volume the reagent concentrations are computed against: the
/// mastermix plus the sample it will be mixed with.
pub fn working_volume(
    num_samples: u32,
    num_replicates: u32,
    mastermix_volume_per_reaction: f64,
    sample_volume_per_reaction: f64,
    holdover_factor: f64,
) -> f64 {
    f64::from(num_samples)
        * f64::from(num_replicates)
        * (mastermix_volume_per_reaction + sample_volume_per_reaction)
        * holdover_factor
}

pub fn number_of_wells_required(total_volume_ul: f64) -> u32 {
    if total_volume_ul <= MAX_VOLUME_PER_WELL_UL {
        1
    } else {
        (total_volume_ul / MAX_VOLUME_PER_WELL_UL).ceil() as u32
    }
}

fn exact_volume_per_reagent(
    total_volume_ul: f64,
    final_concentration: f64,
    stock_concentration: f64,
) -> Result<f64, VolumeError> {
    if !(stock_concentration > 0.0) {
        return Err(VolumeError::NonPositiveStock(stock_concentration));
    }
    finite(total_volume_ul * (final_concentration / stock_concentration))
}

pub fn volume_per_reagent(
    total_volume_ul: f64,
    final_concentration: f64,
    stock_concentration: f64,
) -> Result<f64, VolumeError> {
    exact_volume_per_reagent(total_volume_ul, final_concentration, stock_concentration)
        .map(round_to_tenth)
}

/// Splits `exact_total` into `num_wells` rounded shares whose sum is the
/// rounded total. The last share absorbs the rounding drift.
pub fn split_across_wells(num_wells: u32, exact_total: f64) -> Result<Vec<f64>, VolumeError> {
    if num_wells == 0 {
        return Err(VolumeError::ZeroWells);
    }
    let exact_total = finite(exact_total)?;
    let rounded_total = round_to_tenth(exact_total);
    if num_wells == 1 {
        return Ok(vec![rounded_total]);
    }

    let share = round_to_tenth(exact_total / f64::from(num_wells));
    let mut shares = vec![share; num_wells as usize];
    let drift: f64 = shares.iter().sum::<f64>() - rounded_total;
    let last = round_to_tenth(share - drift);
    if last < 0.0 {
        return Err(VolumeError::NegativeShare {
            total: rounded_total,
            wells: num_wells,
        });
    }
    if let Some(slot) = shares.last_mut() {
        *slot = last;
    }
    Ok(shares)
}

/// Splits a volume the tip cannot take in one go into equal transfers.
pub fn split_for_tip(volume_ul: f64, tip_capacity_ul: f64) -> Result<Vec<f64>, VolumeError> {
    if !(tip_capacity_ul > 0.0) {
        return Err(VolumeError::NonPositiveTip(tip_capacity_ul));
    }
    let volume_ul = finite(volume_ul)?;
    if volume_ul < tip_capacity_ul {
        return Ok(vec![volume_ul]);
    }

    let count = (volume_ul / tip_capacity_ul).ceil() as usize;
    let part = round_to_tenth(volume_ul / count as f64);
    let mut parts = vec![part; count];
    if let Some(slot) = parts.last_mut() {
        *slot = round_to_tenth(volume_ul - part * (count - 1) as f64);
    }
    Ok(parts)
}

fn tip_steps(
    shares: &[f64],
    liquid_type: &LiquidType,
    dispense_type: DispenseType,
) -> Result<Vec<VolumeStep>, VolumeError> {
    let mut steps = Vec::with_capacity(shares.len());
    for (well_index, &share) in shares.iter().enumerate() {
        let selection = resolve_tip_type(liquid_type, share);
        if selection.is_overflow {
            warn!(
                volume_ul = share,
                max_capacity_ul = selection.max_capacity_ul,
                liquid_type = %liquid_type,
                "volume exceeds the largest tip, splitting into several transfers"
            );
        }
        let liquid_class = resolve_liquid_class(liquid_type, dispense_type, selection.tip);
        for volume_ul in split_for_tip(share, selection.tip.capacity_ul())? {
            steps.push(VolumeStep {
                volume_ul,
                tip: selection.tip,
                liquid_class: liquid_class.clone(),
                well_index: well_index as u32,
            });
        }
    }
    Ok(steps)
}

pub fn distribute_across_wells(
    num_wells: u32,
    total_volume_ul: f64,
    final_concentration: f64,
    stock_concentration: f64,
    liquid_type: &LiquidType,
    dispense_type: DispenseType,
) -> Result<Vec<VolumeStep>, VolumeError> {
    let exact = exact_volume_per_reagent(total_volume_ul, final_concentration, stock_concentration)?;
    let shares = split_across_wells(num_wells, exact)?;
    tip_steps(&shares, liquid_type, dispense_type)
}

pub fn water_fill_volume(
    mastermix_volume_ul: f64,
    total_other_reagents_ul: f64,
) -> Result<f64, VolumeError> {
    let water = finite(round_to_tenth(mastermix_volume_ul - total_other_reagents_ul))?;
    if water < 0.0 {
        return Err(VolumeError::NegativeWaterFill {
            water,
            mastermix: mastermix_volume_ul,
            others: total_other_reagents_ul,
        });
    }
    Ok(water)
}

/// Water tops each mastermix well up to volume, with the same splitting as
/// every other reagent.
pub fn distribute_water(
    num_wells: u32,
    mastermix_volume_ul: f64,
    total_other_reagents_ul: f64,
    liquid_type: &LiquidType,
    dispense_type: DispenseType,
) -> Result<Vec<VolumeStep>, VolumeError> {
    water_fill_volume(mastermix_volume_ul, total_other_reagents_ul)?;
    let shares = split_across_wells(num_wells, mastermix_volume_ul - total_other_reagents_ul)?;
    tip_steps(&shares, liquid_type, dispense_type)
}
