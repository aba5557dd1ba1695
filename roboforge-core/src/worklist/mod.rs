//! NAAT worklist generation: mastermix build rows, the optional mixing and
//! aliquoting rows, and the sample transfers.

pub mod builder;
pub mod engine;
pub mod sample;
pub mod tracker;

pub use builder::NaatWorklistBuilder;
pub use engine::{generate_mastermix_worklist, NaatWorklist, NaatWorklistEngine};
pub use sample::generate_sample_worklist;

use crate::{error::CalculationError, plate::MASTERMIX_PLATE};
use roboforge_schemas::{experiment::NaatExperiment, worklist::WorklistRow};

pub const FROM_PATH: &str = "some path";
pub const ROW_GUID: u32 = 1;
pub const TOUCHOFF_DISTANCE: i32 = -1;

/// Reaction wells across every mastermix, refusing counts a `u32` cannot hold.
pub(crate) fn reaction_count(
    mastermix_count: usize,
    experiment: &NaatExperiment,
) -> Result<u32, CalculationError> {
    let per_mastermix = experiment
        .checked_wells_per_mastermix()
        .ok_or(CalculationError::CountOverflow("reaction wells per mastermix"))?;
    u32::try_from(mastermix_count)
        .ok()
        .and_then(|count| count.checked_mul(per_mastermix))
        .ok_or(CalculationError::CountOverflow("reaction count"))
}

/// A row carrying only the columns every NAAT row shares.
pub(crate) fn blank_row() -> WorklistRow {
    WorklistRow {
        step: String::new(),
        dx: 0.0,
        dz: 0.0,
        volume_ul: 0.0,
        liquid_class: String::new(),
        timer_delta: 0.0,
        source: String::new(),
        step_index: 0,
        destination: 0,
        group_number: 0,
        timer_group_check: 0,
        guid: ROW_GUID,
        from_path: FROM_PATH.to_string(),
        asp_mixing: 0,
        dispense_type: String::new(),
        tip_type: 0,
        touchoff_dis: TOUCHOFF_DISTANCE,
        to_plate: MASTERMIX_PLATE.to_string(),
        to_well: 0,
        from_plate: String::new(),
        from_well: 0,
    }
}
