//! Sample (template) transfers from the sample plate into every reaction well.

use super::{blank_row, reaction_count};
use crate::{
    error::CalculationError,
    liquid_class::{resolve_liquid_class, resolve_tip_type},
    plate::{pcr_destination_plate, pcr_destination_well, SAMPLE_PLATE},
    volume::split_for_tip,
};
use roboforge_schemas::{
    experiment::NaatExperiment, mastermix::Mastermix, reagent::DispenseType,
    worklist::WorklistRow,
};

const SAMPLE_STEP: &str = "template";

pub fn sample_source_name(index: u32) -> String {
    format!("sample{:02}", index)
}

/// One sample transfer per reaction well. Sources rotate through the sample
/// concentrations; the group number advances with every full PCR plate.
pub fn generate_sample_worklist(
    mastermixes: &[Mastermix],
    experiment: &NaatExperiment,
) -> Result<Vec<WorklistRow>, CalculationError> {
    let concentrations = experiment.num_of_sample_concentrations;
    if concentrations == 0 {
        return Ok(Vec::new());
    }
    let size = experiment.pcr_plate_size;
    let reactions = reaction_count(mastermixes.len(), experiment)?;

    let volume_ul = experiment.sample_volume_per_reaction;
    let selection = resolve_tip_type(&experiment.sample_liquid_type, volume_ul);
    let liquid_class = resolve_liquid_class(
        &experiment.sample_liquid_type,
        DispenseType::SurfaceEmpty,
        selection.tip,
    );
    let transfers = split_for_tip(volume_ul, selection.tip.capacity_ul()).map_err(|cause| {
        CalculationError::Volume {
            context: "sample volume per reaction".to_string(),
            cause,
        }
    })?;

    let mut rows = Vec::with_capacity(reactions as usize * transfers.len());
    for row_number in 1..=reactions {
        let sample = (row_number - 1) % concentrations;
        for &transfer in &transfers {
            rows.push(WorklistRow {
                step: SAMPLE_STEP.to_string(),
                volume_ul: transfer,
                liquid_class: liquid_class.clone(),
                source: sample_source_name(sample),
                group_number: (row_number - 1) / size.wells() + 1,
                dispense_type: DispenseType::SurfaceEmpty.as_str().to_string(),
                tip_type: selection.tip.microlitres(),
                to_plate: pcr_destination_plate(size, row_number),
                to_well: pcr_destination_well(size, row_number),
                from_plate: SAMPLE_PLATE.to_string(),
                from_well: sample + 1,
                ..blank_row()
            });
        }
    }
    Ok(rows)
}
