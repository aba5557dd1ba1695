//! Lateral-flow assay worklists.
//!
//! Every protocol step is applied to every strip of every assay plate. Each
//! (source, step) pair gets its own run of source wells, sized by packing the
//! pair's transfers into wells by usable volume. Imaging steps stay on the
//! assay plate; the camera never gets a source well.

use crate::{
    error::{CalculationError, RoboforgeError},
    liquid_class::{lfa_liquid_class, TipSize},
    plate::{self, PlateSelector, WellCursor},
    solutions::plate_well_label,
    validation::validate_lfa_input,
    volume::round_to_tenth,
    worklist::{FROM_PATH, TOUCHOFF_DISTANCE},
};
use roboforge_schemas::{
    lfa::{LfaOptions, LfaPlateConfig, LfaStep},
    plate::PlateCatalogue,
    worklist::{LfaWorklistRow, UserSolutionRow},
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, info};

pub const IMAGING_STEP: &str = "imaging";
pub const CAMERA_SOURCE: &str = "camera";

#[derive(Debug, Clone, PartialEq)]
pub struct LfaWorklist {
    pub worklist: Vec<LfaWorklistRow>,
    pub user_solutions: Vec<UserSolutionRow>,
}

fn is_camera(source: &str) -> bool {
    source.eq_ignore_ascii_case(CAMERA_SOURCE)
}

/// Transfers one (source, step) pair makes, in emission order.
#[derive(Debug)]
struct Demand {
    source: String,
    step: String,
    volumes: Vec<f64>,
}

/// Source wells of one (source, step) pair and the well each transfer uses.
#[derive(Debug)]
struct SourceWells {
    plate_label: String,
    wells: Vec<u32>,
    drawn_ul: Vec<f64>,
    holdover_ul: f64,
    transfer_wells: Vec<usize>,
    next_transfer: usize,
}

impl SourceWells {
    fn next(&mut self) -> (usize, u32) {
        let position = self
            .transfer_wells
            .get(self.next_transfer)
            .copied()
            .unwrap_or(0);
        self.next_transfer += 1;
        (position, self.wells[position])
    }
}

/// Greedy packing: a transfer goes into the current well while it fits,
/// otherwise it opens the next well.
fn pack(
    demand: &Demand,
    plate_name: &str,
    usable_ul: f64,
) -> Result<(Vec<f64>, Vec<usize>), CalculationError> {
    let mut drawn: Vec<f64> = Vec::new();
    let mut transfer_wells = Vec::with_capacity(demand.volumes.len());
    for &volume in &demand.volumes {
        if volume > usable_ul {
            return Err(CalculationError::TransferExceedsWell {
                source_name: demand.source.clone(),
                plate: plate_name.to_string(),
                volume,
                usable: usable_ul,
            });
        }
        match drawn.last_mut() {
            Some(current) if *current + volume <= usable_ul + 1e-9 => *current += volume,
            _ => drawn.push(volume),
        }
        transfer_wells.push(drawn.len() - 1);
    }
    Ok((drawn, transfer_wells))
}

fn collect_demands(steps: &[LfaStep], transfers_per_step: usize) -> Vec<Demand> {
    let mut demands: Vec<Demand> = Vec::new();
    let mut index: HashMap<(String, String), usize> = HashMap::new();
    for step in steps.iter().filter(|s| s.step != IMAGING_STEP) {
        for source in step.sources().filter(|s| !is_camera(s)) {
            let key = (source.to_string(), step.step.clone());
            let position = *index.entry(key).or_insert_with(|| {
                demands.push(Demand {
                    source: source.to_string(),
                    step: step.step.clone(),
                    volumes: Vec::new(),
                });
                demands.len() - 1
            });
            demands[position]
                .volumes
                .extend(std::iter::repeat(step.volume).take(transfers_per_step));
        }
    }
    demands
}

fn assign_source_wells(
    demands: &[Demand],
    catalogue: &PlateCatalogue,
) -> Result<HashMap<(String, String), SourceWells>, CalculationError> {
    let mut cursors: HashMap<&'static str, WellCursor> = HashMap::new();
    let mut assigned = HashMap::with_capacity(demands.len());

    for demand in demands {
        let total_ul: f64 = demand.volumes.iter().sum();
        let plate_name = PlateSelector::LFA.select(total_ul);
        let entry = plate::lookup(catalogue, plate_name)?;
        let usable_ul = plate::usable_volume(entry)?;

        let (drawn_ul, transfer_wells) = pack(demand, plate_name, usable_ul)?;
        let cursor = cursors
            .entry(plate_name)
            .or_insert_with(|| WellCursor::new(entry, u32::MAX));
        let block = cursor.allocate(drawn_ul.len().max(1) as u32)?;
        let wells = (0..block.len)
            .map(|offset| plate::well_number(entry, block.slot(offset)))
            .collect::<Vec<_>>();
        debug!(
            source = %demand.source,
            step = %demand.step,
            total_ul,
            plate = plate_name,
            plate_index = block.plate_index,
            wells = ?wells,
            "assigned LFA source wells"
        );

        assigned.insert(
            (demand.source.clone(), demand.step.clone()),
            SourceWells {
                plate_label: format!("{}_{}", plate_name, block.plate_index),
                wells,
                drawn_ul,
                holdover_ul: entry.holdover_volume_ul,
                transfer_wells,
                next_transfer: 0,
            },
        );
    }
    Ok(assigned)
}

struct RowContext<'a> {
    step: &'a LfaStep,
    step_index: u32,
    strip: u32,
    group_number: u32,
    to_plate: &'a str,
    tip: TipSize,
    liquid_class: &'a str,
    options: &'a LfaOptions,
}

impl RowContext<'_> {
    /// A row that aspirates from the assay plate itself.
    fn row(&self, guid: u32) -> LfaWorklistRow {
        LfaWorklistRow {
            step: self.step.step.clone(),
            dx: self.step.dx,
            dz: self.step.dz,
            volume_ul: self.step.volume,
            liquid_class: self.liquid_class.to_string(),
            timer_delta: self.step.time,
            source: self.step.source.clone(),
            step_index: self.step_index,
            destination: self.strip,
            group_number: self.group_number,
            timer_group_check: if self.step.time > 0.0 { self.step_index } else { 0 },
            guid,
            from_path: FROM_PATH.to_string(),
            asp_mixing: u32::from(self.options.aspiration_mixing),
            dispense_type: self.options.dispense_type.clone(),
            tip_type: self.tip.microlitres(),
            touchoff_dis: TOUCHOFF_DISTANCE,
            to_plate: self.to_plate.to_string(),
            to_well: self.strip,
            from_plate: self.to_plate.to_string(),
            from_well: self.strip,
            liquid_type_x: self.step.liquid_class.clone(),
            liquid_type_y: String::new(),
            liquid_type: self.step.liquid_class.clone(),
        }
    }
}

/// Builds the LFA worklist and its loading sheet.
///
/// # Errors
///
/// Returns `InvalidInput` for malformed steps or plate configuration, and a
/// `CalculationError` when a transfer does not fit any source well.
pub fn generate_lfa_worklist(
    steps: &[LfaStep],
    plate_config: &LfaPlateConfig,
    options: &LfaOptions,
    catalogue: &PlateCatalogue,
) -> Result<LfaWorklist, RoboforgeError> {
    validate_lfa_input(steps, plate_config, options)?;

    let Some(transfers_per_step) = plate_config.transfers_per_step() else {
        return Err(RoboforgeError::InvalidInput(vec![
            "plate config: too many strips".to_string(),
        ]));
    };
    let transfers_per_step = transfers_per_step as usize;
    let demands = collect_demands(steps, transfers_per_step);
    let mut source_wells = assign_source_wells(&demands, catalogue)?;

    let mut worklist = Vec::new();
    let mut user_solutions = Vec::new();
    let mut loaded: HashSet<(String, String)> = HashSet::new();
    let mut guid = 0;

    for (index, step) in steps.iter().enumerate() {
        let tip = TipSize::smallest_for(step.volume);
        let liquid_class = lfa_liquid_class(&step.liquid_class, tip, &options.dispense_type);
        for plate_number in 1..=plate_config.num_plates {
            let to_plate = format!(
                "{}_{:0width$}",
                plate_config.prefix,
                plate_number,
                width = options.zero_fill
            );
            for strip in 1..=plate_config.num_strips_per_plate {
                let context = RowContext {
                    step,
                    step_index: index as u32 + 1,
                    strip,
                    group_number: strip.div_ceil(options.strips_per_group),
                    to_plate: &to_plate,
                    tip,
                    liquid_class: &liquid_class,
                    options,
                };

                if step.step == IMAGING_STEP {
                    guid += 1;
                    worklist.push(context.row(guid));
                    continue;
                }

                for source in step.sources().filter(|s| !is_camera(s)) {
                    let key = (source.to_string(), step.step.clone());
                    let Some(wells) = source_wells.get_mut(&key) else {
                        continue;
                    };
                    let (position, well) = wells.next();
                    let plate_well = plate_well_label(&wells.plate_label, well);
                    if loaded.insert((source.to_string(), plate_well.clone())) {
                        user_solutions.push(UserSolutionRow {
                            solution: source.to_string(),
                            plate_well,
                            user_input: round_to_tenth(wells.drawn_ul[position] + wells.holdover_ul),
                        });
                    }

                    guid += 1;
                    worklist.push(LfaWorklistRow {
                        source: source.to_string(),
                        from_plate: wells.plate_label.clone(),
                        from_well: well,
                        ..context.row(guid)
                    });
                }
            }
        }
    }

    worklist.sort_by_key(|row| (row.step_index, row.group_number, row.destination));

    info!(
        steps = steps.len(),
        plates = plate_config.num_plates,
        rows = worklist.len(),
        solutions = user_solutions.len(),
        "generated LFA worklist"
    );
    Ok(LfaWorklist {
        worklist,
        user_solutions,
    })
}
