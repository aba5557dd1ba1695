use super::{
    blank_row, reaction_count,
    sample::generate_sample_worklist,
    tracker::{self, PendingRow, SortKey},
};
use crate::{
    error::{CalculationError, VolumeError},
    liquid_class::{high_volume_liquid_class, TipSize},
    plate::{self, pcr_destination_plate, pcr_destination_well, MASTERMIX_PLATE},
    solutions,
    volume::{self, round_to_tenth, VolumeStep},
};
use roboforge_schemas::{
    experiment::NaatExperiment,
    mastermix::Mastermix,
    plate::PlateCatalogue,
    reagent::{DispenseType, LiquidType, Reagent, TipWashing},
    worklist::{UserSolutionRow, WorklistRow},
};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info};

/// Share of a well's mastermix drawn up on each mixing stroke.
const MIX_FRACTION: f64 = 0.8;
const MIXING_SOURCE: &str = "mixing";
const MIXING_ASPIRATIONS: u32 = 10;
const ALIQUOT_SOURCE: &str = "MM_aq";
const TIP_WASHING_ASPIRATIONS: u32 = 3;

/// Everything the robot and the operator need for one NAAT run.
#[derive(Debug, Clone, PartialEq)]
pub struct NaatWorklist {
    pub worklist: Vec<WorklistRow>,
    pub sample_worklist: Vec<WorklistRow>,
    pub user_solutions: Vec<UserSolutionRow>,
}

/// A validated NAAT generation request. Built by
/// [`NaatWorklistBuilder`](super::NaatWorklistBuilder).
#[derive(Debug, Clone)]
pub struct NaatWorklistEngine {
    pub(super) experiment: NaatExperiment,
    pub(super) mastermixes: Vec<Mastermix>,
    pub(super) catalogue: PlateCatalogue,
    pub(super) include_mixing_and_aliquoting: bool,
}

impl NaatWorklistEngine {
    pub fn experiment(&self) -> &NaatExperiment {
        &self.experiment
    }

    pub fn mastermixes(&self) -> &[Mastermix] {
        &self.mastermixes
    }

    pub fn run(&self) -> Result<NaatWorklist, CalculationError> {
        let build = build_mastermixes(&self.mastermixes, &self.experiment, &self.catalogue)?;
        let build_len = build.rows.len();
        let worklist = assemble(
            &self.mastermixes,
            &self.experiment,
            build,
            self.include_mixing_and_aliquoting,
        );
        let sample_worklist = generate_sample_worklist(&self.mastermixes, &self.experiment)?;
        let user_solutions =
            solutions::naat_user_solutions(&worklist[..build_len], &sample_worklist, &self.catalogue);

        info!(
            experiment = %self.experiment.name_of_experimental_plan,
            mastermixes = self.mastermixes.len(),
            rows = worklist.len(),
            sample_rows = sample_worklist.len(),
            solutions = user_solutions.len(),
            "generated NAAT worklist"
        );
        Ok(NaatWorklist {
            worklist,
            sample_worklist,
            user_solutions,
        })
    }
}

/// Mastermix-level volumes shared by every reagent.
#[derive(Debug, Clone, Copy)]
struct VolumePlan {
    mastermix_volume_ul: f64,
    working_volume_ul: f64,
    num_wells: u32,
}

impl VolumePlan {
    fn new(experiment: &NaatExperiment, catalogue: &PlateCatalogue) -> Result<Self, CalculationError> {
        let holdover = plate::holdover_factor(catalogue, MASTERMIX_PLATE);
        let samples = experiment.num_of_sample_concentrations;
        let replicates = experiment.num_of_technical_replicates;
        let mastermix_volume_ul = volume::mastermix_volume(
            samples,
            replicates,
            experiment.mastermix_volume_per_reaction,
            holdover,
        );
        let working_volume_ul = volume::working_volume(
            samples,
            replicates,
            experiment.mastermix_volume_per_reaction,
            experiment.sample_volume_per_reaction,
            holdover,
        );
        for (context, value) in [
            ("mastermix volume", mastermix_volume_ul),
            ("working volume", working_volume_ul),
        ] {
            if !value.is_finite() {
                return Err(CalculationError::Volume {
                    context: context.to_string(),
                    cause: VolumeError::NonFinite(value),
                });
            }
        }
        Ok(Self {
            mastermix_volume_ul,
            working_volume_ul,
            num_wells: volume::number_of_wells_required(mastermix_volume_ul),
        })
    }
}

/// Sorted, well-assigned build rows and the last group number they used.
pub(crate) struct MastermixBuild {
    pub rows: Vec<PendingRow>,
    pub last_group: u32,
    pub num_wells: u32,
    pub wells_per_mastermix: u32,
}

fn in_reagent<'a>(
    mastermix: &'a Mastermix,
    reagent: &'a Reagent,
) -> impl Fn(VolumeError) -> CalculationError + 'a {
    move |cause| CalculationError::Reagent {
        mastermix: mastermix.name.clone(),
        reagent: reagent.source.clone(),
        cause,
    }
}

fn reagent_rows(
    mastermix_index: usize,
    mastermix: &Mastermix,
    plan: &VolumePlan,
) -> Result<Vec<PendingRow>, CalculationError> {
    let ordered = mastermix.ordered_reagents();

    let mut others_ul = 0.0;
    for reagent in ordered.iter().filter(|r| !r.is_water()) {
        others_ul += volume::volume_per_reagent(
            plan.working_volume_ul,
            reagent.final_concentration,
            reagent.stock_concentration,
        )
        .map_err(in_reagent(mastermix, reagent))?;
    }

    let mut rows = Vec::new();
    for reagent in ordered {
        let steps = if reagent.is_water() {
            volume::distribute_water(
                plan.num_wells,
                plan.mastermix_volume_ul,
                others_ul,
                &reagent.liquid_type,
                reagent.dispense_type,
            )
        } else {
            volume::distribute_across_wells(
                plan.num_wells,
                plan.working_volume_ul,
                reagent.final_concentration,
                reagent.stock_concentration,
                &reagent.liquid_type,
                reagent.dispense_type,
            )
        };
        let steps = steps.map_err(in_reagent(mastermix, reagent))?;

        rows.extend(steps.into_iter().map(|step| pending_row(mastermix_index, mastermix, reagent, step)));
    }
    Ok(rows)
}

fn pending_row(
    mastermix_index: usize,
    mastermix: &Mastermix,
    reagent: &Reagent,
    step: VolumeStep,
) -> PendingRow {
    let asp_mixing = match reagent.tip_washing {
        TipWashing::Yes => TIP_WASHING_ASPIRATIONS,
        TipWashing::No => 0,
    };
    let key = SortKey {
        source_order: 0,
        source: reagent.source_key(),
        liquid_class: step.liquid_class.to_lowercase(),
        mastermix_id: mastermix.id.to_lowercase(),
        reagent_id: reagent.id.to_lowercase(),
    };
    PendingRow {
        row: WorklistRow {
            step: mastermix.name.clone(),
            volume_ul: step.volume_ul,
            liquid_class: step.liquid_class,
            source: reagent.source.clone(),
            asp_mixing,
            dispense_type: reagent.dispense_type.as_str().to_string(),
            tip_type: step.tip.microlitres(),
            ..blank_row()
        },
        key,
        mastermix_index,
        well_index: step.well_index,
    }
}

pub(crate) fn build_mastermixes(
    mastermixes: &[Mastermix],
    experiment: &NaatExperiment,
    catalogue: &PlateCatalogue,
) -> Result<MastermixBuild, CalculationError> {
    let plan = VolumePlan::new(experiment, catalogue)?;
    debug!(
        mastermix_volume_ul = plan.mastermix_volume_ul,
        working_volume_ul = plan.working_volume_ul,
        num_wells = plan.num_wells,
        "mastermix volume plan"
    );
    reaction_count(mastermixes.len(), experiment)?;
    let wells_per_mastermix = experiment.wells_per_mastermix();

    let mastermix_plate = plate::lookup(catalogue, MASTERMIX_PLATE)?;
    let wells_needed = u32::try_from(mastermixes.len())
        .ok()
        .and_then(|count| count.checked_mul(plan.num_wells))
        .ok_or(CalculationError::CountOverflow("mastermix well count"))?;
    if wells_needed > mastermix_plate.well_count {
        return Err(CalculationError::PlateFull {
            plate: MASTERMIX_PLATE.to_string(),
            start: 0,
            requested: wells_needed,
            capacity: mastermix_plate.well_count,
        });
    }

    let mut rows = Vec::new();
    for (index, mastermix) in mastermixes.iter().enumerate() {
        rows.extend(reagent_rows(index, mastermix, &plan)?);
    }

    let mut first_seen: HashMap<String, usize> = HashMap::new();
    for pending in &mut rows {
        let next = first_seen.len();
        pending.key.source_order = *first_seen.entry(pending.key.source.clone()).or_insert(next);
    }
    rows.sort_by(|a, b| a.key.cmp(&b.key));

    let plans = tracker::plan_sources(&rows, catalogue)?;
    let (rows, state) = tracker::assign_wells(rows, &plans, catalogue, plan.num_wells)?;
    Ok(MastermixBuild {
        rows,
        last_group: state.group_number,
        num_wells: plan.num_wells,
        wells_per_mastermix,
    })
}

fn mixing_rows(mastermixes: &[Mastermix], build: &MastermixBuild) -> Vec<WorklistRow> {
    let mut well_volumes: BTreeMap<(usize, u32), f64> = BTreeMap::new();
    for pending in &build.rows {
        *well_volumes
            .entry((pending.mastermix_index, pending.well_index))
            .or_insert(0.0) += pending.row.volume_ul;
    }

    let mut rows = Vec::with_capacity(mastermixes.len() * build.num_wells as usize);
    for (index, mastermix) in mastermixes.iter().enumerate() {
        for well_index in 0..build.num_wells {
            let mixed = well_volumes.get(&(index, well_index)).copied().unwrap_or(0.0);
            let well = index as u32 * build.num_wells + well_index + 1;
            rows.push(WorklistRow {
                step: format!("mix_{}", mastermix.name),
                volume_ul: round_to_tenth(mixed * MIX_FRACTION).ceil(),
                liquid_class: high_volume_liquid_class(&LiquidType::Mastermix),
                source: MIXING_SOURCE.to_string(),
                group_number: build.last_group + 1,
                asp_mixing: MIXING_ASPIRATIONS,
                dispense_type: DispenseType::SurfaceEmpty.as_str().to_string(),
                tip_type: TipSize::Tip1000.microlitres(),
                to_well: well,
                from_plate: MASTERMIX_PLATE.to_string(),
                from_well: well,
                ..blank_row()
            });
        }
    }
    rows
}

fn aliquot_rows(
    mastermixes: &[Mastermix],
    experiment: &NaatExperiment,
    build: &MastermixBuild,
) -> Vec<WorklistRow> {
    let size = experiment.pcr_plate_size;
    let wells_per_mastermix = build.wells_per_mastermix;
    let mut rows = Vec::with_capacity(mastermixes.len() * wells_per_mastermix as usize);
    let mut row_number = 0;
    for (index, mastermix) in mastermixes.iter().enumerate() {
        let first_well = index as u32 * build.num_wells + 1;
        for reaction in 0..wells_per_mastermix {
            row_number += 1;
            rows.push(WorklistRow {
                step: format!("aq_{}", mastermix.name),
                volume_ul: experiment.mastermix_volume_per_reaction,
                liquid_class: high_volume_liquid_class(&LiquidType::Mastermix),
                source: ALIQUOT_SOURCE.to_string(),
                group_number: build.last_group + 2,
                dispense_type: DispenseType::JetEmpty.as_str().to_string(),
                tip_type: TipSize::Tip300.microlitres(),
                to_plate: pcr_destination_plate(size, row_number),
                to_well: pcr_destination_well(size, row_number),
                from_plate: MASTERMIX_PLATE.to_string(),
                from_well: first_well + reaction % build.num_wells.max(1),
                ..blank_row()
            });
        }
    }
    rows
}

fn assemble(
    mastermixes: &[Mastermix],
    experiment: &NaatExperiment,
    build: MastermixBuild,
    include_mixing_and_aliquoting: bool,
) -> Vec<WorklistRow> {
    let extras = if include_mixing_and_aliquoting {
        let mut extras = mixing_rows(mastermixes, &build);
        extras.extend(aliquot_rows(mastermixes, experiment, &build));
        extras
    } else {
        Vec::new()
    };

    let mut rows: Vec<WorklistRow> = build.rows.into_iter().map(|pending| pending.row).collect();
    rows.extend(extras);
    rows
}

/// Builds the mastermix worklist: every reagent transfer, then optionally
/// one mixing row per mastermix well and one aliquoting row per reaction.
///
/// Inputs are expected to be validated; see
/// [`validate_naat_input`](crate::validation::validate_naat_input).
pub fn generate_mastermix_worklist(
    mastermixes: &[Mastermix],
    experiment: &NaatExperiment,
    catalogue: &PlateCatalogue,
    include_mixing_and_aliquoting: bool,
) -> Result<Vec<WorklistRow>, CalculationError> {
    let build = build_mastermixes(mastermixes, experiment, catalogue)?;
    Ok(assemble(mastermixes, experiment, build, include_mixing_and_aliquoting))
}
