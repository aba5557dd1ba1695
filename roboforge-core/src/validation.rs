//! Input checks run before any volume is computed, plus the mastermix editing
//! operations whose result is always re-validated.

use crate::error::RoboforgeError;
use crate::liquid_class::TipSize;
use roboforge_schemas::{
    experiment::NaatExperiment,
    lfa::{LfaOptions, LfaPlateConfig, LfaStep},
    mastermix::Mastermix,
    reagent::{LiquidType, Reagent},
};

/// Problems with a single reagent, one message per offending field.
pub fn reagent_issues(reagent: &Reagent) -> Vec<String> {
    let mut issues = Vec::new();
    if reagent.source.trim().is_empty() {
        issues.push("source is required".to_string());
    }
    if reagent.liquid_type == LiquidType::Other(String::new()) {
        issues.push("liquid type is required".to_string());
    }
    if reagent.is_water() {
        return issues;
    }

    if reagent.unit.trim().is_empty() {
        issues.push("unit is required".to_string());
    }
    if !(reagent.final_concentration > 0.0) || !reagent.final_concentration.is_finite() {
        issues.push(format!(
            "final concentration must be greater than 0, got {}",
            reagent.final_concentration
        ));
    }
    if !(reagent.stock_concentration > 0.0) || !reagent.stock_concentration.is_finite() {
        issues.push(format!(
            "stock concentration must be greater than 0, got {}",
            reagent.stock_concentration
        ));
    } else if reagent.stock_concentration < reagent.final_concentration {
        issues.push(format!(
            "stock concentration {} is below the final concentration {}",
            reagent.stock_concentration, reagent.final_concentration
        ));
    }
    issues
}

pub fn mastermix_issues(mastermix: &Mastermix) -> Vec<String> {
    let label = if mastermix.name.trim().is_empty() {
        format!("mastermix '{}'", mastermix.id)
    } else {
        format!("mastermix '{}'", mastermix.name)
    };

    let mut issues = Vec::new();
    if mastermix.name.trim().is_empty() {
        issues.push(format!("{label}: name is required"));
    }
    if mastermix.reagents.is_empty() {
        issues.push(format!("{label}: at least one reagent is required"));
    }
    if mastermix.reagents.iter().filter(|r| r.is_water()).count() > 1 {
        issues.push(format!("{label}: only one water reagent can fill the remainder"));
    }
    for reagent in &mastermix.reagents {
        let name = if reagent.source.trim().is_empty() {
            reagent.id.as_str()
        } else {
            reagent.source.as_str()
        };
        issues.extend(
            reagent_issues(reagent)
                .into_iter()
                .map(|issue| format!("{label}, reagent '{name}': {issue}")),
        );
    }
    issues
}

pub fn experiment_issues(experiment: &NaatExperiment) -> Vec<String> {
    let mut issues = Vec::new();
    if experiment.num_of_sample_concentrations == 0 {
        issues.push("experiment: numOfSampleConcentrations must be at least 1".to_string());
    }
    if experiment.num_of_technical_replicates == 0 {
        issues.push("experiment: numOfTechnicalReplicates must be at least 1".to_string());
    }
    if experiment.checked_wells_per_mastermix().is_none() {
        issues.push(format!(
            "experiment: {} sample concentrations x {} replicates is too many reactions",
            experiment.num_of_sample_concentrations, experiment.num_of_technical_replicates
        ));
    }
    let volume = experiment.mastermix_volume_per_reaction;
    if !(volume > 0.0) || !volume.is_finite() {
        issues.push(format!(
            "experiment: mastermixVolumePerReaction must be greater than 0, got {volume}"
        ));
    }
    let volume = experiment.sample_volume_per_reaction;
    if !(volume >= 0.0) || !volume.is_finite() {
        issues.push(format!(
            "experiment: sampleVolumePerReaction must not be negative, got {volume}"
        ));
    }
    issues
}

fn reject(issues: Vec<String>) -> Result<(), RoboforgeError> {
    if issues.is_empty() {
        Ok(())
    } else {
        Err(RoboforgeError::InvalidInput(issues))
    }
}

/// Collects every problem in the NAAT input instead of stopping at the first.
pub fn validate_naat_input(
    experiment: &NaatExperiment,
    mastermixes: &[Mastermix],
) -> Result<(), RoboforgeError> {
    let mut issues = experiment_issues(experiment);
    if let Some(per_mastermix) = experiment.checked_wells_per_mastermix() {
        let total = u32::try_from(mastermixes.len())
            .ok()
            .and_then(|count| count.checked_mul(per_mastermix));
        if total.is_none() {
            issues.push(format!(
                "{} mastermixes x {per_mastermix} reactions is too many reactions",
                mastermixes.len()
            ));
        }
    }
    for mastermix in mastermixes {
        issues.extend(mastermix_issues(mastermix));
    }
    reject(issues)
}

pub fn validate_lfa_input(
    steps: &[LfaStep],
    plate_config: &LfaPlateConfig,
    options: &LfaOptions,
) -> Result<(), RoboforgeError> {
    let mut issues = Vec::new();
    if steps.is_empty() {
        issues.push("at least one LFA step is required".to_string());
    }
    if plate_config.prefix.trim().is_empty() {
        issues.push("plate config: prefix is required".to_string());
    }
    if plate_config.num_plates == 0 {
        issues.push("plate config: numPlates must be at least 1".to_string());
    }
    if plate_config.num_strips_per_plate == 0 {
        issues.push("plate config: numStripsPerPlate must be at least 1".to_string());
    }
    if plate_config.transfers_per_step().is_none() {
        issues.push(format!(
            "plate config: {} plates x {} strips is too many strips",
            plate_config.num_plates, plate_config.num_strips_per_plate
        ));
    }
    if options.strips_per_group == 0 {
        issues.push("options: stripsPerGroup must be at least 1".to_string());
    }

    let largest_tip = TipSize::largest().capacity_ul();
    for (index, step) in steps.iter().enumerate() {
        let label = format!("step {} ('{}')", index + 1, step.step);
        if step.step.trim().is_empty() {
            issues.push(format!("{label}: step name is required"));
        }
        if step.sources().next().is_none() {
            issues.push(format!("{label}: source is required"));
        }
        if !(step.volume >= 0.0) || !step.volume.is_finite() {
            issues.push(format!("{label}: volume must not be negative, got {}", step.volume));
        } else if step.volume > largest_tip {
            issues.push(format!(
                "{label}: volume {} exceeds the largest tip ({largest_tip} uL)",
                step.volume
            ));
        }
        if !step.time.is_finite() {
            issues.push(format!("{label}: time is not a finite number"));
        }
    }
    reject(issues)
}

/// Outcome of a mastermix edit: the derived validity and what breaks it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MastermixValidity {
    pub is_valid: bool,
    pub issues: Vec<String>,
}

impl MastermixValidity {
    fn of(mastermix: &Mastermix) -> Self {
        let issues = mastermix_issues(mastermix);
        Self {
            is_valid: issues.is_empty(),
            issues,
        }
    }
}

/// Editing operations on a mastermix. Each re-derives validity, so the flag
/// can never go stale.
pub trait MastermixEditor {
    fn is_valid(&self) -> bool;
    fn validity(&self) -> MastermixValidity;
    fn add_reagent(&mut self, reagent: Reagent) -> MastermixValidity;
    fn remove_reagent(&mut self, reagent_id: &str) -> MastermixValidity;
    /// Inserts a copy right after the original under `new_id`.
    fn clone_reagent(&mut self, reagent_id: &str, new_id: &str) -> MastermixValidity;
    fn move_reagent(&mut self, from: usize, to: usize) -> MastermixValidity;
}

impl MastermixEditor for Mastermix {
    fn is_valid(&self) -> bool {
        mastermix_issues(self).is_empty()
    }

    fn validity(&self) -> MastermixValidity {
        MastermixValidity::of(self)
    }

    fn add_reagent(&mut self, reagent: Reagent) -> MastermixValidity {
        self.reagents.push(reagent);
        self.validity()
    }

    fn remove_reagent(&mut self, reagent_id: &str) -> MastermixValidity {
        self.reagents.retain(|r| r.id != reagent_id);
        self.validity()
    }

    fn clone_reagent(&mut self, reagent_id: &str, new_id: &str) -> MastermixValidity {
        if let Some(position) = self.reagents.iter().position(|r| r.id == reagent_id) {
            let mut copy = self.reagents[position].clone();
            copy.id = new_id.to_string();
            self.reagents.insert(position + 1, copy);
        }
        self.validity()
    }

    fn move_reagent(&mut self, from: usize, to: usize) -> MastermixValidity {
        if from < self.reagents.len() {
            let reagent = self.reagents.remove(from);
            let to = to.min(self.reagents.len());
            self.reagents.insert(to, reagent);
        }
        self.validity()
    }
}
