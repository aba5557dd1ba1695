use super::engine::NaatWorklistEngine;
use crate::{
    error::RoboforgeError,
    plate::{self, standard_catalogue, MASTERMIX_PLATE, NAAT_DEEP_WELL_PLATE, NAAT_FLAT_PLATE},
    validation::validate_naat_input,
};
use roboforge_schemas::{experiment::NaatExperiment, mastermix::Mastermix, plate::PlateCatalogue};

/// A fluent builder for constructing a `NaatWorklistEngine`.
///
/// Collects the experiment, its mastermixes and the deck's plate catalogue,
/// then validates the whole input once in [`build`](Self::build).
pub struct NaatWorklistBuilder {
    experiment: Option<NaatExperiment>,
    mastermixes: Vec<Mastermix>,
    catalogue: Option<PlateCatalogue>,
    include_mixing_and_aliquoting: bool,
}

impl Default for NaatWorklistBuilder {
    fn default() -> Self {
        Self {
            experiment: None,
            mastermixes: Vec::new(),
            catalogue: None,
            include_mixing_and_aliquoting: true,
        }
    }
}

impl NaatWorklistBuilder {
    /// Creates a builder that emits mixing and aliquoting rows by default.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_experiment(mut self, experiment: NaatExperiment) -> Self {
        self.experiment = Some(experiment);
        self
    }

    pub fn with_mastermixes(mut self, mastermixes: Vec<Mastermix>) -> Self {
        self.mastermixes = mastermixes;
        self
    }

    /// Replaces the standard plate catalogue.
    pub fn with_plate_catalogue(mut self, catalogue: PlateCatalogue) -> Self {
        self.catalogue = Some(catalogue);
        self
    }

    pub fn include_mixing_and_aliquoting(mut self, include: bool) -> Self {
        self.include_mixing_and_aliquoting = include;
        self
    }

    /// Consumes the builder and returns a validated `NaatWorklistEngine`.
    ///
    /// # Errors
    ///
    /// Returns a `RoboforgeError` if the experiment or mastermixes are missing,
    /// if any input fails validation, or if the catalogue lacks a plate the
    /// generator places liquid on.
    pub fn build(self) -> Result<NaatWorklistEngine, RoboforgeError> {
        let experiment = self.experiment.ok_or(RoboforgeError::ExperimentNotDefined)?;
        if self.mastermixes.is_empty() {
            return Err(RoboforgeError::NoMastermixProvided);
        }
        validate_naat_input(&experiment, &self.mastermixes)?;

        let catalogue = self.catalogue.unwrap_or_else(standard_catalogue);
        for name in [NAAT_DEEP_WELL_PLATE, NAAT_FLAT_PLATE, MASTERMIX_PLATE] {
            plate::usable_volume(plate::lookup(&catalogue, name)?)?;
        }

        Ok(NaatWorklistEngine {
            experiment,
            mastermixes: self.mastermixes,
            catalogue,
            include_mixing_and_aliquoting: self.include_mixing_and_aliquoting,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CalculationError;
    use roboforge_schemas::{experiment::PcrPlateSize, reagent::LiquidType};

    fn experiment() -> NaatExperiment {
        NaatExperiment {
            name_of_experimental_plan: String::new(),
            num_of_sample_concentrations: 1,
            num_of_technical_replicates: 1,
            mastermix_volume_per_reaction: 20.0,
            sample_volume_per_reaction: 5.0,
            pcr_plate_size: PcrPlateSize::Wells96,
            deck_layout_id: String::new(),
            sample_liquid_type: LiquidType::Template,
        }
    }

    #[test]
    fn missing_parts_are_reported() {
        assert!(matches!(
            NaatWorklistBuilder::new().build(),
            Err(RoboforgeError::ExperimentNotDefined)
        ));
        assert!(matches!(
            NaatWorklistBuilder::new().with_experiment(experiment()).build(),
            Err(RoboforgeError::NoMastermixProvided)
        ));
    }

    #[test]
    fn invalid_mastermix_is_rejected_before_generation() {
        let result = NaatWorklistBuilder::new()
            .with_experiment(experiment())
            .with_mastermixes(vec![Mastermix {
                id: "mm".to_string(),
                name: String::new(),
                reagents: Vec::new(),
            }])
            .build();
        assert!(matches!(result, Err(RoboforgeError::InvalidInput(issues)) if issues.len() == 2));
    }

    #[test]
    fn catalogue_must_cover_the_naat_plates() {
        let result = NaatWorklistBuilder::new()
            .with_experiment(experiment())
            .with_mastermixes(vec![Mastermix {
                id: "mm".to_string(),
                name: "MM".to_string(),
                reagents: vec![roboforge_schemas::reagent::Reagent {
                    id: "w".to_string(),
                    source: "Water".to_string(),
                    unit: String::new(),
                    final_concentration: 0.0,
                    stock_concentration: 0.0,
                    liquid_type: LiquidType::Water,
                    dispense_type: Default::default(),
                    tip_washing: Default::default(),
                    order_index: None,
                }],
            }])
            .with_plate_catalogue(PlateCatalogue::new())
            .build();
        assert!(matches!(
            result,
            Err(RoboforgeError::Calculation(CalculationError::UnknownPlate(_)))
        ));
    }
}
