use thiserror::Error;

/// Leaf failures of the volume calculator.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum VolumeError {
    #[error("stock concentration must be positive, got {0}")]
    NonPositiveStock(f64),

    #[error("volume is not a finite number ({0})")]
    NonFinite(f64),

    #[error("at least one well is required to hold a volume")]
    ZeroWells,

    #[error("{total:.1} uL is too small to split over {wells} wells")]
    NegativeShare { total: f64, wells: u32 },

    #[error("tip capacity must be positive, got {0}")]
    NonPositiveTip(f64),

    #[error("water fill is negative ({water:.1} uL): other reagents need {others:.1} uL of a {mastermix:.1} uL mastermix")]
    NegativeWaterFill {
        water: f64,
        mastermix: f64,
        others: f64,
    },
}

/// Arithmetic and capacity failures raised while building a worklist.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CalculationError {
    #[error("mastermix '{mastermix}', reagent '{reagent}': {cause}")]
    Reagent {
        mastermix: String,
        reagent: String,
        #[source]
        cause: VolumeError,
    },

    #[error("{context}: {cause}")]
    Volume {
        context: String,
        #[source]
        cause: VolumeError,
    },

    #[error("Plate '{0}' not found in the plate catalogue")]
    UnknownPlate(String),

    #[error("Plate '{0}' has no usable well volume")]
    ZeroWellCapacity(String),

    #[error("Plate '{plate}' cannot fit a block of {requested} wells starting at slot {start} ({capacity} wells available)")]
    PlateFull {
        plate: String,
        start: u32,
        requested: u32,
        capacity: u32,
    },

    #[error("{0} is too large to address on the deck")]
    CountOverflow(&'static str),

    #[error("Transfer of {volume:.1} uL from '{source_name}' exceeds the {usable:.1} uL usable volume of a '{plate}' well")]
    TransferExceedsWell {
        source_name: String,
        plate: String,
        volume: f64,
        usable: f64,
    },
}

#[derive(Debug, Error)]
pub enum RoboforgeError {
    #[error("Worklist generation requires an experiment, but none was provided")]
    ExperimentNotDefined,

    #[error("Worklist generation requires at least one mastermix")]
    NoMastermixProvided,

    #[error("Invalid input:\n  {}", .0.join("\n  "))]
    InvalidInput(Vec<String>),

    #[error(transparent)]
    Calculation(#[from] CalculationError),

    #[error("Refusing to export row {row}: field '{field}' is not finite ({value})")]
    NonFiniteField {
        row: usize,
        field: &'static str,
        value: f64,
    },

    #[error("I/O error for file '{0}': {1}")]
    FileIO(String, #[source] std::io::Error),

    #[error("Failed to process CSV file '{0}': {1}")]
    CsvError(String, #[source] csv::Error),
}
