use serde::{Deserialize, Serialize};

/// One protocol step of a lateral-flow assay, applied to every strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LfaStep {
    pub step: String,
    #[serde(default)]
    pub dx: f64,
    #[serde(default)]
    pub dz: f64,
    pub volume: f64,
    pub liquid_class: String,
    #[serde(default)]
    pub time: f64,
    /// One source, or several separated by commas.
    pub source: String,
}

impl LfaStep {
    pub fn sources(&self) -> impl Iterator<Item = &str> {
        self.source.split(',').map(str::trim).filter(|s| !s.is_empty())
    }
}

/// Destination assay plates (cassette holders) of an LFA run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LfaPlateConfig {
    pub prefix: String,
    pub num_plates: u32,
    pub num_strips_per_plate: u32,
    #[serde(default)]
    pub num_columns: u32,
}

impl LfaPlateConfig {
    /// Strips across every plate, or `None` when that overflows a `u32`.
    pub fn transfers_per_step(&self) -> Option<u32> {
        self.num_plates.checked_mul(self.num_strips_per_plate)
    }
}

fn default_strips_per_group() -> u32 {
    8
}

fn default_dispense_type() -> String {
    "jet_empty".to_string()
}

fn default_aspiration_mixing() -> bool {
    true
}

fn default_zero_fill() -> usize {
    2
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LfaOptions {
    #[serde(default = "default_strips_per_group")]
    pub strips_per_group: u32,
    #[serde(default = "default_dispense_type")]
    pub dispense_type: String,
    #[serde(default = "default_aspiration_mixing")]
    pub aspiration_mixing: bool,
    /// Width the destination plate number is zero-padded to.
    #[serde(default = "default_zero_fill")]
    pub zero_fill: usize,
}

impl Default for LfaOptions {
    fn default() -> Self {
        Self {
            strips_per_group: default_strips_per_group(),
            dispense_type: default_dispense_type(),
            aspiration_mixing: default_aspiration_mixing(),
            zero_fill: default_zero_fill(),
        }
    }
}
