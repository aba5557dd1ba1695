use crate::{
    experiment::NaatExperiment,
    lfa::{LfaOptions, LfaPlateConfig, LfaStep},
    mastermix::Mastermix,
    plate::PlateCatalogEntry,
};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct NaatExportFile {
    pub schema_version: String,
    pub experiment: NaatExperiment,
    pub mastermixes: Vec<Mastermix>,
}

#[derive(Debug, Deserialize)]
pub struct LfaExportFile {
    pub schema_version: String,
    pub steps: Vec<LfaStep>,
    pub plate_config: LfaPlateConfig,
    #[serde(default)]
    pub options: LfaOptions,
}

#[derive(Debug, Deserialize)]
pub struct PlateCatalogueFile {
    pub schema_version: String,
    pub plates: Vec<PlateCatalogEntry>,
}
