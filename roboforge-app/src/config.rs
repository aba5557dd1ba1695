use anyhow::{bail, Context, Result};
use roboforge_core::plate::standard_catalogue;
use roboforge_schemas::{
    file_formats::{LfaExportFile, NaatExportFile, PlateCatalogueFile},
    plate::PlateCatalogue,
};
use serde::de::DeserializeOwned;
use std::{fs, path::Path};
use tracing::{debug, warn};

/// Schema version the input documents are written against.
pub const SCHEMA_VERSION: &str = "1";

/// Reads a YAML or JSON document, picking the parser from the file extension.
pub fn load_document<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase);
    match extension.as_deref() {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse YAML from {}", path.display())),
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON from {}", path.display())),
        _ => bail!(
            "Unsupported input format for {}: expected .yaml, .yml or .json",
            path.display()
        ),
    }
}

fn check_schema_version(path: &Path, version: &str) {
    if version.split('.').next() != Some(SCHEMA_VERSION) {
        warn!(
            file = %path.display(),
            version,
            expected = SCHEMA_VERSION,
            "input schema version differs, reading it anyway"
        );
    }
}

pub fn load_naat_export(path: &Path) -> Result<NaatExportFile> {
    let file: NaatExportFile = load_document(path)?;
    check_schema_version(path, &file.schema_version);
    println!(
        "Loaded NAAT plan '{}' with {} mastermix(es) from '{}'.",
        file.experiment.name_of_experimental_plan,
        file.mastermixes.len(),
        path.display()
    );
    Ok(file)
}

pub fn load_lfa_export(path: &Path) -> Result<LfaExportFile> {
    let file: LfaExportFile = load_document(path)?;
    check_schema_version(path, &file.schema_version);
    println!(
        "Loaded LFA protocol with {} step(s) for {} plate(s) of '{}' from '{}'.",
        file.steps.len(),
        file.plate_config.num_plates,
        file.plate_config.prefix,
        path.display()
    );
    Ok(file)
}

/// The standard deck plates, with any entries from `path` replacing or
/// adding to them.
pub fn load_plate_catalogue(path: Option<&Path>) -> Result<PlateCatalogue> {
    let mut catalogue = standard_catalogue();
    let Some(path) = path else {
        return Ok(catalogue);
    };
    let file: PlateCatalogueFile = load_document(path)?;
    check_schema_version(path, &file.schema_version);
    for plate in file.plates {
        debug!(plate = %plate.name, capacity = plate.well_capacity_ul, "plate catalogue entry");
        if catalogue.insert(plate.clone()).is_some() {
            println!("Plate '{}' overridden by '{}'.", plate.name, path.display());
        }
    }
    Ok(catalogue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use roboforge_core::plate::{LFA_FLAT_PLATE, NAAT_FLAT_PLATE};
    use roboforge_schemas::experiment::PcrPlateSize;
    use std::io::Write;
    use tempfile::Builder;

    fn temp_file(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    const NAAT_YAML: &str = r#"
schema_version: "1.0"
experiment:
  nameOfExperimentalPlan: LAMP panel
  numOfSampleConcentrations: 2
  numOfTechnicalReplicates: 3
  mastermixVolumePerReaction: 20
  sampleVolumePerReaction: 5
  pcrPlateSize: 96
mastermixes:
  - id: mm-1
    name: MM1
    reagents:
      - id: r1
        source: Buffer
        unit: X
        finalConcentration: 1
        stockConcentration: 10
        liquidType: buffer
        dispenseType: Jet_Empty
      - id: r2
        source: Water
        liquidType: water
"#;

    #[test]
    fn naat_export_reads_from_yaml() {
        let file = temp_file(".yaml", NAAT_YAML);
        let export = load_naat_export(file.path()).unwrap();
        assert_eq!(export.experiment.pcr_plate_size, PcrPlateSize::Wells96);
        assert_eq!(export.mastermixes[0].reagents.len(), 2);
        assert!(export.mastermixes[0].reagents[1].is_water());
    }

    #[test]
    fn lfa_export_reads_from_json() {
        let json = r#"{
            "schema_version": "1",
            "steps": [
                {"step": "sample", "volume": 20, "liquid_class": "serum", "source": "patient"}
            ],
            "plate_config": {"prefix": "assay", "numPlates": 1, "numStripsPerPlate": 8}
        }"#;
        let file = temp_file(".json", json);
        let export = load_lfa_export(file.path()).unwrap();
        assert_eq!(export.steps[0].source, "patient");
        assert_eq!(export.plate_config.num_strips_per_plate, 8);
        assert_eq!(export.options.strips_per_group, 8);
    }

    #[test]
    fn unknown_extension_is_refused() {
        let file = temp_file(".txt", NAAT_YAML);
        let err = load_naat_export(file.path()).unwrap_err();
        assert!(err.to_string().contains("Unsupported input format"));
    }

    #[test]
    fn catalogue_file_overrides_standard_plates() {
        let yaml = r#"
schema_version: "1"
plates:
  - name: IVL_384_FLAT_V1
    well_count: 384
    num_rows: 16
    num_columns: 24
    well_capacity_ul: 40
    holdover_volume_ul: 10
    traversal: column_interleaved
"#;
        let file = temp_file(".yml", yaml);
        let catalogue = load_plate_catalogue(Some(file.path())).unwrap();
        assert_eq!(catalogue.len(), standard_catalogue().len());
        assert_eq!(catalogue.get(LFA_FLAT_PLATE).unwrap().well_capacity_ul, 40.0);
        assert!(catalogue.get(NAAT_FLAT_PLATE).is_some());
    }

    #[test]
    fn no_catalogue_file_means_standard_plates() {
        assert_eq!(load_plate_catalogue(None).unwrap(), standard_catalogue());
    }
}
