use crate::config;
use anyhow::{Context, Result};
use roboforge_core::{
    export::{write_csv_file, CsvRecord},
    lfa::generate_lfa_worklist,
    worklist::NaatWorklistBuilder,
};
use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::info;

pub const WORKLIST_FILE: &str = "worklist.csv";
pub const SAMPLE_WORKLIST_FILE: &str = "sample_worklist.csv";
pub const USER_SOLUTIONS_FILE: &str = "user_solutions.csv";

/// Where a run wrote its files, and how many rows went into each.
#[derive(Debug)]
pub struct RunReport {
    pub output_dir: PathBuf,
    pub files: Vec<(PathBuf, usize)>,
}

impl RunReport {
    fn new(output_dir: PathBuf) -> Self {
        Self {
            output_dir,
            files: Vec::new(),
        }
    }

    fn write<T: CsvRecord>(&mut self, file_name: &str, rows: &[T]) -> Result<()> {
        let path = self.output_dir.join(file_name);
        let count = write_csv_file(&path, rows)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("  -> {} ({} rows)", path.display(), count);
        self.files.push((path, count));
        Ok(())
    }
}

/// Uses `requested` if given, otherwise a fresh timestamped directory under
/// `./data/runs`.
pub fn prepare_output_dir(kind: &str, requested: Option<&Path>) -> Result<PathBuf> {
    let dir = match requested {
        Some(dir) => dir.to_path_buf(),
        None => PathBuf::from(format!(
            "./data/runs/{}_{}",
            kind,
            chrono::Utc::now().format("%Y%m%d_%H%M%S")
        )),
    };
    fs::create_dir_all(&dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
    Ok(dir)
}

/// Copies the input document next to the worklists for traceability.
fn archive_input(input: &Path, output_dir: &Path) -> Result<()> {
    let name = input
        .file_name()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("input"));
    let target = output_dir.join(name);
    fs::copy(input, &target).with_context(|| {
        format!("Failed to copy {} to {}", input.display(), target.display())
    })?;
    Ok(())
}

pub fn run_naat(
    input: &Path,
    plates: Option<&Path>,
    output_dir: Option<&Path>,
    include_mixing_and_aliquoting: bool,
) -> Result<RunReport> {
    println!("\n--- [Workflow] NAAT worklist ---");
    let export = config::load_naat_export(input)?;
    let catalogue = config::load_plate_catalogue(plates)?;

    let engine = NaatWorklistBuilder::new()
        .with_experiment(export.experiment)
        .with_mastermixes(export.mastermixes)
        .with_plate_catalogue(catalogue)
        .include_mixing_and_aliquoting(include_mixing_and_aliquoting)
        .build()
        .context("NAAT input rejected")?;
    let result = engine.run().context("NAAT worklist generation failed")?;
    info!(
        rows = result.worklist.len(),
        samples = result.sample_worklist.len(),
        solutions = result.user_solutions.len(),
        "NAAT run generated"
    );

    let dir = prepare_output_dir("naat", output_dir)?;
    archive_input(input, &dir)?;
    let mut report = RunReport::new(dir);
    report.write(WORKLIST_FILE, &result.worklist)?;
    report.write(SAMPLE_WORKLIST_FILE, &result.sample_worklist)?;
    report.write(USER_SOLUTIONS_FILE, &result.user_solutions)?;
    Ok(report)
}

pub fn run_lfa(input: &Path, plates: Option<&Path>, output_dir: Option<&Path>) -> Result<RunReport> {
    println!("\n--- [Workflow] LFA worklist ---");
    let export = config::load_lfa_export(input)?;
    let catalogue = config::load_plate_catalogue(plates)?;

    let result = generate_lfa_worklist(
        &export.steps,
        &export.plate_config,
        &export.options,
        &catalogue,
    )
    .context("LFA worklist generation failed")?;
    info!(
        rows = result.worklist.len(),
        solutions = result.user_solutions.len(),
        "LFA run generated"
    );

    let dir = prepare_output_dir("lfa", output_dir)?;
    archive_input(input, &dir)?;
    let mut report = RunReport::new(dir);
    report.write(WORKLIST_FILE, &result.worklist)?;
    report.write(USER_SOLUTIONS_FILE, &result.user_solutions)?;
    Ok(report)
}
