//! Operator loading sheets: how much of each solution goes into which source
//! well before the run starts.

use crate::plate::holdover_factor;
use roboforge_schemas::{
    plate::PlateCatalogue,
    worklist::{UserSolutionRow, WorklistRow},
};
use std::collections::HashMap;

/// Volume to load for `drawn_ul` of demand: one extra microlitre, scaled by
/// the plate's holdover factor, rounded up to the next 10 µL.
pub fn loading_volume(drawn_ul: f64, holdover_factor: f64) -> f64 {
    (((drawn_ul + 1.0) * holdover_factor) / 10.0).ceil() * 10.0
}

pub fn plate_well_label(plate: &str, well: u32) -> String {
    format!("{}|{}", plate, well)
}

/// Per-well totals in first-seen order.
#[derive(Debug, Default, Clone)]
pub struct LoadingSheet {
    entries: Vec<LoadingEntry>,
    index: HashMap<(String, String, u32), usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct LoadingEntry {
    pub solution: String,
    pub plate: String,
    pub well: u32,
    pub drawn_ul: f64,
}

impl LoadingSheet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, solution: &str, plate: &str, well: u32, volume_ul: f64) {
        let key = (solution.trim().to_string(), plate.trim().to_string(), well);
        match self.index.get(&key) {
            Some(&position) => self.entries[position].drawn_ul += volume_ul,
            None => {
                self.index.insert(key.clone(), self.entries.len());
                self.entries.push(LoadingEntry {
                    solution: key.0,
                    plate: key.1,
                    well,
                    drawn_ul: volume_ul,
                });
            }
        }
    }

    pub fn entries(&self) -> &[LoadingEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Loading sheet for a NAAT run: the mastermix source wells ordered by plate
/// then well, followed by one line per sample at its first well.
pub fn naat_user_solutions(
    build_rows: &[WorklistRow],
    sample_rows: &[WorklistRow],
    catalogue: &PlateCatalogue,
) -> Vec<UserSolutionRow> {
    let mut ordered: Vec<&WorklistRow> = build_rows.iter().collect();
    ordered.sort_by(|a, b| {
        a.from_plate
            .to_lowercase()
            .cmp(&b.from_plate.to_lowercase())
            .then(a.from_well.cmp(&b.from_well))
    });

    let mut reagents = LoadingSheet::new();
    for row in ordered {
        reagents.add(&row.source, &row.from_plate, row.from_well, row.volume_ul);
    }

    // Sample sources are matched case-insensitively and loaded at the first
    // well they are drawn from.
    let mut samples: Vec<LoadingEntry> = Vec::new();
    let mut sample_index: HashMap<String, usize> = HashMap::new();
    for row in sample_rows {
        let key = row.source.trim().to_lowercase();
        match sample_index.get(&key) {
            Some(&position) => samples[position].drawn_ul += row.volume_ul,
            None => {
                sample_index.insert(key, samples.len());
                samples.push(LoadingEntry {
                    solution: row.source.trim().to_string(),
                    plate: row.from_plate.trim().to_string(),
                    well: row.from_well,
                    drawn_ul: row.volume_ul,
                });
            }
        }
    }

    reagents
        .entries()
        .iter()
        .chain(samples.iter())
        .map(|entry| UserSolutionRow {
            solution: entry.solution.clone(),
            plate_well: plate_well_label(&entry.plate, entry.well),
            user_input: loading_volume(entry.drawn_ul, holdover_factor(catalogue, &entry.plate)),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plate::standard_catalogue;

    fn row(source: &str, plate: &str, well: u32, volume_ul: f64) -> WorklistRow {
        WorklistRow {
            source: source.to_string(),
            from_plate: plate.to_string(),
            from_well: well,
            volume_ul,
            ..crate::worklist::blank_row()
        }
    }

    #[test]
    fn loading_volume_rounds_up_to_ten() {
        assert_eq!(loading_volume(5.0, 1.0), 10.0);
        assert_eq!(loading_volume(9.0, 1.0), 10.0);
        assert_eq!(loading_volume(9.5, 1.0), 20.0);
        assert_eq!(loading_volume(45.0, 1.2), 60.0);
    }

    #[test]
    fn build_rows_are_summed_per_source_well() {
        let build = vec![
            row("Water", "plate_b", 1, 45.0),
            row("Buffer", "plate_a", 2, 5.0),
            row("Buffer", "plate_a", 2, 5.0),
            row("Primer", "plate_a", 1, 2.5),
        ];
        let rows = naat_user_solutions(&build, &[], &standard_catalogue());
        let summary: Vec<(&str, &str, f64)> = rows
            .iter()
            .map(|r| (r.solution.as_str(), r.plate_well.as_str(), r.user_input))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("Primer", "plate_a|1", 10.0),
                ("Buffer", "plate_a|2", 20.0),
                ("Water", "plate_b|1", 50.0),
            ]
        );
    }

    #[test]
    fn samples_follow_at_their_first_well() {
        let samples = vec![
            row("sample00", "pcr_96_0001", 1, 5.0),
            row("sample01", "pcr_96_0001", 2, 5.0),
            row("sample00", "pcr_96_0001", 1, 5.0),
        ];
        let rows = naat_user_solutions(&[], &samples, &standard_catalogue());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].plate_well, "pcr_96_0001|1");
        assert_eq!(rows[0].user_input, 20.0);
        assert_eq!(rows[1].user_input, 10.0);
    }
}
