//! Plate geometry shared by the NAAT and LFA pipelines: which plate family a
//! source goes on, how slots map to well numbers, and the cursor that hands
//! out blocks of wells.

use crate::error::CalculationError;
use roboforge_schemas::{
    experiment::PcrPlateSize,
    plate::{PlateCatalogEntry, PlateCatalogue, WellTraversal},
};

pub const NAAT_DEEP_WELL_PLATE: &str = "ivl_96_dw_v1_0001";
pub const NAAT_FLAT_PLATE: &str = "ivl_96_flat_v1_0001";
/// Plate the mastermixes are built, mixed and aliquoted from.
pub const MASTERMIX_PLATE: &str = "dw_96_0002";
pub const SAMPLE_PLATE: &str = "pcr_96_0001";
pub const LFA_DEEP_WELL_PLATE: &str = "ivl_96_dw_v1";
pub const LFA_FLAT_PLATE: &str = "ivl_384_flat_v1";

fn entry(
    name: &str,
    well_count: u32,
    num_rows: u32,
    num_columns: u32,
    well_capacity_ul: f64,
    holdover_volume_ul: f64,
    traversal: WellTraversal,
) -> PlateCatalogEntry {
    PlateCatalogEntry {
        name: name.to_string(),
        well_count,
        num_rows,
        num_columns,
        well_capacity_ul,
        holdover_volume_ul,
        holdover_factor: None,
        traversal,
    }
}

/// Every plate the generators refer to by name.
pub fn standard_catalogue() -> PlateCatalogue {
    vec![
        entry(NAAT_DEEP_WELL_PLATE, 96, 8, 12, 750.0, 50.0, WellTraversal::RowMajor),
        entry(NAAT_FLAT_PLATE, 96, 8, 12, 150.0, 10.0, WellTraversal::RowMajor),
        entry(MASTERMIX_PLATE, 96, 8, 12, 2000.0, 50.0, WellTraversal::RowMajor),
        entry(SAMPLE_PLATE, 96, 8, 12, 200.0, 10.0, WellTraversal::RowMajor),
        entry(LFA_DEEP_WELL_PLATE, 96, 8, 12, 1000.0, 50.0, WellTraversal::RowMajor),
        entry(LFA_FLAT_PLATE, 384, 16, 24, 100.0, 10.0, WellTraversal::ColumnInterleaved),
    ]
    .into_iter()
    .collect()
}

pub fn lookup<'a>(
    catalogue: &'a PlateCatalogue,
    name: &str,
) -> Result<&'a PlateCatalogEntry, CalculationError> {
    catalogue
        .get(name)
        .ok_or_else(|| CalculationError::UnknownPlate(name.to_string()))
}

/// Multiplicative dead-volume allowance of a plate; 1 when it defines none.
pub fn holdover_factor(catalogue: &PlateCatalogue, name: &str) -> f64 {
    catalogue
        .get(name)
        .and_then(|entry| entry.holdover_factor)
        .unwrap_or(1.0)
}

pub fn usable_volume(entry: &PlateCatalogEntry) -> Result<f64, CalculationError> {
    let usable = entry.usable_volume_ul();
    if usable > 0.0 {
        Ok(usable)
    } else {
        Err(CalculationError::ZeroWellCapacity(entry.name.clone()))
    }
}

/// Chooses a source plate family by the total volume one source needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlateSelector {
    pub threshold_ul: f64,
    pub above: &'static str,
    pub at_or_below: &'static str,
}

impl PlateSelector {
    pub const NAAT: PlateSelector = PlateSelector {
        threshold_ul: 160.0,
        above: NAAT_DEEP_WELL_PLATE,
        at_or_below: NAAT_FLAT_PLATE,
    };

    pub const LFA: PlateSelector = PlateSelector {
        threshold_ul: 100.0,
        above: LFA_DEEP_WELL_PLATE,
        at_or_below: LFA_FLAT_PLATE,
    };

    pub fn select(&self, total_volume_ul: f64) -> &'static str {
        if total_volume_ul > self.threshold_ul {
            self.above
        } else {
            self.at_or_below
        }
    }
}

/// Maps a zero-based slot to the 1-based well number the robot addresses.
pub fn well_number(entry: &PlateCatalogEntry, slot: u32) -> u32 {
    match entry.traversal {
        WellTraversal::RowMajor => slot + 1,
        WellTraversal::ColumnInterleaved => {
            let rows = entry.num_rows.max(1);
            let column = slot / rows;
            let row = slot % rows;
            column * rows * 2 + row * 2 + 1
        }
    }
}

/// A run of consecutive slots on one plate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WellBlock {
    /// 1-based plate number within the plate type.
    pub plate_index: u32,
    pub start_slot: u32,
    pub len: u32,
}

impl WellBlock {
    pub fn slot(&self, offset: u32) -> u32 {
        self.start_slot + offset % self.len.max(1)
    }
}

/// Hands out non-overlapping blocks of wells on one plate type. Blocks never
/// straddle two plates.
#[derive(Debug, Clone)]
pub struct WellCursor {
    plate: String,
    slots_per_plate: u32,
    max_plates: u32,
    plate_index: u32,
    next_slot: u32,
}

impl WellCursor {
    pub fn new(entry: &PlateCatalogEntry, max_plates: u32) -> Self {
        Self {
            plate: entry.name.clone(),
            slots_per_plate: entry.slot_count(),
            max_plates: max_plates.max(1),
            plate_index: 1,
            next_slot: 0,
        }
    }

    pub fn allocate(&mut self, len: u32) -> Result<WellBlock, CalculationError> {
        let full = |start: u32| CalculationError::PlateFull {
            plate: self.plate.clone(),
            start,
            requested: len,
            capacity: self.slots_per_plate,
        };
        if len > self.slots_per_plate {
            return Err(full(0));
        }
        if self.next_slot + len > self.slots_per_plate {
            if self.plate_index >= self.max_plates {
                return Err(full(self.next_slot));
            }
            self.plate_index += 1;
            self.next_slot = 0;
        }
        let block = WellBlock {
            plate_index: self.plate_index,
            start_slot: self.next_slot,
            len,
        };
        self.next_slot += len;
        Ok(block)
    }
}

/// Destination plate of the `row_number`-th (1-based) reaction well.
pub fn pcr_destination_plate(size: PcrPlateSize, row_number: u32) -> String {
    let prefix = match size {
        PcrPlateSize::Wells96 => "PCR_onCooler",
        PcrPlateSize::Wells384 => "ivl_384_flat_v1",
    };
    let plate_index = row_number.max(1).div_ceil(size.wells());
    format!("{}_{:04}", prefix, plate_index)
}

pub fn pcr_destination_well(size: PcrPlateSize, row_number: u32) -> u32 {
    (row_number.max(1) - 1) % size.wells() + 1
}
