//! Source-well assignment for the mastermix build rows.
//!
//! Rows arrive sorted by [`SortKey`]. Each source gets one plate type (by its
//! total volume across every mastermix) and one block of consecutive wells on
//! it; successive rows of the source cycle through the block without ever
//! drawing more than a well's usable volume, growing the block when it runs
//! dry. Blocks on the same plate type are laid end to end. Group numbers change exactly where the
//! robot must change tips: when the liquid class or the source changes.

use crate::error::CalculationError;
use crate::plate::{self, PlateSelector, WellBlock, WellCursor};
use roboforge_schemas::{
    plate::{PlateCatalogEntry, PlateCatalogue},
    worklist::WorklistRow,
};
use std::collections::{btree_map::Entry, BTreeMap, HashMap};
use tracing::debug;

/// Extra volume reserved per source so that wells are never drawn dry.
pub const SOURCE_OVERAGE_FACTOR: f64 = 1.3;

/// Ordering of build rows. Compared field by field; every string is
/// lower-cased when the key is built.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) struct SortKey {
    pub source_order: usize,
    pub source: String,
    pub liquid_class: String,
    pub mastermix_id: String,
    pub reagent_id: String,
}

/// A build row plus the bookkeeping that never reaches the CSV.
#[derive(Debug, Clone)]
pub(crate) struct PendingRow {
    pub row: WorklistRow,
    pub key: SortKey,
    pub mastermix_index: usize,
    pub well_index: u32,
}

/// Where one source lives on the deck, decided once per generation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct SourcePlan {
    pub plate: &'static str,
    pub total_volume_ul: f64,
    pub block_len: u32,
}

pub(crate) fn plan_sources(
    rows: &[PendingRow],
    catalogue: &PlateCatalogue,
) -> Result<HashMap<String, SourcePlan>, CalculationError> {
    let mut totals: HashMap<&str, f64> = HashMap::new();
    for pending in rows {
        *totals.entry(pending.key.source.as_str()).or_insert(0.0) += pending.row.volume_ul;
    }

    let mut plans = HashMap::with_capacity(totals.len());
    for (source, total_volume_ul) in totals {
        let plate_name = PlateSelector::NAAT.select(total_volume_ul);
        let usable = plate::usable_volume(plate::lookup(catalogue, plate_name)?)?;
        let block_len = ((total_volume_ul * SOURCE_OVERAGE_FACTOR) / usable).ceil().max(1.0) as u32;
        debug!(source, total_volume_ul, plate = plate_name, block_len, "planned source wells");
        plans.insert(
            source.to_string(),
            SourcePlan {
                plate: plate_name,
                total_volume_ul,
                block_len,
            },
        );
    }
    Ok(plans)
}

/// Cursor state for one plate type.
#[derive(Debug, Clone)]
pub struct WellTracker {
    entry: PlateCatalogEntry,
    usable_ul: f64,
    cursor: WellCursor,
    owner: Option<String>,
    block: Option<WellBlock>,
    drawn_ul: Vec<f64>,
    offset: u32,
}

impl WellTracker {
    pub fn new(entry: &PlateCatalogEntry) -> Self {
        Self {
            entry: entry.clone(),
            usable_ul: entry.usable_volume_ul(),
            cursor: WellCursor::new(entry, 1),
            owner: None,
            block: None,
            drawn_ul: Vec::new(),
            offset: 0,
        }
    }

    /// Well for the next `volume_ul` row of `source`. A source seen for the
    /// first time opens a new block right after the previous one. Rows cycle
    /// through the block, skipping wells that cannot take the volume; when
    /// none can, the block grows by one well.
    pub fn next_well(
        &mut self,
        source: &str,
        block_len: u32,
        volume_ul: f64,
    ) -> Result<u32, CalculationError> {
        if volume_ul > self.usable_ul + 1e-9 {
            return Err(CalculationError::TransferExceedsWell {
                source_name: source.to_string(),
                plate: self.entry.name.clone(),
                volume: volume_ul,
                usable: self.usable_ul,
            });
        }

        let (mut block, start) = match self.block {
            Some(block) if self.owner.as_deref() == Some(source) => {
                (block, (self.offset + 1) % block.len.max(1))
            }
            _ => {
                let block = self.cursor.allocate(block_len.max(1))?;
                self.owner = Some(source.to_string());
                self.drawn_ul = vec![0.0; block.len as usize];
                (block, 0)
            }
        };

        let usable_ul = self.usable_ul;
        let free = (0..block.len)
            .map(|step| (start + step) % block.len)
            .find(|&offset| self.drawn_ul[offset as usize] + volume_ul <= usable_ul + 1e-9);
        let offset = match free {
            Some(offset) => offset,
            None => {
                let extra = self.cursor.allocate(1)?;
                if extra.plate_index != block.plate_index
                    || extra.start_slot != block.start_slot + block.len
                {
                    return Err(CalculationError::PlateFull {
                        plate: self.entry.name.clone(),
                        start: block.start_slot,
                        requested: block.len + 1,
                        capacity: self.entry.slot_count(),
                    });
                }
                block.len += 1;
                self.drawn_ul.push(0.0);
                block.len - 1
            }
        };

        self.drawn_ul[offset as usize] += volume_ul;
        self.block = Some(block);
        self.offset = offset;
        Ok(plate::well_number(&self.entry, block.start_slot + offset))
    }
}

/// Fold accumulator for [`assign_wells`].
#[derive(Debug, Default)]
pub(crate) struct AssignmentState {
    trackers: BTreeMap<&'static str, WellTracker>,
    previous: Option<(String, String)>,
    pub group_number: u32,
}

impl AssignmentState {
    fn advance(
        &mut self,
        pending: &mut PendingRow,
        plans: &HashMap<String, SourcePlan>,
        catalogue: &PlateCatalogue,
        wells_per_mastermix: u32,
    ) -> Result<(), CalculationError> {
        let boundary = (pending.row.liquid_class.clone(), pending.key.source.clone());
        if self.previous.as_ref() != Some(&boundary) {
            self.group_number += 1;
            self.previous = Some(boundary);
        }

        let plan = plans
            .get(&pending.key.source)
            .ok_or_else(|| CalculationError::UnknownPlate(pending.row.source.clone()))?;
        let tracker = match self.trackers.entry(plan.plate) {
            Entry::Occupied(occupied) => occupied.into_mut(),
            Entry::Vacant(vacant) => {
                vacant.insert(WellTracker::new(plate::lookup(catalogue, plan.plate)?))
            }
        };

        pending.row.group_number = self.group_number;
        pending.row.from_plate = plan.plate.to_string();
        pending.row.from_well =
            tracker.next_well(&pending.key.source, plan.block_len, pending.row.volume_ul)?;
        pending.row.to_well =
            pending.mastermix_index as u32 * wells_per_mastermix + pending.well_index + 1;
        Ok(())
    }
}

/// Fills `group_number`, `from_plate`, `from_well` and `to_well` of sorted
/// build rows. The tracker lives only for this call.
pub(crate) fn assign_wells(
    rows: Vec<PendingRow>,
    plans: &HashMap<String, SourcePlan>,
    catalogue: &PlateCatalogue,
    wells_per_mastermix: u32,
) -> Result<(Vec<PendingRow>, AssignmentState), CalculationError> {
    let capacity = rows.len();
    rows.into_iter().try_fold(
        (Vec::with_capacity(capacity), AssignmentState::default()),
        |(mut assigned, mut state), mut pending| {
            state.advance(&mut pending, plans, catalogue, wells_per_mastermix)?;
            assigned.push(pending);
            Ok((assigned, state))
        },
    )
}
