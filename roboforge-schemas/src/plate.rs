use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Order in which a plate's wells are handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WellTraversal {
    /// Wells are numbered and used 1, 2, 3, ...
    #[default]
    RowMajor,
    /// Every other well, column by column: only odd-numbered wells are used,
    /// which keeps a high-density plate on the 96-well pitch.
    ColumnInterleaved,
}

/// Physical description of a labware type on the deck.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlateCatalogEntry {
    pub name: String,
    pub well_count: u32,
    pub num_rows: u32,
    pub num_columns: u32,
    pub well_capacity_ul: f64,
    #[serde(default)]
    pub holdover_volume_ul: f64,
    #[serde(default)]
    pub holdover_factor: Option<f64>,
    #[serde(default)]
    pub traversal: WellTraversal,
}

impl PlateCatalogEntry {
    /// Volume a well can deliver once the dead volume is set aside.
    pub fn usable_volume_ul(&self) -> f64 {
        self.well_capacity_ul - self.holdover_volume_ul
    }

    /// Number of wells the traversal can hand out on one plate.
    pub fn slot_count(&self) -> u32 {
        match self.traversal {
            WellTraversal::RowMajor => self.well_count,
            WellTraversal::ColumnInterleaved => self.well_count / 2,
        }
    }
}

/// Plate types keyed case-insensitively by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlateCatalogue {
    entries: BTreeMap<String, PlateCatalogEntry>,
}

impl PlateCatalogue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds or replaces an entry, returning the one it replaced.
    pub fn insert(&mut self, entry: PlateCatalogEntry) -> Option<PlateCatalogEntry> {
        self.entries.insert(entry.name.trim().to_lowercase(), entry)
    }

    pub fn get(&self, name: &str) -> Option<&PlateCatalogEntry> {
        self.entries.get(&name.trim().to_lowercase())
    }

    pub fn iter(&self) -> impl Iterator<Item = &PlateCatalogEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<PlateCatalogEntry> for PlateCatalogue {
    fn from_iter<I: IntoIterator<Item = PlateCatalogEntry>>(iter: I) -> Self {
        let mut catalogue = PlateCatalogue::new();
        for entry in iter {
            catalogue.insert(entry);
        }
        catalogue
    }
}

impl Extend<PlateCatalogEntry> for PlateCatalogue {
    fn extend<I: IntoIterator<Item = PlateCatalogEntry>>(&mut self, iter: I) {
        for entry in iter {
            self.insert(entry);
        }
    }
}
