use crate::error::RoboforgeError;
use csv::{Terminator, Writer, WriterBuilder};
use roboforge_schemas::worklist::{LfaWorklistRow, UserSolutionRow, WorklistRow};
use serde::Serialize;
use std::{fs, io, path::Path};

/// A row the robot CSV layer can write. Numeric columns are exposed so that
/// a NaN or infinity is refused before it reaches the deck software.
pub trait CsvRecord: Serialize {
    fn numeric_fields(&self) -> Vec<(&'static str, f64)>;
}

impl CsvRecord for WorklistRow {
    fn numeric_fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("dx", self.dx),
            ("dz", self.dz),
            ("volume_uL", self.volume_ul),
            ("timer_delta", self.timer_delta),
        ]
    }
}

impl CsvRecord for LfaWorklistRow {
    fn numeric_fields(&self) -> Vec<(&'static str, f64)> {
        vec![
            ("dx", self.dx),
            ("dz", self.dz),
            ("volume_ul", self.volume_ul),
            ("timer_delta", self.timer_delta),
        ]
    }
}

impl CsvRecord for UserSolutionRow {
    fn numeric_fields(&self) -> Vec<(&'static str, f64)> {
        vec![("user_input", self.user_input)]
    }
}

pub fn ensure_finite<T: CsvRecord>(rows: &[T]) -> Result<(), RoboforgeError> {
    for (row, record) in rows.iter().enumerate() {
        if let Some((field, value)) = record
            .numeric_fields()
            .into_iter()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(RoboforgeError::NonFiniteField { row, field, value });
        }
    }
    Ok(())
}

fn writer<W: io::Write>(inner: W) -> Writer<W> {
    WriterBuilder::new()
        .terminator(Terminator::Any(b'\n'))
        .from_writer(inner)
}

/// Serializes rows with a header line. No rows give an empty string.
pub fn to_csv_string<T: CsvRecord>(rows: &[T]) -> Result<String, RoboforgeError> {
    const LABEL: &str = "<memory>";
    if rows.is_empty() {
        return Ok(String::new());
    }
    ensure_finite(rows)?;

    let mut csv = writer(Vec::new());
    for record in rows {
        csv.serialize(record)
            .map_err(|e| RoboforgeError::CsvError(LABEL.to_string(), e))?;
    }
    let bytes = csv
        .into_inner()
        .map_err(|e| RoboforgeError::FileIO(LABEL.to_string(), e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| {
        RoboforgeError::FileIO(LABEL.to_string(), io::Error::new(io::ErrorKind::InvalidData, e))
    })
}

/// Writes one CSV file per call, replacing whatever was there.
pub struct CsvExporter {
    path: String,
    writer: Writer<fs::File>,
    rows_written: usize,
}

impl CsvExporter {
    pub fn new(path: &Path) -> Result<Self, RoboforgeError> {
        let label = path.display().to_string();
        let file = fs::File::create(path).map_err(|e| RoboforgeError::FileIO(label.clone(), e))?;
        Ok(Self {
            path: label,
            writer: writer(file),
            rows_written: 0,
        })
    }

    /// Checks every row before the first write.
    pub fn write_rows<T: CsvRecord>(&mut self, rows: &[T]) -> Result<usize, RoboforgeError> {
        ensure_finite(rows)?;
        for record in rows {
            self.writer
                .serialize(record)
                .map_err(|e| RoboforgeError::CsvError(self.path.clone(), e))?;
        }
        self.writer
            .flush()
            .map_err(|e| RoboforgeError::FileIO(self.path.clone(), e))?;
        self.rows_written += rows.len();
        Ok(rows.len())
    }

    pub fn rows_written(&self) -> usize {
        self.rows_written
    }
}

/// Validates `rows` before touching `path`; a refused row set creates or
/// truncates nothing.
pub fn write_csv_file<T: CsvRecord>(path: &Path, rows: &[T]) -> Result<usize, RoboforgeError> {
    ensure_finite(rows)?;
    CsvExporter::new(path)?.write_rows(rows)
}
