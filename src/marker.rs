//! Marker writer.
//!
//! Merges a rendered consistency marker with the reference alignment and
//! writes the result as FASTA, with the marker record placed first or last.
//! The output file is written to a temporary file next to its destination and
//! only moved into place once everything has been written.

use std::fmt;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use log::info;
use tempfile::NamedTempFile;

use crate::error::{ConsposError, ConsposResult};
use crate::fasta::write_fasta;
use crate::model::{Alignment, SequenceRecord};

/// Default name of the synthetic marker record.
pub const DEFAULT_MARKER_NAME: &str = "conspos_marker";

/// The two symbols of a consistency marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerSymbols {
    consistent: char,
    inconsistent: char,
}

impl MarkerSymbols {
    /// Creates a symbol pair; the two symbols must differ.
    pub fn new(consistent: char, inconsistent: char) -> ConsposResult<Self> {
        if consistent == inconsistent {
            return Err(ConsposError::InvalidConfiguration(format!(
                "consistent and inconsistent markers must differ (both '{}')",
                consistent
            )));
        }
        // One byte per column, and nothing that breaks a FASTA line
        let usable = |c: char| c.is_ascii_graphic() && c != '>';
        if !usable(consistent) || !usable(inconsistent) {
            return Err(ConsposError::InvalidConfiguration(
                "marker symbols must be printable ASCII other than '>'".to_string(),
            ));
        }
        Ok(Self {
            consistent,
            inconsistent,
        })
    }

    pub fn consistent(&self) -> char {
        self.consistent
    }

    pub fn inconsistent(&self) -> char {
        self.inconsistent
    }

    /// Symbol for a column state.
    pub fn symbol(&self, consistent: bool) -> char {
        if consistent {
            self.consistent
        } else {
            self.inconsistent
        }
    }
}

impl Default for MarkerSymbols {
    fn default() -> Self {
        Self {
            consistent: 'C',
            inconsistent: 'N',
        }
    }
}

/// Where the marker record goes among the output records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MarkerLocation {
    #[default]
    Start,
    End,
}

impl fmt::Display for MarkerLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarkerLocation::Start => write!(f, "start"),
            MarkerLocation::End => write!(f, "end"),
        }
    }
}

impl FromStr for MarkerLocation {
    type Err = ConsposError;

    /// Accepts `start`/`end` and the index spellings `0`/`-1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "start" | "0" => Ok(MarkerLocation::Start),
            "end" | "-1" => Ok(MarkerLocation::End),
            _ => Err(ConsposError::InvalidConfiguration(format!(
                "invalid marker location '{}' (expected 'start' or 'end')",
                s
            ))),
        }
    }
}

/// Places the marker record before or after the reference records.
pub fn merge_marker(
    reference: &Alignment,
    marker: SequenceRecord,
    location: MarkerLocation,
) -> Vec<SequenceRecord> {
    let mut records = Vec::with_capacity(reference.sequence_count() + 1);
    match location {
        MarkerLocation::Start => {
            records.push(marker);
            records.extend(reference.iter().cloned());
        }
        MarkerLocation::End => {
            records.extend(reference.iter().cloned());
            records.push(marker);
        }
    }
    records
}

/// Writes the merged alignment to `path`.
///
/// Nothing appears at `path` unless the whole alignment was written.
pub fn write_marked_alignment<P: AsRef<Path>>(
    path: P,
    reference: &Alignment,
    marker: SequenceRecord,
    location: MarkerLocation,
) -> ConsposResult<usize> {
    let path = path.as_ref();
    let records = merge_marker(reference, marker, location);

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let tmp = NamedTempFile::new_in(dir)?;
    let count = {
        let mut writer = BufWriter::new(tmp.as_file());
        let count = write_fasta(&mut writer, &records)?;
        writer.flush()?;
        count
    };
    tmp.persist(path).map_err(|e| ConsposError::Io(e.error))?;

    info!("Wrote {} records to {}", count, path.display());
    Ok(count)
}
