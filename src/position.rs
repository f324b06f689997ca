//! Position encoding of alignment rows.
//!
//! Each row of an alignment is split into residue units (one character, or
//! one codon) and every unit is replaced by the number of non-gap units seen
//! before it, or by [`GAP_POSITION`] when the unit is a gap. Two alignments
//! place a column identically exactly when their encoded columns are equal.
//!
//! ```text
//! A C - G T      ->   0  1 -1  2  3
//! ATG --- GGT    ->   0 -1  1
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::{ConsposError, ConsposResult};
use crate::model::Alignment;

/// Encoded position of one residue unit.
pub type Position = i64;

/// Sentinel stored for gap units.
pub const GAP_POSITION: Position = -1;

/// Gap character used in alignments.
pub const GAP: u8 = b'-';

/// Encoded row: one position per unit.
pub type PositionArray = Vec<Position>;

/// Width of the atomic comparison unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitWidth {
    /// One character per unit (nucleotide or amino acid alignments)
    #[default]
    Residue,
    /// Three characters per unit (codon alignments)
    Codon,
}

impl UnitWidth {
    /// Number of characters in one unit.
    pub fn width(self) -> usize {
        match self {
            UnitWidth::Residue => 1,
            UnitWidth::Codon => 3,
        }
    }
}

impl fmt::Display for UnitWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitWidth::Residue => write!(f, "residue"),
            UnitWidth::Codon => write!(f, "codon"),
        }
    }
}

impl FromStr for UnitWidth {
    type Err = ConsposError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "residue" | "1" => Ok(UnitWidth::Residue),
            "codon" | "3" => Ok(UnitWidth::Codon),
            _ => Err(ConsposError::InvalidConfiguration(format!(
                "unknown unit width '{}' (expected 'residue' or 'codon')",
                s
            ))),
        }
    }
}

/// Splits a gapped sequence into units of the given width.
///
/// A trailing unit shorter than the width is kept as-is.
pub fn split_units(sequence: &str, unit: UnitWidth) -> std::slice::Chunks<'_, u8> {
    sequence.as_bytes().chunks(unit.width())
}

/// A unit is a gap unit when it consists only of gap characters.
pub fn is_gap_unit(unit: &[u8]) -> bool {
    !unit.is_empty() && unit.iter().all(|&b| b == GAP)
}

/// Encodes a row of residue units into positions.
///
/// Non-gap units receive 0, 1, 2, ... in column order; gap units receive
/// [`GAP_POSITION`]. The output has one entry per input unit.
pub fn encode<'a, I>(units: I) -> PositionArray
where
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut next: Position = 0;
    units
        .into_iter()
        .map(|unit| {
            if is_gap_unit(unit) {
                GAP_POSITION
            } else {
                let pos = next;
                next += 1;
                pos
            }
        })
        .collect()
}

/// Encodes a gapped sequence split at the given unit width.
pub fn encode_sequence(sequence: &str, unit: UnitWidth) -> PositionArray {
    encode(split_units(sequence, unit))
}

/// Position arrays of every sequence of one alignment.
///
/// Stored column-major so a whole column can be compared as one slice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionMatrix {
    names: Vec<String>,
    columns: usize,
    data: Vec<Position>,
}

impl PositionMatrix {
    /// Stacks named position arrays into a matrix.
    ///
    /// Fails with `ShapeMismatch` if the rows differ in length; no partial
    /// matrix is produced.
    pub fn new(label: &str, rows: Vec<(String, PositionArray)>) -> ConsposResult<Self> {
        let columns = rows.first().map(|(_, r)| r.len()).unwrap_or(0);
        if let Some((name, row)) = rows.iter().find(|(_, r)| r.len() != columns) {
            return Err(ConsposError::ShapeMismatch {
                label: label.to_string(),
                name: name.clone(),
                expected: columns,
                found: row.len(),
            });
        }

        let row_count = rows.len();
        let mut data = vec![GAP_POSITION; row_count * columns];
        for (r, (_, row)) in rows.iter().enumerate() {
            for (c, &pos) in row.iter().enumerate() {
                data[c * row_count + r] = pos;
            }
        }

        Ok(Self {
            names: rows.into_iter().map(|(name, _)| name).collect(),
            columns,
            data,
        })
    }

    /// Encodes an alignment, keeping its own row order.
    pub fn from_alignment(
        label: &str,
        alignment: &Alignment,
        unit: UnitWidth,
    ) -> ConsposResult<Self> {
        let order = alignment.names();
        Self::from_alignment_ordered(label, alignment, unit, &order)
    }

    /// Encodes an alignment with rows arranged in the given name order.
    ///
    /// The alignment must contain exactly the names in `order`, each once.
    pub fn from_alignment_ordered(
        label: &str,
        alignment: &Alignment,
        unit: UnitWidth,
        order: &[&str],
    ) -> ConsposResult<Self> {
        let mismatch = |detail: String| ConsposError::SequenceSetMismatch {
            label: label.to_string(),
            detail,
        };

        if let Some(name) = alignment.duplicate_name() {
            return Err(mismatch(format!("sequence '{}' appears more than once", name)));
        }
        if alignment.sequence_count() != order.len() {
            return Err(mismatch(format!(
                "{} sequences, expected {}",
                alignment.sequence_count(),
                order.len()
            )));
        }

        let mut records = Vec::with_capacity(order.len());
        for &name in order {
            let record = alignment
                .find(name)
                .ok_or_else(|| mismatch(format!("sequence '{}' is missing", name)))?;
            records.push(record);
        }

        // Raw lengths first: a codon split can hide a one-character difference
        let expected = alignment.alignment_length();
        if let Some(bad) = alignment.ragged_record() {
            return Err(ConsposError::ShapeMismatch {
                label: label.to_string(),
                name: bad.name.clone(),
                expected,
                found: bad.len(),
            });
        }
        if expected % unit.width() != 0 {
            if let Some(first) = records.first() {
                return Err(ConsposError::InvalidLength {
                    name: first.name.clone(),
                    length: expected,
                });
            }
        }

        let rows = records
            .into_iter()
            .map(|r| (r.name.clone(), encode_sequence(&r.sequence, unit)))
            .collect();
        Self::new(label, rows)
    }

    /// Number of sequences.
    pub fn row_count(&self) -> usize {
        self.names.len()
    }

    /// Number of units per row.
    pub fn column_count(&self) -> usize {
        self.columns
    }

    /// Sequence names in row order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// All positions at one column, in row order.
    pub fn column(&self, col: usize) -> &[Position] {
        let rows = self.row_count();
        &self.data[col * rows..(col + 1) * rows]
    }

    /// Position array of one row.
    pub fn row(&self, row: usize) -> PositionArray {
        (0..self.columns)
            .map(|c| self.data[c * self.row_count() + row])
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SequenceRecord;

    fn residue_units(s: &str) -> PositionArray {
        encode_sequence(s, UnitWidth::Residue)
    }

    #[test]
    fn test_encode_residues() {
        assert_eq!(residue_units("AC-GT"), vec![0, 1, -1, 2, 3]);
        assert_eq!(residue_units("--A"), vec![-1, -1, 0]);
        assert_eq!(residue_units(""), Vec::<Position>::new());
    }

    #[test]
    fn test_encode_all_gap_row() {
        assert_eq!(residue_units("----"), vec![-1, -1, -1, -1]);
    }

    #[test]
    fn test_encode_codons() {
        assert_eq!(encode_sequence("ATG---GGT", UnitWidth::Codon), vec![0, -1, 1]);
        // A partially gapped codon is still a residue
        assert_eq!(encode_sequence("A--GGT", UnitWidth::Codon), vec![0, 1]);
        // A trailing short unit is a gap only if all of it is gap
        assert_eq!(encode_sequence("ATG--", UnitWidth::Codon), vec![0, -1]);
        assert_eq!(encode_sequence("ATGA", UnitWidth::Codon), vec![0, 1]);
    }

    #[test]
    fn test_encoding_invariant() {
        for row in ["A-C--GT-", "--------", "ACGTACGT", "-A-A-A-A"] {
            let encoded = residue_units(row);
            let k = row.bytes().filter(|&b| b != GAP).count();
            assert_eq!(encoded.len(), row.len());
            assert_eq!(encoded.iter().filter(|&&p| p == GAP_POSITION).count(), row.len() - k);
            let values: Vec<Position> = encoded.into_iter().filter(|&p| p >= 0).collect();
            assert_eq!(values, (0..k as Position).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_unit_width_from_str() {
        assert_eq!("codon".parse::<UnitWidth>().unwrap(), UnitWidth::Codon);
        assert_eq!("Residue".parse::<UnitWidth>().unwrap(), UnitWidth::Residue);
        assert!(matches!(
            "triplet".parse::<UnitWidth>(),
            Err(ConsposError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_matrix_columns_and_rows() {
        let matrix = PositionMatrix::new(
            "test",
            vec![
                ("a".into(), vec![0, 1, -1, 2]),
                ("b".into(), vec![0, -1, 1, 2]),
            ],
        )
        .unwrap();
        assert_eq!(matrix.row_count(), 2);
        assert_eq!(matrix.column_count(), 4);
        assert_eq!(matrix.column(1), &[1, -1]);
        assert_eq!(matrix.column(3), &[2, 2]);
        assert_eq!(matrix.row(1), vec![0, -1, 1, 2]);
    }

    #[test]
    fn test_matrix_shape_mismatch() {
        let result = PositionMatrix::new(
            "global",
            vec![("a".into(), vec![0; 10]), ("b".into(), vec![0; 11])],
        );
        match result {
            Err(ConsposError::ShapeMismatch { label, name, expected, found }) => {
                assert_eq!(label, "global");
                assert_eq!(name, "b");
                assert_eq!(expected, 10);
                assert_eq!(found, 11);
            }
            other => panic!("expected ShapeMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_from_alignment_raw_length_mismatch() {
        // 10 and 11 characters both split into 4 codons
        let alignment = Alignment::new(vec![
            SequenceRecord::new("a", "ATGATGATGA"),
            SequenceRecord::new("b", "ATGATGATGAT"),
        ]);
        let result = PositionMatrix::from_alignment("local", &alignment, UnitWidth::Codon);
        assert!(matches!(result, Err(ConsposError::ShapeMismatch { found: 11, .. })));
    }

    #[test]
    fn test_codon_units_require_whole_codons() {
        let alignment = Alignment::new(vec![
            SequenceRecord::new("a", "ATGAAAGCTG"),
            SequenceRecord::new("b", "ATGAAAGC-G"),
        ]);
        let result = PositionMatrix::from_alignment("global", &alignment, UnitWidth::Codon);
        assert!(matches!(result, Err(ConsposError::InvalidLength { length: 10, .. })));

        // The same rows are fine when compared per character
        let matrix = PositionMatrix::from_alignment("global", &alignment, UnitWidth::Residue).unwrap();
        assert_eq!(matrix.column_count(), 10);
    }

    #[test]
    fn test_from_alignment_ordered_by_name() {
        let alignment = Alignment::new(vec![
            SequenceRecord::new("b", "A-C"),
            SequenceRecord::new("a", "AC-"),
        ]);
        let matrix =
            PositionMatrix::from_alignment_ordered("x", &alignment, UnitWidth::Residue, &["a", "b"])
                .unwrap();
        assert_eq!(matrix.names(), &["a".to_string(), "b".to_string()]);
        assert_eq!(matrix.row(0), vec![0, 1, -1]);
        assert_eq!(matrix.row(1), vec![0, -1, 1]);
    }

    #[test]
    fn test_from_alignment_sequence_set_mismatch() {
        let alignment = Alignment::new(vec![
            SequenceRecord::new("a", "AC"),
            SequenceRecord::new("c", "AC"),
        ]);
        let missing =
            PositionMatrix::from_alignment_ordered("x", &alignment, UnitWidth::Residue, &["a", "b"]);
        assert!(matches!(missing, Err(ConsposError::SequenceSetMismatch { .. })));

        let extra =
            PositionMatrix::from_alignment_ordered("x", &alignment, UnitWidth::Residue, &["a"]);
        assert!(matches!(extra, Err(ConsposError::SequenceSetMismatch { .. })));

        let duplicated = Alignment::new(vec![
            SequenceRecord::new("a", "AC"),
            SequenceRecord::new("a", "AC"),
        ]);
        let dup = PositionMatrix::from_alignment("x", &duplicated, UnitWidth::Residue);
        assert!(matches!(dup, Err(ConsposError::SequenceSetMismatch { .. })));
    }
}
