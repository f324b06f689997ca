//! Data model for sequences and alignments.
//!
//! This module contains the record and alignment types shared by every
//! other module:
//! - `SequenceRecord`: one named, optionally described, gapped sequence
//! - `Alignment`: an ordered set of records with name lookup
//!
//! Records are immutable once built. Row correspondence between alignments
//! is always resolved by name (see `Alignment::find`), never by position.

use std::collections::HashMap;
use std::fmt;

/// Represents a single sequence with its identifier, description and data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceRecord {
    /// The sequence identifier (first token of the FASTA header, without '>')
    pub name: String,
    /// Remainder of the FASTA header after the identifier
    pub description: Option<String>,
    /// The sequence data (nucleotides, amino acids or codons, possibly gapped)
    pub sequence: String,
}

impl SequenceRecord {
    /// Creates a new record without description.
    pub fn new(name: impl Into<String>, sequence: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            sequence: sequence.into(),
        }
    }

    /// Creates a new record with an optional description.
    ///
    /// An empty or whitespace-only description is stored as `None`.
    pub fn with_description(
        name: impl Into<String>,
        description: Option<String>,
        sequence: impl Into<String>,
    ) -> Self {
        let description = description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        Self {
            name: name.into(),
            description,
            sequence: sequence.into(),
        }
    }

    /// Returns a copy of this record carrying a different sequence.
    pub fn with_sequence(&self, sequence: impl Into<String>) -> Self {
        Self {
            name: self.name.clone(),
            description: self.description.clone(),
            sequence: sequence.into(),
        }
    }

    /// Returns the length of the sequence.
    pub fn len(&self) -> usize {
        self.sequence.len()
    }

    /// Returns true if the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.sequence.is_empty()
    }

    /// Returns the sequence as bytes.
    pub fn as_bytes(&self) -> &[u8] {
        self.sequence.as_bytes()
    }

    /// FASTA header text (without '>'): name, then description if any.
    pub fn header(&self) -> String {
        match &self.description {
            Some(desc) => format!("{} {}", self.name, desc),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for SequenceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ">{}\n{}", self.header(), self.sequence)
    }
}

/// Represents an alignment of multiple sequences.
///
/// Rows of unequal length are accepted here; `ragged_record` reports the
/// first offender so callers can reject it with their own context.
#[derive(Debug, Clone)]
pub struct Alignment {
    /// All records in the alignment, in file order
    pub records: Vec<SequenceRecord>,
    /// Name -> row index (first occurrence wins)
    index: HashMap<String, usize>,
}

impl Alignment {
    /// Creates a new alignment from a vector of records.
    pub fn new(records: Vec<SequenceRecord>) -> Self {
        let mut index = HashMap::with_capacity(records.len());
        for (i, record) in records.iter().enumerate() {
            index.entry(record.name.clone()).or_insert(i);
        }
        Self { records, index }
    }

    /// Returns the number of sequences.
    pub fn sequence_count(&self) -> usize {
        self.records.len()
    }

    /// Returns the alignment length, taken from the first row (0 if empty).
    pub fn alignment_length(&self) -> usize {
        self.records.first().map(SequenceRecord::len).unwrap_or(0)
    }

    /// First record whose length differs from the first row's.
    pub fn ragged_record(&self) -> Option<&SequenceRecord> {
        let expected = self.alignment_length();
        self.records.iter().find(|r| r.len() != expected)
    }

    /// Gets a record by row index.
    pub fn get(&self, index: usize) -> Option<&SequenceRecord> {
        self.records.get(index)
    }

    /// Gets a record by sequence name.
    pub fn find(&self, name: &str) -> Option<&SequenceRecord> {
        self.index.get(name).map(|&i| &self.records[i])
    }

    /// Sequence names in row order.
    pub fn names(&self) -> Vec<&str> {
        self.records.iter().map(|r| r.name.as_str()).collect()
    }

    /// Returns the first name that appears more than once, if any.
    pub fn duplicate_name(&self) -> Option<&str> {
        if self.index.len() == self.records.len() {
            return None;
        }
        self.records
            .iter()
            .enumerate()
            .find(|(i, r)| self.index.get(&r.name) != Some(i))
            .map(|(_, r)| r.name.as_str())
    }

    /// Iterates over the records in row order.
    pub fn iter(&self) -> std::slice::Iter<'_, SequenceRecord> {
        self.records.iter()
    }

    /// Returns true if the alignment is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<SequenceRecord>> for Alignment {
    fn from(records: Vec<SequenceRecord>) -> Self {
        Self::new(records)
    }
}
