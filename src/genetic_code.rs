//! Genetic code definitions and translation logic.
//!
//! This module provides:
//! - The standard genetic code (NCBI table 1) as a static lookup table
//! - Codon partitioning and stop codon removal
//! - Codon to amino acid translation

use thiserror::Error;

use crate::error::{ConsposError, ConsposResult};
use crate::model::SequenceRecord;

/// Standard genetic code in NCBI `ncbieaa` order (TCAG for each base).
const STANDARD_NCBIEAA: &[u8; 64] =
    b"FFLLSSSSYY**CC*WLLLLPPPPHHQQRRRRIIIMTTTTNNKKSSRRVVVVAAAADDEEGGGG";

/// Codons that terminate translation in the standard code.
pub const STOP_CODONS: [&str; 3] = ["TAA", "TAG", "TGA"];

/// Residue emitted for codons missing from the table (ambiguous bases).
pub const UNKNOWN_RESIDUE: char = 'X';

/// Errors raised while translating a nucleotide sequence.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TranslationError {
    #[error("Length of nucleotide sequence is not a multiple of 3: {0}")]
    InvalidLength(usize),

    #[error("Nucleotide sequence contains non-ASCII characters")]
    NonAscii,
}

/// Index of a nucleotide in TCAG order. `U` is read as `T`.
fn base_index(b: u8) -> Option<usize> {
    match b.to_ascii_uppercase() {
        b'T' | b'U' => Some(0),
        b'C' => Some(1),
        b'A' => Some(2),
        b'G' => Some(3),
        _ => None,
    }
}

/// Splits a nucleotide sequence into consecutive codons.
///
/// The iterator is lazy and finite: a trailing 1-2 nucleotides that do not
/// complete a codon are silently dropped. The sequence must be ASCII; the
/// fallible functions below check this before splitting.
pub fn codons(sequence: &str) -> impl Iterator<Item = &str> + '_ {
    let complete = sequence.len() - sequence.len() % 3;
    (0..complete)
        .step_by(3)
        .filter_map(move |i| sequence.get(i..i + 3))
}

/// Translates a single codon to an amino acid.
///
/// Codons that are not exactly three unambiguous nucleotides map to `X`.
pub fn translate_codon(codon: &str) -> char {
    let bytes = codon.as_bytes();
    if bytes.len() != 3 {
        return UNKNOWN_RESIDUE;
    }
    match (base_index(bytes[0]), base_index(bytes[1]), base_index(bytes[2])) {
        (Some(b1), Some(b2), Some(b3)) => STANDARD_NCBIEAA[b1 * 16 + b2 * 4 + b3] as char,
        _ => UNKNOWN_RESIDUE,
    }
}

/// Returns true if the codon is a stop codon (case-insensitive, `U` as `T`).
pub fn is_stop_codon(codon: &str) -> bool {
    if codon.len() != 3 {
        return false;
    }
    let normalized: String = codon
        .chars()
        .map(|c| match c.to_ascii_uppercase() {
            'U' => 'T',
            other => other,
        })
        .collect();
    STOP_CODONS.contains(&normalized.as_str())
}

/// Removes every stop codon, keeping the remaining codons in order.
///
/// Like `codons`, any trailing incomplete codon is dropped.
pub fn strip_stop_codons(sequence: &str) -> Result<String, TranslationError> {
    if !sequence.is_ascii() {
        return Err(TranslationError::NonAscii);
    }
    Ok(codons(sequence).filter(|c| !is_stop_codon(c)).collect())
}

/// Translates a nucleotide sequence whose length is a multiple of 3.
pub fn translate(sequence: &str) -> Result<String, TranslationError> {
    if !sequence.is_ascii() {
        return Err(TranslationError::NonAscii);
    }
    if sequence.len() % 3 != 0 {
        return Err(TranslationError::InvalidLength(sequence.len()));
    }
    Ok(codons(sequence).map(translate_codon).collect())
}

/// Translates a nucleotide record, keeping its name and description.
pub fn translate_record(record: &SequenceRecord) -> ConsposResult<SequenceRecord> {
    let protein = translate(&record.sequence).map_err(|e| record_error(record, e))?;
    Ok(record.with_sequence(protein))
}

/// Strips stop codons from a nucleotide record.
pub fn strip_stop_codons_record(record: &SequenceRecord) -> ConsposResult<SequenceRecord> {
    let stripped = strip_stop_codons(&record.sequence).map_err(|e| record_error(record, e))?;
    Ok(record.with_sequence(stripped))
}

fn record_error(record: &SequenceRecord, error: TranslationError) -> ConsposError {
    let name = record.name.clone();
    match error {
        TranslationError::InvalidLength(length) => ConsposError::InvalidLength { name, length },
        TranslationError::NonAscii => ConsposError::NonAsciiSequence { name },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_code_translation() {
        assert_eq!(translate_codon("ATG"), 'M'); // Start codon
        assert_eq!(translate_codon("TAA"), '*');
        assert_eq!(translate_codon("TAG"), '*');
        assert_eq!(translate_codon("TGA"), '*');
        assert_eq!(translate_codon("TTT"), 'F');
        assert_eq!(translate_codon("GGG"), 'G');
        assert_eq!(translate_codon("TGG"), 'W');
        assert_eq!(translate_codon("AAA"), 'K');
    }

    #[test]
    fn test_rna_and_case() {
        assert_eq!(translate_codon("AUG"), 'M');
        assert_eq!(translate_codon("atg"), 'M');
        assert_eq!(translate_codon("uUu"), 'F');
    }

    #[test]
    fn test_ambiguous_nucleotides() {
        assert_eq!(translate_codon("ATN"), 'X');
        assert_eq!(translate_codon("NNN"), 'X');
        assert_eq!(translate_codon("CTR"), 'X');
        assert_eq!(translate_codon("A-G"), 'X');
        assert_eq!(translate_codon("AT"), 'X');
    }

    #[test]
    fn test_codons_drop_trailing_partial() {
        let parts: Vec<&str> = codons("ATGGGTTA").collect();
        assert_eq!(parts, vec!["ATG", "GGT"]);
        assert_eq!(codons("AT").count(), 0);
    }

    #[test]
    fn test_translate_sequence() {
        assert_eq!(translate("ATGTTTTAG").unwrap(), "MF*");
        assert_eq!(translate("").unwrap(), "");
        assert_eq!(translate("ATGT"), Err(TranslationError::InvalidLength(4)));
    }

    #[test]
    fn test_strip_stop_codons() {
        assert_eq!(strip_stop_codons("ATGTAAGGTTGA").unwrap(), "ATGGGT");
        assert_eq!(strip_stop_codons("ATGuagGG").unwrap(), "ATG");
        // A stop-like triplet out of frame is kept
        assert_eq!(strip_stop_codons("ATAAGG").unwrap(), "ATAAGG");
    }

    #[test]
    fn test_strip_then_translate() {
        let stripped = strip_stop_codons("ATGTAA").unwrap();
        assert_eq!(translate(&stripped).unwrap(), "M");
    }

    #[test]
    fn test_non_ascii_rejected() {
        // 'é' is two bytes, so the whole string is 6 bytes long
        assert_eq!(translate("ATGAé"), Err(TranslationError::NonAscii));
        assert_eq!(strip_stop_codons("ATGAé"), Err(TranslationError::NonAscii));

        let rec = SequenceRecord::new("cds1", "ATGAé");
        assert!(matches!(
            strip_stop_codons_record(&rec),
            Err(ConsposError::NonAsciiSequence { name }) if name == "cds1"
        ));
        assert!(matches!(
            translate_record(&rec),
            Err(ConsposError::NonAsciiSequence { .. })
        ));
    }

    #[test]
    fn test_translate_record_reports_name() {
        let rec = SequenceRecord::with_description("cds1", Some("x".into()), "ATGA");
        match translate_record(&rec) {
            Err(ConsposError::InvalidLength { name, length }) => {
                assert_eq!(name, "cds1");
                assert_eq!(length, 4);
            }
            other => panic!("unexpected result: {:?}", other),
        }

        let rec = rec.with_sequence("ATGAAA");
        let protein = translate_record(&rec).unwrap();
        assert_eq!(protein.sequence, "MK");
        assert_eq!(protein.header(), "cds1 x");
    }
}
