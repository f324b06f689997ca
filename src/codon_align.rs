//! Codon alignment from an amino acid alignment.
//!
//! Each aligned amino acid is replaced by the codon it was translated from,
//! and each gap by a gap codon, giving a nucleotide alignment three times as
//! wide as the protein alignment.
//!
//! Records are paired by position: the i-th nucleotide record belongs to the
//! i-th amino acid record. A trailing 1-2 nucleotides that do not form a full
//! codon are ignored, which can silently hide truncated input.

use log::warn;

use crate::error::{ConsposError, ConsposResult};
use crate::genetic_code::codons;
use crate::model::SequenceRecord;
use crate::position::GAP;

/// Gap unit emitted for a gapped amino acid column.
pub const GAP_CODON: &str = "---";

/// Builds the codon-level row for one nucleotide / amino acid pair.
///
/// The output keeps the nucleotide record's name and description. Fails with
/// `CodonUnderflow` when the amino acid row has more residues than the
/// nucleotide sequence has codons.
pub fn map_codon_record(
    nucleotide: &SequenceRecord,
    amino_acids: &SequenceRecord,
) -> ConsposResult<SequenceRecord> {
    for record in [nucleotide, amino_acids] {
        if !record.sequence.is_ascii() {
            return Err(ConsposError::NonAsciiSequence {
                name: record.name.clone(),
            });
        }
    }

    let mut source = codons(&nucleotide.sequence);
    let mut used = 0;
    let mut out = String::with_capacity(amino_acids.len() * 3);

    for aa in amino_acids.as_bytes() {
        if *aa == GAP {
            out.push_str(GAP_CODON);
            continue;
        }
        match source.next() {
            Some(codon) => {
                out.push_str(codon);
                used += 1;
            }
            None => {
                let residues = amino_acids.as_bytes().iter().filter(|&&b| b != GAP).count();
                return Err(ConsposError::CodonUnderflow {
                    name: nucleotide.name.clone(),
                    codons: used,
                    residues,
                });
            }
        }
    }

    Ok(nucleotide.with_sequence(out))
}

/// Maps every amino acid alignment row back to codons.
pub fn map_codons(
    nucleotides: &[SequenceRecord],
    amino_acid_alignment: &[SequenceRecord],
) -> ConsposResult<Vec<SequenceRecord>> {
    if nucleotides.len() != amino_acid_alignment.len() {
        return Err(ConsposError::RecordCountMismatch {
            nucleotides: nucleotides.len(),
            amino_acids: amino_acid_alignment.len(),
        });
    }

    nucleotides
        .iter()
        .zip(amino_acid_alignment)
        .map(|(nt, aa)| {
            if nt.name != aa.name {
                warn!(
                    "Pairing nucleotide record '{}' with amino acid record '{}' by position",
                    nt.name, aa.name
                );
            }
            map_codon_record(nt, aa)
        })
        .collect()
}
