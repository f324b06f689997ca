//! Error types for the consistency pipeline.
//!
//! None of these are recovered internally: each aborts the current unit of
//! work and carries enough context (alignment label, sequence name, column
//! counts) to diagnose the offending input.

use thiserror::Error;

use crate::fasta::FastaError;

/// Errors raised by position encoding, marker computation, codon mapping,
/// translation and the surrounding pipeline.
#[derive(Error, Debug)]
pub enum ConsposError {
    #[error("Alignment '{label}': sequence '{name}' has {found} columns, expected {expected}")]
    ShapeMismatch {
        label: String,
        name: String,
        expected: usize,
        found: usize,
    },

    #[error("Alignment '{label}' has {found} columns but reference '{reference}' has {expected}")]
    ColumnCountMismatch {
        label: String,
        reference: String,
        expected: usize,
        found: usize,
    },

    #[error("Reference alignment '{reference}' is not among the compared alignments ({available})")]
    InvalidReference { reference: String, available: String },

    #[error("Alignment '{label}' does not match the reference sequence set: {detail}")]
    SequenceSetMismatch { label: String, detail: String },

    #[error(
        "Sequence '{name}': amino acid alignment has {residues} residues \
         but the nucleotide sequence only provides {codons} codons"
    )]
    CodonUnderflow {
        name: String,
        codons: usize,
        residues: usize,
    },

    #[error("Sequence '{name}': length {length} is not a multiple of 3")]
    InvalidLength { name: String, length: usize },

    #[error("Sequence '{name}' contains non-ASCII characters")]
    NonAsciiSequence { name: String },

    #[error(
        "Cannot map codons: {nucleotides} nucleotide records \
         but {amino_acids} amino acid alignment records"
    )]
    RecordCountMismatch {
        nucleotides: usize,
        amino_acids: usize,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("{program} failed for {style} alignment: {detail}")]
    AlignerFailed {
        program: String,
        style: String,
        detail: String,
    },

    #[error("FASTA error: {0}")]
    Fasta(#[from] FastaError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for pipeline operations.
pub type ConsposResult<T> = Result<T, ConsposError>;
