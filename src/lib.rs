//! # conspos - Consistent alignment positions
//!
//! Aligns the same sequences with several strategies (global, local,
//! affine-gap), compares how each alignment positions the residues, and
//! appends a marker row to the reference alignment flagging the columns on
//! which the alignments agree.
//!
//! ## Architecture
//!
//! - `model`: sequence records and alignments
//! - `fasta`: FASTA reading and writing
//! - `genetic_code`: stop codon removal and translation
//! - `position`: position encoding of alignment rows
//! - `consistency`: cross-alignment column comparison
//! - `codon_align`: codon alignment from an amino acid alignment
//! - `marker`: merging and writing the marker record
//! - `aligner`: external aligner (MAFFT) invocation
//! - `config`: run configuration
//! - `pipeline`: orchestration of the above

pub mod aligner;
pub mod codon_align;
pub mod config;
pub mod consistency;
pub mod error;
pub mod fasta;
pub mod genetic_code;
pub mod marker;
pub mod model;
pub mod pipeline;
pub mod position;

pub use error::{ConsposError, ConsposResult};
