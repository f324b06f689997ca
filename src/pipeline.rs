//! End-to-end consistency pipeline.
//!
//! For coding sequences (CDS):
//! 1. Remove stop codons                        -> `<input>.rmstop.fna`
//! 2. Translate to amino acids                  -> `<input>.trl.faa`
//! 3. Align the translation in each style       -> `<input>.<style>.cod.faa.aln`
//! 4. Map the protein alignment back to codons  -> `<input>.<style>.cod.fna.aln`
//!
//! Non-coding sequences (introns) are aligned directly
//! (`<input>.<style>.fna.aln`). The alignments are then compared and the
//! reference alignment is written with the marker record.

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::info;

use crate::aligner::{Aligner, AlignmentStyle};
use crate::codon_align::map_codons;
use crate::config::ConsposConfig;
use crate::error::{ConsposError, ConsposResult};
use crate::fasta::{parse_fasta_file, read_alignment, write_fasta_file};
use crate::genetic_code::{strip_stop_codons_record, translate_record};
use crate::marker::write_marked_alignment;
use crate::model::{Alignment, SequenceRecord};

/// What the input sequences are.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceKind {
    /// Protein-coding: aligned as amino acids, then mapped back to codons
    #[default]
    Coding,
    /// Aligned as nucleotides
    Noncoding,
}

impl fmt::Display for SequenceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SequenceKind::Coding => write!(f, "coding"),
            SequenceKind::Noncoding => write!(f, "noncoding"),
        }
    }
}

impl FromStr for SequenceKind {
    type Err = ConsposError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "coding" | "cds" => Ok(SequenceKind::Coding),
            "noncoding" | "intron" => Ok(SequenceKind::Noncoding),
            _ => Err(ConsposError::InvalidConfiguration(format!(
                "unknown sequence kind '{}' (expected coding or noncoding)",
                s
            ))),
        }
    }
}

/// Summary of a finished run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineReport {
    pub sequences: usize,
    /// Marked units (columns, or codon columns)
    pub columns: usize,
    pub consistent_columns: usize,
    pub output: PathBuf,
}

impl fmt::Display for PipelineReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} sequences, {}/{} consistent columns, written to {}",
            self.sequences,
            self.consistent_columns,
            self.columns,
            self.output.display()
        )
    }
}

/// Aligns one input in every style and writes the marked reference alignment.
pub struct Pipeline<'a, A: Aligner + ?Sized> {
    aligner: &'a A,
    config: &'a ConsposConfig,
    kind: SequenceKind,
    work_dir: Option<PathBuf>,
}

impl<'a, A: Aligner + ?Sized> Pipeline<'a, A> {
    pub fn new(aligner: &'a A, config: &'a ConsposConfig) -> Self {
        Self {
            aligner,
            config,
            kind: SequenceKind::default(),
            work_dir: None,
        }
    }

    pub fn kind(mut self, kind: SequenceKind) -> Self {
        self.kind = kind;
        self
    }

    /// Directory for intermediate files (defaults to the input's directory).
    pub fn work_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.work_dir = Some(dir.into());
        self
    }

    /// Runs the whole pipeline on `input`, writing the result to `output`.
    pub fn run(&self, input: &Path, output: &Path) -> ConsposResult<PipelineReport> {
        self.config.validate()?;
        let engine = self.config.engine()?;

        let alignments = match self.kind {
            SequenceKind::Coding => self.align_coding(input)?,
            SequenceKind::Noncoding => self.align_noncoding(input)?,
        };

        let marker = engine.compute(&alignments, &self.config.reference)?;
        let reference = &alignments[&self.config.reference];
        write_output(self.config, reference, &marker.render(&self.config.symbols), output)?;

        let report = PipelineReport {
            sequences: reference.sequence_count(),
            columns: marker.len(),
            consistent_columns: marker.consistent_columns(),
            output: output.to_path_buf(),
        };
        info!("{}", report);
        Ok(report)
    }

    /// Path of an intermediate file derived from the input name.
    fn intermediate(&self, input: &Path, suffix: &str) -> PathBuf {
        let dir = match &self.work_dir {
            Some(dir) => dir.clone(),
            None => input.parent().map(Path::to_path_buf).unwrap_or_default(),
        };
        let name = input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "input".to_string());
        dir.join(format!("{}.{}", name, suffix))
    }

    fn align_coding(&self, input: &Path) -> ConsposResult<BTreeMap<AlignmentStyle, Alignment>> {
        let records = parse_fasta_file(input)?;
        info!("Loaded {} coding sequences from {}", records.len(), input.display());

        let stripped = records
            .iter()
            .map(strip_stop_codons_record)
            .collect::<ConsposResult<Vec<_>>>()?;
        write_fasta_file(self.intermediate(input, "rmstop.fna"), &stripped)?;

        let proteins = stripped
            .iter()
            .map(translate_record)
            .collect::<ConsposResult<Vec<_>>>()?;
        let translation = self.intermediate(input, "trl.faa");
        write_fasta_file(&translation, &proteins)?;

        let mut alignments = BTreeMap::new();
        for style in AlignmentStyle::ALL {
            let protein_aln = self.intermediate(input, &format!("{}.cod.faa.aln", style));
            self.aligner.align(&translation, style, &protein_aln)?;

            let aligned = parse_fasta_file(&protein_aln)?;
            let codon = map_codons(&stripped, &aligned)?;
            write_fasta_file(
                self.intermediate(input, &format!("{}.cod.fna.aln", style)),
                &codon,
            )?;
            alignments.insert(style, Alignment::new(codon));
        }
        Ok(alignments)
    }

    fn align_noncoding(&self, input: &Path) -> ConsposResult<BTreeMap<AlignmentStyle, Alignment>> {
        let mut alignments = BTreeMap::new();
        for style in AlignmentStyle::ALL {
            let path = self.intermediate(input, &format!("{}.fna.aln", style));
            self.aligner.align(input, style, &path)?;
            alignments.insert(style, read_alignment(&path)?);
        }
        Ok(alignments)
    }
}

/// Marks pre-computed alignments and writes the reference with its marker.
///
/// The reference style must be one of the keys of `paths`; this is checked
/// before any file is read.
pub fn mark_alignments(
    paths: &BTreeMap<AlignmentStyle, PathBuf>,
    config: &ConsposConfig,
    output: &Path,
) -> ConsposResult<PipelineReport> {
    config.validate()?;
    let engine = config.engine()?;
    if !paths.contains_key(&config.reference) {
        return Err(ConsposError::InvalidReference {
            reference: config.reference.to_string(),
            available: paths
                .keys()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", "),
        });
    }

    let mut alignments = BTreeMap::new();
    for (&style, path) in paths {
        let alignment = read_alignment(path)?;
        info!(
            "Loaded {} alignment: {} sequences x {} columns",
            style,
            alignment.sequence_count(),
            alignment.alignment_length()
        );
        alignments.insert(style, alignment);
    }

    let marker = engine.compute(&alignments, &config.reference)?;
    let reference = &alignments[&config.reference];
    write_output(config, reference, &marker.render(&config.symbols), output)?;

    Ok(PipelineReport {
        sequences: reference.sequence_count(),
        columns: marker.len(),
        consistent_columns: marker.consistent_columns(),
        output: output.to_path_buf(),
    })
}

fn write_output(
    config: &ConsposConfig,
    reference: &Alignment,
    marker: &str,
    output: &Path,
) -> ConsposResult<()> {
    let record = SequenceRecord::new(config.marker_name.clone(), marker);
    write_marked_alignment(output, reference, record, config.marker_location)?;
    Ok(())
}
