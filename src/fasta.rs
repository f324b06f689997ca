//! FASTA reader and writer.
//!
//! This module handles reading and writing FASTA format files.
//! It supports both single-line and multi-line sequences on input and
//! always writes one sequence line per record.
//!
//! ## FASTA Format
//!
//! ```text
//! >sequence_identifier optional description
//! ACGTACGTACGT...
//! >another_sequence
//! TGCATGCATGCA...
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use log::warn;
use thiserror::Error;

use crate::model::{Alignment, SequenceRecord};

/// Errors that can occur during FASTA parsing.
#[derive(Error, Debug)]
pub enum FastaError {
    #[error("Failed to access file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Empty FASTA file")]
    EmptyFile,

    #[error("Invalid FASTA format: {0}")]
    InvalidFormat(String),

    #[error("Sequence without header at line {0}")]
    SequenceWithoutHeader(usize),
}

/// Result type for FASTA operations.
pub type FastaResult<T> = Result<T, FastaError>;

/// Parses a FASTA file and returns its records in file order.
///
/// # Examples
///
/// ```no_run
/// use conspos::fasta::parse_fasta_file;
///
/// let records = parse_fasta_file("sequences.fasta").unwrap();
/// println!("Loaded {} sequences", records.len());
/// ```
pub fn parse_fasta_file<P: AsRef<Path>>(path: P) -> FastaResult<Vec<SequenceRecord>> {
    let file = File::open(path)?;
    parse_fasta(BufReader::new(file))
}

/// Parses a FASTA file into an `Alignment`.
pub fn read_alignment<P: AsRef<Path>>(path: P) -> FastaResult<Alignment> {
    parse_fasta_file(path).map(Alignment::new)
}

/// Splits a header line (without '>') into identifier and description.
fn split_header(header: &str) -> (&str, Option<String>) {
    let header = header.trim();
    match header.split_once(char::is_whitespace) {
        Some((id, rest)) => {
            let rest = rest.trim();
            (id, (!rest.is_empty()).then(|| rest.to_string()))
        }
        None => (header, None),
    }
}

/// Parses FASTA content from a reader.
///
/// This function handles both single-line and multi-line sequences.
/// Records without any sequence data are skipped.
pub fn parse_fasta<R: BufRead>(reader: R) -> FastaResult<Vec<SequenceRecord>> {
    let mut records = Vec::new();
    let mut current: Option<(String, Option<String>)> = None;
    let mut current_seq = String::new();
    let mut line_number = 0;

    for line_result in reader.lines() {
        line_number += 1;
        let line = line_result?;
        let line = line.trim();

        // Skip empty lines
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix('>') {
            // Save previous record if exists
            if let Some((id, desc)) = current.take() {
                push_record(&mut records, id, desc, std::mem::take(&mut current_seq));
            }

            let (id, desc) = split_header(header);
            if id.is_empty() {
                return Err(FastaError::InvalidFormat(format!(
                    "Empty sequence identifier at line {}",
                    line_number
                )));
            }

            current = Some((id.to_string(), desc));
            current_seq.clear();
        } else {
            // Sequence line
            if current.is_none() {
                return Err(FastaError::SequenceWithoutHeader(line_number));
            }
            if !line.is_ascii() {
                return Err(FastaError::InvalidFormat(format!(
                    "Non-ASCII character in sequence at line {}",
                    line_number
                )));
            }

            if line.bytes().all(|b| !b.is_ascii_whitespace()) {
                current_seq.push_str(line);
            } else {
                current_seq.extend(line.chars().filter(|c| !c.is_whitespace()));
            }
        }
    }

    // Don't forget the last record
    if let Some((id, desc)) = current {
        push_record(&mut records, id, desc, current_seq);
    }

    if records.is_empty() {
        return Err(FastaError::EmptyFile);
    }

    Ok(records)
}

fn push_record(
    records: &mut Vec<SequenceRecord>,
    id: String,
    desc: Option<String>,
    sequence: String,
) {
    if sequence.is_empty() {
        warn!("Skipping FASTA record '{}' without sequence data", id);
        return;
    }
    records.push(SequenceRecord::with_description(id, desc, sequence));
}

/// Parses FASTA content from a string.
///
/// Useful for testing or processing in-memory data.
pub fn parse_fasta_str(content: &str) -> FastaResult<Vec<SequenceRecord>> {
    parse_fasta(content.as_bytes())
}

/// Writes records as FASTA, one sequence line per record.
pub fn write_fasta<'a, W, I>(writer: &mut W, records: I) -> std::io::Result<usize>
where
    W: Write,
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let mut count = 0;
    for record in records {
        writeln!(writer, ">{}", record.header())?;
        writeln!(writer, "{}", record.sequence)?;
        count += 1;
    }
    Ok(count)
}

/// Writes records to a FASTA file, replacing any existing content.
pub fn write_fasta_file<'a, P, I>(path: P, records: I) -> FastaResult<usize>
where
    P: AsRef<Path>,
    I: IntoIterator<Item = &'a SequenceRecord>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    let count = write_fasta(&mut writer, records)?;
    writer.flush()?;
    Ok(count)
}
