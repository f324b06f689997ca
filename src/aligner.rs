//! External multiple sequence aligner.
//!
//! The alignments themselves are produced by MAFFT in three styles:
//! - global (G-INS-i, `--globalpair`)
//! - local (L-INS-i, `--localpair`)
//! - affine-gap (E-INS-i, `--genafpair`)
//!
//! The `Aligner` trait is the seam used by the pipeline, so another program
//! (or a test double) can stand in for MAFFT.

use std::fmt;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use log::{debug, info};

use crate::error::{ConsposError, ConsposResult};

/// Alignment strategy requested from the external aligner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AlignmentStyle {
    Global,
    Local,
    AffineGap,
}

impl AlignmentStyle {
    /// All styles, in comparison order.
    pub const ALL: [AlignmentStyle; 3] = [
        AlignmentStyle::Global,
        AlignmentStyle::Local,
        AlignmentStyle::AffineGap,
    ];

    /// Label used in file names, logs and configuration.
    pub fn label(self) -> &'static str {
        match self {
            AlignmentStyle::Global => "global",
            AlignmentStyle::Local => "local",
            AlignmentStyle::AffineGap => "affine-gap",
        }
    }

    /// MAFFT option selecting this style.
    pub fn mafft_method(self) -> &'static str {
        match self {
            AlignmentStyle::Global => "--globalpair",
            AlignmentStyle::Local => "--localpair",
            AlignmentStyle::AffineGap => "--genafpair",
        }
    }
}

impl fmt::Display for AlignmentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl FromStr for AlignmentStyle {
    type Err = ConsposError;

    /// Accepts the style labels and the MAFFT preset names.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "global" | "ginsi" => Ok(AlignmentStyle::Global),
            "local" | "linsi" => Ok(AlignmentStyle::Local),
            "affine-gap" | "affine_gap" | "einsi" => Ok(AlignmentStyle::AffineGap),
            _ => Err(ConsposError::InvalidConfiguration(format!(
                "unknown alignment style '{}' (expected global, local or affine-gap)",
                s
            ))),
        }
    }
}

/// Produces a FASTA alignment from a FASTA input.
pub trait Aligner {
    /// Aligns `input` with the given style, writing the alignment to `output`.
    fn align(&self, input: &Path, style: AlignmentStyle, output: &Path) -> ConsposResult<()>;

    /// Program name used in logs and errors.
    fn name(&self) -> &str;
}

/// Runs the `mafft` executable.
#[derive(Debug, Clone)]
pub struct MafftAligner {
    program: PathBuf,
    max_iterate: u32,
}

impl MafftAligner {
    pub const DEFAULT_PROGRAM: &'static str = "mafft";
    pub const DEFAULT_MAX_ITERATE: u32 = 1000;

    pub fn new(program: impl Into<PathBuf>, max_iterate: u32) -> Self {
        Self {
            program: program.into(),
            max_iterate,
        }
    }

    /// Command line for one run (stdout is redirected by the caller).
    fn command(&self, input: &Path, style: AlignmentStyle) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.arg(style.mafft_method())
            .arg("--maxiterate")
            .arg(self.max_iterate.to_string())
            .arg(input);
        cmd
    }
}

impl Default for MafftAligner {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PROGRAM, Self::DEFAULT_MAX_ITERATE)
    }
}

impl Aligner for MafftAligner {
    fn align(&self, input: &Path, style: AlignmentStyle, output: &Path) -> ConsposResult<()> {
        let failure = |detail: String| ConsposError::AlignerFailed {
            program: self.name().to_string(),
            style: style.to_string(),
            detail,
        };

        let mut cmd = self.command(input, style);
        cmd.stdout(Stdio::from(File::create(output)?))
            .stderr(Stdio::piped());
        info!("Running {} ({}) on {}", self.name(), style, input.display());
        debug!("{:?}", cmd);

        let result = cmd
            .output()
            .map_err(|e| failure(format!("could not start {}: {}", self.program.display(), e)))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr);
            return Err(failure(format!(
                "exited with {}: {}",
                result.status,
                stderr.trim()
            )));
        }

        let written = std::fs::metadata(output).map(|m| m.len()).unwrap_or(0);
        if written == 0 {
            return Err(failure(format!("no alignment written to {}", output.display())));
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "mafft"
    }
}
