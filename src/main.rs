//! conspos - mark consistently aligned columns
//!
//! ## Usage
//!
//! ```bash
//! conspos run genes.fna -o genes.conspos.fna            # CDS, MAFFT in 3 styles
//! conspos run introns.fa -o out.fa --kind noncoding
//! conspos mark -a global=g.aln -a local=l.aln -a affine-gap=e.aln -o out.fa
//! ```
//!
//! The marker record (`conspos_marker` by default) holds `C` for columns on
//! which every alignment agrees with the reference and `N` elsewhere.

// Use jemalloc for better memory management (returns memory to OS)
#[cfg(not(windows))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::LevelFilter;

use conspos::aligner::{AlignmentStyle, MafftAligner};
use conspos::config::ConsposConfig;
use conspos::marker::{MarkerLocation, MarkerSymbols, DEFAULT_MARKER_NAME};
use conspos::pipeline::{mark_alignments, Pipeline, SequenceKind};
use conspos::position::UnitWidth;

/// Alignment style for command line
#[derive(Debug, Clone, Copy, ValueEnum)]
enum StyleArg {
    /// MAFFT G-INS-i
    Global,
    /// MAFFT L-INS-i
    Local,
    /// MAFFT E-INS-i
    AffineGap,
}

impl From<StyleArg> for AlignmentStyle {
    fn from(arg: StyleArg) -> Self {
        match arg {
            StyleArg::Global => AlignmentStyle::Global,
            StyleArg::Local => AlignmentStyle::Local,
            StyleArg::AffineGap => AlignmentStyle::AffineGap,
        }
    }
}

/// Marker record position
#[derive(Debug, Clone, Copy, ValueEnum)]
enum LocationArg {
    /// Before the alignment records
    Start,
    /// After the alignment records
    End,
}

impl From<LocationArg> for MarkerLocation {
    fn from(arg: LocationArg) -> Self {
        match arg {
            LocationArg::Start => MarkerLocation::Start,
            LocationArg::End => MarkerLocation::End,
        }
    }
}

/// Comparison unit
#[derive(Debug, Clone, Copy, ValueEnum)]
enum UnitArg {
    /// One alignment character
    Residue,
    /// Three alignment characters
    Codon,
}

impl From<UnitArg> for UnitWidth {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Residue => UnitWidth::Residue,
            UnitArg::Codon => UnitWidth::Codon,
        }
    }
}

/// Input sequence kind
#[derive(Debug, Clone, Copy, ValueEnum)]
enum KindArg {
    /// Protein-coding sequences, aligned via their translation
    Coding,
    /// Sequences aligned as nucleotides (e.g. introns)
    Noncoding,
}

impl From<KindArg> for SequenceKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Coding => SequenceKind::Coding,
            KindArg::Noncoding => SequenceKind::Noncoding,
        }
    }
}

/// Options shaping the marker
#[derive(Args, Debug)]
struct MarkerArgs {
    /// Alignment used as positional template and written to the output
    #[arg(short = 'r', long = "reference", value_enum, default_value = "affine-gap")]
    reference: StyleArg,

    /// Fraction of alignments that must agree for a consistent column, in (0, 1]
    #[arg(short = 't', long = "threshold", default_value = "1.0")]
    threshold: f64,

    /// Symbol for consistent columns
    #[arg(long = "consistent", default_value = "C")]
    consistent: char,

    /// Symbol for inconsistent columns
    #[arg(long = "inconsistent", default_value = "N")]
    inconsistent: char,

    /// Name of the marker record
    #[arg(long = "marker-name", default_value = DEFAULT_MARKER_NAME)]
    marker_name: String,

    /// Place the marker record at the start or end of the output
    #[arg(long = "marker-location", value_enum, default_value = "start")]
    marker_location: LocationArg,

    /// Unit compared per column
    #[arg(short = 'u', long = "unit", value_enum, default_value = "residue")]
    unit: UnitArg,
}

impl MarkerArgs {
    fn to_config(&self) -> Result<ConsposConfig> {
        let config = ConsposConfig {
            reference: self.reference.into(),
            threshold: self.threshold,
            symbols: MarkerSymbols::new(self.consistent, self.inconsistent)?,
            marker_name: self.marker_name.clone(),
            marker_location: self.marker_location.into(),
            unit: self.unit.into(),
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Align a FASTA file in all three styles and mark the reference alignment
    Run {
        /// Input FASTA file (CDS or non-coding sequences)
        input: PathBuf,

        /// Output FASTA file
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        /// Kind of input sequences
        #[arg(short = 'k', long = "kind", value_enum, default_value = "coding")]
        kind: KindArg,

        /// MAFFT executable
        #[arg(long = "mafft", default_value = MafftAligner::DEFAULT_PROGRAM)]
        mafft: PathBuf,

        /// MAFFT --maxiterate value
        #[arg(long = "max-iterate", default_value_t = MafftAligner::DEFAULT_MAX_ITERATE)]
        max_iterate: u32,

        /// Directory for intermediate files (default: next to the input)
        #[arg(short = 'w', long = "work-dir")]
        work_dir: Option<PathBuf>,

        #[command(flatten)]
        marker: MarkerArgs,
    },

    /// Mark existing alignments of the same sequences
    Mark {
        /// Alignment as STYLE=PATH (style: global, local, affine-gap); repeatable
        #[arg(short = 'a', long = "alignment", required = true, value_parser = parse_alignment_arg)]
        alignments: Vec<(AlignmentStyle, PathBuf)>,

        /// Output FASTA file
        #[arg(short = 'o', long = "output")]
        output: PathBuf,

        #[command(flatten)]
        marker: MarkerArgs,
    },
}

/// conspos - mark alignment columns on which several alignment methods agree
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Only log errors
    #[arg(short = 'q', long = "quiet", global = true)]
    quiet: bool,
}

fn parse_alignment_arg(s: &str) -> Result<(AlignmentStyle, PathBuf), String> {
    let (style, path) = s
        .split_once('=')
        .ok_or_else(|| format!("expected STYLE=PATH, got '{}'", s))?;
    let style = style.parse::<AlignmentStyle>().map_err(|e| e.to_string())?;
    if path.is_empty() {
        return Err(format!("missing path for {} alignment", style));
    }
    Ok((style, PathBuf::from(path)))
}

fn setup_logging(verbose: u8, quiet: bool) {
    let level = if quiet {
        LevelFilter::Error
    } else {
        match verbose {
            0 => LevelFilter::Warn,
            1 => LevelFilter::Info,
            2 => LevelFilter::Debug,
            _ => LevelFilter::Trace,
        }
    };

    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_secs()
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    setup_logging(cli.verbose, cli.quiet);

    match cli.command {
        Command::Run {
            input,
            output,
            kind,
            mafft,
            max_iterate,
            work_dir,
            marker,
        } => {
            let config = marker.to_config()?;
            if max_iterate == 0 {
                anyhow::bail!("--max-iterate must be at least 1");
            }

            let aligner = MafftAligner::new(mafft, max_iterate);
            let mut pipeline = Pipeline::new(&aligner, &config).kind(kind.into());
            if let Some(dir) = work_dir {
                pipeline = pipeline.work_dir(dir);
            }
            let report = pipeline
                .run(&input, &output)
                .with_context(|| format!("conspos failed for {}", input.display()))?;
            eprintln!("{}", report);
        }
        Command::Mark {
            alignments,
            output,
            marker,
        } => {
            let config = marker.to_config()?;
            let mut paths = BTreeMap::new();
            for (style, path) in alignments {
                if paths.insert(style, path).is_some() {
                    anyhow::bail!("{} alignment given more than once", style);
                }
            }

            let report = mark_alignments(&paths, &config, &output)?;
            eprintln!("{}", report);
        }
    }

    Ok(())
}
