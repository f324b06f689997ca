//! Run configuration.
//!
//! Collects every setting that shapes the marker: which alignment is the
//! reference, how many alignments must agree, the marker symbols, and where
//! the marker record goes. `validate` runs before any file is touched.

use crate::aligner::AlignmentStyle;
use crate::consistency::{validate_threshold, ConsistencyEngine, DEFAULT_THRESHOLD};
use crate::error::{ConsposError, ConsposResult};
use crate::marker::{MarkerLocation, MarkerSymbols, DEFAULT_MARKER_NAME};
use crate::position::UnitWidth;

#[derive(Debug, Clone, PartialEq)]
pub struct ConsposConfig {
    /// Alignment used as positional template and written to the output
    pub reference: AlignmentStyle,
    /// Fraction of alignments that must agree, in (0, 1]
    pub threshold: f64,
    pub symbols: MarkerSymbols,
    pub marker_name: String,
    pub marker_location: MarkerLocation,
    /// Unit compared per column
    pub unit: UnitWidth,
}

impl Default for ConsposConfig {
    fn default() -> Self {
        Self {
            reference: AlignmentStyle::AffineGap,
            threshold: DEFAULT_THRESHOLD,
            symbols: MarkerSymbols::default(),
            marker_name: DEFAULT_MARKER_NAME.to_string(),
            marker_location: MarkerLocation::Start,
            unit: UnitWidth::Residue,
        }
    }
}

impl ConsposConfig {
    /// Checks the configuration as a whole.
    pub fn validate(&self) -> ConsposResult<()> {
        validate_threshold(self.threshold)?;
        if self.marker_name.is_empty() || self.marker_name.chars().any(char::is_whitespace) {
            return Err(ConsposError::InvalidConfiguration(format!(
                "marker name '{}' must be non-empty and contain no whitespace",
                self.marker_name
            )));
        }
        Ok(())
    }

    /// Engine configured with this threshold and unit width.
    pub fn engine(&self) -> ConsposResult<ConsistencyEngine> {
        ConsistencyEngine::new(self.threshold, self.unit)
    }
}
