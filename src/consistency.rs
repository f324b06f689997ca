//! Cross-alignment consistency engine.
//!
//! Given several alignments of the same sequence set, every alignment is
//! position-encoded (rows ordered by the reference's sequence names) and each
//! column is compared against the reference column. A column agrees only if
//! the whole encoded column is identical: same rows gapped, same positions.
//!
//! The marker is binary: a column is consistent when enough alignments agree
//! with the reference, inconsistent otherwise.

use std::collections::BTreeMap;
use std::fmt;

use log::debug;
use rayon::prelude::*;

use crate::error::{ConsposError, ConsposResult};
use crate::marker::MarkerSymbols;
use crate::model::Alignment;
use crate::position::{PositionMatrix, UnitWidth};

/// Default fraction of alignments that must agree (unanimity).
pub const DEFAULT_THRESHOLD: f64 = 1.0;

/// Per-column consistency of a reference alignment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsistencyMarker {
    states: Vec<bool>,
    agreement: Vec<usize>,
    compared: usize,
    unit: UnitWidth,
}

impl ConsistencyMarker {
    /// Number of marked columns (units).
    pub fn len(&self) -> usize {
        self.states.len()
    }

    /// Returns true if the reference alignment had no columns.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Consistency of each column.
    pub fn states(&self) -> &[bool] {
        &self.states
    }

    /// Whether a column is consistent.
    pub fn is_consistent(&self, col: usize) -> bool {
        self.states.get(col).copied().unwrap_or(false)
    }

    /// Number of alignments (reference included) agreeing at each column.
    pub fn agreement(&self) -> &[usize] {
        &self.agreement
    }

    /// Number of alignments compared.
    pub fn compared(&self) -> usize {
        self.compared
    }

    /// Number of consistent columns.
    pub fn consistent_columns(&self) -> usize {
        self.states.iter().filter(|&&s| s).count()
    }

    /// Unit width the marker was computed at.
    pub fn unit(&self) -> UnitWidth {
        self.unit
    }

    /// Renders the marker as a sequence row.
    ///
    /// Each column symbol is repeated to the unit width, so the row is as
    /// long as the reference alignment's sequences.
    pub fn render(&self, symbols: &MarkerSymbols) -> String {
        let width = self.unit.width();
        let mut out = String::with_capacity(self.states.len() * width);
        for &state in &self.states {
            let symbol = symbols.symbol(state);
            out.extend(std::iter::repeat(symbol).take(width));
        }
        out
    }
}

/// Checks that a threshold lies in (0, 1].
pub fn validate_threshold(threshold: f64) -> ConsposResult<()> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(ConsposError::InvalidConfiguration(format!(
            "threshold must be in (0, 1], got {}",
            threshold
        )))
    }
}

/// Whether `agreeing` out of `compared` alignments reaches the threshold.
///
/// `agreeing >= threshold * compared` always passes. Thresholds are read at
/// two-decimal precision, so a fraction within half a hundredth below the
/// threshold also passes (0.67 is met by two alignments out of three).
/// A threshold of 1.0 requires every alignment to agree.
fn meets_threshold(agreeing: usize, compared: usize, threshold: f64) -> bool {
    if threshold >= 1.0 {
        return agreeing == compared;
    }
    let agreeing = agreeing as f64;
    let compared = compared as f64;
    let exact = agreeing >= threshold * compared - 1e-9;
    exact || agreeing >= (threshold - 0.005) * compared - 1e-9
}

/// Compares position encodings of several alignments against a reference.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConsistencyEngine {
    threshold: f64,
    unit: UnitWidth,
}

impl ConsistencyEngine {
    /// Creates an engine, rejecting thresholds outside (0, 1].
    pub fn new(threshold: f64, unit: UnitWidth) -> ConsposResult<Self> {
        validate_threshold(threshold)?;
        Ok(Self { threshold, unit })
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    pub fn unit(&self) -> UnitWidth {
        self.unit
    }

    /// Computes the consistency marker of `reference` among `alignments`.
    ///
    /// Rows are matched by sequence name. Fails with `InvalidReference` if
    /// the reference label is absent, `SequenceSetMismatch` or
    /// `ShapeMismatch` for a malformed alignment, and `ColumnCountMismatch`
    /// if any alignment has a different number of columns than the reference.
    pub fn compute<L>(
        &self,
        alignments: &BTreeMap<L, Alignment>,
        reference: &L,
    ) -> ConsposResult<ConsistencyMarker>
    where
        L: Ord + fmt::Display + Sync,
    {
        let reference_alignment =
            alignments
                .get(reference)
                .ok_or_else(|| ConsposError::InvalidReference {
                    reference: reference.to_string(),
                    available: alignments
                        .keys()
                        .map(|k| k.to_string())
                        .collect::<Vec<_>>()
                        .join(", "),
                })?;
        let order = reference_alignment.names();

        // Matrices are independent; errors are reported in label order.
        let built: Vec<(&L, ConsposResult<PositionMatrix>)> = alignments
            .par_iter()
            .map(|(label, alignment)| {
                let matrix = PositionMatrix::from_alignment_ordered(
                    &label.to_string(),
                    alignment,
                    self.unit,
                    &order,
                );
                (label, matrix)
            })
            .collect();

        let mut matrices = Vec::with_capacity(built.len());
        for (label, matrix) in built {
            matrices.push((label, matrix?));
        }

        let reference_matrix = matrices
            .iter()
            .find(|(label, _)| *label == reference)
            .map(|(_, m)| m)
            .ok_or_else(|| ConsposError::InvalidReference {
                reference: reference.to_string(),
                available: String::new(),
            })?;
        let width = reference_matrix.column_count();

        for (label, matrix) in &matrices {
            if matrix.column_count() != width {
                return Err(ConsposError::ColumnCountMismatch {
                    label: label.to_string(),
                    reference: reference.to_string(),
                    expected: width,
                    found: matrix.column_count(),
                });
            }
        }

        let compared = matrices.len();
        let mut agreement = vec![0usize; width];
        for (label, matrix) in &matrices {
            let mut agreeing_columns = 0;
            for (col, count) in agreement.iter_mut().enumerate() {
                if matrix.column(col) == reference_matrix.column(col) {
                    *count += 1;
                    agreeing_columns += 1;
                }
            }
            debug!(
                "Alignment '{}' agrees with '{}' at {}/{} columns",
                label, reference, agreeing_columns, width
            );
        }

        let states = agreement
            .iter()
            .map(|&count| meets_threshold(count, compared, self.threshold))
            .collect();

        Ok(ConsistencyMarker {
            states,
            agreement,
            compared,
            unit: self.unit,
        })
    }
}

/// Computes a marker over single-character units.
pub fn compute_marker<L>(
    alignments: &BTreeMap<L, Alignment>,
    reference: &L,
    threshold: f64,
) -> ConsposResult<ConsistencyMarker>
where
    L: Ord + fmt::Display + Sync,
{
    ConsistencyEngine::new(threshold, UnitWidth::Residue)?.compute(alignments, reference)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SequenceRecord;

    fn alignment(rows: &[(&str, &str)]) -> Alignment {
        Alignment::new(
            rows.iter()
                .map(|(name, seq)| SequenceRecord::new(*name, *seq))
                .collect(),
        )
    }

    fn symbols() -> MarkerSymbols {
        MarkerSymbols::new('C', 'N').unwrap()
    }

    #[test]
    fn test_self_agreement() {
        let mut alignments = BTreeMap::new();
        alignments.insert("A", alignment(&[("s1", "AC-GT"), ("s2", "ACTG-")]));
        let marker = compute_marker(&alignments, &"A", 1.0).unwrap();
        assert_eq!(marker.len(), 5);
        assert_eq!(marker.render(&symbols()), "CCCCC");
        assert_eq!(marker.compared(), 1);
    }

    #[test]
    fn test_unanimity_detects_differing_column() {
        // Reference row positions [0,1,-1,2] vs [0,1,2,-1]
        let mut alignments = BTreeMap::new();
        alignments.insert("ref", alignment(&[("s1", "AC-G"), ("s2", "ACTG")]));
        alignments.insert("alt", alignment(&[("s1", "ACG-"), ("s2", "ACTG")]));
        let marker = compute_marker(&alignments, &"ref", 1.0).unwrap();
        assert_eq!(marker.render(&symbols()), "CCNN");
        assert_eq!(marker.agreement(), &[2, 2, 1, 1]);
        assert_eq!(marker.consistent_columns(), 2);
    }

    #[test]
    fn test_threshold_two_of_three() {
        let mut alignments = BTreeMap::new();
        // Column 1: ref and b agree, c differs. Column 2: only ref.
        alignments.insert("a", alignment(&[("s1", "A-CG"), ("s2", "AT-G")]));
        alignments.insert("b", alignment(&[("s1", "A-CG"), ("s2", "ATG-")]));
        alignments.insert("c", alignment(&[("s1", "AC-G"), ("s2", "A-TG")]));

        let marker = compute_marker(&alignments, &"a", 0.67).unwrap();
        assert_eq!(marker.agreement(), &[3, 2, 1, 1]);
        assert_eq!(marker.render(&symbols()), "CCNN");

        let strict = compute_marker(&alignments, &"a", 1.0).unwrap();
        assert_eq!(strict.render(&symbols()), "CNNN");

        let loose = compute_marker(&alignments, &"a", 0.3).unwrap();
        assert_eq!(loose.render(&symbols()), "CCCC");
    }

    #[test]
    fn test_rows_matched_by_name() {
        let mut alignments = BTreeMap::new();
        alignments.insert("a", alignment(&[("s1", "AC-G"), ("s2", "A-CG")]));
        // Same alignment with rows listed in a different order
        alignments.insert("b", alignment(&[("s2", "A-CG"), ("s1", "AC-G")]));
        let marker = compute_marker(&alignments, &"a", 1.0).unwrap();
        assert_eq!(marker.render(&symbols()), "CCCC");
    }

    #[test]
    fn test_invalid_reference() {
        let mut alignments = BTreeMap::new();
        alignments.insert("a", alignment(&[("s1", "AC")]));
        let result = compute_marker(&alignments, &"z", 1.0);
        assert!(matches!(result, Err(ConsposError::InvalidReference { .. })));
    }

    #[test]
    fn test_column_count_mismatch() {
        let mut alignments = BTreeMap::new();
        alignments.insert("a", alignment(&[("s1", "AC-"), ("s2", "ACG")]));
        alignments.insert("b", alignment(&[("s1", "A-C-"), ("s2", "ACG-")]));
        match compute_marker(&alignments, &"a", 1.0) {
            Err(ConsposError::ColumnCountMismatch { label, expected, found, .. }) => {
                assert_eq!(label, "b");
                assert_eq!(expected, 3);
                assert_eq!(found, 4);
            }
            other => panic!("expected ColumnCountMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_sequence_set_mismatch() {
        let mut alignments = BTreeMap::new();
        alignments.insert("a", alignment(&[("s1", "AC"), ("s2", "AC")]));
        alignments.insert("b", alignment(&[("s1", "AC"), ("s3", "AC")]));
        let result = compute_marker(&alignments, &"a", 1.0);
        assert!(matches!(result, Err(ConsposError::SequenceSetMismatch { .. })));
    }

    #[test]
    fn test_shape_mismatch_in_compared_alignment() {
        let mut alignments = BTreeMap::new();
        alignments.insert("a", alignment(&[("s1", "AC"), ("s2", "AC")]));
        alignments.insert("b", alignment(&[("s1", "AC"), ("s2", "ACG")]));
        let result = compute_marker(&alignments, &"a", 1.0);
        assert!(matches!(result, Err(ConsposError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(ConsistencyEngine::new(0.0, UnitWidth::Residue).is_err());
        assert!(ConsistencyEngine::new(1.5, UnitWidth::Residue).is_err());
        assert!(ConsistencyEngine::new(f64::NAN, UnitWidth::Residue).is_err());
        assert!(ConsistencyEngine::new(0.5, UnitWidth::Codon).is_ok());
    }

    #[test]
    fn test_codon_units_render_full_width() {
        let mut alignments = BTreeMap::new();
        alignments.insert("a", alignment(&[("s1", "ATG---GGT"), ("s2", "ATGCCCGGT")]));
        alignments.insert("b", alignment(&[("s1", "ATGGGT---"), ("s2", "ATGCCCGGT")]));
        let engine = ConsistencyEngine::new(1.0, UnitWidth::Codon).unwrap();
        let marker = engine.compute(&alignments, &"a").unwrap();
        assert_eq!(marker.len(), 3);
        assert_eq!(marker.render(&symbols()), "CCCNNNNNN");
    }

    #[test]
    fn test_meets_threshold() {
        assert!(meets_threshold(2, 3, 0.67));
        assert!(!meets_threshold(1, 3, 0.67));
        assert!(!meets_threshold(2, 3, 1.0));
        assert!(meets_threshold(3, 3, 1.0));
        assert!(meets_threshold(1, 2, 0.5));
        // Exact formula always passes
        assert!(meets_threshold(1, 3, 0.333));
        assert!(meets_threshold(3, 10, 0.3));
        // Unanimity is strict whatever the number of alignments
        assert!(!meets_threshold(199, 200, 1.0));
        assert!(!meets_threshold(999, 1000, 1.0));
        // Only half a hundredth of slack below the threshold
        assert!(!meets_threshold(66, 100, 0.67));
        assert!(meets_threshold(665, 1000, 0.67));
    }

    #[test]
    fn test_unanimity_with_many_alignments() {
        let mut alignments = BTreeMap::new();
        for i in 0..199 {
            alignments.insert(format!("aln{:03}", i), alignment(&[("s1", "AC-G"), ("s2", "ACTG")]));
        }
        alignments.insert("shifted".to_string(), alignment(&[("s1", "ACG-"), ("s2", "ACTG")]));

        let marker = compute_marker(&alignments, &"aln000".to_string(), 1.0).unwrap();
        assert_eq!(marker.compared(), 200);
        assert_eq!(marker.agreement(), &[200, 200, 199, 199]);
        assert_eq!(marker.render(&symbols()), "CCNN");
    }

    #[test]
    fn test_low_threshold_single_agreement() {
        let mut alignments = BTreeMap::new();
        alignments.insert("a", alignment(&[("s1", "A-CG"), ("s2", "AT-G")]));
        alignments.insert("b", alignment(&[("s1", "A-CG"), ("s2", "ATG-")]));
        alignments.insert("c", alignment(&[("s1", "AC-G"), ("s2", "ATG-")]));

        let marker = compute_marker(&alignments, &"a", 0.333).unwrap();
        assert_eq!(marker.agreement(), &[3, 2, 1, 1]);
        assert_eq!(marker.render(&symbols()), "CCCC");
    }
}
