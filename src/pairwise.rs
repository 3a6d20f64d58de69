//! Pairwise alignment input data.
//!
//! Pairwise records are produced upstream (feature matching plus per-pair
//! homography estimation) and treated as read-only here. A record for the
//! ordered pair `(from, to)` carries the relative transform mapping `to`'s
//! coordinate frame into `from`'s, the matched point pairs, a confidence
//! weight (typically the inlier count) and the per-correspondence inlier
//! mask.

use std::collections::HashMap;

use nalgebra::{DMatrix, Matrix3, Vector2};

use crate::error::{AlignError, Result};

/// One directed pairwise measurement between two images.
#[derive(Debug, Clone)]
pub struct PairwiseRecord {
    /// Index of the first endpoint (the frame the relative transform maps into).
    pub from: usize,
    /// Index of the second endpoint.
    pub to: usize,
    /// Relative transform mapping `to`'s frame into `from`'s frame.
    pub relative: Matrix3<f64>,
    /// Matched point pairs: (point in `from`, point in `to`).
    pub correspondences: Vec<(Vector2<f64>, Vector2<f64>)>,
    /// Confidence weight used when building the graph, e.g. the inlier count.
    pub confidence: f64,
    /// Inlier flag per correspondence, aligned index-for-index.
    pub inliers: Vec<bool>,
}

/// Collection of pairwise records with stable (insertion-order) iteration.
///
/// The iteration order is what makes residual vectors and the external
/// solver's problem file reproducible, so it is part of this type's contract.
#[derive(Debug, Clone, Default)]
pub struct PairwiseSet {
    records: Vec<PairwiseRecord>,
    by_pair: HashMap<(usize, usize), usize>,
}

impl PairwiseSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, validating the correspondence/inlier-mask invariant and
    /// rejecting a second record for the same ordered pair.
    pub fn insert(&mut self, record: PairwiseRecord) -> Result<()> {
        if record.correspondences.len() != record.inliers.len() {
            return Err(AlignError::InlierMaskMismatch {
                from: record.from,
                to: record.to,
                correspondences: record.correspondences.len(),
                flags: record.inliers.len(),
            });
        }
        let key = (record.from, record.to);
        if self.by_pair.contains_key(&key) {
            return Err(AlignError::DuplicatePairwiseRecord {
                from: record.from,
                to: record.to,
            });
        }
        self.by_pair.insert(key, self.records.len());
        self.records.push(record);
        Ok(())
    }

    /// Look up the record for the ordered pair `(from, to)`.
    pub fn get(&self, from: usize, to: usize) -> Option<&PairwiseRecord> {
        self.by_pair.get(&(from, to)).map(|&i| &self.records[i])
    }

    /// Records in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PairwiseRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Build the N x N edge-weight matrix from record confidences.
    ///
    /// An entry of 0 means "no edge". Where both directions of a pair exist,
    /// both entries receive the maximum of the two confidences; a pair
    /// measured in only one direction stays a directed edge.
    ///
    /// All record endpoint indices must be below `node_count`.
    pub fn edge_matrix(&self, node_count: usize) -> DMatrix<f64> {
        let mut weights = DMatrix::zeros(node_count, node_count);
        for record in &self.records {
            weights[(record.from, record.to)] = record.confidence;
        }
        for record in &self.records {
            if self.by_pair.contains_key(&(record.to, record.from)) {
                let w = weights[(record.from, record.to)].max(weights[(record.to, record.from)]);
                weights[(record.from, record.to)] = w;
                weights[(record.to, record.from)] = w;
            }
        }
        weights
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(from: usize, to: usize, confidence: f64) -> PairwiseRecord {
        PairwiseRecord {
            from,
            to,
            relative: Matrix3::identity(),
            correspondences: vec![(Vector2::zeros(), Vector2::zeros())],
            confidence,
            inliers: vec![true],
        }
    }

    #[test]
    fn mask_length_must_match_correspondences() {
        let mut set = PairwiseSet::new();
        let mut bad = record(0, 1, 5.0);
        bad.inliers = vec![true, false];
        let err = set.insert(bad).unwrap_err();
        assert!(matches!(
            err,
            AlignError::InlierMaskMismatch {
                from: 0,
                to: 1,
                correspondences: 1,
                flags: 2,
            }
        ));
    }

    #[test]
    fn duplicate_ordered_pairs_are_rejected() {
        let mut set = PairwiseSet::new();
        set.insert(record(0, 1, 5.0)).unwrap();
        let err = set.insert(record(0, 1, 7.0)).unwrap_err();
        assert!(matches!(
            err,
            AlignError::DuplicatePairwiseRecord { from: 0, to: 1 }
        ));
        // The reverse direction is a different record.
        set.insert(record(1, 0, 7.0)).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut set = PairwiseSet::new();
        set.insert(record(2, 0, 1.0)).unwrap();
        set.insert(record(0, 1, 2.0)).unwrap();
        set.insert(record(1, 2, 3.0)).unwrap();
        let pairs: Vec<(usize, usize)> = set.iter().map(|r| (r.from, r.to)).collect();
        assert_eq!(pairs, vec![(2, 0), (0, 1), (1, 2)]);
    }

    #[test]
    fn edge_matrix_symmetrizes_to_the_maximum() {
        let mut set = PairwiseSet::new();
        set.insert(record(0, 1, 10.0)).unwrap();
        set.insert(record(1, 0, 25.0)).unwrap();
        set.insert(record(1, 2, 4.0)).unwrap();

        let weights = set.edge_matrix(3);
        assert_eq!(weights[(0, 1)], 25.0);
        assert_eq!(weights[(1, 0)], 25.0);
        // One-directional measurement stays directed.
        assert_eq!(weights[(1, 2)], 4.0);
        assert_eq!(weights[(2, 1)], 0.0);
        assert_eq!(weights[(0, 2)], 0.0);
    }
}
