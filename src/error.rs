//! Error types for the alignment core.

use thiserror::Error;

/// Alignment error type.
///
/// Only unrecoverable input or environment problems are modeled as errors.
/// A singular pairwise transform during residual evaluation is a tolerated
/// degeneracy (the pair's reprojection residuals are skipped), and an
/// optimizer that exhausts its iteration budget still returns its best
/// solution together with before/after residual diagnostics.
#[derive(Error, Debug)]
pub enum AlignError {
    #[error("duplicate image name: {image}")]
    DuplicateImage { image: String },

    #[error("unknown image: {image}")]
    UnknownImage { image: String },

    #[error(
        "pairwise record {from} -> {to} has {correspondences} correspondences \
         but {flags} inlier flags"
    )]
    InlierMaskMismatch {
        from: usize,
        to: usize,
        correspondences: usize,
        flags: usize,
    },

    #[error("pairwise record {from} -> {to} inserted twice")]
    DuplicatePairwiseRecord { from: usize, to: usize },

    #[error("image {image} is unreachable from the reference in the pairwise graph")]
    DisconnectedGraph { image: String },

    #[error("spanning tree uses edge {from} -> {to} but no pairwise record exists in that direction")]
    MissingPairwiseData { from: String, to: String },

    #[error("no absolute transform available for image {image}")]
    MissingAbsolute { image: String },

    #[error("external solver failed: {reason}")]
    ExternalSolver { reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AlignError>;
