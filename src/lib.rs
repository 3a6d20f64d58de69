//! # globalign - Globally Consistent Image Alignment
//!
//! `globalign` turns noisy pairwise homographies between overlapping images
//! into one globally consistent absolute transform per image, the core
//! geometric step of image mosaicking. It builds a confidence-weighted graph
//! over the images, extracts its minimum spanning tree, chains relative
//! transforms along the tree for an initial solution, and refines all
//! transforms jointly with nonlinear least squares.
//!
//! ## Quick Start
//!
//! ```rust
//! use globalign::{
//!     Aligner, AlignmentSettings, ImageSet, LeastSquaresSolver, PairwiseRecord, PairwiseSet,
//!     TransformFamily,
//! };
//! use nalgebra::{Matrix3, Vector2};
//!
//! let images = ImageSet::from_names(["left.jpg", "right.jpg"]).unwrap();
//!
//! // Pairwise measurement: right.jpg sits 100 px to the right of left.jpg.
//! let relative = Matrix3::new(1.0, 0.0, 100.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0);
//! let correspondences: Vec<_> = [(0.0, 0.0), (50.0, 10.0), (20.0, 80.0), (90.0, 40.0)]
//!     .iter()
//!     .map(|&(x, y)| (Vector2::new(x + 100.0, y), Vector2::new(x, y)))
//!     .collect();
//! let count = correspondences.len();
//!
//! let mut pairwise = PairwiseSet::new();
//! pairwise
//!     .insert(PairwiseRecord {
//!         from: 0,
//!         to: 1,
//!         relative,
//!         correspondences,
//!         confidence: count as f64,
//!         inliers: vec![true; count],
//!     })
//!     .unwrap();
//!
//! let settings = AlignmentSettings {
//!     family: TransformFamily::Translation,
//!     ..Default::default()
//! };
//! let aligner = Aligner::new(settings, LeastSquaresSolver::new());
//! let absolute = aligner.align(&images, &pairwise, "left.jpg", None).unwrap();
//!
//! assert_eq!(absolute["left.jpg"], Matrix3::identity());
//! assert!((absolute["right.jpg"][(0, 2)] - 100.0).abs() < 1e-3);
//! ```
//!
//! ## Pipeline
//!
//! 1. [`PairwiseSet::edge_matrix`] turns pairwise confidences into a weighted
//!    graph over the images.
//! 2. [`WeightedGraph::minimum_spanning_tree`] keeps the most reliable
//!    pairwise measurements.
//! 3. [`propagate_absolute`] chains relative transforms from the reference
//!    image outward along the tree.
//! 4. A [`SolverBackend`] refines every transform jointly: the in-process
//!    [`LeastSquaresSolver`] by default, or [`ExternalSolver`] to delegate
//!    the problem to a separate optimizer binary.
//!
//! Progress can be observed through [`AlignmentObserver`]; the crate itself
//! logs through the [`log`] facade and never prints.

pub mod align;
pub mod error;
pub mod family;
pub mod graph;
pub mod images;
pub mod observer;
pub mod pairwise;
pub mod propagate;
pub mod residual;
pub mod solvers;
pub mod types;

pub use align::{Aligner, AlignmentSettings};
pub use error::{AlignError, Result};
pub use family::TransformFamily;
pub use graph::WeightedGraph;
pub use images::ImageSet;
pub use observer::{AlignmentEvent, AlignmentObserver, LogObserver, NullObserver};
pub use pairwise::{PairwiseRecord, PairwiseSet};
pub use propagate::propagate_absolute;
pub use residual::ResidualModel;
pub use solvers::{ExternalSolver, LeastSquaresSolver, RefineProblem, SolverBackend};
pub use types::AbsoluteHomographies;
