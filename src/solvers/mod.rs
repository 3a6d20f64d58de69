//! Solver backends for the global refinement stage.
//!
//! Refinement is pluggable: the in-process Levenberg-Marquardt backend is the
//! default, and an external-process backend delegates the same problem to a
//! separate optimizer binary via a text file. Both consume the same
//! [`RefineProblem`] and return refined absolute transforms.

use crate::error::Result;
use crate::family::TransformFamily;
use crate::images::ImageSet;
use crate::pairwise::PairwiseSet;
use crate::types::AbsoluteHomographies;

pub mod external;
pub mod least_squares;

pub use external::ExternalSolver;
pub use least_squares::LeastSquaresSolver;

/// Everything a backend needs to refine a set of absolute transforms.
pub struct RefineProblem<'a> {
    pub images: &'a ImageSet,
    pub pairwise: &'a PairwiseSet,
    /// Initial absolute transform per image, typically from tree propagation.
    pub initial: &'a AbsoluteHomographies,
    pub family: TransformFamily,
    /// Name of the image anchored to the identity.
    pub reference: &'a str,
    /// Maximum number of correspondences used per pair.
    pub inlier_cap: usize,
}

/// A global refinement strategy.
pub trait SolverBackend {
    /// Short backend name for logs and progress events.
    fn name(&self) -> &'static str;

    /// Refine the problem's initial transforms into globally consistent ones.
    fn refine(&self, problem: &RefineProblem<'_>) -> Result<AbsoluteHomographies>;
}
