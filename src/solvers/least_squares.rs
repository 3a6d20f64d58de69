//! In-process Levenberg-Marquardt refinement backend.

use levenberg_marquardt::{LeastSquaresProblem, LevenbergMarquardt};
use nalgebra::{DMatrix, DVector, Dynamic, U1, VecStorage};

use crate::error::{AlignError, Result};
use crate::residual::ResidualModel;
use crate::types::{flatten_absolute, matrix_from_row_major, AbsoluteHomographies};

use super::{RefineProblem, SolverBackend};

/// Numerical-differentiation step scale for the Jacobian.
const JACOBIAN_STEP: f64 = 1e-6;

/// Refines the alignment in-process with the `levenberg-marquardt` crate.
///
/// The Jacobian is evaluated by forward differences; with 9 parameters per
/// image this stays practical into the low hundreds of images.
#[derive(Debug, Clone, Copy)]
pub struct LeastSquaresSolver {
    patience: usize,
}

impl LeastSquaresSolver {
    pub fn new() -> Self {
        Self { patience: 10 }
    }

    /// Number of non-improving iterations tolerated before giving up.
    pub fn with_patience(mut self, patience: usize) -> Self {
        self.patience = patience;
        self
    }
}

impl Default for LeastSquaresSolver {
    fn default() -> Self {
        Self::new()
    }
}

impl SolverBackend for LeastSquaresSolver {
    fn name(&self) -> &'static str {
        "levenberg-marquardt"
    }

    fn refine(&self, problem: &RefineProblem<'_>) -> Result<AbsoluteHomographies> {
        let reference = problem
            .images
            .index_of(problem.reference)
            .ok_or_else(|| AlignError::UnknownImage {
                image: problem.reference.to_string(),
            })?;

        let model = ResidualModel::new(
            problem.images.len(),
            problem.pairwise,
            problem.family,
            reference,
            problem.inlier_cap,
        );
        let params = flatten_absolute(problem.images, problem.initial)?;
        let before = model.mean_abs_residual(&params);

        let lm_problem = AlignmentProblem { model, params };
        let (solved, report) = LevenbergMarquardt::new()
            .with_patience(self.patience)
            .minimize(lm_problem);
        log::info!("levenberg-marquardt terminated: {report:?}");
        log::info!(
            "mean |residual| {before:.6e} -> {:.6e}",
            solved.model.mean_abs_residual(&solved.params)
        );

        let mut refined = AbsoluteHomographies::new();
        for (i, name) in problem.images.names().iter().enumerate() {
            let row_major: Vec<f64> = (0..9).map(|k| solved.params[9 * i + k]).collect();
            refined.insert(name.clone(), matrix_from_row_major(&row_major));
        }
        Ok(refined)
    }
}

/// Adapter exposing a [`ResidualModel`] to the `levenberg-marquardt` solver.
struct AlignmentProblem<'a> {
    model: ResidualModel<'a>,
    params: DVector<f64>,
}

impl<'a> LeastSquaresProblem<f64, Dynamic, Dynamic> for AlignmentProblem<'a> {
    type ResidualStorage = VecStorage<f64, Dynamic, U1>;
    type JacobianStorage = VecStorage<f64, Dynamic, Dynamic>;
    type ParameterStorage = VecStorage<f64, Dynamic, U1>;

    fn set_params(&mut self, x: &DVector<f64>) {
        self.params = x.clone();
    }

    fn params(&self) -> DVector<f64> {
        self.params.clone()
    }

    fn residuals(&self) -> Option<DVector<f64>> {
        Some(DVector::from_vec(self.model.residuals(&self.params)))
    }

    fn jacobian(&self) -> Option<DMatrix<f64>> {
        let base = self.model.residuals(&self.params);
        let rows = base.len();
        let cols = self.params.len();
        let mut jacobian = DMatrix::zeros(rows, cols);

        for j in 0..cols {
            let step = JACOBIAN_STEP * self.params[j].abs().max(1.0);
            let mut perturbed = self.params.clone();
            perturbed[j] += step;
            let shifted = self.model.residuals(&perturbed);
            // A parameter step that makes a pair transform singular changes
            // the residual layout; no consistent Jacobian exists there.
            if shifted.len() != rows {
                return None;
            }
            for i in 0..rows {
                jacobian[(i, j)] = (shifted[i] - base[i]) / step;
            }
        }
        Some(jacobian)
    }
}
