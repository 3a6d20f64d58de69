//! Transform families and their constraint encoders.
//!
//! A 9-parameter block in the global parameter vector is unconstrained; the
//! family decides which of its entries are free and emits soft constraint
//! residuals pulling the remaining entries to their fixed values. Keeping
//! both operations on one enum gives a single encoder per family instead of
//! duplicated per-family branches in the residual assembly.

use nalgebra::Matrix3;

/// Family of planar transforms the global optimization may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformFamily {
    /// Pure translation: only the translation column varies.
    Translation,
    /// Uniform scale + rotation + translation.
    Similarity,
    /// General affine map, bottom row fixed to `[0, 0, 1]`.
    Affine,
    /// Full projective map, bottom-right entry fixed to 1.
    Homography,
}

impl TransformFamily {
    /// Decode a 9-parameter block into the family-constrained transform.
    ///
    /// Entries the family does not allow to vary are replaced by their fixed
    /// values; the constraint residuals below are what pull the raw block
    /// toward agreeing with this decoded form.
    pub fn constrain(&self, block: &Matrix3<f64>) -> Matrix3<f64> {
        let mut h = Matrix3::identity();
        match self {
            TransformFamily::Translation => {
                h[(0, 2)] = block[(0, 2)];
                h[(1, 2)] = block[(1, 2)];
            }
            TransformFamily::Similarity | TransformFamily::Affine => {
                for c in 0..3 {
                    h[(0, c)] = block[(0, c)];
                    h[(1, c)] = block[(1, c)];
                }
            }
            TransformFamily::Homography => {
                for c in 0..3 {
                    h[(0, c)] = block[(0, c)];
                    h[(1, c)] = block[(1, c)];
                }
                h[(2, 0)] = block[(2, 0)];
                h[(2, 1)] = block[(2, 1)];
            }
        }
        h
    }

    /// Append the family's constraint residuals for one endpoint block.
    ///
    /// The emission order is fixed; it is part of the reproducibility
    /// contract of the residual vector.
    pub fn constraint_residuals(&self, block: &Matrix3<f64>, out: &mut Vec<f64>) {
        match self {
            TransformFamily::Translation => {
                out.push(block[(0, 1)]);
                out.push(block[(1, 0)]);
                out.push(block[(2, 0)]);
                out.push(block[(2, 1)]);
                out.push(block[(0, 0)] - 1.0);
                out.push(block[(1, 1)] - 1.0);
                out.push(block[(2, 2)] - 1.0);
            }
            TransformFamily::Similarity => {
                out.push(block[(2, 0)]);
                out.push(block[(2, 1)]);
                out.push(block[(2, 2)] - 1.0);
                // Conformal 2x2 sub-block: equal diagonal, opposed off-diagonal.
                out.push(block[(0, 0)] - block[(1, 1)]);
                out.push(block[(0, 1)] + block[(1, 0)]);
            }
            TransformFamily::Affine => {
                out.push(block[(2, 0)]);
                out.push(block[(2, 1)]);
                out.push(block[(2, 2)] - 1.0);
            }
            TransformFamily::Homography => {
                out.push(block[(2, 2)] - 1.0);
            }
        }
    }

    /// Append the gauge residuals anchoring the reference image's block to
    /// the identity: six off-diagonal entries, then the diagonal minus one.
    ///
    /// This removes the global scale/rotation/translation/perspective
    /// freedom the pairwise data cannot determine.
    pub fn gauge_residuals(&self, block: &Matrix3<f64>, out: &mut Vec<f64>) {
        out.push(block[(0, 1)]);
        out.push(block[(0, 2)]);
        out.push(block[(1, 0)]);
        out.push(block[(1, 2)]);
        out.push(block[(2, 0)]);
        out.push(block[(2, 1)]);
        out.push(block[(0, 0)] - 1.0);
        out.push(block[(1, 1)] - 1.0);
        out.push(block[(2, 2)] - 1.0);
    }
}
