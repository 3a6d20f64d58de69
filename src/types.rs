//! Shared types and small conversion helpers.
//!
//! The whole crate works on 3x3 homogeneous transforms. Parameter vectors
//! used by the optimizer store one 9-element block per image, holding the
//! row-major flattening of that image's absolute transform.

use std::collections::BTreeMap;

use nalgebra::{DVector, Matrix3};

use crate::error::{AlignError, Result};
use crate::images::ImageSet;

/// Map from image name to its absolute transform into the reference frame.
///
/// Refinement stages replace this map wholesale; entries are never mutated
/// in place.
pub type AbsoluteHomographies = BTreeMap<String, Matrix3<f64>>;

/// Row-major flattening of a 3x3 transform.
pub fn matrix_to_row_major(h: &Matrix3<f64>) -> [f64; 9] {
    [
        h[(0, 0)],
        h[(0, 1)],
        h[(0, 2)],
        h[(1, 0)],
        h[(1, 1)],
        h[(1, 2)],
        h[(2, 0)],
        h[(2, 1)],
        h[(2, 2)],
    ]
}

/// Rebuild a 3x3 transform from a row-major 9-element slice.
///
/// Panics if `values` holds fewer than nine elements.
pub fn matrix_from_row_major(values: &[f64]) -> Matrix3<f64> {
    Matrix3::new(
        values[0], values[1], values[2], values[3], values[4], values[5], values[6], values[7],
        values[8],
    )
}

/// Read image `index`'s 9-parameter block out of a flat parameter vector.
pub fn block(params: &DVector<f64>, index: usize) -> Matrix3<f64> {
    let base = 9 * index;
    Matrix3::new(
        params[base],
        params[base + 1],
        params[base + 2],
        params[base + 3],
        params[base + 4],
        params[base + 5],
        params[base + 6],
        params[base + 7],
        params[base + 8],
    )
}

/// Flatten an absolute-homography map into the global parameter vector,
/// one 9-element block per image in index order.
///
/// Every image of the set must have an entry; a missing image indicates an
/// upstream propagation bug and is surfaced as [`AlignError::MissingAbsolute`].
pub fn flatten_absolute(images: &ImageSet, absolute: &AbsoluteHomographies) -> Result<DVector<f64>> {
    let mut params = DVector::zeros(9 * images.len());
    for (i, name) in images.names().iter().enumerate() {
        let h = absolute
            .get(name)
            .ok_or_else(|| AlignError::MissingAbsolute {
                image: name.clone(),
            })?;
        let flat = matrix_to_row_major(h);
        for (k, value) in flat.iter().enumerate() {
            params[9 * i + k] = *value;
        }
    }
    Ok(params)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn row_major_round_trip() {
        let h = Matrix3::new(1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0);
        let flat = matrix_to_row_major(&h);
        assert_eq!(flat, [1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        assert_eq!(matrix_from_row_major(&flat), h);
    }

    #[test]
    fn block_reads_the_right_slice() {
        let mut params = DVector::zeros(18);
        for k in 0..9 {
            params[9 + k] = k as f64;
        }
        let h = block(&params, 1);
        assert_eq!(h[(0, 0)], 0.0);
        assert_eq!(h[(0, 2)], 2.0);
        assert_eq!(h[(2, 2)], 8.0);
        assert_eq!(block(&params, 0), Matrix3::zeros());
    }

    #[test]
    fn flatten_absolute_fails_on_missing_image() {
        let images = ImageSet::from_names(["a", "b"]).unwrap();
        let mut absolute = AbsoluteHomographies::new();
        absolute.insert("a".to_string(), Matrix3::identity());

        let err = flatten_absolute(&images, &absolute).unwrap_err();
        assert!(matches!(err, AlignError::MissingAbsolute { image } if image == "b"));
    }
}
