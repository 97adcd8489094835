//! Output bounds of a 3D volume under a linear transform.

use crate::raw_volume::VolumeError;

use ndarray::{Array2, ArrayView2};
use thiserror::Error;

const SINGULAR_EPSILON: f64 = 1e-12;

#[derive(Debug, Error, PartialEq)]
pub enum TransformError {
    #[error("Only 3x3 matrices are supported, got {0}x{1}")]
    InvalidMatrixShape(usize, usize),

    #[error("The transform matrix is not invertible")]
    Singular,

    #[error("Cannot compensate a negative excursion on axis {0}: the diagonal entry is zero")]
    DegenerateDiagonal(usize),

    #[error("The transformed volume is too large to allocate")]
    OutputTooLarge,

    #[error(transparent)]
    Volume(#[from] VolumeError),
}

/// Shape that holds a transformed volume and the pre-transform translation
/// that keeps its coordinates non-negative.
#[derive(Clone, Debug, PartialEq)]
pub struct AffineBounds {
    pub shape: (usize, usize, usize),
    pub offset: [f64; 3],
}

pub(crate) fn ensure_square_3x3(matrix: ArrayView2<'_, f64>) -> Result<(), TransformError> {
    match matrix.dim() {
        (3, 3) => Ok(()),
        (rows, cols) => Err(TransformError::InvalidMatrixShape(rows, cols)),
    }
}

/// Resolve the output shape and offset of `shape` transformed by `matrix`.
///
/// The eight corner voxels `{0, D-1} x {0, H-1} x {0, W-1}` are transformed
/// as column vectors. Each output axis spans the transformed corners'
/// extent on that axis, so rotations that are not axis aligned get a box
/// larger than the tight rotated one.
pub fn resolve(
    shape: (usize, usize, usize),
    matrix: ArrayView2<'_, f64>,
) -> Result<AffineBounds, TransformError> {
    ensure_square_3x3(matrix)?;

    let (d, h, w) = shape;
    let last = |n: usize| n.saturating_sub(1) as f64;
    let (d, h, w) = (last(d), last(h), last(w));
    let corners = [
        [0.0, 0.0, 0.0],
        [0.0, h, 0.0],
        [0.0, 0.0, w],
        [0.0, h, w],
        [d, 0.0, 0.0],
        [d, h, 0.0],
        [d, 0.0, w],
        [d, h, w],
    ];

    let mut min_t = [f64::INFINITY; 3];
    let mut max_t = [f64::NEG_INFINITY; 3];
    for corner in corners {
        for axis in 0..3 {
            let t: f64 = (0..3).map(|k| matrix[[axis, k]] * corner[k]).sum();
            min_t[axis] = min_t[axis].min(t);
            max_t[axis] = max_t[axis].max(t);
        }
    }

    let mut offset = [0.0; 3];
    for axis in 0..3 {
        if min_t[axis] < 0.0 {
            let diagonal = matrix[[axis, axis]];
            if diagonal == 0.0 {
                return Err(TransformError::DegenerateDiagonal(axis));
            }
            offset[axis] = min_t[axis] / diagonal;
        }
    }

    let mut extents = [0usize; 3];
    for axis in 0..3 {
        let extent = (max_t[axis] - min_t[axis]).ceil();
        if !extent.is_finite() || extent > isize::MAX as f64 {
            return Err(TransformError::OutputTooLarge);
        }
        extents[axis] = extent as usize;
    }
    extents
        .iter()
        .try_fold(1usize, |acc, &n| acc.checked_mul(n.max(1)))
        .filter(|&len| len <= isize::MAX as usize)
        .ok_or(TransformError::OutputTooLarge)?;

    Ok(AffineBounds {
        shape: (extents[0], extents[1], extents[2]),
        offset,
    })
}

/// Inverse of a 3x3 matrix by cofactor expansion.
pub fn invert(matrix: ArrayView2<'_, f64>) -> Result<Array2<f64>, TransformError> {
    ensure_square_3x3(matrix)?;
    let m = |r: usize, c: usize| matrix[[r, c]];

    let cofactor = |r: usize, c: usize| {
        let (r0, r1) = match r {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        let (c0, c1) = match c {
            0 => (1, 2),
            1 => (0, 2),
            _ => (0, 1),
        };
        let minor = m(r0, c0) * m(r1, c1) - m(r0, c1) * m(r1, c0);
        if (r + c) % 2 == 0 { minor } else { -minor }
    };

    let det: f64 = (0..3).map(|c| m(0, c) * cofactor(0, c)).sum();
    if det.abs() < SINGULAR_EPSILON || !det.is_finite() {
        return Err(TransformError::Singular);
    }

    // adjugate is the transposed cofactor matrix
    Ok(Array2::from_shape_fn((3, 3), |(r, c)| cofactor(c, r) / det))
}
