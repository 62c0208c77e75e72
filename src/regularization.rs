//! Regularization matrix assembly over the source-pixel pair graph.
//!
//! The inversion penalizes flux differences between neighboring source
//! pixels through a symmetric operator H. The textbook construction builds
//! one signed difference row per pixel-pair direction (weight -w at the
//! source pixel, +w at its neighbor) and multiplies Bᵀ·B; because each row
//! touches two pixels out of n, that dense product wastes almost all of
//! its work. Summing the two Gram-matrix contributions of a pair in closed
//! form gives the identical matrix in O(|pairs|):
//!
//! for each pair (i, j), with a = w[i]² + w[j]²:
//!   H[i][i] += a,  H[j][j] += a,  H[i][j] -= a,  H[j][i] -= a
//!
//! Pair order does not affect the result, and H is symmetric positive
//! semi-definite by construction.

use nalgebra::DMatrix;

/// Errors raised while assembling a regularization matrix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegularizationError {
    /// A pair referenced a pixel index at or beyond the pixel count.
    PairIndexOutOfRange { index: usize, pixels: usize },
    /// The weight list length did not match the pixel count.
    WeightCountMismatch { expected: usize, got: usize },
    /// The per-pixel pair-count list length did not match the pixel count.
    PairCountMismatch { expected: usize, got: usize },
}

impl std::fmt::Display for RegularizationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PairIndexOutOfRange { index, pixels } => {
                write!(f, "pair index {} out of range for {} pixels", index, pixels)
            }
            Self::WeightCountMismatch { expected, got } => {
                write!(f, "expected {} regularization weights, got {}", expected, got)
            }
            Self::PairCountMismatch { expected, got } => {
                write!(f, "expected {} per-pixel pair counts, got {}", expected, got)
            }
        }
    }
}

impl std::error::Error for RegularizationError {}

/// Assembles the n×n regularization matrix for `pixels` source pixels from
/// per-pixel `weights` and the unordered neighbor `pixel_pairs`.
///
/// `pair_counts` is bookkeeping carried along from the Voronoi layer (how
/// many pairs each pixel participates in); when present it is validated
/// for length but plays no part in the numbers.
///
/// Each pair contributes once; callers feeding duplicate pairs get
/// accumulated (double-counted) contributions.
pub fn regularization_matrix(
    pixels: usize,
    weights: &[f64],
    pair_counts: Option<&[usize]>,
    pixel_pairs: &[[usize; 2]],
) -> Result<DMatrix<f64>, RegularizationError> {
    if weights.len() != pixels {
        return Err(RegularizationError::WeightCountMismatch {
            expected: pixels,
            got: weights.len(),
        });
    }
    if let Some(counts) = pair_counts {
        if counts.len() != pixels {
            return Err(RegularizationError::PairCountMismatch {
                expected: pixels,
                got: counts.len(),
            });
        }
    }

    let mut matrix = DMatrix::zeros(pixels, pixels);
    for &[i, j] in pixel_pairs {
        if i >= pixels {
            return Err(RegularizationError::PairIndexOutOfRange { index: i, pixels });
        }
        if j >= pixels {
            return Err(RegularizationError::PairIndexOutOfRange { index: j, pixels });
        }
        let a = weights[i] * weights[i] + weights[j] * weights[j];
        matrix[(i, i)] += a;
        matrix[(j, j)] += a;
        matrix[(i, j)] -= a;
        matrix[(j, i)] -= a;
    }
    Ok(matrix)
}
