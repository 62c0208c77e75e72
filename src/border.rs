//! Border curve model bounding the valid source-plane region.
//!
//! Ray tracing scatters a small fraction of sub-pixels far outside the
//! region covered by the source; left alone they stretch the pixelization
//! and destabilize the inversion. The border model fits a periodic
//! radius-vs-angle curve through a designated ring of coordinates and pulls
//! every outside coordinate radially back onto the curve at its own angle.
//!
//! The fit is a polynomial least-squares regression with each (theta,
//! radius) sample replicated at theta ± 360°, so the curve and its slope
//! agree across the 0°/360° seam. Evaluation wraps the query angle back
//! into [0, 360).

use log::debug;
use nalgebra::{DMatrix, DVector};
use serde::Serialize;

use crate::geometry::{angle_from_x_deg, radius_from, to_centre};

const SVD_EPS: f64 = 1e-12;

/// Errors raised while constructing a border model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorderError {
    /// Too few border points to constrain a fit of the requested degree.
    InsufficientBorderPoints { needed: usize, got: usize },
    /// A border index referred outside the owning plane's coordinate list.
    IndexOutOfRange { index: usize, len: usize },
    /// The least-squares system for the border curve was singular.
    SingularFit,
}

impl std::fmt::Display for BorderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InsufficientBorderPoints { needed, got } => {
                write!(f, "too few border points: need {}, got {}", needed, got)
            }
            Self::IndexOutOfRange { index, len } => {
                write!(f, "border index {} out of range for {} coordinates", index, len)
            }
            Self::SingularFit => write!(f, "border curve fit is singular"),
        }
    }
}

impl std::error::Error for BorderError {}

/// A closed radius-vs-angle curve fitted to a ring of border coordinates.
///
/// `radii` and `thetas` are parallel to `coordinates`, in the order the
/// coordinates were supplied.
#[derive(Debug, Clone, Serialize)]
pub struct SourceBorder {
    pub coordinates: Vec<[f64; 2]>,
    pub radii: Vec<f64>,
    pub thetas: Vec<f64>,
    pub degree: usize,
    pub centre: [f64; 2],
    coeffs: Vec<f64>,
}

impl SourceBorder {
    /// Fits a border of the given polynomial degree through `coordinates`,
    /// measured about `centre`.
    ///
    /// Requires at least `degree + 1` coordinates.
    pub fn new(
        coordinates: Vec<[f64; 2]>,
        degree: usize,
        centre: [f64; 2],
    ) -> Result<Self, BorderError> {
        let got = coordinates.len();
        if got < degree + 1 {
            return Err(BorderError::InsufficientBorderPoints {
                needed: degree + 1,
                got,
            });
        }

        let radii: Vec<f64> = coordinates.iter().map(|&c| radius_from(c, centre)).collect();
        let thetas: Vec<f64> = coordinates
            .iter()
            .map(|&c| angle_from_x_deg(c, centre))
            .collect();
        let coeffs = fit_periodic_polynomial(&thetas, &radii, degree)?;
        debug!(
            "border fit: {} points, degree {}, coefficient norm {:.3e}",
            got,
            degree,
            coeffs.iter().map(|c| c * c).sum::<f64>().sqrt()
        );

        Ok(Self {
            coordinates,
            radii,
            thetas,
            degree,
            centre,
            coeffs,
        })
    }

    /// Border radius at `theta` degrees; `theta` is wrapped into [0, 360).
    pub fn radius_at_theta(&self, theta: f64) -> f64 {
        let t = theta.rem_euclid(360.0) / 360.0;
        self.coeffs.iter().rev().fold(0.0, |acc, &c| acc * t + c)
    }

    /// Radial scale factor pulling `coordinate` onto the border.
    ///
    /// 1.0 for coordinates inside or on the border (and for the centre
    /// itself, which is never relocated); otherwise the ratio of the border
    /// radius at the coordinate's angle to the coordinate's radius, a value
    /// in (0, 1).
    pub fn move_factor(&self, coordinate: [f64; 2]) -> f64 {
        let radius = radius_from(coordinate, self.centre);
        if radius == 0.0 {
            return 1.0;
        }
        let border_radius = self.radius_at_theta(angle_from_x_deg(coordinate, self.centre));
        if radius <= border_radius {
            1.0
        } else {
            border_radius / radius
        }
    }

    /// Returns `coordinate` unchanged if it lies inside or on the border,
    /// otherwise pulled radially inward to sit on the border at its own
    /// angle. Idempotent.
    pub fn relocated_coordinate(&self, coordinate: [f64; 2]) -> [f64; 2] {
        let factor = self.move_factor(coordinate);
        let [dx, dy] = to_centre(coordinate, self.centre);
        [self.centre[0] + factor * dx, self.centre[1] + factor * dy]
    }
}

/// Least-squares polynomial fit of radius against theta, with every sample
/// replicated at theta ± 360° so the curve is periodic across the seam.
///
/// Thetas are rescaled by 1/360 before building the Vandermonde system to
/// keep it well conditioned.
fn fit_periodic_polynomial(
    thetas: &[f64],
    radii: &[f64],
    degree: usize,
) -> Result<Vec<f64>, BorderError> {
    let mut t = Vec::with_capacity(thetas.len() * 3);
    let mut r = Vec::with_capacity(radii.len() * 3);
    for (&theta, &radius) in thetas.iter().zip(radii) {
        for shift in [-360.0, 0.0, 360.0] {
            t.push((theta + shift) / 360.0);
            r.push(radius);
        }
    }

    let cols = degree + 1;
    let mut design = DMatrix::zeros(t.len(), cols);
    for (i, &ti) in t.iter().enumerate() {
        let mut power = 1.0;
        for j in 0..cols {
            design[(i, j)] = power;
            power *= ti;
        }
    }

    let rhs = DVector::from_column_slice(&r);
    let solution = design
        .svd(true, true)
        .solve(&rhs, SVD_EPS)
        .map_err(|_| BorderError::SingularFit)?;
    Ok(solution.iter().copied().collect())
}
