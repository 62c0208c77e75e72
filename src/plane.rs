//! Source-plane coordinate set with a reference centre.
//!
//! A `SourcePlane` owns the ray-traced coordinates of one lens-model
//! evaluation. The coordinate order is caller-significant (it matches the
//! image sub-pixel order) and is preserved by every operation, including
//! the in-place border relocation.

use serde::Serialize;

use crate::border::{BorderError, SourceBorder};
use crate::geometry::{angle_from_x_deg, radius_from, to_centre};

/// An ordered set of source-plane coordinates measured about a centre.
#[derive(Debug, Clone, Serialize)]
pub struct SourcePlane {
    pub coordinates: Vec<[f64; 2]>,
    pub centre: [f64; 2],
}

impl SourcePlane {
    pub fn new(coordinates: Vec<[f64; 2]>, centre: [f64; 2]) -> Self {
        Self {
            coordinates,
            centre,
        }
    }

    /// Shifts a coordinate so it is measured relative to the plane centre.
    pub fn to_centre(&self, coordinate: [f64; 2]) -> [f64; 2] {
        to_centre(coordinate, self.centre)
    }

    /// Distance of a coordinate from the plane centre.
    pub fn radius(&self, coordinate: [f64; 2]) -> f64 {
        radius_from(coordinate, self.centre)
    }

    /// Angle of a coordinate about the plane centre, degrees in [0, 360).
    pub fn angle_from_x(&self, coordinate: [f64; 2]) -> f64 {
        angle_from_x_deg(coordinate, self.centre)
    }

    /// Builds a border from the subset of owned coordinates named by
    /// `indices`, in index order, sharing the plane centre.
    pub fn border_from_indices(
        &self,
        indices: &[usize],
        degree: usize,
    ) -> Result<SourceBorder, BorderError> {
        let len = self.coordinates.len();
        let mut border_coordinates = Vec::with_capacity(indices.len());
        for &index in indices {
            if index >= len {
                return Err(BorderError::IndexOutOfRange { index, len });
            }
            border_coordinates.push(self.coordinates[index]);
        }
        SourceBorder::new(border_coordinates, degree, self.centre)
    }

    /// Relocates every owned coordinate lying outside `border` onto it,
    /// in place and preserving order.
    pub fn relocate_coordinates_outside_border(&mut self, border: &SourceBorder) {
        for coordinate in &mut self.coordinates {
            *coordinate = border.relocated_coordinate(*coordinate);
        }
    }

    /// Composite of [`Self::border_from_indices`] and
    /// [`Self::relocate_coordinates_outside_border`]: fits a border to the
    /// named subset, then relocates all coordinates (border ones included).
    pub fn relocate_coordinates_outside_border_from_indices(
        &mut self,
        indices: &[usize],
        degree: usize,
    ) -> Result<(), BorderError> {
        let border = self.border_from_indices(indices, degree)?;
        self.relocate_coordinates_outside_border(&border);
        Ok(())
    }
}
