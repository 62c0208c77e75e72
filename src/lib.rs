#![doc = include_str!("../README.md")]

pub mod border;
pub mod geometry;
pub mod locator;
pub mod plane;
pub mod regularization;

// --- High-level re-exports -------------------------------------------------

pub use crate::border::{BorderError, SourceBorder};
pub use crate::locator::{
    nearest_via_brute_force, nearest_via_sparse_walk, nearest_via_sparse_walk_with_diagnostics,
    par_nearest_via_sparse_walk, LocatorError, NeighborGraph, SparseGridAssignment,
    WalkDiagnostics,
};
pub use crate::plane::SourcePlane;
pub use crate::regularization::{regularization_matrix, RegularizationError};

/// Small prelude for quick experiments.
///
/// ```
/// use source_plane::prelude::*;
///
/// let mut plane = SourcePlane::new(
///     vec![[1.0, 0.0], [0.0, 1.0], [-1.0, 0.0], [0.0, -1.0], [3.0, 0.0]],
///     [0.0, 0.0],
/// );
/// plane
///     .relocate_coordinates_outside_border_from_indices(&[0, 1, 2, 3], 3)
///     .unwrap();
/// assert!((plane.radius(plane.coordinates[4]) - 1.0).abs() < 1e-3);
/// ```
pub mod prelude {
    pub use crate::border::SourceBorder;
    pub use crate::locator::{
        nearest_via_brute_force, nearest_via_sparse_walk, NeighborGraph, SparseGridAssignment,
    };
    pub use crate::plane::SourcePlane;
    pub use crate::regularization::regularization_matrix;
}
