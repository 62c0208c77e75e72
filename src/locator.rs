//! Nearest source-pixel assignment for image sub-pixel coordinates.
//!
//! Two interchangeable strategies:
//!
//! - **Brute force** scans every source pixel per query. Exact, O(queries ×
//!   pixels), used directly on small sets and as the seed/fallback path.
//! - **Sparse walk** seeds each query from a coarse sparse-grid assignment
//!   and then hops through the Voronoi neighbor graph to any strictly
//!   closer neighbor until none improves. On a genuine Voronoi adjacency
//!   the squared distance has no spurious local minimum, so the walk ends
//!   at the same pixel brute force finds; `best_dist` strictly decreases at
//!   every hop, so the walk terminates.
//!
//! A query whose seed pixel has no neighbors (degenerate tessellation)
//! silently falls back to brute force for that one query.

use log::warn;
use rayon::prelude::*;
use serde::Serialize;

use crate::geometry::squared_separation;

/// Errors raised while building locator acceleration structures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocatorError {
    /// A Voronoi ridge pair referenced a pixel at or beyond the pixel count.
    RidgeIndexOutOfRange { index: usize, pixels: usize },
    /// A cluster label referenced a cluster at or beyond the cluster count.
    LabelOutOfRange { index: usize, clusters: usize },
}

impl std::fmt::Display for LocatorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RidgeIndexOutOfRange { index, pixels } => {
                write!(f, "ridge index {} out of range for {} pixels", index, pixels)
            }
            Self::LabelOutOfRange { index, clusters } => {
                write!(f, "cluster label {} out of range for {} clusters", index, clusters)
            }
        }
    }
}

impl std::error::Error for LocatorError {}

/// Symmetric source-pixel adjacency derived from Voronoi ridge pairs.
///
/// Two pixels are neighbors iff their Voronoi cells share an edge.
#[derive(Debug, Clone, Serialize)]
pub struct NeighborGraph {
    neighbors: Vec<Vec<usize>>,
    totals: Vec<usize>,
}

impl NeighborGraph {
    /// Builds the adjacency list for `pixels` source pixels from the
    /// unordered ridge pairs of an external Voronoi tessellation.
    pub fn from_ridge_pairs(
        pixels: usize,
        ridge_pairs: &[[usize; 2]],
    ) -> Result<Self, LocatorError> {
        let mut neighbors = vec![Vec::new(); pixels];
        for &[i, j] in ridge_pairs {
            if i >= pixels {
                return Err(LocatorError::RidgeIndexOutOfRange { index: i, pixels });
            }
            if j >= pixels {
                return Err(LocatorError::RidgeIndexOutOfRange { index: j, pixels });
            }
            neighbors[i].push(j);
            neighbors[j].push(i);
        }
        let totals = neighbors.iter().map(Vec::len).collect();
        Ok(Self { neighbors, totals })
    }

    pub fn pixels(&self) -> usize {
        self.neighbors.len()
    }

    pub fn neighbors_of(&self, pixel: usize) -> &[usize] {
        &self.neighbors[pixel]
    }

    /// Number of Voronoi edges the pixel shares with other pixels.
    pub fn neighbor_total(&self, pixel: usize) -> usize {
        self.totals[pixel]
    }
}

/// Coarse-grid acceleration index: every query carries the label of its
/// sparse cluster, and every sparse cluster knows its own nearest source
/// pixel.
#[derive(Debug, Clone, Serialize)]
pub struct SparseGridAssignment {
    pub query_to_sparse: Vec<usize>,
    pub sparse_to_pixel: Vec<usize>,
}

impl SparseGridAssignment {
    /// Builds the assignment from external clustering output: per-query
    /// cluster `labels` and the `cluster_centres` they refer to. Each
    /// cluster centre is paired to its nearest source pixel by brute force
    /// over the (much smaller) sparse set.
    pub fn from_cluster_labels(
        labels: &[usize],
        cluster_centres: &[[f64; 2]],
        pixel_centres: &[[f64; 2]],
    ) -> Result<Self, LocatorError> {
        let clusters = cluster_centres.len();
        for &label in labels {
            if label >= clusters {
                return Err(LocatorError::LabelOutOfRange { index: label, clusters });
            }
        }
        let sparse_to_pixel = cluster_centres
            .iter()
            .map(|&centre| nearest_pixel(centre, pixel_centres))
            .collect();
        Ok(Self {
            query_to_sparse: labels.to_vec(),
            sparse_to_pixel,
        })
    }
}

/// Walk statistics, exposed for diagnostics of the acceleration quality.
#[derive(Debug, Clone, Default, Serialize)]
pub struct WalkDiagnostics {
    pub queries: usize,
    /// Total neighbor hops taken across all queries.
    pub hops: usize,
    /// Queries that fell back to brute force for lack of neighbors.
    pub fallbacks: usize,
}

/// Assigns each query to its nearest source pixel by scanning every pixel.
///
/// Ties go to the lowest pixel index. `pixel_centres` must be non-empty.
pub fn nearest_via_brute_force(
    queries: &[[f64; 2]],
    pixel_centres: &[[f64; 2]],
) -> Vec<usize> {
    debug_assert!(!pixel_centres.is_empty());
    queries
        .iter()
        .map(|&q| nearest_pixel(q, pixel_centres))
        .collect()
}

/// Assigns each query to its nearest source pixel via the sparse-grid seed
/// and neighbor-graph walk. Agrees exactly with
/// [`nearest_via_brute_force`] whenever `graph` is a genuine Voronoi
/// adjacency over `pixel_centres`.
pub fn nearest_via_sparse_walk(
    queries: &[[f64; 2]],
    pixel_centres: &[[f64; 2]],
    graph: &NeighborGraph,
    sparse: &SparseGridAssignment,
) -> Vec<usize> {
    nearest_via_sparse_walk_with_diagnostics(queries, pixel_centres, graph, sparse).0
}

/// As [`nearest_via_sparse_walk`], additionally reporting hop and fallback
/// counts.
pub fn nearest_via_sparse_walk_with_diagnostics(
    queries: &[[f64; 2]],
    pixel_centres: &[[f64; 2]],
    graph: &NeighborGraph,
    sparse: &SparseGridAssignment,
) -> (Vec<usize>, WalkDiagnostics) {
    debug_assert_eq!(queries.len(), sparse.query_to_sparse.len());
    let mut diagnostics = WalkDiagnostics {
        queries: queries.len(),
        ..Default::default()
    };
    let mut assignments = Vec::with_capacity(queries.len());
    for (query_index, &query) in queries.iter().enumerate() {
        let seed = sparse.sparse_to_pixel[sparse.query_to_sparse[query_index]];
        let (pixel, hops, fell_back) = walk_from_seed(query, pixel_centres, graph, seed);
        diagnostics.hops += hops;
        diagnostics.fallbacks += fell_back as usize;
        assignments.push(pixel);
    }
    (assignments, diagnostics)
}

/// Parallel variant of [`nearest_via_sparse_walk`]. Bit-exact with the
/// sequential walk: each query is independent and touches no shared
/// mutable state.
pub fn par_nearest_via_sparse_walk(
    queries: &[[f64; 2]],
    pixel_centres: &[[f64; 2]],
    graph: &NeighborGraph,
    sparse: &SparseGridAssignment,
) -> Vec<usize> {
    debug_assert_eq!(queries.len(), sparse.query_to_sparse.len());
    queries
        .par_iter()
        .enumerate()
        .map(|(query_index, &query)| {
            let seed = sparse.sparse_to_pixel[sparse.query_to_sparse[query_index]];
            walk_from_seed(query, pixel_centres, graph, seed).0
        })
        .collect()
}

/// Greedy descent from `seed`: hop to the first strictly closer neighbor
/// until no neighbor improves. Returns (pixel, hops, fell_back).
fn walk_from_seed(
    query: [f64; 2],
    pixel_centres: &[[f64; 2]],
    graph: &NeighborGraph,
    seed: usize,
) -> (usize, usize, bool) {
    if graph.neighbors_of(seed).is_empty() {
        warn!("pixel {} has no neighbors; falling back to brute force", seed);
        return (nearest_pixel(query, pixel_centres), 0, true);
    }

    let mut candidate = seed;
    let mut best = squared_separation(query, pixel_centres[candidate]);
    let mut hops = 0;
    loop {
        match closer_neighbor(query, pixel_centres, graph.neighbors_of(candidate), best) {
            Some((neighbor, separation)) => {
                candidate = neighbor;
                best = separation;
                hops += 1;
            }
            None => return (candidate, hops, false),
        }
    }
}

/// First neighbor strictly closer to `query` than `best`, with its squared
/// separation.
fn closer_neighbor(
    query: [f64; 2],
    pixel_centres: &[[f64; 2]],
    neighbors: &[usize],
    best: f64,
) -> Option<(usize, f64)> {
    for &neighbor in neighbors {
        let separation = squared_separation(query, pixel_centres[neighbor]);
        if separation < best {
            return Some((neighbor, separation));
        }
    }
    None
}

/// Index of the pixel nearest to `query`; ties go to the lowest index.
fn nearest_pixel(query: [f64; 2], pixel_centres: &[[f64; 2]]) -> usize {
    let mut best_index = 0;
    let mut best = f64::INFINITY;
    for (index, &centre) in pixel_centres.iter().enumerate() {
        let separation = squared_separation(query, centre);
        if separation < best {
            best = separation;
            best_index = index;
        }
    }
    best_index
}

#[cfg(test)]
mod tests {
    use super::*;

    // 5 pixels in the face-of-a-die cross; every outer pixel borders the
    // centre and its two lateral companions in the Voronoi diagram.
    fn cross_pixels() -> Vec<[f64; 2]> {
        vec![[-1.0, 1.0], [1.0, 1.0], [0.0, 0.0], [-1.0, -1.0], [1.0, -1.0]]
    }

    fn cross_ridge_pairs() -> Vec<[usize; 2]> {
        vec![[2, 0], [2, 1], [2, 3], [2, 4], [0, 1], [0, 3], [3, 4], [4, 1]]
    }

    #[test]
    fn brute_force_pairs_each_query_with_nearest_pixel() {
        let pixels = vec![[1.0, 1.0], [-1.0, 1.0], [-1.0, -1.0], [1.0, -1.0]];
        let queries = vec![
            [1.1, 1.1],
            [-1.1, 1.1],
            [-1.1, -1.1],
            [1.1, -1.1],
            [0.9, -0.9],
            [-0.9, -0.9],
            [-0.9, 0.9],
            [0.9, 0.9],
        ];
        assert_eq!(
            nearest_via_brute_force(&queries, &pixels),
            vec![0, 1, 2, 3, 3, 2, 1, 0]
        );
    }

    #[test]
    fn brute_force_breaks_ties_by_first_occurrence() {
        let pixels = vec![[1.0, 1.0], [-1.0, 1.0], [-1.0, -1.0], [1.0, -1.0], [0.0, 0.0], [2.0, 2.0]];
        let queries = vec![
            [0.1, 0.1],
            [-0.1, -0.1],
            [0.49, 0.49],
            [0.51, 0.51],
            [1.01, 1.01],
            [1.51, 1.51],
            [1.5, 1.5],
        ];
        // (1.5, 1.5) is equidistant from (1,1) and (2,2): lowest index wins.
        assert_eq!(
            nearest_via_brute_force(&queries, &pixels),
            vec![4, 4, 4, 0, 0, 5, 0]
        );
    }

    #[test]
    fn ridge_pairs_build_a_symmetric_adjacency() {
        let graph = NeighborGraph::from_ridge_pairs(5, &cross_ridge_pairs()).unwrap();

        assert_eq!(graph.pixels(), 5);
        let expected_totals = [3, 3, 4, 3, 3];
        for (pixel, &total) in expected_totals.iter().enumerate() {
            assert_eq!(graph.neighbor_total(pixel), total);
        }

        let sorted = |pixel: usize| {
            let mut n = graph.neighbors_of(pixel).to_vec();
            n.sort_unstable();
            n
        };
        assert_eq!(sorted(0), vec![1, 2, 3]);
        assert_eq!(sorted(1), vec![0, 2, 4]);
        assert_eq!(sorted(2), vec![0, 1, 3, 4]);
        assert_eq!(sorted(3), vec![0, 2, 4]);
        assert_eq!(sorted(4), vec![1, 2, 3]);
    }

    #[test]
    fn ridge_index_out_of_range_is_an_error() {
        let err = NeighborGraph::from_ridge_pairs(3, &[[0, 3]]).unwrap_err();
        assert_eq!(err, LocatorError::RidgeIndexOutOfRange { index: 3, pixels: 3 });
    }

    #[test]
    fn cluster_centres_pair_with_their_nearest_pixels() {
        let pixel_centres = vec![[0.0, 0.0], [1.0, 0.0], [2.0, 0.0]];
        let cluster_centres = vec![[1.9, 0.1], [0.2, 0.0]];
        let labels = vec![0, 0, 1, 1];

        let sparse =
            SparseGridAssignment::from_cluster_labels(&labels, &cluster_centres, &pixel_centres)
                .unwrap();
        assert_eq!(sparse.query_to_sparse, vec![0, 0, 1, 1]);
        assert_eq!(sparse.sparse_to_pixel, vec![2, 0]);
    }

    #[test]
    fn cluster_label_out_of_range_is_an_error() {
        let err = SparseGridAssignment::from_cluster_labels(
            &[0, 2],
            &[[0.0, 0.0], [1.0, 1.0]],
            &[[0.0, 0.0]],
        )
        .unwrap_err();
        assert_eq!(err, LocatorError::LabelOutOfRange { index: 2, clusters: 2 });
    }

    #[test]
    fn walk_agrees_with_brute_force_on_the_cross() {
        let pixels = cross_pixels();
        let graph = NeighborGraph::from_ridge_pairs(5, &cross_ridge_pairs()).unwrap();

        // Central queries pair with the centre pixel, corner queries with
        // their corner.
        let queries = vec![
            [-1.0, 1.0],
            [0.0, 0.2],
            [1.0, 1.0],
            [-1.0, 0.2],
            [0.0, 0.0],
            [0.2, 0.0],
            [-1.0, -1.0],
            [0.0, -0.2],
            [1.0, -1.0],
        ];
        let query_to_sparse = vec![0, 1, 0, 1, 1, 1, 2, 1, 2];
        let sparse_to_pixel = vec![1, 2, 4];
        let sparse = SparseGridAssignment {
            query_to_sparse,
            sparse_to_pixel,
        };

        let brute = nearest_via_brute_force(&queries, &pixels);
        let (walked, diagnostics) =
            nearest_via_sparse_walk_with_diagnostics(&queries, &pixels, &graph, &sparse);
        assert_eq!(walked, brute);
        assert_eq!(diagnostics.queries, 9);
        assert_eq!(diagnostics.fallbacks, 0);
    }

    #[test]
    fn walk_without_neighbors_falls_back_to_brute_force() {
        // Two disconnected pixels: the seed pixel has no ridge at all, so
        // the walk cannot leave it and must brute force instead.
        let pixels = vec![[0.0, 0.0], [5.0, 0.0]];
        let graph = NeighborGraph::from_ridge_pairs(2, &[]).unwrap();
        let sparse = SparseGridAssignment {
            query_to_sparse: vec![0],
            sparse_to_pixel: vec![0],
        };

        let queries = vec![[4.9, 0.0]];
        let (assignments, diagnostics) =
            nearest_via_sparse_walk_with_diagnostics(&queries, &pixels, &graph, &sparse);
        assert_eq!(assignments, vec![1]);
        assert_eq!(diagnostics.fallbacks, 1);
        assert_eq!(diagnostics.hops, 0);
    }

    #[test]
    fn walk_descends_across_several_hops() {
        // A 1-D chain of pixels; seeding at one end forces the walk to hop
        // down the whole chain.
        let pixels: Vec<[f64; 2]> = (0..6).map(|i| [i as f64, 0.0]).collect();
        let ridge_pairs: Vec<[usize; 2]> = (0..5).map(|i| [i, i + 1]).collect();
        let graph = NeighborGraph::from_ridge_pairs(6, &ridge_pairs).unwrap();
        let sparse = SparseGridAssignment {
            query_to_sparse: vec![0],
            sparse_to_pixel: vec![0],
        };

        let queries = vec![[5.1, 0.0]];
        let (assignments, diagnostics) =
            nearest_via_sparse_walk_with_diagnostics(&queries, &pixels, &graph, &sparse);
        assert_eq!(assignments, vec![5]);
        assert_eq!(diagnostics.hops, 5);
    }

    #[test]
    fn parallel_walk_matches_sequential_walk() {
        let pixels = cross_pixels();
        let graph = NeighborGraph::from_ridge_pairs(5, &cross_ridge_pairs()).unwrap();
        let queries: Vec<[f64; 2]> = (0..40)
            .map(|i| {
                let phi = i as f64 * 0.37;
                [1.4 * phi.cos(), 1.4 * phi.sin()]
            })
            .collect();
        let sparse = SparseGridAssignment {
            query_to_sparse: vec![0; queries.len()],
            sparse_to_pixel: vec![2],
        };

        let sequential = nearest_via_sparse_walk(&queries, &pixels, &graph, &sparse);
        let parallel = par_nearest_via_sparse_walk(&queries, &pixels, &graph, &sparse);
        assert_eq!(sequential, parallel);
        assert_eq!(sequential, nearest_via_brute_force(&queries, &pixels));
    }
}
