//! Synthetic source-plane geometry shared by the integration tests.

/// `n` coordinates evenly spaced on a circle of `radius` about `centre`.
pub fn circle_points(n: usize, radius: f64, centre: [f64; 2]) -> Vec<[f64; 2]> {
    assert!(n > 0, "circle needs at least one point");
    (0..n)
        .map(|i| {
            let phi = i as f64 * std::f64::consts::TAU / n as f64;
            [
                centre[0] + radius * phi.cos(),
                centre[1] + radius * phi.sin(),
            ]
        })
        .collect()
}

/// A `w` × `h` unit-spaced lattice of pixel centres, row-major from the
/// origin.
pub fn lattice_points(w: usize, h: usize) -> Vec<[f64; 2]> {
    assert!(w > 0 && h > 0, "lattice dimensions must be positive");
    let mut points = Vec::with_capacity(w * h);
    for y in 0..h {
        for x in 0..w {
            points.push([x as f64, y as f64]);
        }
    }
    points
}

/// Voronoi ridge pairs of a unit lattice: cells are unit squares, so each
/// pixel borders its horizontal and vertical lattice neighbors only.
pub fn lattice_ridge_pairs(w: usize, h: usize) -> Vec<[usize; 2]> {
    let mut pairs = Vec::new();
    for y in 0..h {
        for x in 0..w {
            let i = y * w + x;
            if x + 1 < w {
                pairs.push([i, i + 1]);
            }
            if y + 1 < h {
                pairs.push([i, i + w]);
            }
        }
    }
    pairs
}
