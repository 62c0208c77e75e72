//! Centre-relative geometry helpers shared by the plane and border models.

/// Shifts a coordinate so it is measured relative to `centre`.
#[inline]
pub fn to_centre(coordinate: [f64; 2], centre: [f64; 2]) -> [f64; 2] {
    [coordinate[0] - centre[0], coordinate[1] - centre[1]]
}

/// Euclidean distance of a coordinate from `centre`.
///
/// Zero exactly when `coordinate == centre`.
#[inline]
pub fn radius_from(coordinate: [f64; 2], centre: [f64; 2]) -> f64 {
    let [dx, dy] = to_centre(coordinate, centre);
    (dx * dx + dy * dy).sqrt()
}

/// Angle of a coordinate about `centre`, in degrees counter-clockwise from
/// the positive x-axis, normalized to [0, 360).
///
/// At the centre itself the angle is 0 by convention.
#[inline]
pub fn angle_from_x_deg(coordinate: [f64; 2], centre: [f64; 2]) -> f64 {
    let [dx, dy] = to_centre(coordinate, centre);
    let theta = dy.atan2(dx).to_degrees();
    if theta < 0.0 {
        theta + 360.0
    } else {
        theta
    }
}

/// Squared Euclidean separation between two coordinates.
#[inline]
pub fn squared_separation(a: [f64; 2], b: [f64; 2]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    dx * dx + dy * dy
}
