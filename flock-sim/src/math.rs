pub fn dot3(ax: f64, ay: f64, az: f64, bx: f64, by: f64, bz: f64) -> f64 {
    ax * bx + ay * by + az * bz
}

pub fn length_3d(x: f64, y: f64, z: f64) -> f64 {
    dot3(x, y, z, x, y, z).sqrt()
}

pub fn distance_3d(dx: f64, dy: f64, dz: f64) -> f64 {
    length_3d(dx, dy, dz)
}

/// Rescales `(x, y, z)` to `magnitude` keeping its direction.
///
/// A zero vector has no direction and is returned unchanged.
pub fn rescale_to_magnitude(x: f64, y: f64, z: f64, magnitude: f64) -> (f64, f64, f64) {
    let len = length_3d(x, y, z);
    if len == 0.0 {
        return (x, y, z);
    }

    (
        magnitude * x / len,
        magnitude * y / len,
        magnitude * z / len,
    )
}

/// Angle between a heading and the offset `(dx, dy, dz)` of length `dist`.
///
/// Returns `+inf` when either vector is degenerate so that the caller's
/// `angle < limit` tests fail instead of seeing NaN.
pub fn heading_angle(
    heading: (f64, f64, f64),
    heading_len: f64,
    dx: f64,
    dy: f64,
    dz: f64,
    dist: f64,
) -> f64 {
    if heading_len == 0.0 || dist == 0.0 || !dist.is_finite() {
        return f64::INFINITY;
    }

    let cos = dot3(heading.0, heading.1, heading.2, dx, dy, dz) / (heading_len * dist);
    cos.clamp(-1.0, 1.0).acos()
}
