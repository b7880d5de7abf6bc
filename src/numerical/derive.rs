//! Second-order central-difference stencils evaluated at a single node.
//!
//! All functions read the four neighbours of `(i, j)`, so they are only valid
//! for interior nodes `1 <= i <= ni-2`, `1 <= j <= nj-2`.

use crate::domain::grid2d::ScalarField2D;

/// `(f[i+1, j] - f[i-1, j]) / 2h`
#[inline]
pub fn central_difference_x(field: &ScalarField2D, i: usize, j: usize, h: f64) -> f64 {
    (field[(i + 1, j)] - field[(i - 1, j)]) / (2.0 * h)
}

/// `(f[i, j+1] - f[i, j-1]) / 2h`
#[inline]
pub fn central_difference_y(field: &ScalarField2D, i: usize, j: usize, h: f64) -> f64 {
    (field[(i, j + 1)] - field[(i, j - 1)]) / (2.0 * h)
}

/// Five-point Laplacian on a uniform mesh.
#[inline]
pub fn laplacian(field: &ScalarField2D, i: usize, j: usize, h: f64) -> f64 {
    (field[(i + 1, j)] + field[(i - 1, j)] + field[(i, j + 1)] + field[(i, j - 1)]
        - 4.0 * field[(i, j)])
        / (h * h)
}

/// Velocity `(u, v) = (dFc/dy, -dFc/dx)` at an interior node.
#[inline]
pub fn stream_velocity(streamfunction: &ScalarField2D, i: usize, j: usize, h: f64) -> (f64, f64) {
    (
        central_difference_y(streamfunction, i, j, h),
        -central_difference_x(streamfunction, i, j, h),
    )
}
