pub mod derive;

use crate::boundary::bc2d::{apply_wall_velocity, WallVelocities};
use crate::domain::grid2d::ScalarField2D;
use self::derive::{central_difference_x, central_difference_y, laplacian, stream_velocity};

/// One explicit pseudo-time step of the vorticity transport equation.
///
/// Reads `vorticity` and `streamfunction` only and writes `next`:
///
/// `next = Vo + dt * (-u dVo/dx - v dVo/dy + nu lap(Vo))`
///
/// at every interior node. Boundary entries of `next` are copied from
/// `vorticity` unchanged, so the wall values set earlier in the iteration survive.
pub fn advance_vorticity(
    vorticity: &ScalarField2D,
    streamfunction: &ScalarField2D,
    next: &mut ScalarField2D,
    h: f64,
    nu: f64,
    dt: f64,
) {
    assert_eq!(vorticity.shape(), streamfunction.shape(), "Vorticity and streamfunction shapes differ");
    assert_eq!(vorticity.shape(), next.shape(), "Vorticity and output buffer shapes differ");

    let ni = vorticity.nrows();
    let nj = vorticity.ncols();
    next.copy_from(vorticity);

    for j in 1..nj - 1 {
        for i in 1..ni - 1 {
            let (u, v) = stream_velocity(streamfunction, i, j, h);
            let advection = u * central_difference_x(vorticity, i, j, h)
                + v * central_difference_y(vorticity, i, j, h);
            let diffusion = nu * laplacian(vorticity, i, j, h);
            next[(i, j)] = vorticity[(i, j)] + dt * (diffusion - advection);
        }
    }
}

/// Velocity field from the streamfunction.
///
/// Interior nodes use central differences; boundary nodes get the wall
/// velocities (no-slip everywhere except the moving walls).
pub fn extract_velocity(
    streamfunction: &ScalarField2D,
    h: f64,
    walls: &WallVelocities,
    u: &mut ScalarField2D,
    v: &mut ScalarField2D,
) {
    let ni = streamfunction.nrows();
    let nj = streamfunction.ncols();
    u.fill(0.0);
    v.fill(0.0);

    for j in 1..nj - 1 {
        for i in 1..ni - 1 {
            let (ui, vi) = stream_velocity(streamfunction, i, j, h);
            u[(i, j)] = ui;
            v[(i, j)] = vi;
        }
    }
    apply_wall_velocity(u, v, walls);
}

pub fn velocity_magnitude(u: &ScalarField2D, v: &ScalarField2D) -> ScalarField2D {
    u.zip_map(v, |a, b| (a * a + b * b).sqrt())
}

pub fn all_finite(field: &ScalarField2D) -> bool {
    field.iter().all(|value| value.is_finite())
}

/// Interior node with the smallest streamfunction value: the centre of the
/// primary (clockwise) vortex for a lid moving in +x.
pub fn primary_vortex_center(streamfunction: &ScalarField2D) -> Option<(usize, usize, f64)> {
    let ni = streamfunction.nrows();
    let nj = streamfunction.ncols();
    let mut best: Option<(usize, usize, f64)> = None;
    for j in 1..nj.saturating_sub(1) {
        for i in 1..ni.saturating_sub(1) {
            let value = streamfunction[(i, j)];
            if best.map_or(true, |(_, _, min)| value < min) {
                best = Some((i, j, value));
            }
        }
    }
    best
}
