use serde::{Deserialize, Serialize};

use crate::domain::grid2d::ScalarField2D;

/// Tangential wall speeds on a pair of opposite faces: `(low, high)`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct FaceBoundary(pub f64, pub f64);

/// Tangential speed of each cavity wall.
///
/// `x` holds the left (`i = 0`) and right (`i = ni-1`) walls, whose tangential
/// component is `v`. `y` holds the bottom (`j = 0`) and top (`j = nj-1`) walls,
/// whose tangential component is `u`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct WallVelocities {
    pub x: FaceBoundary,
    pub y: FaceBoundary,
}

impl WallVelocities {
    /// Stationary walls with the top wall sliding at `lid_speed`.
    pub fn lid_driven(lid_speed: f64) -> Self {
        Self {
            x: FaceBoundary(0.0, 0.0),
            y: FaceBoundary(0.0, lid_speed),
        }
    }

    pub fn left(&self) -> f64 {
        self.x.0
    }

    pub fn right(&self) -> f64 {
        self.x.1
    }

    pub fn bottom(&self) -> f64 {
        self.y.0
    }

    pub fn top(&self) -> f64 {
        self.y.1
    }

    /// Largest tangential wall speed, used for the cell CFL estimate.
    pub fn max_speed(&self) -> f64 {
        [self.left(), self.right(), self.bottom(), self.top()]
            .iter()
            .fold(0.0_f64, |acc, s| acc.max(s.abs()))
    }
}

/// Wall vorticity from Thom's formula.
///
/// The streamfunction is zero on every wall, so the one-sided expansion
/// `Fc_adj = ±h·U_wall - h²/2·Vo_wall` gives:
///
/// - top:    `Vo[i, nj-1] = -2 Fc[i, nj-2] / h² - 2 U_top / h`
/// - bottom: `Vo[i, 0]    = -2 Fc[i, 1]    / h² + 2 U_bottom / h`
/// - left:   `Vo[0, j]    = -2 Fc[1, j]    / h² - 2 V_left / h`
/// - right:  `Vo[ni-1, j] = -2 Fc[ni-2, j] / h² + 2 V_right / h`
///
/// Rows (bottom, top) are written first, then columns (left, right), so the
/// four corner nodes end up holding the side-wall value. The top-row formula
/// therefore holds for `1 <= i <= ni-2` only, not at `i = 0` or `i = ni-1`.
pub fn apply_wall_vorticity(
    vorticity: &mut ScalarField2D,
    streamfunction: &ScalarField2D,
    h: f64,
    walls: &WallVelocities,
) {
    let ni = vorticity.nrows();
    let nj = vorticity.ncols();
    let h2 = h * h;

    for i in 0..ni {
        vorticity[(i, nj - 1)] = -2.0 * streamfunction[(i, nj - 2)] / h2 - 2.0 * walls.top() / h;
        vorticity[(i, 0)] = -2.0 * streamfunction[(i, 1)] / h2 + 2.0 * walls.bottom() / h;
    }

    for j in 0..nj {
        vorticity[(0, j)] = -2.0 * streamfunction[(1, j)] / h2 - 2.0 * walls.left() / h;
        vorticity[(ni - 1, j)] = -2.0 * streamfunction[(ni - 2, j)] / h2 + 2.0 * walls.right() / h;
    }
}

/// Writes the wall velocities onto the boundary nodes of `u` and `v`.
///
/// Every row/column first gets the no-slip zero. Side walls then set `v`
/// on their non-corner nodes; bottom and top set `u` along the full row,
/// so the top row carries `u = U_top, v = 0` at every `i`.
pub fn apply_wall_velocity(u: &mut ScalarField2D, v: &mut ScalarField2D, walls: &WallVelocities) {
    let ni = u.nrows();
    let nj = u.ncols();

    for j in 0..nj {
        u[(0, j)] = 0.0;
        u[(ni - 1, j)] = 0.0;
        v[(0, j)] = 0.0;
        v[(ni - 1, j)] = 0.0;
    }
    for j in 1..nj - 1 {
        v[(0, j)] = walls.left();
        v[(ni - 1, j)] = walls.right();
    }
    for i in 0..ni {
        u[(i, 0)] = walls.bottom();
        u[(i, nj - 1)] = walls.top();
        v[(i, 0)] = 0.0;
        v[(i, nj - 1)] = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::DMatrix;

    fn ramp_streamfunction(n: usize) -> DMatrix<f64> {
        // Zero on walls, arbitrary interior values.
        DMatrix::from_fn(n, n, |i, j| {
            if i == 0 || j == 0 || i == n - 1 || j == n - 1 {
                0.0
            } else {
                -0.01 * (i * n + j) as f64
            }
        })
    }

    #[test]
    fn test_lid_driven_walls() {
        let walls = WallVelocities::lid_driven(2.5);
        assert_eq!(walls.top(), 2.5);
        assert_eq!(walls.bottom(), 0.0);
        assert_eq!(walls.left(), 0.0);
        assert_eq!(walls.right(), 0.0);
        assert_eq!(walls.max_speed(), 2.5);
        assert_eq!(WallVelocities::lid_driven(-3.0).max_speed(), 3.0);
    }

    #[test]
    fn test_apply_wall_vorticity_lid_driven() {
        let n = 6;
        let h = 0.2;
        let lid = 1.0;
        let fc = ramp_streamfunction(n);
        let mut vo = DMatrix::<f64>::from_element(n, n, 7.0);

        apply_wall_vorticity(&mut vo, &fc, h, &WallVelocities::lid_driven(lid));

        for i in 1..n - 1 {
            let expected_top = -2.0 * fc[(i, n - 2)] / (h * h) - 2.0 * lid / h;
            assert_relative_eq!(vo[(i, n - 1)], expected_top, epsilon = 1e-12);
            assert_relative_eq!(vo[(i, 0)], -2.0 * fc[(i, 1)] / (h * h), epsilon = 1e-12);
        }
        for j in 0..n {
            assert_relative_eq!(vo[(0, j)], -2.0 * fc[(1, j)] / (h * h), epsilon = 1e-12);
            assert_relative_eq!(vo[(n - 1, j)], -2.0 * fc[(n - 2, j)] / (h * h), epsilon = 1e-12);
        }
        // Interior untouched.
        for i in 1..n - 1 {
            for j in 1..n - 1 {
                assert_eq!(vo[(i, j)], 7.0);
            }
        }
    }

    #[test]
    fn test_corners_take_side_wall_value() {
        let n = 5;
        let h = 0.25;
        let fc = DMatrix::<f64>::zeros(n, n);
        let mut vo = DMatrix::<f64>::zeros(n, n);

        apply_wall_vorticity(&mut vo, &fc, h, &WallVelocities::lid_driven(1.0));

        // Top row without corners carries the lid term, corners carry the side-wall value.
        assert_relative_eq!(vo[(2, n - 1)], -8.0, epsilon = 1e-12);
        assert_eq!(vo[(0, n - 1)], 0.0);
        assert_eq!(vo[(n - 1, n - 1)], 0.0);
        assert_eq!(vo[(0, 0)], 0.0);
    }

    #[test]
    fn test_apply_wall_vorticity_all_walls_moving() {
        let n = 5;
        let h = 0.5;
        let fc = DMatrix::<f64>::zeros(n, n);
        let mut vo = DMatrix::<f64>::zeros(n, n);
        let walls = WallVelocities {
            x: FaceBoundary(1.0, 2.0),
            y: FaceBoundary(3.0, 4.0),
        };

        apply_wall_vorticity(&mut vo, &fc, h, &walls);

        assert_relative_eq!(vo[(2, n - 1)], -16.0);
        assert_relative_eq!(vo[(2, 0)], 12.0);
        assert_relative_eq!(vo[(0, 2)], -4.0);
        assert_relative_eq!(vo[(n - 1, 2)], 8.0);
    }

    #[test]
    fn test_apply_wall_velocity() {
        let n = 4;
        let mut u = DMatrix::<f64>::from_element(n, n, 9.0);
        let mut v = DMatrix::<f64>::from_element(n, n, 9.0);

        apply_wall_velocity(&mut u, &mut v, &WallVelocities::lid_driven(1.0));

        for i in 0..n {
            assert_eq!(u[(i, n - 1)], 1.0);
            assert_eq!(v[(i, n - 1)], 0.0);
            assert_eq!(u[(i, 0)], 0.0);
            assert_eq!(v[(i, 0)], 0.0);
        }
        for j in 0..n - 1 {
            assert_eq!(u[(0, j)], 0.0);
            assert_eq!(v[(0, j)], 0.0);
            assert_eq!(u[(n - 1, j)], 0.0);
            assert_eq!(v[(n - 1, j)], 0.0);
        }
        // Interior untouched.
        assert_eq!(u[(1, 1)], 9.0);
        assert_eq!(v[(2, 2)], 9.0);
    }
}
