use std::ops::Range;

use nalgebra::DMatrix;
use crate::error::GridError;

/// Two-dimensional scalar field indexed `(i, j)` -> `(x_i, y_j)`.
pub type ScalarField2D = DMatrix<f64>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridDimensions2D(pub usize, pub usize); // ni, nj (nodes, walls included)

#[derive(Debug, Clone, PartialEq)]
pub struct Grid2D {
    pub dimensions: GridDimensions2D,
    pub length: f64,
    pub h: f64,
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Grid2D {
    /// Uniform node-centred mesh on the square `[0, L] x [0, L]`.
    ///
    /// ```text
    ///  j=nj-1  ■ ─ ■ ─ ■ ─ ■ ─ ■     ■ wall node (vorticity from Thom's formula,
    ///          │   │   │   │   │              streamfunction pinned at zero)
    ///          ■ ─ ● ─ ● ─ ● ─ ■     ● interior node (transport + relaxation)
    ///          │   │   │   │   │
    ///          ■ ─ ● ─ ● ─ ● ─ ■
    ///          │   │   │   │   │
    ///  j=0     ■ ─ ■ ─ ■ ─ ■ ─ ■
    ///         i=0             i=ni-1
    /// ```
    ///
    /// Nodes are `h = L / (ni - 1)` apart in both directions, so `ni` must equal `nj`.
    pub fn new(dimensions: GridDimensions2D, length: f64) -> Result<Self, GridError> {
        let GridDimensions2D(ni, nj) = dimensions;
        if ni < 3 || nj < 3 {
            return Err(GridError::InvalidGridSize(format!(
                "node counts (ni, nj) must be at least 3x3, got {}x{}",
                ni, nj
            )));
        }
        if ni != nj {
            return Err(GridError::NonSquareGrid { ni, nj });
        }
        if !length.is_finite() || length <= 0.0 {
            return Err(GridError::InvalidLength(length));
        }

        let h = length / (ni - 1) as f64;
        Ok(Self {
            dimensions,
            length,
            h,
            x: coordinates(ni, length),
            y: coordinates(nj, length),
        })
    }

    pub fn ni(&self) -> usize {
        self.dimensions.0
    }

    pub fn nj(&self) -> usize {
        self.dimensions.1
    }

    /// Interior node indices along x: `1..=ni-2`.
    pub fn interior_i(&self) -> Range<usize> {
        1..self.ni() - 1
    }

    /// Interior node indices along y: `1..=nj-2`.
    pub fn interior_j(&self) -> Range<usize> {
        1..self.nj() - 1
    }

    pub fn is_boundary(&self, i: usize, j: usize) -> bool {
        i == 0 || j == 0 || i == self.ni() - 1 || j == self.nj() - 1
    }

    /// Zero field shaped `ni x nj`.
    pub fn zeros(&self) -> ScalarField2D {
        DMatrix::<f64>::zeros(self.ni(), self.nj())
    }
}

// k * L / (n - 1) keeps the last node exactly on L.
fn coordinates(n: usize, length: f64) -> Vec<f64> {
    let last = (n - 1) as f64;
    (0..n).map(|k| k as f64 * length / last).collect()
}
