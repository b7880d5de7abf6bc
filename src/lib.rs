//! Steady lid-driven cavity flow in streamfunction-vorticity form.
//!
//! [`solver::Solver`] owns every field for the duration of a run and exposes
//! them read-only afterwards; [`json_io`] hands them to external plotting tools.

pub mod boundary;
pub mod config;
pub mod domain;
pub mod error;
pub mod json_io;
pub mod numerical;
pub mod poisson;
pub mod solver;
