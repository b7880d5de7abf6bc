pub mod convergence;

use std::time::Instant;

use serde::Serialize;
use tracing::{info, info_span, warn};

use crate::boundary::bc2d::{apply_wall_vorticity, WallVelocities};
use crate::config::{Parameters, StabilityReport};
use crate::domain::grid2d::{Grid2D, ScalarField2D};
use crate::error::SolverError;
use crate::numerical::{
    advance_vorticity, all_finite, extract_velocity, primary_vortex_center, velocity_magnitude,
};
use crate::poisson::{relax_streamfunction, residual_norm};
use convergence::{ConvergenceHistory, ConvergenceMonitor};

const PROGRESS_INTERVAL: usize = 1000;

/// Fields owned by the solver for the duration of a run.
#[derive(Debug, Clone)]
pub struct SimulationState {
    pub vorticity: ScalarField2D,
    /// Copy of `vorticity` taken at the start of the current iteration.
    pub previous_vorticity: ScalarField2D,
    pub streamfunction: ScalarField2D,
    /// Filled once the run terminates.
    pub u: ScalarField2D,
    pub v: ScalarField2D,
}

impl SimulationState {
    pub fn zeros(grid: &Grid2D) -> Self {
        Self {
            vorticity: grid.zeros(),
            previous_vorticity: grid.zeros(),
            streamfunction: grid.zeros(),
            u: grid.zeros(),
            v: grid.zeros(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Termination {
    Converged { iteration: usize, error: f64 },
    ReachedMaxIterations { iterations: usize, last_error: Option<f64> },
    /// Non-finite values appeared during `iteration`; the exposed fields are
    /// those of iteration `iteration - 1`.
    Diverged { iteration: usize },
}

impl Termination {
    pub fn is_converged(&self) -> bool {
        matches!(self, Termination::Converged { .. })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepOutcome {
    Continue,
    Converged(f64),
    Diverged,
    /// The run has terminated; nothing was changed.
    Finished,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunReport {
    pub termination: Termination,
    /// Completed iterations with finite fields.
    pub iterations: usize,
    /// Max-norm of `lap(Fc) + Vo` for the final fields.
    pub poisson_residual: f64,
    pub stability: StabilityReport,
    pub elapsed_ms: f64,
    pub history: ConvergenceHistory,
}

/// Streamfunction-vorticity solver for the driven cavity.
///
/// Each iteration applies Thom's wall vorticity, advances the interior
/// vorticity one explicit pseudo-time step, performs a single relaxation
/// sweep on the streamfunction and checks convergence.
#[derive(Debug)]
pub struct Solver {
    grid: Grid2D,
    params: Parameters,
    walls: WallVelocities,
    state: SimulationState,
    monitor: ConvergenceMonitor,
    iteration: usize,
    vorticity_buffer: ScalarField2D,
    streamfunction_buffer: ScalarField2D,
    previous_streamfunction: ScalarField2D,
    report: Option<RunReport>,
}

impl Solver {
    /// Lid-driven cavity: top wall at `params.lid_velocity`, other walls at rest.
    pub fn new(params: Parameters) -> Result<Self, SolverError> {
        let walls = WallVelocities::lid_driven(params.lid_velocity);
        Self::with_walls(params, walls)
    }

    pub fn with_walls(params: Parameters, walls: WallVelocities) -> Result<Self, SolverError> {
        let grid = params.grid()?;
        let speeds = [walls.left(), walls.right(), walls.bottom(), walls.top()];
        if speeds.iter().any(|s| !s.is_finite()) {
            return Err(SolverError::configuration("walls", "wall velocities must be finite"));
        }

        let monitor = ConvergenceMonitor::new(params.criterion, params.tolerance, params.warmup_iterations);
        Ok(Self {
            state: SimulationState::zeros(&grid),
            vorticity_buffer: grid.zeros(),
            streamfunction_buffer: grid.zeros(),
            previous_streamfunction: grid.zeros(),
            grid,
            params,
            walls,
            monitor,
            iteration: 0,
            report: None,
        })
    }

    pub fn grid(&self) -> &Grid2D {
        &self.grid
    }

    pub fn parameters(&self) -> &Parameters {
        &self.params
    }

    pub fn walls(&self) -> &WallVelocities {
        &self.walls
    }

    pub fn state(&self) -> &SimulationState {
        &self.state
    }

    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn report(&self) -> Option<&RunReport> {
        self.report.as_ref()
    }

    pub fn history(&self) -> &ConvergenceHistory {
        self.monitor.history()
    }

    /// Performs one outer iteration. On non-finite values the fields are
    /// rolled back to the start of the iteration and the counter is not advanced.
    /// Once [`Solver::run`] has returned the fields are frozen and this is a no-op.
    pub fn step(&mut self) -> StepOutcome {
        if self.report.is_some() {
            return StepOutcome::Finished;
        }
        let h = self.grid.h;
        let state = &mut self.state;

        state.previous_vorticity.copy_from(&state.vorticity);
        self.previous_streamfunction.copy_from(&state.streamfunction);

        apply_wall_vorticity(&mut state.vorticity, &state.streamfunction, h, &self.walls);

        advance_vorticity(
            &state.vorticity,
            &state.streamfunction,
            &mut self.vorticity_buffer,
            h,
            self.params.kinematic_viscosity(),
            self.params.dt,
        );
        std::mem::swap(&mut state.vorticity, &mut self.vorticity_buffer);
        if !all_finite(&state.vorticity) {
            self.rollback();
            return StepOutcome::Diverged;
        }

        relax_streamfunction(
            &mut state.streamfunction,
            &state.vorticity,
            h,
            self.params.sweep,
            &mut self.streamfunction_buffer,
        );
        if !all_finite(&state.streamfunction) {
            self.rollback();
            return StepOutcome::Diverged;
        }

        self.iteration += 1;
        match self.monitor.observe(self.iteration, &self.state.vorticity, &self.state.previous_vorticity) {
            Some(error) if self.monitor.is_converged(error) => StepOutcome::Converged(error),
            _ => StepOutcome::Continue,
        }
    }

    fn rollback(&mut self) {
        self.state.vorticity.copy_from(&self.state.previous_vorticity);
        self.state.streamfunction.copy_from(&self.previous_streamfunction);
    }

    /// Iterates until convergence, divergence or `max_iterations`, then
    /// extracts the velocity field. A second call returns the stored report.
    pub fn run(&mut self) -> RunReport {
        if let Some(report) = &self.report {
            return report.clone();
        }

        let stability = self.params.stability_report(&self.grid);
        let run_span = info_span!(
            "cavity_run",
            ni = self.grid.ni(),
            nj = self.grid.nj(),
            re = self.params.reynolds_number()
        )
        .entered();
        if !stability.is_within_limits() {
            warn!(
                diffusion_number = stability.diffusion_number,
                cell_cfl = stability.cell_cfl,
                "Time step exceeds the explicit stability estimate; the run may diverge"
            );
        }
        info!(
            "Starting cavity run: h={:.4e}, dt={:.3e}, max_iterations={}, tolerance={:.1e}, sweep={:?}",
            self.grid.h, self.params.dt, self.params.max_iterations, self.params.tolerance, self.params.sweep
        );

        let start_time = Instant::now();
        let termination = loop {
            if self.iteration >= self.params.max_iterations {
                break Termination::ReachedMaxIterations {
                    iterations: self.iteration,
                    last_error: self.monitor.last_error(),
                };
            }
            match self.step() {
                StepOutcome::Continue => {
                    if self.iteration % PROGRESS_INTERVAL == 0 {
                        info!("Iteration {}: error={:?}", self.iteration, self.monitor.last_error());
                    }
                }
                StepOutcome::Converged(error) => {
                    break Termination::Converged {
                        iteration: self.iteration,
                        error,
                    }
                }
                StepOutcome::Diverged => {
                    warn!(iteration = self.iteration + 1, "Non-finite field detected, stopping");
                    break Termination::Diverged {
                        iteration: self.iteration + 1,
                    };
                }
                // `report` is only set below, after the loop.
                StepOutcome::Finished => unreachable!("step reported a finished run inside run()"),
            }
        };

        extract_velocity(
            &self.state.streamfunction,
            self.grid.h,
            &self.walls,
            &mut self.state.u,
            &mut self.state.v,
        );

        let elapsed = start_time.elapsed();
        let report = RunReport {
            termination,
            iterations: self.iteration,
            poisson_residual: residual_norm(&self.state.streamfunction, &self.state.vorticity, self.grid.h),
            stability,
            elapsed_ms: elapsed.as_secs_f64() * 1e3,
            history: self.monitor.history().clone(),
        };
        info!(
            "Run finished after {} iterations in {:.2}s: {:?}",
            report.iterations,
            elapsed.as_secs_f64(),
            report.termination
        );

        drop(run_span);
        self.report = Some(report.clone());
        report
    }

    /// Speed `sqrt(u² + v²)` at every node.
    pub fn speed(&self) -> ScalarField2D {
        velocity_magnitude(&self.state.u, &self.state.v)
    }

    /// Node `(i, j)` and value of the streamfunction minimum.
    pub fn vortex_center(&self) -> Option<(usize, usize, f64)> {
        primary_vortex_center(&self.state.streamfunction)
    }
}
