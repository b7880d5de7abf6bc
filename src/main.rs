use std::env;

use tracing::{info, warn};

use vortex_cavity::config::RunConfig;
use vortex_cavity::json_io::JsonOutputManager;
use vortex_cavity::solver::{Solver, Termination};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Optional first argument: JSON run configuration.
    let config = match env::args().nth(1) {
        Some(path) => RunConfig::from_json_file(path)?,
        None => RunConfig::default(),
    };

    tracing_subscriber::fmt().with_max_level(config.level()?).init();

    let params = config.parameters.clone();
    info!(
        "Lid-driven cavity: L={}, U={}, Re={:.1}, grid {}x{}",
        params.length,
        params.lid_velocity,
        params.reynolds_number(),
        params.ni,
        params.nj
    );

    let mut solver = Solver::new(params)?;
    let report = solver.run();

    match report.termination {
        Termination::Converged { iteration, error } => {
            info!("Converged at iteration {} (error {:.3e})", iteration, error);
        }
        Termination::ReachedMaxIterations { iterations, last_error } => {
            warn!("Stopped after {} iterations without converging (last error {:?})", iterations, last_error);
        }
        Termination::Diverged { iteration } => {
            warn!("Diverged at iteration {}; reporting fields of iteration {}", iteration, report.iterations);
        }
    }
    if let Some((i, j, value)) = solver.vortex_center() {
        info!(
            "Primary vortex at ({:.4}, {:.4}), streamfunction {:.5}",
            solver.grid().x[i],
            solver.grid().y[j],
            value
        );
    }
    info!("Poisson residual: {:.3e}", report.poisson_residual);

    if let Some(path) = &config.output.path {
        let manager = JsonOutputManager::new(path.clone(), config.output.history_stride)?;
        manager.write_final_output(&solver, &report)?;
    }

    Ok(())
}
