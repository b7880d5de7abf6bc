use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use serde::Serialize;
use tracing::info;

use crate::boundary::bc2d::WallVelocities;
use crate::config::Parameters;
use crate::domain::grid2d::ScalarField2D;
use crate::solver::convergence::ConvergenceSample;
use crate::solver::{RunReport, Solver, Termination};

// --- Data Structures for Serialization ---

#[derive(Serialize, Debug)]
struct Metadata<'a> {
    ni: usize,
    nj: usize,
    length: f64,
    h: f64,
    parameters: &'a Parameters,
    walls: &'a WallVelocities,
    termination: Termination,
    iterations: usize,
    poisson_residual: f64,
    elapsed_ms: f64,
    vortex_center: Option<VortexCenter>,
}

#[derive(Serialize, Debug)]
struct VortexCenter {
    x: f64,
    y: f64,
    streamfunction: f64,
}

#[derive(Serialize, Debug)]
struct GridData<'a> {
    x: &'a [f64],
    y: &'a [f64],
}

/// Fields as nested arrays indexed `[i][j]`.
#[derive(Serialize, Debug)]
struct FieldData {
    streamfunction: Vec<Vec<f64>>,
    vorticity: Vec<Vec<f64>>,
    u: Vec<Vec<f64>>,
    v: Vec<Vec<f64>>,
    speed: Vec<Vec<f64>>,
}

#[derive(Serialize, Debug)]
struct SimulationOutput<'a> {
    metadata: Metadata<'a>,
    grid: GridData<'a>,
    fields: FieldData,
    history: Vec<ConvergenceSample>,
}

fn nested(field: &ScalarField2D) -> Vec<Vec<f64>> {
    field
        .row_iter()
        .map(|row| row.iter().copied().collect())
        .collect()
}

// --- Output Manager ---

/// Writes the final fields of a run to a JSON document for external plotting.
#[derive(Debug)]
pub struct JsonOutputManager {
    pub output_filepath: String,
    pub history_stride: usize,
}

impl JsonOutputManager {
    /// Ensures the parent directory for the output file exists.
    pub fn new(output_filepath: String, history_stride: usize) -> Result<Self, io::Error> {
        let path = Path::new(&output_filepath);
        if let Some(parent_dir) = path.parent() {
            if !parent_dir.as_os_str().is_empty() {
                fs::create_dir_all(parent_dir)?;
                info!("Ensured output directory exists: {}", parent_dir.display());
            }
        }

        Ok(Self {
            output_filepath,
            history_stride,
        })
    }

    pub fn write_final_output(&self, solver: &Solver, report: &RunReport) -> Result<(), io::Error> {
        info!("Writing results to JSON file: {}...", self.output_filepath);
        let output_start = Instant::now();

        let grid = solver.grid();
        let state = solver.state();
        let vortex_center = solver.vortex_center().map(|(i, j, value)| VortexCenter {
            x: grid.x[i],
            y: grid.y[j],
            streamfunction: value,
        });

        let output = SimulationOutput {
            metadata: Metadata {
                ni: grid.ni(),
                nj: grid.nj(),
                length: grid.length,
                h: grid.h,
                parameters: solver.parameters(),
                walls: solver.walls(),
                termination: report.termination,
                iterations: report.iterations,
                poisson_residual: report.poisson_residual,
                elapsed_ms: report.elapsed_ms,
                vortex_center,
            },
            grid: GridData {
                x: &grid.x,
                y: &grid.y,
            },
            fields: FieldData {
                streamfunction: nested(&state.streamfunction),
                vorticity: nested(&state.vorticity),
                u: nested(&state.u),
                v: nested(&state.v),
                speed: nested(&solver.speed()),
            },
            history: report.history.sampled(self.history_stride),
        };

        let file = File::create(&self.output_filepath)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, &output)
            .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("Failed to serialize data to JSON: {}", e)))?;
        writer.flush()?;

        info!("JSON output finished in {:.2}ms", output_start.elapsed().as_millis());
        Ok(())
    }
}
