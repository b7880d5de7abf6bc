use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, Level};

use crate::domain::grid2d::{Grid2D, GridDimensions2D};
use crate::error::SolverError;
use crate::poisson::SweepStrategy;
use crate::solver::convergence::ConvergenceCriterion;

/// Physical and numerical parameters of one cavity run. Immutable once the
/// solver is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Parameters {
    pub length: f64,         // cavity side L
    pub lid_velocity: f64,   // U
    pub density: f64,        // rho
    pub viscosity: f64,      // dynamic viscosity mu
    pub dt: f64,             // pseudo-time step
    pub ni: usize,
    pub nj: usize,
    pub max_iterations: usize,
    pub tolerance: f64,
    pub warmup_iterations: usize,
    pub sweep: SweepStrategy,
    pub criterion: ConvergenceCriterion,
}

impl Default for Parameters {
    fn default() -> Self {
        Self {
            length: 1.0,
            lid_velocity: 1.0,
            density: 1.0,
            viscosity: 0.01,
            dt: 0.001,
            ni: 81,
            nj: 81,
            max_iterations: 10_000,
            tolerance: 1e-6,
            warmup_iterations: 10,
            sweep: SweepStrategy::GaussSeidel,
            criterion: ConvergenceCriterion::SignedMax,
        }
    }
}

/// Explicit-scheme stability numbers for a parameter set on a given mesh.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StabilityReport {
    /// `nu dt / h²`, stable up to 1/4 in 2D.
    pub diffusion_number: f64,
    /// `U dt / h`, stable up to 1.
    pub cell_cfl: f64,
}

impl StabilityReport {
    pub const DIFFUSION_LIMIT: f64 = 0.25;
    pub const CFL_LIMIT: f64 = 1.0;

    pub fn is_within_limits(&self) -> bool {
        self.diffusion_number <= Self::DIFFUSION_LIMIT && self.cell_cfl <= Self::CFL_LIMIT
    }
}

impl Parameters {
    /// Lid-driven cavity on an `n x n` mesh, everything else default.
    pub fn lid_driven(n: usize) -> Self {
        Self {
            ni: n,
            nj: n,
            ..Self::default()
        }
    }

    pub fn kinematic_viscosity(&self) -> f64 {
        self.viscosity / self.density
    }

    pub fn reynolds_number(&self) -> f64 {
        self.lid_velocity.abs() * self.length / self.kinematic_viscosity()
    }

    pub fn validate(&self) -> Result<(), SolverError> {
        if !self.length.is_finite() || self.length <= 0.0 {
            return Err(SolverError::configuration("length", format!("must be positive, got {}", self.length)));
        }
        if self.ni < 3 {
            return Err(SolverError::configuration("ni", format!("must be at least 3, got {}", self.ni)));
        }
        if self.nj < 3 {
            return Err(SolverError::configuration("nj", format!("must be at least 3, got {}", self.nj)));
        }
        if self.ni != self.nj {
            return Err(SolverError::configuration(
                "nj",
                format!("must equal ni for a square uniform mesh, got ni={} nj={}", self.ni, self.nj),
            ));
        }
        if !self.lid_velocity.is_finite() {
            return Err(SolverError::configuration("lid_velocity", "must be finite"));
        }
        if !self.density.is_finite() || self.density <= 0.0 {
            return Err(SolverError::configuration("density", format!("must be positive, got {}", self.density)));
        }
        if !self.viscosity.is_finite() || self.viscosity <= 0.0 {
            return Err(SolverError::configuration("viscosity", format!("must be positive, got {}", self.viscosity)));
        }
        if !self.dt.is_finite() || self.dt <= 0.0 {
            return Err(SolverError::configuration("dt", format!("must be positive, got {}", self.dt)));
        }
        if !self.tolerance.is_finite() || self.tolerance <= 0.0 {
            return Err(SolverError::configuration("tolerance", format!("must be positive, got {}", self.tolerance)));
        }
        if self.max_iterations == 0 {
            return Err(SolverError::configuration("max_iterations", "must be at least 1"));
        }
        Ok(())
    }

    /// Validates and builds the mesh.
    pub fn grid(&self) -> Result<Grid2D, SolverError> {
        self.validate()?;
        Ok(Grid2D::new(GridDimensions2D(self.ni, self.nj), self.length)?)
    }

    pub fn stability_report(&self, grid: &Grid2D) -> StabilityReport {
        StabilityReport {
            diffusion_number: self.kinematic_viscosity() * self.dt / (grid.h * grid.h),
            cell_cfl: self.lid_velocity.abs() * self.dt / grid.h,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// JSON result file; nothing is written when absent.
    pub path: Option<String>,
    /// Keep every n-th convergence sample in the export (the last one is always kept).
    pub history_stride: usize,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: Some("output/cavity.json".to_string()),
            history_stride: 10,
        }
    }
}

/// Everything the binary needs for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub parameters: Parameters,
    pub output: OutputConfig,
    pub log_level: String,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            parameters: Parameters::default(),
            output: OutputConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl RunConfig {
    pub fn from_json_str(contents: &str) -> Result<Self, SolverError> {
        let config: RunConfig = serde_json::from_str(contents).map_err(|e| SolverError::Parse(e.to_string()))?;
        config.parameters.validate()?;
        config.level()?;
        Ok(config)
    }

    /// Parsed `log_level` (`trace`, `debug`, `info`, `warn`, `error`, case-insensitive).
    pub fn level(&self) -> Result<Level, SolverError> {
        self.log_level.parse::<Level>().map_err(|_| {
            SolverError::configuration(
                "log_level",
                format!("expected one of trace, debug, info, warn, error, got {:?}", self.log_level),
            )
        })
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, SolverError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| SolverError::Io(format!("{}: {}", path.display(), e)))?;
        let config = Self::from_json_str(&contents)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use std::io::Write;
    use tempfile::tempdir;

    fn assert_rejects(params: Parameters, expected: &str) {
        match params.validate() {
            Err(SolverError::Configuration { parameter, .. }) => assert_eq!(parameter, expected),
            other => panic!("expected configuration error for {}, got {:?}", expected, other),
        }
    }

    #[test]
    fn test_defaults_are_valid() {
        let params = Parameters::default();
        assert!(params.validate().is_ok());
        assert_eq!(params.warmup_iterations, 10);
        assert_eq!(params.sweep, SweepStrategy::GaussSeidel);
        assert_eq!(params.criterion, ConvergenceCriterion::SignedMax);
        assert_relative_eq!(params.reynolds_number(), 100.0, epsilon = 1e-9);
    }

    #[test]
    fn test_invalid_parameters_are_named() {
        assert_rejects(Parameters { length: 0.0, ..Parameters::default() }, "length");
        assert_rejects(Parameters { ni: 2, ..Parameters::default() }, "ni");
        assert_rejects(Parameters { ni: 10, nj: 2, ..Parameters::default() }, "nj");
        assert_rejects(Parameters { ni: 10, nj: 12, ..Parameters::default() }, "nj");
        assert_rejects(Parameters { density: 0.0, ..Parameters::default() }, "density");
        assert_rejects(Parameters { viscosity: -1.0, ..Parameters::default() }, "viscosity");
        assert_rejects(Parameters { dt: 0.0, ..Parameters::default() }, "dt");
        assert_rejects(Parameters { tolerance: 0.0, ..Parameters::default() }, "tolerance");
        assert_rejects(Parameters { max_iterations: 0, ..Parameters::default() }, "max_iterations");
        assert_rejects(Parameters { lid_velocity: f64::NAN, ..Parameters::default() }, "lid_velocity");
    }

    #[test]
    fn test_grid_from_parameters() {
        let grid = Parameters::lid_driven(21).grid().unwrap();
        assert_eq!(grid.ni(), 21);
        assert_relative_eq!(grid.h, 0.05);
    }

    #[test]
    fn test_stability_report() {
        let params = Parameters {
            viscosity: 0.01,
            dt: 0.001,
            ..Parameters::lid_driven(21)
        };
        let grid = params.grid().unwrap();
        let report = params.stability_report(&grid);
        assert_relative_eq!(report.diffusion_number, 0.004, epsilon = 1e-12);
        assert_relative_eq!(report.cell_cfl, 0.02, epsilon = 1e-12);
        assert!(report.is_within_limits());

        let unstable = Parameters { dt: 1.0, ..params };
        assert!(!unstable.stability_report(&grid).is_within_limits());
    }

    #[test]
    fn test_run_config_partial_json_uses_defaults() {
        let config = RunConfig::from_json_str(
            r#"{ "parameters": { "ni": 41, "nj": 41, "sweep": "jacobi", "criterion": "absolute_max" },
                 "log_level": "debug" }"#,
        )
        .unwrap();
        assert_eq!(config.parameters.ni, 41);
        assert_eq!(config.parameters.sweep, SweepStrategy::Jacobi);
        assert_eq!(config.parameters.criterion, ConvergenceCriterion::AbsoluteMax);
        assert_eq!(config.parameters.dt, 0.001);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.output, OutputConfig::default());
    }

    #[test]
    fn test_run_config_rejects_bad_input() {
        assert!(matches!(RunConfig::from_json_str("{ not json"), Err(SolverError::Parse(_))));
        assert!(matches!(
            RunConfig::from_json_str(r#"{ "parameters": { "dt": -1.0 } }"#),
            Err(SolverError::Configuration { parameter: "dt", .. })
        ));
    }

    #[test]
    fn test_run_config_log_level() {
        assert_eq!(RunConfig::default().level().unwrap(), Level::INFO);
        let config = RunConfig::from_json_str(r#"{ "log_level": "WARN" }"#).unwrap();
        assert_eq!(config.level().unwrap(), Level::WARN);

        assert!(matches!(
            RunConfig::from_json_str(r#"{ "log_level": "verbose" }"#),
            Err(SolverError::Configuration { parameter: "log_level", .. })
        ));
        let config = RunConfig { log_level: "inf".to_string(), ..RunConfig::default() };
        assert!(config.level().is_err());
    }

    #[test]
    fn test_run_config_from_file() -> Result<(), Box<dyn std::error::Error>> {
        let dir = tempdir()?;
        let path = dir.path().join("run.json");
        let mut file = std::fs::File::create(&path)?;
        write!(file, r#"{{ "parameters": {{ "lid_velocity": 2.0 }}, "output": {{ "path": null }} }}"#)?;

        let config = RunConfig::from_json_file(&path)?;
        assert_eq!(config.parameters.lid_velocity, 2.0);
        assert_eq!(config.output.path, None);

        assert!(matches!(
            RunConfig::from_json_file(dir.path().join("missing.json")),
            Err(SolverError::Io(_))
        ));
        Ok(())
    }
}
