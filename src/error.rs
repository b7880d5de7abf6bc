use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("Invalid grid size: {0}")]
    InvalidGridSize(String),

    #[error("Invalid domain length {0}: must be finite and positive")]
    InvalidLength(f64),

    #[error("Grid must be square for a uniform mesh, got ni={ni}, nj={nj}")]
    NonSquareGrid { ni: usize, nj: usize },
}

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid parameter `{parameter}`: {reason}")]
    Configuration {
        parameter: &'static str,
        reason: String,
    },

    #[error("Grid error: {0}")]
    Grid(#[from] GridError),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Could not parse configuration: {0}")]
    Parse(String),
}

impl SolverError {
    pub fn configuration(parameter: &'static str, reason: impl Into<String>) -> Self {
        SolverError::Configuration {
            parameter,
            reason: reason.into(),
        }
    }
}

impl From<std::io::Error> for SolverError {
    fn from(e: std::io::Error) -> Self {
        SolverError::Io(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_names_parameter() {
        let err = SolverError::configuration("dt", "must be positive");
        assert_eq!(err.to_string(), "Invalid parameter `dt`: must be positive");
    }

    #[test]
    fn test_grid_error_converts() {
        let err: SolverError = GridError::NonSquareGrid { ni: 5, nj: 7 }.into();
        assert!(matches!(err, SolverError::Grid(GridError::NonSquareGrid { ni: 5, nj: 7 })));
    }
}
