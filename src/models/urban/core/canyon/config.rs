use serde::{Deserialize, Serialize};
use twine_solvers::equation::bisection;

use crate::{
    models::urban::core::ConfigurationError,
    support::{
        constraint::{ConstraintError, StrictlyPositive},
        iteration,
    },
};

/// Iteration limits and tolerances for the per-step canyon solve.
///
/// The defaults reproduce reference traces; they are tunable, not physical
/// constants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Cap on outer canyon air iterations.
    pub max_iters: usize,
    /// Canyon and surface temperature tolerance between iterations, K.
    pub temp_tol: f64,
    /// Canyon humidity tolerance between iterations, kg/kg.
    pub hum_tol: f64,
    pub surface: SurfaceSolverConfig,
}

/// Bisection settings for each surface temperature root-find.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSolverConfig {
    pub max_iters: usize,
    /// Absolute tolerance on surface temperature, K.
    pub temp_tol: f64,
    /// Absolute tolerance on the net surface flux, W/m².
    pub residual_tol: f64,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_iters: 50,
            temp_tol: 1e-6,
            hum_tol: 1e-9,
            surface: SurfaceSolverConfig::default(),
        }
    }
}

impl Default for SurfaceSolverConfig {
    fn default() -> Self {
        Self {
            max_iters: 100,
            temp_tol: 1e-9,
            residual_tol: 1e-9,
        }
    }
}

impl SolverConfig {
    /// Checks that every tolerance is positive and every cap nonzero.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::InvalidParameter`] naming the first bad field.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = ConfigurationError::invalid;

        let caps = [
            ("solver.max_iters", self.max_iters),
            ("solver.surface.max_iters", self.surface.max_iters),
        ];
        if let Some((name, _)) = caps.into_iter().find(|&(_, cap)| cap == 0) {
            return Err(invalid(name)(ConstraintError::Zero));
        }
        StrictlyPositive::new(self.temp_tol).map_err(invalid("solver.temp_tol"))?;
        StrictlyPositive::new(self.hum_tol).map_err(invalid("solver.hum_tol"))?;
        StrictlyPositive::new(self.surface.temp_tol).map_err(invalid("solver.surface.temp_tol"))?;
        StrictlyPositive::new(self.surface.residual_tol)
            .map_err(invalid("solver.surface.residual_tol"))?;
        Ok(())
    }

    pub(super) fn iteration(&self) -> iteration::Config {
        iteration::Config {
            max_iters: self.max_iters,
        }
    }

    /// Normalized change between two iterates; converged at `1.0` or below.
    pub(super) fn normalized_change(&self, temp_change: f64, hum_change: f64) -> f64 {
        (temp_change.abs() / self.temp_tol).max(hum_change.abs() / self.hum_tol)
    }
}

impl SurfaceSolverConfig {
    /// Converts this configuration into a bisection solver configuration.
    pub(super) fn bisection(&self) -> bisection::Config {
        bisection::Config {
            max_iters: self.max_iters,
            x_abs_tol: self.temp_tol,
            x_rel_tol: 0.0,
            residual_tol: self.residual_tol,
        }
    }
}
