//! Per-step canyon energy balance.
//!
//! Each step solves four surface balances (road, wall, roof and, when the
//! district has trees, the canopy) and the canyon air balance by fixed-point
//! iteration. Surface temperatures are roots of independent single-node
//! balances; the air temperature and humidity are then linear in the
//! surface temperatures and are solved directly.

mod air;
mod config;
mod error;
mod solve;
mod state;
mod surface;
mod wind;

pub use config::{SolverConfig, SurfaceSolverConfig};
pub use error::SolveError;
pub use solve::{CanyonInput, CanyonSolution};
pub use state::CanyonState;
pub use surface::Surface;

use super::{AtmosphereConstants, ConfigurationError, Geometry, UrbanParameters};

/// The canyon energy-balance solver for one district.
///
/// Holds the static geometry and parameters; the evolving state is passed
/// in and returned through [`CanyonInput`] and [`CanyonSolution`].
#[derive(Debug, Clone, PartialEq)]
pub struct CanyonModel {
    geometry: Geometry,
    params: UrbanParameters,
    config: SolverConfig,
    atmosphere: AtmosphereConstants,
}

impl CanyonModel {
    /// Derives the geometry and checks the solver settings.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the parameters or solver settings
    /// are invalid.
    pub fn new(
        params: UrbanParameters,
        config: SolverConfig,
        atmosphere: AtmosphereConstants,
    ) -> Result<Self, ConfigurationError> {
        let geometry = Geometry::derive(&params)?;
        config.validate()?;
        Ok(Self {
            geometry,
            params,
            config,
            atmosphere,
        })
    }

    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        &self.geometry
    }

    #[must_use]
    pub fn params(&self) -> &UrbanParameters {
        &self.params
    }

    #[must_use]
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    #[must_use]
    pub fn atmosphere(&self) -> &AtmosphereConstants {
        &self.atmosphere
    }

    /// Solves the canyon for one step.
    ///
    /// # Errors
    ///
    /// Returns a [`SolveError`] if a surface balance cannot be bracketed or
    /// a balance becomes non-finite. Hitting an iteration cap is reported
    /// as a warning on the solution instead.
    pub fn solve(&self, input: &CanyonInput) -> Result<CanyonSolution, SolveError> {
        solve::solve(self, input)
    }
}
