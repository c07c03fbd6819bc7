use jiff::civil::DateTime;
use thiserror::Error;

use crate::support::constraint::ConstraintError;

use super::{ArchetypeId, BuildingError, SolveError};

/// Invalid static inputs, detected before any timestep runs.
#[derive(Debug, Error)]
pub enum ConfigurationError {
    /// A named parameter violated its range constraint.
    #[error("invalid parameter `{name}`")]
    InvalidParameter {
        name: &'static str,
        #[source]
        source: ConstraintError,
    },

    /// Two parameters that must be ordered are not.
    #[error("`{lower}` ({lower_value}) must not exceed `{upper}` ({upper_value})")]
    Misordered {
        lower: &'static str,
        lower_value: f64,
        upper: &'static str,
        upper_value: f64,
    },

    /// Archetype population weights do not sum to one.
    #[error("archetype weights sum to {sum}, expected 1")]
    WeightSum { sum: f64 },

    /// The same archetype id was registered twice.
    #[error("duplicate archetype `{0}`")]
    DuplicateArchetype(ArchetypeId),

    /// No archetypes were supplied.
    #[error("at least one building archetype is required")]
    NoArchetypes,

    /// Supplied HVAC capacities do not cover every archetype.
    #[error("no HVAC capacity for archetype `{0}`")]
    MissingCapacity(ArchetypeId),

    /// No design days were supplied for autosizing.
    #[error("at least one design day is required for autosizing")]
    NoDesignDays,

    /// Valid inputs whose derived canyon geometry is not finite.
    #[error("derived `{quantity}` ({value}) is not finite and positive")]
    DegenerateGeometry { quantity: &'static str, value: f64 },

    /// The step duration must be positive and divide one hour evenly.
    #[error("step of {seconds} s must be positive and divide 3600 s evenly")]
    InvalidStep { seconds: i64 },
}

impl ConfigurationError {
    /// Wraps a constraint violation with the offending parameter name.
    pub(crate) fn invalid(name: &'static str) -> impl FnOnce(ConstraintError) -> Self {
        move |source| Self::InvalidParameter { name, source }
    }
}

/// The main run was started before HVAC capacities were autosized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("HVAC capacities have not been autosized; run autosizing before the main simulation")]
pub struct NotInitializedError;

/// A building collaborator failed while responding to canyon conditions.
#[derive(Debug, Error)]
#[error("building archetype `{archetype}` failed")]
pub struct BuildingFailure {
    pub archetype: ArchetypeId,
    #[source]
    pub source: BuildingError,
}

/// Errors that abort a simulation run.
#[derive(Debug, Error)]
pub enum SimulationError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error(transparent)]
    NotInitialized(#[from] NotInitializedError),

    #[error("canyon solve failed at {time}")]
    Solve {
        time: DateTime,
        #[source]
        source: SolveError,
    },

    #[error(transparent)]
    Building(#[from] BuildingFailure),

    /// The forcing feed had no sample for a simulated time.
    #[error("no forcing available at {time}")]
    MissingForcing { time: DateTime },

    /// Advancing the clock overflowed the supported date range.
    #[error("simulation clock overflow")]
    Clock(#[from] jiff::Error),
}
