//! Interface to the building-energy collaborators.
//!
//! Each building archetype is a black box that reacts to the canyon air it
//! sits in and reports its interior state, HVAC waste heat and utility use.
//! The [`BuildingAggregator`] owns the archetypes and their population
//! weights and is the only place canyon and building models meet.

mod aggregator;
mod load;
mod simple;

pub use aggregator::{AggregatedLoads, BuildingAggregator, BuildingLoadSample, HvacCapacities};
pub use load::{ArchetypeLoad, HvacCapacity, HvacLimit};
pub use simple::{HeatingFuel, SimpleBuilding, SimpleBuildingParameters};

use std::fmt;

use jiff::{SignedDuration, civil::DateTime};
use serde::{Deserialize, Serialize};
use uom::si::f64::{Ratio, ThermodynamicTemperature};

use super::{AtmosphereConstants, ForcingSample};

/// Error type returned by building collaborators.
pub type BuildingError = Box<dyn std::error::Error + Send + Sync>;

/// Identifier of a building archetype (for example `"midrise_apartment"`).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArchetypeId(String);

impl ArchetypeId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchetypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ArchetypeId {
    fn from(id: &str) -> Self {
        Self::new(id)
    }
}

/// Outdoor conditions a building sees during one step.
///
/// Canyon values are the last converged state; the building responds to
/// them once per step, before the canyon solve begins.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingExposure {
    /// End of the step being simulated.
    pub time: DateTime,
    pub step: SignedDuration,
    pub canyon_temp: ThermodynamicTemperature,
    /// Canyon specific humidity, kg/kg.
    pub canyon_hum: Ratio,
    pub wall_temp: ThermodynamicTemperature,
    pub roof_temp: ThermodynamicTemperature,
    /// Facade area per unit of building footprint.
    pub facade_to_footprint: f64,
    pub forcing: ForcingSample,
    /// Air properties shared with the canyon balance.
    pub atmosphere: AtmosphereConstants,
}

/// A building-energy model for one archetype.
///
/// All loads are reported per square meter of building footprint.
pub trait BuildingArchetype: fmt::Debug {
    /// Advances the building one step under `exposure`, honoring `limit`.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildingError`] if the building model cannot produce a
    /// load for this step.
    fn respond(
        &mut self,
        exposure: &BuildingExposure,
        limit: HvacLimit,
    ) -> Result<ArchetypeLoad, BuildingError>;

    /// Clones the model, including its current internal state.
    fn boxed_clone(&self) -> Box<dyn BuildingArchetype>;
}

impl Clone for Box<dyn BuildingArchetype> {
    fn clone(&self) -> Self {
        self.boxed_clone()
    }
}
