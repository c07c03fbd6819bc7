//! Urban canyon energy balance.
//!
//! The canyon is a lumped control volume between two facades and the road.
//! Every step it exchanges heat with its surfaces, the buildings lining it,
//! traffic, trees, and the urban boundary layer above. Geometry is derived
//! once from the district parameters; the per-step state evolves from one
//! converged balance to the next.

mod atmosphere;
mod autosize;
mod boundary_layer;
mod building;
mod canyon;
mod clock;
mod error;
mod forcing;
mod geometry;
mod params;
mod simulation;
mod warning;

#[cfg(test)]
pub(crate) mod test_support;

pub use atmosphere::AtmosphereConstants;
pub use autosize::{AutosizeConfig, DesignDay, HvacAutosizer};
pub use boundary_layer::{BoundaryLayerConfig, BoundaryLayerState};
pub use building::{
    AggregatedLoads, ArchetypeId, ArchetypeLoad, BuildingAggregator, BuildingArchetype,
    BuildingError, BuildingExposure, BuildingLoadSample, HeatingFuel, HvacCapacities,
    HvacCapacity, HvacLimit, SimpleBuilding, SimpleBuildingParameters,
};
pub use canyon::{
    CanyonInput, CanyonModel, CanyonSolution, CanyonState, SolveError, SolverConfig, Surface,
    SurfaceSolverConfig,
};
pub use clock::SimClock;
pub use error::{BuildingFailure, ConfigurationError, NotInitializedError, SimulationError};
pub use forcing::{ForcingFeed, ForcingSample, HourlyForcing};
pub use geometry::Geometry;
pub use params::{SurfaceMaterial, TrafficSchedule, UrbanParameters, VegetationParameters};
pub use simulation::{SimulationConfig, StepRecord, UrbanSimulation};
pub use warning::{
    ClampedQuantity, ConvergenceScope, ConvergenceWarning, NumericClampWarning, StepWarning,
};
