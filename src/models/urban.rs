//! Urban street-canyon climate model.
//!
//! Converts rural reference weather into the air temperature and humidity
//! inside an urban street canyon. The computational core lives in the
//! internal `core` module; this module re-exports its public types and
//! adapts [`CanyonModel`] to [`twine_core::Model`].
//!
//! # Running a simulation
//!
//! 1. Describe the district with [`UrbanParameters`] and the buildings with
//!    a [`BuildingAggregator`] of weighted [`BuildingArchetype`]s.
//! 2. Create an [`UrbanSimulation`] at a start time.
//! 3. Size HVAC capacity with [`UrbanSimulation::autosize`] over one or more
//!    [`DesignDay`]s.
//! 4. Call [`UrbanSimulation::run`] with a [`ForcingFeed`], or
//!    [`UrbanSimulation::step`] with one [`ForcingSample`] at a time.
//!
//! Each step yields a [`StepRecord`] with the converged [`CanyonState`] and
//! any [`StepWarning`]s raised along the way.

pub(crate) mod core;

pub use self::core::{
    AggregatedLoads, ArchetypeId, ArchetypeLoad, AtmosphereConstants, AutosizeConfig,
    BoundaryLayerConfig, BoundaryLayerState, BuildingAggregator, BuildingArchetype,
    BuildingError, BuildingExposure, BuildingFailure, BuildingLoadSample, CanyonInput,
    CanyonModel, CanyonSolution, CanyonState, ClampedQuantity, ConfigurationError,
    ConvergenceScope, ConvergenceWarning, DesignDay, ForcingFeed, ForcingSample, Geometry,
    HeatingFuel, HourlyForcing, HvacAutosizer, HvacCapacities, HvacCapacity, HvacLimit,
    NotInitializedError, NumericClampWarning, SimClock, SimpleBuilding, SimpleBuildingParameters,
    SimulationConfig, SimulationError, SolveError, SolverConfig, StepRecord, StepWarning, Surface,
    SurfaceMaterial, SurfaceSolverConfig, TrafficSchedule, UrbanParameters, UrbanSimulation,
    VegetationParameters,
};

use twine_core::Model;

impl Model for CanyonModel {
    type Input = CanyonInput;
    type Output = CanyonSolution;
    type Error = SolveError;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        self.solve(input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::SignedDuration;
    use uom::si::{f64::Ratio, ratio::ratio};

    use crate::models::urban::core::test_support::{forcing, load_sample};

    #[test]
    fn model_call_matches_core_solve() {
        let model = CanyonModel::new(
            UrbanParameters::default(),
            SolverConfig::default(),
            AtmosphereConstants::default(),
        )
        .unwrap();
        let forcing = forcing(15.0);
        let input = CanyonInput {
            previous: CanyonState::initial(model.geometry(), model.atmosphere(), &forcing),
            forcing,
            loads: load_sample(20.0),
            boundary_layer: BoundaryLayerState::initial(&BoundaryLayerConfig::default(), &forcing),
            traffic_fraction: Ratio::new::<ratio>(0.2),
            step: SignedDuration::from_secs(300),
        };

        assert_eq!(model.call(&input).unwrap(), model.solve(&input).unwrap());
    }
}
