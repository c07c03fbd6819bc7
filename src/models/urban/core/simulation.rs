//! Time-stepping driver.
//!
//! [`UrbanSimulation`] owns the whole simulation context: the canyon model,
//! the building aggregator, the clock and the evolving canyon and
//! boundary-layer states. Each step runs the same pipeline, both here and
//! while autosizing:
//!
//! 1. advance the clock,
//! 2. let the buildings respond to the last converged canyon state,
//! 3. solve the canyon balance,
//! 4. advance the boundary layer with the new canyon fluxes.

use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};
use twine_core::Model;
use uom::si::{f64::Ratio, ratio::ratio};

use super::{
    AggregatedLoads, AtmosphereConstants, AutosizeConfig, BoundaryLayerConfig, BoundaryLayerState,
    BuildingAggregator, BuildingExposure, CanyonInput, CanyonModel, CanyonState,
    ConfigurationError, DesignDay, ForcingFeed, ForcingSample, Geometry, HvacAutosizer,
    HvacCapacities, NotInitializedError, SimClock, SimulationError, SolverConfig, StepWarning,
    UrbanParameters,
};

/// Settings for a simulation run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Step duration in seconds; must divide one hour evenly.
    pub step_seconds: i64,
    pub solver: SolverConfig,
    pub atmosphere: AtmosphereConstants,
    pub boundary_layer: BoundaryLayerConfig,
    pub autosize: AutosizeConfig,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            step_seconds: 300,
            solver: SolverConfig::default(),
            atmosphere: AtmosphereConstants::default(),
            boundary_layer: BoundaryLayerConfig::default(),
            autosize: AutosizeConfig::default(),
        }
    }
}

/// Output of one simulated step.
#[derive(Debug, Clone, PartialEq)]
pub struct StepRecord {
    /// End of the step.
    pub time: DateTime,
    /// Seconds since midnight at the end of the step.
    pub sec_day: f64,
    pub canyon: CanyonState,
    pub boundary_layer: BoundaryLayerState,
    pub loads: AggregatedLoads,
    /// Outer canyon iterations used.
    pub iterations: usize,
    pub warnings: Vec<StepWarning>,
}

/// Mutable simulation state shared by the main run and autosizing.
#[derive(Debug, Clone)]
pub(super) struct Context {
    pub(super) model: CanyonModel,
    pub(super) boundary_layer_config: BoundaryLayerConfig,
    pub(super) aggregator: BuildingAggregator,
    pub(super) clock: SimClock,
    pub(super) canyon: CanyonState,
    pub(super) boundary_layer: BoundaryLayerState,
}

impl Context {
    /// A context starting at `start` with canyon and boundary layer at rural conditions.
    pub(super) fn new(
        model: CanyonModel,
        config: &SimulationConfig,
        aggregator: BuildingAggregator,
        start: DateTime,
        initial_forcing: &ForcingSample,
    ) -> Result<Self, ConfigurationError> {
        let clock = SimClock::new(start, config.step_seconds)?;
        let canyon = CanyonState::initial(model.geometry(), model.atmosphere(), initial_forcing);
        let boundary_layer = BoundaryLayerState::initial(&config.boundary_layer, initial_forcing);
        Ok(Self {
            model,
            boundary_layer_config: config.boundary_layer,
            aggregator,
            clock,
            canyon,
            boundary_layer,
        })
    }

    /// Runs one step of the pipeline under `forcing`.
    ///
    /// Buildings see the canyon as it was at the end of the previous step.
    pub(super) fn advance(
        &mut self,
        forcing: &ForcingSample,
        capacities: Option<&HvacCapacities>,
    ) -> Result<StepRecord, SimulationError> {
        let step_start = self.clock.time();
        let mut clock = self.clock;
        let time = clock.tick()?;
        let step = clock.step();

        let exposure = BuildingExposure {
            time,
            step,
            canyon_temp: self.canyon.can_temp,
            canyon_hum: self.canyon.can_hum,
            wall_temp: self.canyon.wall_temp,
            roof_temp: self.canyon.roof_temp,
            facade_to_footprint: self.model.geometry().facade_to_footprint(),
            forcing: *forcing,
            atmosphere: *self.model.atmosphere(),
        };
        let loads = self.aggregator.aggregate(&exposure, capacities)?;

        let input = CanyonInput {
            previous: self.canyon,
            forcing: *forcing,
            loads: loads.sample,
            boundary_layer: self.boundary_layer,
            traffic_fraction: Ratio::new::<ratio>(
                self.model.params().traffic.fraction(step_start),
            ),
            step,
        };
        let solution = self
            .model
            .call(&input)
            .map_err(|source| SimulationError::Solve { time, source })?;

        let mut warnings = solution.warnings;
        let boundary_layer = self.boundary_layer.advance(
            &self.boundary_layer_config,
            self.model.atmosphere(),
            &solution.state,
            forcing,
            step,
            &mut warnings,
        );

        self.clock = clock;
        self.canyon = solution.state;
        self.boundary_layer = boundary_layer;

        Ok(StepRecord {
            time,
            sec_day: clock.sec_day(),
            canyon: solution.state,
            boundary_layer,
            loads,
            iterations: solution.iterations,
            warnings,
        })
    }
}

/// An urban canyon simulation over a fixed-step clock.
///
/// HVAC capacities must be autosized (or supplied) before the first step.
#[derive(Debug, Clone)]
pub struct UrbanSimulation {
    context: Context,
    config: SimulationConfig,
    initial_forcing: ForcingSample,
    capacities: Option<HvacCapacities>,
}

impl UrbanSimulation {
    /// Sets up a simulation starting at `start`.
    ///
    /// The canyon starts at the rural conditions of `initial_forcing` and
    /// the boundary layer at its nocturnal depth.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the urban parameters or any part
    /// of `config` is invalid.
    pub fn new(
        params: UrbanParameters,
        config: SimulationConfig,
        aggregator: BuildingAggregator,
        start: DateTime,
        initial_forcing: ForcingSample,
    ) -> Result<Self, ConfigurationError> {
        config.boundary_layer.validate()?;
        config.autosize.validate()?;
        let model = CanyonModel::new(params, config.solver, config.atmosphere)?;
        let context = Context::new(model, &config, aggregator, start, &initial_forcing)?;

        Ok(Self {
            context,
            config,
            initial_forcing,
            capacities: None,
        })
    }

    /// Sizes HVAC capacity for every archetype from `design_days`.
    ///
    /// The main context is left untouched.
    ///
    /// # Errors
    ///
    /// Returns a [`SimulationError`] if no design days are given or a design
    /// day fails to simulate.
    pub fn autosize(
        &mut self,
        design_days: &[DesignDay],
    ) -> Result<&HvacCapacities, SimulationError> {
        let autosizer =
            HvacAutosizer::new(&self.context.model, &self.config, &self.context.aggregator);
        let capacities = autosizer.autosize(design_days)?;
        Ok(self.capacities.insert(capacities))
    }

    /// Uses previously computed capacities instead of autosizing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingCapacity`] if an archetype has no
    /// capacity. The simulation then keeps its previous capacities, if any.
    pub fn set_capacities(
        &mut self,
        capacities: HvacCapacities,
    ) -> Result<(), ConfigurationError> {
        self.context.aggregator.check_capacities(&capacities)?;
        self.capacities = Some(capacities);
        Ok(())
    }

    #[must_use]
    pub fn capacities(&self) -> Option<&HvacCapacities> {
        self.capacities.as_ref()
    }

    /// Advances one step under `forcing`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::NotInitialized`] before autosizing, or the
    /// error that aborted the step.
    pub fn step(&mut self, forcing: &ForcingSample) -> Result<StepRecord, SimulationError> {
        let capacities = self.capacities.as_ref().ok_or(NotInitializedError)?;
        self.context.advance(forcing, Some(capacities))
    }

    /// Runs `steps` steps, drawing forcing for the end of each step from `feed`.
    ///
    /// # Errors
    ///
    /// Returns [`SimulationError::MissingForcing`] if `feed` has no sample for
    /// a step, or the error that aborted a step.
    pub fn run(
        &mut self,
        feed: &impl ForcingFeed,
        steps: usize,
    ) -> Result<Vec<StepRecord>, SimulationError> {
        if self.capacities.is_none() {
            return Err(NotInitializedError.into());
        }

        let mut records = Vec::with_capacity(steps);
        for _ in 0..steps {
            let time = self.context.clock.time().checked_add(self.context.clock.step())?;
            let forcing = feed
                .forcing_at(time)
                .ok_or(SimulationError::MissingForcing { time })?;
            records.push(self.step(&forcing)?);
        }
        Ok(records)
    }

    #[must_use]
    pub fn geometry(&self) -> &Geometry {
        self.context.model.geometry()
    }

    #[must_use]
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    #[must_use]
    pub fn clock(&self) -> &SimClock {
        &self.context.clock
    }

    /// Canyon state at the end of the last step.
    #[must_use]
    pub fn canyon(&self) -> &CanyonState {
        &self.context.canyon
    }

    #[must_use]
    pub fn boundary_layer(&self) -> &BoundaryLayerState {
        &self.context.boundary_layer
    }

    /// Forcing used to initialize the canyon.
    #[must_use]
    pub fn initial_forcing(&self) -> &ForcingSample {
        &self.initial_forcing
    }
}
