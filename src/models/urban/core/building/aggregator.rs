use std::collections::BTreeMap;

use uom::si::{
    f64::{HeatFluxDensity, Ratio, ThermodynamicTemperature},
    heat_flux_density::watt_per_square_meter,
    ratio::ratio,
    thermodynamic_temperature::kelvin,
};

use crate::{
    models::urban::core::{BuildingFailure, ConfigurationError, SimulationError},
    support::{
        constraint::UnitInterval,
        units::{
            HeatTransferCoefficient, MassFluxDensity, heat_transfer_coefficient, mass_flux_density,
        },
    },
};

use super::{
    ArchetypeId, ArchetypeLoad, BuildingArchetype, BuildingExposure, HvacCapacity, HvacLimit,
};

/// Allowed deviation of the weight sum from one.
const WEIGHT_SUM_TOL: f64 = 1e-9;

/// Building archetypes keyed by id, each with a population weight.
///
/// Weights are validated once, at construction: each lies in `[0, 1]` and
/// together they sum to one.
#[derive(Debug, Clone)]
pub struct BuildingAggregator {
    archetypes: BTreeMap<ArchetypeId, Weighted>,
}

#[derive(Debug, Clone)]
struct Weighted {
    weight: f64,
    model: Box<dyn BuildingArchetype>,
}

/// Building loads for one step, weighted across archetypes.
///
/// Intensities are per m² of building footprint. Windows are reported as a
/// conductance per m² of facade (`Σ wᵢ · glazingᵢ · Uᵢ`) so the canyon can
/// solve its air temperature and the window exchange together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuildingLoadSample {
    pub indoor_temp: ThermodynamicTemperature,
    pub indoor_hum: Ratio,
    pub glazing_ratio: Ratio,
    pub window_conductance: HeatTransferCoefficient,
    pub ventilation: MassFluxDensity,
    pub waste_sensible: HeatFluxDensity,
    pub waste_latent: HeatFluxDensity,
    pub heating: HeatFluxDensity,
    pub sensible_cooling: HeatFluxDensity,
    pub latent_cooling: HeatFluxDensity,
    pub electricity: HeatFluxDensity,
    pub gas: HeatFluxDensity,
}

/// The weighted sample together with each archetype's own load.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregatedLoads {
    pub sample: BuildingLoadSample,
    pub by_archetype: BTreeMap<ArchetypeId, ArchetypeLoad>,
}

/// Autosized HVAC capacity for each archetype.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct HvacCapacities(BTreeMap<ArchetypeId, HvacCapacity>);

impl HvacCapacities {
    #[must_use]
    pub fn new(capacities: BTreeMap<ArchetypeId, HvacCapacity>) -> Self {
        Self(capacities)
    }

    #[must_use]
    pub fn get(&self, id: &ArchetypeId) -> Option<&HvacCapacity> {
        self.0.get(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ArchetypeId, &HvacCapacity)> {
        self.0.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl BuildingAggregator {
    /// Builds an aggregator from `(id, weight, model)` entries.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if there are no entries, an id is
    /// repeated, a weight is outside `[0, 1]`, or the weights do not sum to 1.
    pub fn new(
        entries: impl IntoIterator<Item = (ArchetypeId, f64, Box<dyn BuildingArchetype>)>,
    ) -> Result<Self, ConfigurationError> {
        let mut archetypes = BTreeMap::new();

        for (id, weight, model) in entries {
            UnitInterval::new(weight).map_err(ConfigurationError::invalid("archetype weight"))?;
            if archetypes.contains_key(&id) {
                return Err(ConfigurationError::DuplicateArchetype(id));
            }
            archetypes.insert(id, Weighted { weight, model });
        }

        if archetypes.is_empty() {
            return Err(ConfigurationError::NoArchetypes);
        }

        let sum: f64 = archetypes.values().map(|a| a.weight).sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOL {
            return Err(ConfigurationError::WeightSum { sum });
        }

        Ok(Self { archetypes })
    }

    /// Archetype ids and weights, in id order.
    pub fn weights(&self) -> impl Iterator<Item = (&ArchetypeId, f64)> {
        self.archetypes.iter().map(|(id, a)| (id, a.weight))
    }

    /// Checks that `capacities` sizes every archetype.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingCapacity`] naming the first
    /// archetype, in id order, without a capacity.
    pub fn check_capacities(
        &self,
        capacities: &HvacCapacities,
    ) -> Result<(), ConfigurationError> {
        match self.archetypes.keys().find(|id| capacities.get(id).is_none()) {
            Some(id) => Err(ConfigurationError::MissingCapacity(id.clone())),
            None => Ok(()),
        }
    }

    /// Forwards `exposure` to every archetype and weights their responses.
    ///
    /// With `capacities` each archetype is capped at its own capacity; with
    /// `None`, as while autosizing, every archetype runs unconstrained.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::MissingCapacity`] before any archetype
    /// steps if `capacities` lacks one, or a [`BuildingFailure`] naming the
    /// first archetype that fails.
    pub fn aggregate(
        &mut self,
        exposure: &BuildingExposure,
        capacities: Option<&HvacCapacities>,
    ) -> Result<AggregatedLoads, SimulationError> {
        if let Some(capacities) = capacities {
            self.check_capacities(capacities)?;
        }

        let mut by_archetype = BTreeMap::new();
        let mut sum = WeightedSum::default();

        for (id, archetype) in &mut self.archetypes {
            let limit = match capacities {
                None => HvacLimit::Unconstrained,
                Some(capacities) => capacities
                    .get(id)
                    .map(|cap| HvacLimit::Capped(*cap))
                    .ok_or_else(|| ConfigurationError::MissingCapacity(id.clone()))?,
            };

            let load = archetype
                .model
                .respond(exposure, limit)
                .map_err(|source| BuildingFailure {
                    archetype: id.clone(),
                    source,
                })?;

            sum.add(archetype.weight, &load);
            by_archetype.insert(id.clone(), load);
        }

        Ok(AggregatedLoads {
            sample: sum.finish(),
            by_archetype,
        })
    }
}

/// Running weighted sums in SI `f64`.
#[derive(Debug, Default)]
struct WeightedSum {
    indoor_temp: f64,
    indoor_hum: f64,
    glazing_ratio: f64,
    window_conductance: f64,
    ventilation: f64,
    waste_sensible: f64,
    waste_latent: f64,
    heating: f64,
    sensible_cooling: f64,
    latent_cooling: f64,
    electricity: f64,
    gas: f64,
}

impl WeightedSum {
    fn add(&mut self, w: f64, load: &ArchetypeLoad) {
        let flux = |q: HeatFluxDensity| w * q.get::<watt_per_square_meter>();
        let glazing = load.glazing_ratio.get::<ratio>();

        self.indoor_temp += w * load.indoor_temp.get::<kelvin>();
        self.indoor_hum += w * load.indoor_hum.get::<ratio>();
        self.glazing_ratio += w * glazing;
        self.window_conductance += w * glazing * load.window_u.value;
        self.ventilation += w * load.ventilation.value;
        self.waste_sensible += flux(load.waste_sensible);
        self.waste_latent += flux(load.waste_latent);
        self.heating += flux(load.heating);
        self.sensible_cooling += flux(load.sensible_cooling);
        self.latent_cooling += flux(load.latent_cooling);
        self.electricity += flux(load.electricity);
        self.gas += flux(load.gas);
    }

    fn finish(self) -> BuildingLoadSample {
        let flux = HeatFluxDensity::new::<watt_per_square_meter>;
        BuildingLoadSample {
            indoor_temp: ThermodynamicTemperature::new::<kelvin>(self.indoor_temp),
            indoor_hum: Ratio::new::<ratio>(self.indoor_hum),
            glazing_ratio: Ratio::new::<ratio>(self.glazing_ratio),
            window_conductance: heat_transfer_coefficient(self.window_conductance),
            ventilation: mass_flux_density(self.ventilation),
            waste_sensible: flux(self.waste_sensible),
            waste_latent: flux(self.waste_latent),
            heating: flux(self.heating),
            sensible_cooling: flux(self.sensible_cooling),
            latent_cooling: flux(self.latent_cooling),
            electricity: flux(self.electricity),
            gas: flux(self.gas),
        }
    }
}
