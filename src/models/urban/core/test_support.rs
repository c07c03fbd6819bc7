//! Shared fixtures for unit tests.

use jiff::{SignedDuration, civil::date};
use uom::si::{
    f64::{HeatFluxDensity, Pressure, Ratio, ThermodynamicTemperature, Velocity},
    heat_flux_density::watt_per_square_meter,
    pressure::pascal,
    ratio::ratio,
    thermodynamic_temperature::degree_celsius,
    velocity::meter_per_second,
};

use crate::support::units::{heat_transfer_coefficient, mass_flux_density};

use super::{
    ArchetypeId, ArchetypeLoad, AtmosphereConstants, BuildingAggregator, BuildingArchetype,
    BuildingError, BuildingExposure, BuildingLoadSample, ForcingSample, HvacLimit, SimpleBuilding,
    SimpleBuildingParameters, UrbanParameters,
};

fn w_m2(value: f64) -> HeatFluxDensity {
    HeatFluxDensity::new::<watt_per_square_meter>(value)
}

/// Overcast, breezy night forcing at `temp_c`.
pub(crate) fn forcing(temp_c: f64) -> ForcingSample {
    ForcingSample {
        temperature: ThermodynamicTemperature::new::<degree_celsius>(temp_c),
        humidity: Ratio::new::<ratio>(0.006),
        wind: Velocity::new::<meter_per_second>(3.0),
        pressure: Pressure::new::<pascal>(101_325.0),
        direct_solar: w_m2(0.0),
        diffuse_solar: w_m2(0.0),
        longwave: w_m2(300.0),
        rural_sensible: w_m2(0.0),
    }
}

/// Canyon air, walls and roof all at `temp_c`.
pub(crate) fn exposure_at(temp_c: f64) -> BuildingExposure {
    let temp = ThermodynamicTemperature::new::<degree_celsius>(temp_c);
    BuildingExposure {
        time: date(2024, 1, 15).at(0, 5, 0, 0),
        step: SignedDuration::from_secs(300),
        canyon_temp: temp,
        canyon_hum: Ratio::new::<ratio>(0.006),
        wall_temp: temp,
        roof_temp: temp,
        facade_to_footprint: 1.0,
        forcing: forcing(temp_c),
        atmosphere: AtmosphereConstants::default(),
    }
}

pub(crate) fn exposure() -> BuildingExposure {
    exposure_at(20.0)
}

/// Aggregated building loads with the given indoor temperature.
pub(crate) fn load_sample(indoor_c: f64) -> BuildingLoadSample {
    BuildingLoadSample {
        indoor_temp: ThermodynamicTemperature::new::<degree_celsius>(indoor_c),
        indoor_hum: Ratio::new::<ratio>(0.008),
        glazing_ratio: Ratio::new::<ratio>(0.4),
        window_conductance: heat_transfer_coefficient(1.08),
        ventilation: mass_flux_density(0.003),
        waste_sensible: w_m2(15.0),
        waste_latent: w_m2(2.0),
        heating: w_m2(10.0),
        sensible_cooling: w_m2(0.0),
        latent_cooling: w_m2(0.0),
        electricity: w_m2(25.0),
        gas: w_m2(12.0),
    }
}

/// Reference district without trees.
pub(crate) fn no_tree_params() -> UrbanParameters {
    UrbanParameters {
        tree_coverage: 0.0,
        ..UrbanParameters::default()
    }
}

/// Two simple buildings that start at their heating setpoint.
pub(crate) fn simple_aggregator() -> BuildingAggregator {
    let building = |floors: f64| -> Box<dyn BuildingArchetype> {
        let params = SimpleBuildingParameters {
            floors,
            initial_temp: 293.15,
            ..SimpleBuildingParameters::default()
        };
        Box::new(SimpleBuilding::new(params).unwrap())
    };
    BuildingAggregator::new([
        (ArchetypeId::from("office"), 0.4, building(6.0)),
        (ArchetypeId::from("residential"), 0.6, building(3.0)),
    ])
    .unwrap()
}

/// A building with a fixed indoor temperature and a 5 W/m² heating demand.
#[derive(Debug, Clone)]
pub(crate) struct ConstantBuilding {
    indoor_c: f64,
}

impl ConstantBuilding {
    pub(crate) fn new(indoor_c: f64) -> Self {
        Self { indoor_c }
    }
}

impl BuildingArchetype for ConstantBuilding {
    fn respond(
        &mut self,
        _exposure: &BuildingExposure,
        limit: HvacLimit,
    ) -> Result<ArchetypeLoad, BuildingError> {
        Ok(ArchetypeLoad {
            indoor_temp: ThermodynamicTemperature::new::<degree_celsius>(self.indoor_c),
            indoor_hum: Ratio::new::<ratio>(0.008),
            glazing_ratio: Ratio::new::<ratio>(0.4),
            window_u: heat_transfer_coefficient(2.0),
            ventilation: mass_flux_density(0.002),
            waste_sensible: w_m2(0.0),
            waste_latent: w_m2(0.0),
            heating: w_m2(limit.heating(5.0)),
            sensible_cooling: w_m2(0.0),
            latent_cooling: w_m2(0.0),
            electricity: w_m2(10.0),
            gas: w_m2(0.0),
        })
    }

    fn boxed_clone(&self) -> Box<dyn BuildingArchetype> {
        Box::new(self.clone())
    }
}
