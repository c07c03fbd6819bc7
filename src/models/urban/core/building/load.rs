use uom::si::{
    f64::{HeatFluxDensity, Ratio, ThermodynamicTemperature},
    heat_flux_density::watt_per_square_meter,
};

use crate::support::units::{HeatTransferCoefficient, MassFluxDensity};

/// One archetype's response to a step, per m² of building footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArchetypeLoad {
    pub indoor_temp: ThermodynamicTemperature,
    /// Indoor specific humidity, kg/kg.
    pub indoor_hum: Ratio,
    /// Window-to-wall ratio.
    pub glazing_ratio: Ratio,
    /// Window U-value, per m² of glazing.
    pub window_u: HeatTransferCoefficient,
    /// Outdoor air exchanged by ventilation and infiltration.
    pub ventilation: MassFluxDensity,
    /// Sensible HVAC heat rejected outdoors.
    pub waste_sensible: HeatFluxDensity,
    /// Latent HVAC heat rejected outdoors.
    pub waste_latent: HeatFluxDensity,
    /// Heating delivered to the zone.
    pub heating: HeatFluxDensity,
    /// Sensible cooling delivered to the zone.
    pub sensible_cooling: HeatFluxDensity,
    /// Latent cooling (dehumidification) delivered to the zone.
    pub latent_cooling: HeatFluxDensity,
    pub electricity: HeatFluxDensity,
    pub gas: HeatFluxDensity,
}

/// Peak HVAC capacity of one archetype, per m² of building footprint.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HvacCapacity {
    pub heating: HeatFluxDensity,
    pub sensible_cooling: HeatFluxDensity,
    pub latent_cooling: HeatFluxDensity,
}

/// Capacity constraint applied to a building's HVAC for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HvacLimit {
    /// Meet any load; used while autosizing.
    Unconstrained,
    /// Deliver at most the given capacity.
    Capped(HvacCapacity),
}

impl HvacLimit {
    /// Caps a heating demand, W/m² of footprint.
    pub(crate) fn heating(&self, demand: f64) -> f64 {
        match self {
            Self::Unconstrained => demand,
            Self::Capped(cap) => demand.min(cap.heating.get::<watt_per_square_meter>()),
        }
    }

    /// Caps a sensible cooling demand, W/m² of footprint.
    pub(crate) fn sensible_cooling(&self, demand: f64) -> f64 {
        match self {
            Self::Unconstrained => demand,
            Self::Capped(cap) => demand.min(cap.sensible_cooling.get::<watt_per_square_meter>()),
        }
    }

    /// Caps a latent cooling demand, W/m² of footprint.
    pub(crate) fn latent_cooling(&self, demand: f64) -> f64 {
        match self {
            Self::Unconstrained => demand,
            Self::Capped(cap) => demand.min(cap.latent_cooling.get::<watt_per_square_meter>()),
        }
    }
}
