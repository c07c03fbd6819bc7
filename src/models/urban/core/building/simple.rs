use serde::{Deserialize, Serialize};
use uom::si::{
    f64::{HeatFluxDensity, Ratio, ThermodynamicTemperature},
    heat_flux_density::watt_per_square_meter,
    pressure::pascal,
    ratio::ratio,
    thermodynamic_temperature::kelvin,
};

use crate::{
    models::urban::core::{ConfigurationError, ForcingSample, atmosphere::moist_air_density},
    support::{
        constraint::{NonNegative, StrictlyPositive, UnitInterval},
        units::{heat_transfer_coefficient, mass_flux_density},
    },
};

use super::{ArchetypeLoad, BuildingArchetype, BuildingError, BuildingExposure, HvacLimit};

/// Fuel used for space heating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HeatingFuel {
    Gas,
    Electric,
}

/// Parameters of a [`SimpleBuilding`].
///
/// Floor-based quantities are per m² of floor area; the building converts
/// them to its footprint using `floors`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimpleBuildingParameters {
    pub floors: f64,
    /// m.
    pub floor_height: f64,
    /// K.
    pub heating_setpoint: f64,
    /// K.
    pub cooling_setpoint: f64,
    /// Indoor specific humidity above which the HVAC dehumidifies, kg/kg.
    pub humidity_setpoint: f64,
    pub glazing_ratio: f64,
    /// W/m²·K of glazing.
    pub window_u: f64,
    pub shgc: f64,
    /// W/m²·K of opaque wall.
    pub wall_u: f64,
    /// W/m²·K of roof.
    pub roof_u: f64,
    /// Air changes per hour.
    pub infiltration_ach: f64,
    /// Mechanical outdoor air, m³/s per m² of floor.
    pub ventilation: f64,
    /// Lighting and plug loads, W/m² of floor.
    pub internal_sensible: f64,
    /// Occupant moisture release, W/m² of floor.
    pub internal_latent: f64,
    /// Cooling coefficient of performance.
    pub cop: f64,
    /// Heating efficiency (furnace efficiency, or heat pump COP when electric).
    pub heating_efficiency: f64,
    pub heating_fuel: HeatingFuel,
    /// Lumped zone heat capacity, J/m²·K of floor.
    pub zone_capacity: f64,
    /// K.
    pub initial_temp: f64,
    /// kg/kg.
    pub initial_hum: f64,
}

impl Default for SimpleBuildingParameters {
    fn default() -> Self {
        Self {
            floors: 3.0,
            floor_height: 3.0,
            heating_setpoint: 293.15,
            cooling_setpoint: 297.15,
            humidity_setpoint: 0.012,
            glazing_ratio: 0.4,
            window_u: 2.7,
            shgc: 0.6,
            wall_u: 0.8,
            roof_u: 0.5,
            infiltration_ach: 0.5,
            ventilation: 6.0e-4,
            internal_sensible: 8.0,
            internal_latent: 1.5,
            cop: 3.0,
            heating_efficiency: 0.8,
            heating_fuel: HeatingFuel::Gas,
            zone_capacity: 1.5e5,
            initial_temp: 295.15,
            initial_hum: 0.008,
        }
    }
}

impl SimpleBuildingParameters {
    fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = ConfigurationError::invalid;

        StrictlyPositive::new(self.floors).map_err(invalid("floors"))?;
        StrictlyPositive::new(self.floor_height).map_err(invalid("floor_height"))?;
        StrictlyPositive::new(self.heating_setpoint).map_err(invalid("heating_setpoint"))?;
        StrictlyPositive::new(self.cooling_setpoint).map_err(invalid("cooling_setpoint"))?;
        NonNegative::new(self.humidity_setpoint).map_err(invalid("humidity_setpoint"))?;
        UnitInterval::new(self.glazing_ratio).map_err(invalid("glazing_ratio"))?;
        NonNegative::new(self.window_u).map_err(invalid("window_u"))?;
        UnitInterval::new(self.shgc).map_err(invalid("shgc"))?;
        NonNegative::new(self.wall_u).map_err(invalid("wall_u"))?;
        NonNegative::new(self.roof_u).map_err(invalid("roof_u"))?;
        NonNegative::new(self.infiltration_ach).map_err(invalid("infiltration_ach"))?;
        NonNegative::new(self.ventilation).map_err(invalid("ventilation"))?;
        NonNegative::new(self.internal_sensible).map_err(invalid("internal_sensible"))?;
        NonNegative::new(self.internal_latent).map_err(invalid("internal_latent"))?;
        StrictlyPositive::new(self.cop).map_err(invalid("cop"))?;
        StrictlyPositive::new(self.heating_efficiency).map_err(invalid("heating_efficiency"))?;
        StrictlyPositive::new(self.zone_capacity).map_err(invalid("zone_capacity"))?;
        StrictlyPositive::new(self.initial_temp).map_err(invalid("initial_temp"))?;
        NonNegative::new(self.initial_hum).map_err(invalid("initial_hum"))?;

        if self.heating_setpoint > self.cooling_setpoint {
            return Err(ConfigurationError::Misordered {
                lower: "heating_setpoint",
                lower_value: self.heating_setpoint,
                upper: "cooling_setpoint",
                upper_value: self.cooling_setpoint,
            });
        }

        Ok(())
    }
}

/// A single-zone, lumped-capacitance building.
///
/// The zone air and contents form one thermal node coupled to the canyon
/// through windows, ventilation and infiltration, and to the wall and roof
/// surface nodes through the opaque envelope. Each step the zone is first
/// allowed to float; if it leaves the setpoint band the HVAC supplies the
/// load needed to return it, up to the capacity limit.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleBuilding {
    params: SimpleBuildingParameters,
    temp: f64,
    hum: f64,
}

impl SimpleBuilding {
    /// Creates a building at its initial indoor conditions.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if any parameter is out of range or
    /// the heating setpoint exceeds the cooling setpoint.
    pub fn new(params: SimpleBuildingParameters) -> Result<Self, ConfigurationError> {
        params.validate()?;
        Ok(Self {
            params,
            temp: params.initial_temp,
            hum: params.initial_hum,
        })
    }

    #[must_use]
    pub fn parameters(&self) -> &SimpleBuildingParameters {
        &self.params
    }

    #[must_use]
    pub fn indoor_temp(&self) -> ThermodynamicTemperature {
        ThermodynamicTemperature::new::<kelvin>(self.temp)
    }

    #[must_use]
    pub fn indoor_hum(&self) -> Ratio {
        Ratio::new::<ratio>(self.hum)
    }
}

impl BuildingArchetype for SimpleBuilding {
    fn respond(
        &mut self,
        exposure: &BuildingExposure,
        limit: HvacLimit,
    ) -> Result<ArchetypeLoad, BuildingError> {
        let p = &self.params;
        let dt = exposure.step.as_secs_f64();
        if !dt.is_finite() || dt <= 0.0 {
            return Err(format!("step of {dt} s is not positive").into());
        }

        let cp = exposure.atmosphere.cp;
        let latent_heat = exposure.atmosphere.latent_heat;
        let t_can = exposure.canyon_temp.get::<kelvin>();
        let q_can = exposure.canyon_hum.get::<ratio>();
        let t_wall = exposure.wall_temp.get::<kelvin>();
        let t_roof = exposure.roof_temp.get::<kelvin>();
        let facade = exposure.facade_to_footprint;
        let rho = moist_air_density(exposure.forcing.pressure.get::<pascal>(), t_can, q_can);

        // Everything below is per m² of footprint.
        let floor_area = p.floors;
        let volume = floor_area * p.floor_height;
        let outdoor_air = rho * (p.ventilation * floor_area + p.infiltration_ach * volume / 3600.0);

        let ua_wall = (1.0 - p.glazing_ratio) * p.wall_u * facade;
        let ua_window = p.glazing_ratio * p.window_u * facade;
        let ua_roof = p.roof_u;
        let g_vent = outdoor_air * cp;
        let solar = p.shgc * p.glazing_ratio * facade * facade_irradiance(&exposure.forcing);
        let gains = p.internal_sensible * floor_area + solar;
        let storage = p.zone_capacity * floor_area / dt;

        let den = storage + ua_wall + ua_window + ua_roof + g_vent;
        let num = storage * self.temp
            + ua_wall * t_wall
            + ua_roof * t_roof
            + (ua_window + g_vent) * t_can
            + gains;
        let free = num / den;

        let (heating, sensible_cooling) = if free < p.heating_setpoint {
            (limit.heating(den * p.heating_setpoint - num), 0.0)
        } else if free > p.cooling_setpoint {
            (0.0, limit.sensible_cooling(num - den * p.cooling_setpoint))
        } else {
            (0.0, 0.0)
        };
        let temp = (num + heating - sensible_cooling) / den;

        let moisture_storage = rho * volume / dt;
        let moisture = p.internal_latent * floor_area / latent_heat;
        let hum_den = moisture_storage + outdoor_air;
        let hum_num = moisture_storage * self.hum + outdoor_air * q_can + moisture;

        let latent_cooling = if hum_num / hum_den > p.humidity_setpoint {
            limit.latent_cooling(latent_heat * (hum_num - hum_den * p.humidity_setpoint))
        } else {
            0.0
        };
        let hum = (hum_num - latent_cooling / latent_heat) / hum_den;

        let cooling = sensible_cooling + latent_cooling;
        let cooling_power = cooling / p.cop;
        let heating_input = heating / p.heating_efficiency;
        let (gas, heating_electricity, flue_loss) = match p.heating_fuel {
            HeatingFuel::Gas => (heating_input, 0.0, heating_input - heating),
            HeatingFuel::Electric => (0.0, heating_input, 0.0),
        };

        self.temp = temp;
        self.hum = hum;

        let flux = HeatFluxDensity::new::<watt_per_square_meter>;
        Ok(ArchetypeLoad {
            indoor_temp: ThermodynamicTemperature::new::<kelvin>(temp),
            indoor_hum: Ratio::new::<ratio>(hum),
            glazing_ratio: Ratio::new::<ratio>(p.glazing_ratio),
            window_u: heat_transfer_coefficient(p.window_u),
            ventilation: mass_flux_density(outdoor_air),
            waste_sensible: flux(cooling + cooling_power + flue_loss),
            // Condensers are air cooled; no moisture is rejected outdoors.
            waste_latent: flux(0.0),
            heating: flux(heating),
            sensible_cooling: flux(sensible_cooling),
            latent_cooling: flux(latent_cooling),
            electricity: flux(p.internal_sensible * floor_area + cooling_power + heating_electricity),
            gas: flux(gas),
        })
    }

    fn boxed_clone(&self) -> Box<dyn BuildingArchetype> {
        Box::new(self.clone())
    }
}

/// Mean irradiance on a facade, estimated from the horizontal components.
fn facade_irradiance(forcing: &ForcingSample) -> f64 {
    0.25 * forcing.direct_solar.get::<watt_per_square_meter>()
        + 0.5 * forcing.diffuse_solar.get::<watt_per_square_meter>()
}
