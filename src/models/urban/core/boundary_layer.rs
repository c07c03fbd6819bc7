//! Well-mixed urban boundary layer above the canyon.
//!
//! The layer is a slab that deepens while the city heats it more than the
//! surrounding countryside and collapses to a nocturnal depth otherwise.
//! Its temperature and humidity follow an implicit slab budget driven by the
//! urban surface fluxes and relaxed toward rural air by advection.

use jiff::SignedDuration;
use serde::{Deserialize, Serialize};
use uom::si::{
    f64::{Length, Ratio, ThermodynamicTemperature},
    heat_flux_density::watt_per_square_meter,
    length::meter,
    pressure::pascal,
    ratio::ratio,
    thermodynamic_temperature::kelvin,
    velocity::meter_per_second,
};

use crate::support::constraint::{NonNegative, StrictlyPositive};

use super::{
    AtmosphereConstants, CanyonState, ClampedQuantity, ConfigurationError, ForcingSample,
    StepWarning, atmosphere::moist_air_density,
};

/// Boundary-layer depth bounds and mixing parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoundaryLayerConfig {
    /// Maximum daytime depth, m.
    pub day_height: f64,
    /// Stable nocturnal depth, m.
    pub night_height: f64,
    /// Horizontal length of the city along the wind, m.
    pub char_length: f64,
    /// Potential temperature lapse rate above the layer, K/m.
    pub lapse_rate: f64,
    /// Entrainment coefficient for convective growth.
    pub entrainment: f64,
}

impl Default for BoundaryLayerConfig {
    fn default() -> Self {
        Self {
            day_height: 1000.0,
            night_height: 80.0,
            char_length: 1000.0,
            lapse_rate: 0.005,
            entrainment: 0.2,
        }
    }
}

impl BoundaryLayerConfig {
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if a height, length or lapse rate is
    /// not positive, the entrainment is negative, or the nocturnal depth
    /// exceeds the daytime depth.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let invalid = ConfigurationError::invalid;
        StrictlyPositive::new(self.day_height).map_err(invalid("boundary_layer.day_height"))?;
        StrictlyPositive::new(self.night_height)
            .map_err(invalid("boundary_layer.night_height"))?;
        StrictlyPositive::new(self.char_length).map_err(invalid("boundary_layer.char_length"))?;
        StrictlyPositive::new(self.lapse_rate).map_err(invalid("boundary_layer.lapse_rate"))?;
        NonNegative::new(self.entrainment).map_err(invalid("boundary_layer.entrainment"))?;

        if self.night_height > self.day_height {
            return Err(ConfigurationError::Misordered {
                lower: "boundary_layer.night_height",
                lower_value: self.night_height,
                upper: "boundary_layer.day_height",
                upper_value: self.day_height,
            });
        }
        Ok(())
    }
}

/// Depth and bulk air properties of the urban boundary layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryLayerState {
    pub height: Length,
    pub temperature: ThermodynamicTemperature,
    /// Specific humidity, kg/kg.
    pub humidity: Ratio,
}

impl BoundaryLayerState {
    /// A nocturnal layer at rural conditions.
    #[must_use]
    pub fn initial(config: &BoundaryLayerConfig, forcing: &ForcingSample) -> Self {
        Self {
            height: Length::new::<meter>(config.night_height),
            temperature: forcing.temperature,
            humidity: forcing.humidity,
        }
    }

    /// Advances the layer one step using the converged canyon fluxes.
    ///
    /// A depth outside `[night_height, day_height]`, or a non-finite one,
    /// is clamped into range and recorded in `warnings`.
    #[must_use]
    pub fn advance(
        &self,
        config: &BoundaryLayerConfig,
        atmosphere: &AtmosphereConstants,
        canyon: &CanyonState,
        forcing: &ForcingSample,
        step: SignedDuration,
        warnings: &mut Vec<StepWarning>,
    ) -> Self {
        let dt = step.as_secs_f64();
        let cp = atmosphere.cp;
        let temp = self.temperature.get::<kelvin>();
        let hum = self.humidity.get::<ratio>();
        let rho = moist_air_density(forcing.pressure.get::<pascal>(), temp, hum);

        let excess_heat = canyon.sens_heat.get::<watt_per_square_meter>()
            - forcing.rural_sensible.get::<watt_per_square_meter>();

        let requested = if excess_heat > 0.0 {
            let height = self.height.get::<meter>();
            (height * height
                + 2.0 * (1.0 + 2.0 * config.entrainment) * excess_heat * dt
                    / (rho * cp * config.lapse_rate))
                .sqrt()
        } else {
            config.night_height
        };
        let height = clamp_height(requested, config, warnings);

        // Implicit slab budget: storage = surface forcing − advective relaxation.
        let relax = canyon.ubl_wind.get::<meter_per_second>() / config.char_length;
        let storage = rho * height / dt;
        let advection = rho * height * relax;

        let rural_temp = forcing.temperature.get::<kelvin>();
        let temperature = (cp * storage * temp + excess_heat + cp * advection * rural_temp)
            / (cp * (storage + advection));

        let rural_hum = forcing.humidity.get::<ratio>();
        let moisture = canyon.lat_heat.get::<watt_per_square_meter>() / atmosphere.latent_heat;
        let humidity = (storage * hum + moisture + advection * rural_hum) / (storage + advection);

        Self {
            height: Length::new::<meter>(height),
            temperature: ThermodynamicTemperature::new::<kelvin>(temperature),
            humidity: Ratio::new::<ratio>(humidity),
        }
    }
}

fn clamp_height(
    requested: f64,
    config: &BoundaryLayerConfig,
    warnings: &mut Vec<StepWarning>,
) -> f64 {
    let applied = if requested.is_finite() {
        requested.clamp(config.night_height, config.day_height)
    } else {
        config.day_height
    };
    if applied != requested {
        warnings.push(StepWarning::clamp(
            ClampedQuantity::BoundaryLayerHeight,
            requested,
            applied,
        ));
    }
    applied
}
