use serde::{Deserialize, Serialize};

/// Physical constants and reference heights for the near-surface atmosphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AtmosphereConstants {
    /// Specific heat of air, J/kg·K.
    pub cp: f64,
    /// Latent heat of vaporization, J/kg.
    pub latent_heat: f64,
    /// Von Kármán constant.
    pub von_karman: f64,
    /// m/s².
    pub gravity: f64,
    /// W/m²·K⁴.
    pub stefan_boltzmann: f64,
    /// Ratio of canyon-top exchange velocity to friction velocity.
    pub exchange_coeff: f64,
    /// Rural roughness length, m.
    pub rural_roughness: f64,
    /// Height of the rural wind measurement, m.
    pub wind_height: f64,
    /// Blending height where rural and urban wind profiles meet, m.
    pub reference_height: f64,
    /// Floor applied to rural and canyon wind speeds, m/s.
    pub min_wind: f64,
}

impl Default for AtmosphereConstants {
    fn default() -> Self {
        Self {
            cp: 1004.0,
            latent_heat: 2.26e6,
            von_karman: 0.4,
            gravity: 9.81,
            stefan_boltzmann: 5.67e-8,
            exchange_coeff: 0.3,
            rural_roughness: 0.1,
            wind_height: 10.0,
            reference_height: 150.0,
            min_wind: 0.1,
        }
    }
}

/// Density of moist air, kg/m³, from pressure (Pa), temperature (K) and
/// specific humidity (kg/kg).
pub(crate) fn moist_air_density(pressure: f64, temperature: f64, humidity: f64) -> f64 {
    pressure / (287.042 * temperature * (1.0 + 1.607_858 * humidity))
}

/// Convective heat transfer coefficient for a surface in wind `speed`, W/m²·K.
pub(crate) fn convection_coefficient(speed: f64) -> f64 {
    5.8 + 3.7 * speed
}
