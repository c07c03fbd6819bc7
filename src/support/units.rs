//! Extensions to [`uom`].
//!
//! Public quantities in this crate are [`uom`] quantities. This module adds
//! the few things the canyon models need that [`uom`] does not provide:
//!
//! - [`TemperatureDifference::minus`] for subtracting absolute temperatures
//!   into a [`TemperatureInterval`](uom::si::f64::TemperatureInterval).
//! - Quantity aliases for surface heat transfer coefficients and mass flux
//!   densities, with constructors taking SI values.

mod quantities;
mod temperature_difference;

pub use quantities::{
    HeatTransferCoefficient, MassFluxDensity, heat_transfer_coefficient, mass_flux_density,
};
pub use temperature_difference::TemperatureDifference;
