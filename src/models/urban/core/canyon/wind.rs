//! Urban wind and friction velocity from the rural wind.

use uom::si::{length::meter, ratio::ratio};

use crate::models::urban::core::{AtmosphereConstants, ClampedQuantity, Geometry, StepWarning};

/// Wind and turbulence scales for one iteration, m/s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct WindField {
    /// Wind at the top of the urban roughness sublayer (twice building height).
    pub(super) urban: f64,
    pub(super) ustar: f64,
    pub(super) ustar_mod: f64,
    pub(super) exchange: f64,
    pub(super) canyon: f64,
}

/// Buoyancy and mean-flow terms that vary between iterations.
#[derive(Debug, Clone, Copy)]
pub(super) struct Buoyancy {
    /// Urban sensible heat flux, W/m².
    pub(super) sens_heat: f64,
    /// kg/m³.
    pub(super) air_density: f64,
    /// K.
    pub(super) can_temp: f64,
}

/// Transfers the rural wind to the city and derives the canyon wind.
///
/// The rural profile is log-linear over `rural_roughness` up to the blending
/// height, where it meets an urban log profile over `z0u`. Friction velocity
/// is raised to the convective velocity scale when buoyancy dominates.
/// Rural and canyon winds are floored at `min_wind`, and each floor applied
/// is recorded in `warnings`.
pub(super) fn wind_field(
    geometry: &Geometry,
    atmosphere: &AtmosphereConstants,
    rural_wind: f64,
    buoyancy: Buoyancy,
    warnings: &mut Vec<StepWarning>,
) -> WindField {
    let AtmosphereConstants {
        von_karman,
        gravity,
        cp,
        exchange_coeff,
        rural_roughness: z0r,
        wind_height,
        reference_height: z_ref,
        min_wind,
        ..
    } = *atmosphere;

    let height = geometry.bld_height.get::<meter>();
    let z0u = geometry.z0u.get::<meter>();
    let l_disp = geometry.l_disp.get::<meter>();

    let rural = floor(rural_wind, min_wind, ClampedQuantity::RuralWind, warnings);

    let urban = rural * (z_ref / z0r).ln() / (wind_height / z0r).ln() * (2.0 * height / z0u).ln()
        / (z_ref / z0u).ln();
    let ustar = von_karman * urban / ((2.0 * height - l_disp) / z0u).ln();

    let wstar = (gravity * buoyancy.sens_heat.max(0.0) * z_ref
        / (buoyancy.air_density * cp * buoyancy.can_temp))
        .cbrt();
    let ustar_mod = ustar.max(wstar);

    let canyon_raw = ustar_mod / (geometry.ver_to_hor.get::<ratio>() / 8.0).sqrt();
    let canyon = floor(canyon_raw, min_wind, ClampedQuantity::CanyonWind, warnings);

    WindField {
        urban,
        ustar,
        ustar_mod,
        exchange: exchange_coeff * ustar_mod,
        canyon,
    }
}

fn floor(
    speed: f64,
    min: f64,
    quantity: ClampedQuantity,
    warnings: &mut Vec<StepWarning>,
) -> f64 {
    if speed >= min {
        return speed;
    }
    warnings.push(StepWarning::clamp(quantity, speed, min));
    min
}
