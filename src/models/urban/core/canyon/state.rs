use uom::{
    ConstZero,
    si::{
        f64::{
            HeatFluxDensity, Length, Power, Ratio, TemperatureInterval, ThermodynamicTemperature,
            Velocity,
        },
        ratio::ratio,
        velocity::meter_per_second,
    },
};

use crate::{
    models::urban::core::{AtmosphereConstants, ForcingSample, Geometry},
    support::units::TemperatureDifference,
};

/// Canyon air, surface and flux state at the end of a step.
///
/// `Q_*` terms are sensible heat flows in W per urban cell, positive into
/// the canyon air except `q_vent` and `q_ubl`, which are positive when heat
/// leaves the canyon, and `q_roof`, which is roof-to-boundary-layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanyonState {
    pub can_temp: ThermodynamicTemperature,
    /// Canyon specific humidity, kg/kg.
    pub can_hum: Ratio,
    pub can_wind: Velocity,
    /// Urban wind at the top of the roughness sublayer.
    pub ubl_wind: Velocity,
    pub ustar: Velocity,
    /// Friction velocity including convective enhancement.
    pub ustar_mod: Velocity,
    /// Canyon-top exchange velocity.
    pub u_exch: Velocity,
    pub z0u: Length,
    pub l_disp: Length,
    pub road_temp: ThermodynamicTemperature,
    pub wall_temp: ThermodynamicTemperature,
    pub roof_temp: ThermodynamicTemperature,
    /// Tree canopy temperature; `None` when the district has no trees.
    pub veg_temp: Option<ThermodynamicTemperature>,
    /// Urban sensible heat flux into the boundary layer, per plan area.
    pub sens_heat: HeatFluxDensity,
    /// Urban latent heat flux into the boundary layer, per plan area.
    pub lat_heat: HeatFluxDensity,
    /// Traffic plus HVAC sensible heat, per plan area.
    pub sens_anthrop: HeatFluxDensity,
    /// Anthropogenic plus HVAC latent heat, per plan area.
    pub lat_anthrop: HeatFluxDensity,
    /// Sensible flux from the tree canopy, per canopy area.
    pub tree_sens_heat: HeatFluxDensity,
    /// Latent flux from the tree canopy, per canopy area.
    pub tree_lat_heat: HeatFluxDensity,
    pub q_wall: Power,
    pub q_window: Power,
    pub q_hvac: Power,
    pub q_road: Power,
    pub q_traffic: Power,
    pub q_tree: Power,
    pub q_vent: Power,
    pub q_ubl: Power,
    pub q_roof: Power,
    /// Building electricity use in the cell.
    pub elec_total: Power,
    /// Building gas use in the cell.
    pub gas_total: Power,
}

impl CanyonState {
    /// Initial guess for the first step: canyon air and surfaces at rural
    /// conditions, no fluxes.
    #[must_use]
    pub fn initial(
        geometry: &Geometry,
        atmosphere: &AtmosphereConstants,
        forcing: &ForcingSample,
    ) -> Self {
        let wind = forcing.wind.get::<meter_per_second>();
        let ubl_wind = wind.max(atmosphere.min_wind);
        let ustar = 0.1 * wind;
        let with_tree = geometry.tree_coverage.get::<ratio>() > 0.0;
        let mps = Velocity::new::<meter_per_second>;

        Self {
            can_temp: forcing.temperature,
            can_hum: forcing.humidity,
            can_wind: mps(ubl_wind),
            ubl_wind: mps(ubl_wind),
            ustar: mps(ustar),
            ustar_mod: mps(ustar),
            u_exch: mps(atmosphere.exchange_coeff * ustar),
            z0u: geometry.z0u,
            l_disp: geometry.l_disp,
            road_temp: forcing.temperature,
            wall_temp: forcing.temperature,
            roof_temp: forcing.temperature,
            veg_temp: with_tree.then_some(forcing.temperature),
            sens_heat: HeatFluxDensity::ZERO,
            lat_heat: HeatFluxDensity::ZERO,
            sens_anthrop: HeatFluxDensity::ZERO,
            lat_anthrop: HeatFluxDensity::ZERO,
            tree_sens_heat: HeatFluxDensity::ZERO,
            tree_lat_heat: HeatFluxDensity::ZERO,
            q_wall: Power::ZERO,
            q_window: Power::ZERO,
            q_hvac: Power::ZERO,
            q_road: Power::ZERO,
            q_traffic: Power::ZERO,
            q_tree: Power::ZERO,
            q_vent: Power::ZERO,
            q_ubl: Power::ZERO,
            q_roof: Power::ZERO,
            elec_total: Power::ZERO,
            gas_total: Power::ZERO,
        }
    }

    /// Canyon air temperature excess over the rural reference.
    #[must_use]
    pub fn heat_island(&self, rural: ThermodynamicTemperature) -> TemperatureInterval {
        self.can_temp.minus(rural)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use uom::si::thermodynamic_temperature::kelvin;

    use crate::models::urban::core::{
        UrbanParameters,
        test_support::{forcing, no_tree_params},
    };

    #[test]
    fn starts_at_rural_conditions() {
        let geometry = Geometry::derive(&UrbanParameters::default()).unwrap();
        let state = CanyonState::initial(&geometry, &AtmosphereConstants::default(), &forcing(10.0));

        assert_relative_eq!(state.can_temp.get::<kelvin>(), 283.15, epsilon = 1e-12);
        assert_relative_eq!(state.ustar.get::<meter_per_second>(), 0.3, epsilon = 1e-12);
        assert!(state.veg_temp.is_some());
        assert_eq!(state.q_ubl, Power::ZERO);
    }

    #[test]
    fn no_canopy_temperature_without_trees() {
        let geometry = Geometry::derive(&no_tree_params()).unwrap();
        let state = CanyonState::initial(&geometry, &AtmosphereConstants::default(), &forcing(10.0));
        assert!(state.veg_temp.is_none());
    }

    #[test]
    fn heat_island_is_signed() {
        use uom::si::{temperature_interval, thermodynamic_temperature::degree_celsius};

        let geometry = Geometry::derive(&no_tree_params()).unwrap();
        let mut state =
            CanyonState::initial(&geometry, &AtmosphereConstants::default(), &forcing(10.0));
        state.can_temp = ThermodynamicTemperature::new::<degree_celsius>(12.5);

        let rural = ThermodynamicTemperature::new::<degree_celsius>(10.0);
        assert_relative_eq!(
            state.heat_island(rural).get::<temperature_interval::kelvin>(),
            2.5,
            epsilon = 1e-12
        );
    }
}
