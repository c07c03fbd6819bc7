use uom::{
    si::{
        ISQ, Quantity, SI,
        area::square_meter,
        f64::{Area, HeatFluxDensity, MassRate, TemperatureInterval},
        heat_flux_density::watt_per_square_meter,
        mass_rate::kilogram_per_second,
        temperature_interval::kelvin,
    },
    typenum::{N1, N2, N3, P1, Z0},
};

/// Surface heat transfer coefficient, W/m²·K in SI.
pub type HeatTransferCoefficient = Quantity<ISQ<Z0, P1, N3, Z0, N1, Z0, Z0>, SI<f64>, f64>;

/// Mass flow per unit area, kg/m²·s in SI.
pub type MassFluxDensity = Quantity<ISQ<N2, P1, N1, Z0, Z0, Z0, Z0>, SI<f64>, f64>;

/// Creates a [`HeatTransferCoefficient`] from a value in W/m²·K.
#[must_use]
pub fn heat_transfer_coefficient(value: f64) -> HeatTransferCoefficient {
    HeatFluxDensity::new::<watt_per_square_meter>(value) / TemperatureInterval::new::<kelvin>(1.0)
}

/// Creates a [`MassFluxDensity`] from a value in kg/m²·s.
#[must_use]
pub fn mass_flux_density(value: f64) -> MassFluxDensity {
    MassRate::new::<kilogram_per_second>(value) / Area::new::<square_meter>(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn coefficient_times_interval_is_flux() {
        let h = heat_transfer_coefficient(12.0);
        let q: HeatFluxDensity = h * TemperatureInterval::new::<kelvin>(2.5);
        assert_relative_eq!(q.get::<watt_per_square_meter>(), 30.0);
    }

    #[test]
    fn mass_flux_times_area_is_mass_rate() {
        let flux: MassFluxDensity =
            MassRate::new::<kilogram_per_second>(0.6) / Area::new::<square_meter>(200.0);
        let total: MassRate = flux * Area::new::<square_meter>(100.0);
        assert_relative_eq!(total.get::<kilogram_per_second>(), 0.3);
    }

    #[test]
    fn constructors_store_si_values() {
        assert_relative_eq!(heat_transfer_coefficient(3.0).value, 3.0);
        assert_relative_eq!(mass_flux_density(0.002).value, 0.002);
    }
}
