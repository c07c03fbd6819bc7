use jiff::SignedDuration;
use uom::si::{
    f64::{HeatFluxDensity, Power, Ratio, ThermodynamicTemperature, Velocity},
    area::square_meter,
    heat_flux_density::watt_per_square_meter,
    power::watt,
    pressure::pascal,
    ratio::ratio,
    thermodynamic_temperature::kelvin,
    velocity::meter_per_second,
    volume::cubic_meter,
};

use crate::{
    models::urban::core::{
        BoundaryLayerState, BuildingLoadSample, ConvergenceScope, ConvergenceWarning,
        ForcingSample, StepWarning,
        atmosphere::{convection_coefficient, moist_air_density},
    },
    support::iteration,
};

use super::{
    CanyonModel, CanyonState, SolveError, Surface,
    air::{Coupling, MoistureBalance, SensibleBalance},
    surface::{SurfaceBalance, SurfaceFluxes, solve_surface},
    wind::{Buoyancy, wind_field},
};

/// Everything a canyon step needs besides the static district description.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanyonInput {
    /// Converged state of the previous step, or the initial guess.
    pub previous: CanyonState,
    pub forcing: ForcingSample,
    pub loads: BuildingLoadSample,
    pub boundary_layer: BoundaryLayerState,
    /// Fraction of peak traffic heat released during the step.
    pub traffic_fraction: Ratio,
    pub step: SignedDuration,
}

/// Converged (or iteration-capped) canyon state for one step.
#[derive(Debug, Clone, PartialEq)]
pub struct CanyonSolution {
    pub state: CanyonState,
    pub iterations: usize,
    /// Heat stored in the canyon air during the step.
    ///
    /// Equals the injected terms minus `q_vent` and `q_ubl`.
    pub storage: Power,
    pub warnings: Vec<StepWarning>,
}

pub(super) fn solve(
    model: &CanyonModel,
    input: &CanyonInput,
) -> Result<CanyonSolution, SolveError> {
    let terms = StepTerms::new(model, input)?;

    let initial = Iterate {
        state: input.previous,
        storage: 0.0,
        warnings: Vec::new(),
    };

    let solution = iteration::solve(
        initial,
        model.config.iteration(),
        |current, _| terms.update(current),
        |previous, next| terms.change(previous, next),
    )?;

    let Iterate {
        state,
        storage,
        mut warnings,
    } = solution.state;

    if solution.status == iteration::Status::MaxIters {
        log::warn!(
            "canyon air did not converge in {} iterations (change={:e})",
            solution.iters,
            solution.change
        );
        warnings.push(StepWarning::Convergence(ConvergenceWarning {
            scope: ConvergenceScope::CanyonAir,
            iters: solution.iters,
            change: solution.change,
        }));
    }

    Ok(CanyonSolution {
        state,
        iterations: solution.iters,
        storage: Power::new::<watt>(storage),
        warnings,
    })
}

/// One outer iterate. Warnings are those raised while producing it.
#[derive(Debug, Clone)]
struct Iterate {
    state: CanyonState,
    storage: f64,
    warnings: Vec<StepWarning>,
}

/// Step-invariant inputs, converted once to SI `f64`.
struct StepTerms<'a> {
    model: &'a CanyonModel,
    previous: &'a CanyonState,
    dt: f64,
    solar: f64,
    sky: f64,
    rural_wind: f64,
    pressure: f64,
    ubl_temp: f64,
    ubl_hum: f64,
    indoor_temp: f64,
    indoor_hum: f64,
    glazing: f64,
    window_conductance: f64,
    ventilation: f64,
    waste_sensible: f64,
    waste_latent: f64,
    electricity: f64,
    gas: f64,
    road_area: f64,
    roof_area: f64,
    fac_area: f64,
    cell_area: f64,
    volume: f64,
    canopy_area: f64,
    road_conf: f64,
    wall_conf: f64,
    road_shad: f64,
    traffic: f64,
}

impl<'a> StepTerms<'a> {
    fn new(model: &'a CanyonModel, input: &'a CanyonInput) -> Result<Self, SolveError> {
        let dt = input.step.as_secs_f64();
        if !dt.is_finite() || dt <= 0.0 {
            return Err(SolveError::InvalidStep { seconds: dt });
        }

        let geometry = &model.geometry;
        let forcing = &input.forcing;
        let loads = &input.loads;
        let w_m2 = |q: HeatFluxDensity| q.get::<watt_per_square_meter>();

        let road_area = geometry.road_area.get::<square_meter>();
        let cell_area = geometry.cell_area().get::<square_meter>();
        let road_shad = geometry.road_shad.get::<ratio>();
        let canopy_area = if geometry.tree_coverage.get::<ratio>() > 0.0 {
            road_shad * road_area
        } else {
            0.0
        };

        Ok(Self {
            model,
            previous: &input.previous,
            dt,
            solar: w_m2(forcing.direct_solar) + w_m2(forcing.diffuse_solar),
            sky: w_m2(forcing.longwave),
            rural_wind: forcing.wind.get::<meter_per_second>(),
            pressure: forcing.pressure.get::<pascal>(),
            ubl_temp: input.boundary_layer.temperature.get::<kelvin>(),
            ubl_hum: input.boundary_layer.humidity.get::<ratio>(),
            indoor_temp: loads.indoor_temp.get::<kelvin>(),
            indoor_hum: loads.indoor_hum.get::<ratio>(),
            glazing: loads.glazing_ratio.get::<ratio>(),
            window_conductance: loads.window_conductance.value,
            ventilation: loads.ventilation.value,
            waste_sensible: w_m2(loads.waste_sensible),
            waste_latent: w_m2(loads.waste_latent),
            electricity: w_m2(loads.electricity),
            gas: w_m2(loads.gas),
            road_area,
            roof_area: geometry.roof_area.get::<square_meter>(),
            fac_area: geometry.fac_area.get::<square_meter>(),
            cell_area,
            volume: geometry.canyon_volume().get::<cubic_meter>(),
            canopy_area,
            road_conf: geometry.road_conf.get::<ratio>(),
            wall_conf: geometry.wall_conf.get::<ratio>(),
            road_shad,
            traffic: input.traffic_fraction.get::<ratio>() * model.params.sens_anthrop * cell_area,
        })
    }

    /// Solves the surfaces at the current air state, then the air at the new
    /// surface temperatures.
    #[allow(clippy::too_many_lines)]
    fn update(&self, current: &Iterate) -> Result<Iterate, SolveError> {
        let params = &self.model.params;
        let geometry = &self.model.geometry;
        let atmosphere = &self.model.atmosphere;
        let surface_config = &self.model.config.surface;
        let state = &current.state;
        let mut warnings = Vec::new();

        let can_temp = state.can_temp.get::<kelvin>();
        let can_hum = state.can_hum.get::<ratio>();
        let rho = moist_air_density(self.pressure, can_temp, can_hum);

        let wind = wind_field(
            geometry,
            atmosphere,
            self.rural_wind,
            Buoyancy {
                sens_heat: state.sens_heat.get::<watt_per_square_meter>(),
                air_density: rho,
                can_temp,
            },
            &mut warnings,
        );
        let h_canyon = convection_coefficient(wind.canyon);
        let h_roof = convection_coefficient(wind.urban);

        let sigma = atmosphere.stefan_boltzmann;
        let road_guess = state.road_temp.get::<kelvin>();
        let wall_guess = state.wall_temp.get::<kelvin>();
        let road_emission = params.road.emissivity * sigma * road_guess.powi(4);
        let wall_emission = params.wall.emissivity * sigma * wall_guess.powi(4);

        // Shortwave reaching the unshaded road, and the grass share of it.
        let road_solar = self.road_conf * self.solar * (1.0 - self.road_shad);
        let grass = params.road_veg_coverage * (1.0 - params.vegetation.albedo);

        let road = SurfaceBalance {
            shortwave: road_solar * (geometry.road_absor.get::<ratio>() + grass),
            longwave: self.road_conf * self.sky + (1.0 - self.road_conf) * wall_emission,
            emissivity: params.road.emissivity,
            sigma,
            convection: h_canyon,
            air_temp: can_temp,
            conductance: params.road.conductance,
            inner_temp: params.deep_ground_temp,
            storage: params.road.heat_capacity / self.dt,
            previous_temp: self.previous.road_temp.get::<kelvin>(),
            latent: road_solar * grass * params.vegetation.latent_fraction,
        };

        let wall = SurfaceBalance {
            shortwave: self.wall_conf * self.solar * geometry.fac_absor.get::<ratio>(),
            longwave: self.wall_conf * (self.sky + road_emission)
                + (1.0 - 2.0 * self.wall_conf) * wall_emission,
            emissivity: params.wall.emissivity,
            sigma,
            convection: h_canyon,
            air_temp: can_temp,
            conductance: params.wall.conductance,
            inner_temp: self.indoor_temp,
            storage: params.wall.heat_capacity / self.dt,
            previous_temp: self.previous.wall_temp.get::<kelvin>(),
            latent: 0.0,
        };

        let roof = SurfaceBalance {
            shortwave: self.solar * (1.0 - params.roof.albedo),
            longwave: self.sky,
            emissivity: params.roof.emissivity,
            sigma,
            convection: h_roof,
            air_temp: self.ubl_temp,
            conductance: params.roof.conductance,
            inner_temp: self.indoor_temp,
            storage: params.roof.heat_capacity / self.dt,
            previous_temp: self.previous.roof_temp.get::<kelvin>(),
            latent: 0.0,
        };

        let road_fluxes =
            solve_surface(Surface::Road, &road, road_guess, surface_config, &mut warnings)?;
        let wall_fluxes =
            solve_surface(Surface::Wall, &wall, wall_guess, surface_config, &mut warnings)?;
        let roof_fluxes = solve_surface(
            Surface::Roof,
            &roof,
            state.roof_temp.get::<kelvin>(),
            surface_config,
            &mut warnings,
        )?;

        let canopy = if self.canopy_area > 0.0 {
            let absorbed = self.road_conf * self.solar * (1.0 - params.vegetation.albedo);
            let balance = SurfaceBalance {
                shortwave: absorbed,
                longwave: self.sky,
                emissivity: params.vegetation.emissivity,
                sigma,
                convection: h_canyon,
                air_temp: can_temp,
                conductance: 0.0,
                inner_temp: can_temp,
                storage: 0.0,
                previous_temp: can_temp,
                latent: params.vegetation.latent_fraction * absorbed,
            };
            let guess = state.veg_temp.map_or(can_temp, |t| t.get::<kelvin>());
            let fluxes = solve_surface(
                Surface::Vegetation,
                &balance,
                guess,
                surface_config,
                &mut warnings,
            )?;
            Some(Canopy {
                fluxes,
                latent: balance.latent,
            })
        } else {
            None
        };

        let road_temp = road_fluxes.temperature.get::<kelvin>();
        let veg_temp = canopy.map(|c| c.fluxes.temperature.get::<kelvin>());
        let cp = atmosphere.cp;
        let exchange = wind.exchange;

        let sensible = SensibleBalance {
            road: Coupling {
                conductance: h_canyon * self.road_area,
                source: road_temp,
            },
            wall: Coupling {
                conductance: h_canyon * self.fac_area * (1.0 - self.glazing),
                source: wall_fluxes.temperature.get::<kelvin>(),
            },
            window: Coupling {
                conductance: self.window_conductance * self.fac_area,
                source: self.indoor_temp,
            },
            tree: Coupling {
                conductance: h_canyon * self.canopy_area,
                source: veg_temp.unwrap_or(can_temp),
            },
            vent: Coupling {
                conductance: self.ventilation * self.roof_area * cp,
                source: self.indoor_temp,
            },
            ubl: Coupling {
                conductance: rho * cp * exchange * self.road_area,
                source: self.ubl_temp,
            },
            storage: Coupling {
                conductance: rho * cp * self.volume / self.dt,
                source: self.previous.can_temp.get::<kelvin>(),
            },
            hvac: params.h_mix * self.waste_sensible * self.roof_area,
            traffic: self.traffic,
        };
        let heat = sensible.solve()?;

        let latent_heat = atmosphere.latent_heat;
        let tree_latent = canopy.map_or(0.0, |c| c.latent);
        let moisture = MoistureBalance {
            vent: Coupling {
                conductance: self.ventilation * self.roof_area,
                source: self.indoor_hum,
            },
            ubl: Coupling {
                conductance: rho * exchange * self.road_area,
                source: self.ubl_hum,
            },
            storage: Coupling {
                conductance: rho * self.volume / self.dt,
                source: self.previous.can_hum.get::<ratio>(),
            },
            sources: (params.h_mix * self.waste_latent * self.roof_area
                + params.lat_anthrop * self.cell_area
                + tree_latent * self.canopy_area
                + road.latent * self.road_area)
                / latent_heat,
        };
        let vapor = moisture.solve()?;

        let tree_sens = veg_temp.map_or(0.0, |t| h_canyon * (t - heat.temp));
        let q_roof = roof_fluxes.convective.get::<watt_per_square_meter>() * self.roof_area;
        let escaped_sensible = (1.0 - params.h_mix) * self.waste_sensible * self.roof_area;
        let escaped_latent = (1.0 - params.h_mix) * self.waste_latent * self.roof_area;

        let flux = HeatFluxDensity::new::<watt_per_square_meter>;
        let mps = Velocity::new::<meter_per_second>;
        let next = CanyonState {
            can_temp: ThermodynamicTemperature::new::<kelvin>(heat.temp),
            can_hum: Ratio::new::<ratio>(vapor.hum),
            can_wind: mps(wind.canyon),
            ubl_wind: mps(wind.urban),
            ustar: mps(wind.ustar),
            ustar_mod: mps(wind.ustar_mod),
            u_exch: mps(exchange),
            z0u: geometry.z0u,
            l_disp: geometry.l_disp,
            road_temp: road_fluxes.temperature,
            wall_temp: wall_fluxes.temperature,
            roof_temp: roof_fluxes.temperature,
            veg_temp: canopy.map(|c| c.fluxes.temperature),
            sens_heat: flux((heat.ubl + q_roof + escaped_sensible) / self.cell_area),
            lat_heat: flux((latent_heat * vapor.ubl + escaped_latent) / self.cell_area),
            sens_anthrop: flux(
                (self.traffic + self.waste_sensible * self.roof_area) / self.cell_area,
            ),
            lat_anthrop: flux(
                params.lat_anthrop + self.waste_latent * self.roof_area / self.cell_area,
            ),
            tree_sens_heat: flux(tree_sens),
            tree_lat_heat: flux(tree_latent),
            q_wall: Power::new::<watt>(heat.wall),
            q_window: Power::new::<watt>(heat.window),
            q_hvac: Power::new::<watt>(sensible.hvac),
            q_road: Power::new::<watt>(heat.road),
            q_traffic: Power::new::<watt>(self.traffic),
            q_tree: Power::new::<watt>(heat.tree),
            q_vent: Power::new::<watt>(heat.vent),
            q_ubl: Power::new::<watt>(heat.ubl),
            q_roof: Power::new::<watt>(q_roof),
            elec_total: Power::new::<watt>(self.electricity * self.roof_area),
            gas_total: Power::new::<watt>(self.gas * self.roof_area),
        };

        Ok(Iterate {
            state: next,
            storage: heat.storage,
            warnings,
        })
    }

    /// Largest temperature and humidity change, normalized by the tolerances.
    fn change(&self, previous: &Iterate, next: &Iterate) -> f64 {
        let (a, b) = (&previous.state, &next.state);
        let delta = |x: ThermodynamicTemperature, y: ThermodynamicTemperature| {
            (y.get::<kelvin>() - x.get::<kelvin>()).abs()
        };

        let canopy = match (a.veg_temp, b.veg_temp) {
            (Some(x), Some(y)) => delta(x, y),
            _ => 0.0,
        };
        let temp_change = [
            delta(a.can_temp, b.can_temp),
            delta(a.road_temp, b.road_temp),
            delta(a.wall_temp, b.wall_temp),
            delta(a.roof_temp, b.roof_temp),
            canopy,
        ]
        .into_iter()
        .fold(0.0, f64::max);
        let hum_change = b.can_hum.get::<ratio>() - a.can_hum.get::<ratio>();

        self.model.config.normalized_change(temp_change, hum_change)
    }
}

#[derive(Debug, Clone, Copy)]
struct Canopy {
    fluxes: SurfaceFluxes,
    /// Latent flux per canopy area, W/m².
    latent: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    use crate::models::urban::core::{
        AtmosphereConstants, BoundaryLayerConfig, UrbanParameters,
        canyon::SolverConfig,
        test_support::{forcing, load_sample, no_tree_params},
    };

    fn model(params: UrbanParameters, config: SolverConfig) -> CanyonModel {
        CanyonModel::new(params, config, AtmosphereConstants::default()).unwrap()
    }

    fn input(model: &CanyonModel, temp_c: f64) -> CanyonInput {
        let forcing = forcing(temp_c);
        CanyonInput {
            previous: CanyonState::initial(model.geometry(), model.atmosphere(), &forcing),
            forcing,
            loads: load_sample(21.0),
            boundary_layer: BoundaryLayerState::initial(&BoundaryLayerConfig::default(), &forcing),
            traffic_fraction: Ratio::new::<ratio>(0.5),
            step: SignedDuration::from_secs(300),
        }
    }

    #[test]
    fn repeated_solves_are_identical() {
        let model = model(UrbanParameters::default(), SolverConfig::default());
        let input = input(&model, 28.0);

        let first = model.solve(&input).unwrap();
        let second = model.solve(&input).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn converges_without_warnings() {
        let model = model(UrbanParameters::default(), SolverConfig::default());
        let solution = model.solve(&input(&model, 28.0)).unwrap();

        assert!(solution.iterations < SolverConfig::default().max_iters);
        assert!(solution.warnings.is_empty(), "{:?}", solution.warnings);
        assert!(solution.state.veg_temp.is_some());
    }

    #[test]
    fn air_balance_conserves_energy() {
        let model = model(UrbanParameters::default(), SolverConfig::default());
        let solution = model.solve(&input(&model, 5.0)).unwrap();
        let s = &solution.state;

        let injected = s.q_road + s.q_wall + s.q_window + s.q_hvac + s.q_traffic + s.q_tree;
        let residual = injected - s.q_vent - s.q_ubl - solution.storage;
        let scale = injected.get::<watt>().abs().max(1.0);

        assert!(residual.get::<watt>().abs() / scale < 1e-9);
    }

    #[test]
    fn no_trees_means_no_tree_heat() {
        let model = model(no_tree_params(), SolverConfig::default());
        let solution = model.solve(&input(&model, 28.0)).unwrap();

        assert_relative_eq!(solution.state.tree_sens_heat.get::<watt_per_square_meter>(), 0.0);
        assert_relative_eq!(solution.state.q_tree.get::<watt>(), 0.0);
        assert!(solution.state.veg_temp.is_none());
    }

    #[test]
    fn waste_heat_warms_the_canyon() {
        let model = model(no_tree_params(), SolverConfig::default());
        let mut quiet = input(&model, 10.0);
        quiet.loads.waste_sensible = HeatFluxDensity::new::<watt_per_square_meter>(0.0);
        let mut busy = quiet;
        busy.loads.waste_sensible = HeatFluxDensity::new::<watt_per_square_meter>(50.0);

        let quiet = model.solve(&quiet).unwrap().state;
        let busy = model.solve(&busy).unwrap().state;

        assert!(busy.can_temp > quiet.can_temp);
        assert!(busy.sens_anthrop > quiet.sens_anthrop);
    }

    #[test]
    fn iteration_cap_still_returns_a_state() {
        let config = SolverConfig {
            max_iters: 1,
            ..SolverConfig::default()
        };
        let model = model(UrbanParameters::default(), config);
        let solution = model.solve(&input(&model, 28.0)).unwrap();

        assert_eq!(solution.iterations, 1);
        assert!(solution.state.can_temp.get::<kelvin>().is_finite());
        assert!(solution.warnings.iter().any(|w| matches!(
            w,
            StepWarning::Convergence(ConvergenceWarning {
                scope: ConvergenceScope::CanyonAir,
                ..
            })
        )));
    }

    #[test]
    fn rejects_non_positive_step() {
        let model = model(UrbanParameters::default(), SolverConfig::default());
        let mut input = input(&model, 20.0);
        input.step = SignedDuration::ZERO;

        assert!(matches!(
            model.solve(&input),
            Err(SolveError::InvalidStep { .. })
        ));
    }

    #[test]
    fn roof_is_hotter_than_air_under_sun() {
        let model = model(UrbanParameters::default(), SolverConfig::default());
        let mut input = input(&model, 30.0);
        input.forcing.direct_solar = HeatFluxDensity::new::<watt_per_square_meter>(700.0);
        input.forcing.diffuse_solar = HeatFluxDensity::new::<watt_per_square_meter>(150.0);

        let state = model.solve(&input).unwrap().state;

        assert!(state.roof_temp.get::<kelvin>() > 303.15);
        assert!(state.sens_heat.get::<watt_per_square_meter>() > 0.0);
    }
}
