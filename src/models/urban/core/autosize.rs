//! HVAC capacity presizing from design days.

use std::collections::BTreeMap;

use jiff::civil::DateTime;
use serde::{Deserialize, Serialize};
use uom::si::{f64::HeatFluxDensity, heat_flux_density::watt_per_square_meter};

use crate::support::constraint::NonNegative;

use super::{
    ArchetypeId, BuildingAggregator, CanyonModel, ConfigurationError, ForcingFeed, ForcingSample,
    HourlyForcing, HvacCapacities, HvacCapacity, SimulationConfig, SimulationError,
    simulation::Context,
};

/// Autosizing settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutosizeConfig {
    /// Fractional oversizing applied to each design peak.
    pub safety_margin: f64,
}

impl Default for AutosizeConfig {
    fn default() -> Self {
        Self { safety_margin: 0.2 }
    }
}

impl AutosizeConfig {
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the safety margin is negative.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        NonNegative::new(self.safety_margin)
            .map_err(ConfigurationError::invalid("autosize.safety_margin"))?;
        Ok(())
    }
}

/// A design day: hourly forcing starting at `start`.
///
/// Each sample is held for its hour, as in [`HourlyForcing`].
#[derive(Debug, Clone, PartialEq)]
pub struct DesignDay {
    pub start: DateTime,
    pub samples: Vec<ForcingSample>,
}

impl DesignDay {
    #[must_use]
    pub fn new(start: DateTime, samples: Vec<ForcingSample>) -> Self {
        Self { start, samples }
    }
}

/// Runs design days through the full step pipeline with unconstrained HVAC
/// and records each archetype's peak loads.
///
/// Every design day starts from a fresh context built from a clone of the
/// aggregator, so autosizing never disturbs the main run and repeated calls
/// give identical capacities.
#[derive(Debug, Clone, Copy)]
pub struct HvacAutosizer<'a> {
    model: &'a CanyonModel,
    config: &'a SimulationConfig,
    aggregator: &'a BuildingAggregator,
}

impl<'a> HvacAutosizer<'a> {
    #[must_use]
    pub fn new(
        model: &'a CanyonModel,
        config: &'a SimulationConfig,
        aggregator: &'a BuildingAggregator,
    ) -> Self {
        Self {
            model,
            config,
            aggregator,
        }
    }

    /// Sizes every archetype from `design_days`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if the autosize or boundary-layer
    /// settings are invalid or `design_days` is empty, or the error that
    /// aborted a design-day step.
    pub fn autosize(&self, design_days: &[DesignDay]) -> Result<HvacCapacities, SimulationError> {
        self.config.autosize.validate()?;
        self.config.boundary_layer.validate()?;
        if design_days.is_empty() {
            return Err(ConfigurationError::NoDesignDays.into());
        }

        let mut peaks: BTreeMap<ArchetypeId, Peak> = self
            .aggregator
            .weights()
            .map(|(id, _)| (id.clone(), Peak::default()))
            .collect();

        for day in design_days {
            self.run_day(day, &mut peaks)?;
        }

        let scale = 1.0 + self.config.autosize.safety_margin;
        let capacities = peaks
            .into_iter()
            .map(|(id, peak)| {
                let capacity = peak.scaled(scale);
                log::info!(
                    "autosized `{id}`: heating {:.1} W/m², sensible cooling {:.1} W/m², latent cooling {:.1} W/m²",
                    capacity.heating.get::<watt_per_square_meter>(),
                    capacity.sensible_cooling.get::<watt_per_square_meter>(),
                    capacity.latent_cooling.get::<watt_per_square_meter>(),
                );
                (id, capacity)
            })
            .collect();

        Ok(HvacCapacities::new(capacities))
    }

    fn run_day(
        &self,
        day: &DesignDay,
        peaks: &mut BTreeMap<ArchetypeId, Peak>,
    ) -> Result<(), SimulationError> {
        let Some(first) = day.samples.first() else {
            return Ok(());
        };

        let mut context = Context::new(
            self.model.clone(),
            self.config,
            self.aggregator.clone(),
            day.start,
            first,
        )?;
        let feed = HourlyForcing::new(day.start, day.samples.clone());
        let steps = feed.hours() * usize::try_from(3600 / self.config.step_seconds).unwrap_or(0);

        for _ in 0..steps {
            let time = context.clock.time().checked_add(context.clock.step())?;
            let forcing = feed
                .forcing_at(time)
                .ok_or(SimulationError::MissingForcing { time })?;
            let record = context.advance(&forcing, None)?;

            for (id, load) in &record.loads.by_archetype {
                if let Some(peak) = peaks.get_mut(id) {
                    peak.heating = peak.heating.max(load.heating.get::<watt_per_square_meter>());
                    peak.sensible_cooling = peak
                        .sensible_cooling
                        .max(load.sensible_cooling.get::<watt_per_square_meter>());
                    peak.latent_cooling = peak
                        .latent_cooling
                        .max(load.latent_cooling.get::<watt_per_square_meter>());
                }
            }
        }
        Ok(())
    }
}

/// Running peak loads, W/m² of footprint.
#[derive(Debug, Clone, Copy, Default)]
struct Peak {
    heating: f64,
    sensible_cooling: f64,
    latent_cooling: f64,
}

impl Peak {
    fn scaled(self, scale: f64) -> HvacCapacity {
        let flux = HeatFluxDensity::new::<watt_per_square_meter>;
        HvacCapacity {
            heating: flux(self.heating * scale),
            sensible_cooling: flux(self.sensible_cooling * scale),
            latent_cooling: flux(self.latent_cooling * scale),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;
    use jiff::civil::date;

    use crate::models::urban::core::{
        AtmosphereConstants, SolverConfig,
        test_support::{forcing, no_tree_params, simple_aggregator},
    };

    fn model() -> CanyonModel {
        CanyonModel::new(
            no_tree_params(),
            SolverConfig::default(),
            AtmosphereConstants::default(),
        )
        .unwrap()
    }

    fn winter_day() -> DesignDay {
        DesignDay::new(date(2024, 1, 20).at(0, 0, 0, 0), vec![forcing(-10.0); 6])
    }

    #[test]
    fn repeated_autosizing_is_identical() {
        let model = model();
        let config = SimulationConfig::default();
        let aggregator = simple_aggregator();
        let autosizer = HvacAutosizer::new(&model, &config, &aggregator);

        let first = autosizer.autosize(&[winter_day()]).unwrap();
        let second = autosizer.autosize(&[winter_day()]).unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn winter_sizes_heating_with_margin() {
        let model = model();
        let aggregator = simple_aggregator();
        let tight = SimulationConfig {
            autosize: AutosizeConfig { safety_margin: 0.0 },
            ..SimulationConfig::default()
        };
        let loose = SimulationConfig::default();

        let base = HvacAutosizer::new(&model, &tight, &aggregator)
            .autosize(&[winter_day()])
            .unwrap();
        let sized = HvacAutosizer::new(&model, &loose, &aggregator)
            .autosize(&[winter_day()])
            .unwrap();

        assert_eq!(sized.len(), 2);
        for (id, capacity) in sized.iter() {
            let heating = capacity.heating.get::<watt_per_square_meter>();
            let unscaled = base.get(id).unwrap().heating.get::<watt_per_square_meter>();
            assert!(heating > 0.0, "{id} has no heating capacity");
            assert_relative_eq!(heating, 1.2 * unscaled, max_relative = 1e-12);
        }
    }

    #[test]
    fn rejects_negative_safety_margin() {
        let model = model();
        let aggregator = simple_aggregator();
        let config = SimulationConfig {
            autosize: AutosizeConfig {
                safety_margin: -2.0,
            },
            ..SimulationConfig::default()
        };

        assert!(matches!(
            HvacAutosizer::new(&model, &config, &aggregator).autosize(&[winter_day()]),
            Err(SimulationError::Configuration(
                ConfigurationError::InvalidParameter {
                    name: "autosize.safety_margin",
                    ..
                }
            ))
        ));
    }

    #[test]
    fn rejects_inverted_boundary_layer() {
        let model = model();
        let aggregator = simple_aggregator();
        let mut config = SimulationConfig::default();
        config.boundary_layer.night_height = 2.0 * config.boundary_layer.day_height;

        assert!(matches!(
            HvacAutosizer::new(&model, &config, &aggregator).autosize(&[winter_day()]),
            Err(SimulationError::Configuration(
                ConfigurationError::Misordered { .. }
            ))
        ));
    }

    #[test]
    fn requires_design_days() {
        let model = model();
        let config = SimulationConfig::default();
        let aggregator = simple_aggregator();

        assert!(matches!(
            HvacAutosizer::new(&model, &config, &aggregator).autosize(&[]),
            Err(SimulationError::Configuration(ConfigurationError::NoDesignDays))
        ));
    }
}
