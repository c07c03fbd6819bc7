//! Raw urban-area description, as loaded from configuration.
//!
//! All fields are plain SI `f64` values so the structs deserialize directly
//! from JSON or TOML. Range checks happen in [`Geometry::derive`](super::Geometry::derive).

use jiff::civil::{DateTime, Weekday};
use serde::{Deserialize, Serialize};

use crate::support::constraint::{
    ConstraintError, NonNegative, StrictlyPositive, UnitInterval, UnitIntervalOpen,
};

use super::ConfigurationError;

/// Static description of the urban district.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrbanParameters {
    /// Average building height, m.
    pub bld_height: f64,
    /// Facade area per unit of urban plan area.
    pub ver_to_hor: f64,
    /// Building footprint fraction of the plan area.
    pub bld_density: f64,
    /// Tree canopy fraction of the plan area.
    pub tree_coverage: f64,
    /// Grass fraction of the road surface.
    pub road_veg_coverage: f64,
    /// Peak traffic sensible heat per plan area, W/m².
    pub sens_anthrop: f64,
    /// Anthropogenic latent heat per plan area, W/m².
    pub lat_anthrop: f64,
    /// Fraction of HVAC waste heat released into the canyon (the rest leaves at roof level).
    pub h_mix: f64,
    /// District average window-to-wall ratio.
    pub glazing_ratio: f64,
    /// District average window solar heat gain coefficient.
    pub shgc: f64,
    /// Temperature of the deep ground below the road, K.
    pub deep_ground_temp: f64,
    pub road: SurfaceMaterial,
    pub wall: SurfaceMaterial,
    pub roof: SurfaceMaterial,
    pub vegetation: VegetationParameters,
    pub traffic: TrafficSchedule,
}

impl Default for UrbanParameters {
    fn default() -> Self {
        Self {
            bld_height: 10.0,
            ver_to_hor: 0.48,
            bld_density: 0.5,
            tree_coverage: 0.1,
            road_veg_coverage: 0.0,
            sens_anthrop: 20.0,
            lat_anthrop: 2.0,
            h_mix: 1.0,
            glazing_ratio: 0.4,
            shgc: 0.6,
            deep_ground_temp: 299.15,
            road: SurfaceMaterial {
                albedo: 0.1,
                emissivity: 0.95,
                conductance: 1.5,
                heat_capacity: 1.8e5,
            },
            wall: SurfaceMaterial {
                albedo: 0.2,
                emissivity: 0.9,
                conductance: 1.2,
                heat_capacity: 1.0e5,
            },
            roof: SurfaceMaterial {
                albedo: 0.2,
                emissivity: 0.9,
                conductance: 0.8,
                heat_capacity: 8.0e4,
            },
            vegetation: VegetationParameters::default(),
            traffic: TrafficSchedule::default(),
        }
    }
}

/// Radiative and thermal properties of one urban surface.
///
/// The surface is a single node with heat capacity `heat_capacity`
/// connected through `conductance` to its inner boundary: the deep ground
/// for roads, the building interior for walls and roofs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SurfaceMaterial {
    pub albedo: f64,
    pub emissivity: f64,
    /// W/m²·K.
    pub conductance: f64,
    /// J/m²·K.
    pub heat_capacity: f64,
}

impl SurfaceMaterial {
    /// Checks ranges, reporting violations under the given field names
    /// (albedo, emissivity, conductance, heat capacity).
    pub(crate) fn validate(&self, names: &[&'static str; 4]) -> Result<(), ConfigurationError> {
        UnitInterval::new(self.albedo).map_err(ConfigurationError::invalid(names[0]))?;
        UnitInterval::new(self.emissivity).map_err(ConfigurationError::invalid(names[1]))?;
        NonNegative::new(self.conductance).map_err(ConfigurationError::invalid(names[2]))?;
        finite(self.conductance, names[2])?;
        NonNegative::new(self.heat_capacity).map_err(ConfigurationError::invalid(names[3]))?;
        finite(self.heat_capacity, names[3])?;
        Ok(())
    }
}

/// Tree canopy properties.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VegetationParameters {
    pub albedo: f64,
    pub emissivity: f64,
    /// Fraction of absorbed shortwave released as latent heat.
    pub latent_fraction: f64,
}

impl Default for VegetationParameters {
    fn default() -> Self {
        Self {
            albedo: 0.25,
            emissivity: 0.95,
            latent_fraction: 0.7,
        }
    }
}

/// Hourly traffic intensity as a fraction of the peak `sens_anthrop`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrafficSchedule {
    pub weekday: [f64; 24],
    pub saturday: [f64; 24],
    pub sunday: [f64; 24],
}

impl Default for TrafficSchedule {
    fn default() -> Self {
        Self {
            weekday: [
                0.2, 0.2, 0.2, 0.2, 0.2, 0.4, 0.7, 0.9, 0.9, 0.6, 0.6, 0.6, 0.6, 0.6, 0.7, 0.8,
                0.9, 0.9, 0.8, 0.8, 0.7, 0.3, 0.2, 0.2,
            ],
            saturday: [
                0.2, 0.2, 0.2, 0.2, 0.2, 0.3, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.5, 0.6, 0.7,
                0.7, 0.7, 0.7, 0.5, 0.4, 0.3, 0.2, 0.2,
            ],
            sunday: [
                0.2, 0.2, 0.2, 0.2, 0.2, 0.3, 0.4, 0.4, 0.4, 0.4, 0.4, 0.4, 0.4, 0.4, 0.4, 0.4,
                0.4, 0.4, 0.4, 0.4, 0.3, 0.3, 0.2, 0.2,
            ],
        }
    }
}

impl TrafficSchedule {
    /// Traffic fraction for the hour containing `time`.
    #[must_use]
    pub fn fraction(&self, time: DateTime) -> f64 {
        let hour = usize::try_from(time.hour()).unwrap_or(0).min(23);
        match time.weekday() {
            Weekday::Saturday => self.saturday[hour],
            Weekday::Sunday => self.sunday[hour],
            _ => self.weekday[hour],
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigurationError> {
        self.weekday
            .iter()
            .chain(&self.saturday)
            .chain(&self.sunday)
            .try_for_each(|&f| {
                UnitInterval::new(f)
                    .map(|_| ())
                    .map_err(ConfigurationError::invalid("traffic"))
            })
    }
}

impl UrbanParameters {
    /// Checks every range constraint on the raw inputs.
    ///
    /// # Errors
    ///
    /// Returns the first [`ConfigurationError`] found.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        StrictlyPositive::new(self.bld_height).map_err(ConfigurationError::invalid("bld_height"))?;
        finite(self.bld_height, "bld_height")?;
        StrictlyPositive::new(self.ver_to_hor).map_err(ConfigurationError::invalid("ver_to_hor"))?;
        finite(self.ver_to_hor, "ver_to_hor")?;
        UnitIntervalOpen::new(self.bld_density)
            .map_err(ConfigurationError::invalid("bld_density"))?;
        UnitInterval::new(self.tree_coverage)
            .map_err(ConfigurationError::invalid("tree_coverage"))?;
        UnitInterval::new(self.road_veg_coverage)
            .map_err(ConfigurationError::invalid("road_veg_coverage"))?;
        NonNegative::new(self.sens_anthrop).map_err(ConfigurationError::invalid("sens_anthrop"))?;
        finite(self.sens_anthrop, "sens_anthrop")?;
        NonNegative::new(self.lat_anthrop).map_err(ConfigurationError::invalid("lat_anthrop"))?;
        finite(self.lat_anthrop, "lat_anthrop")?;
        UnitInterval::new(self.h_mix).map_err(ConfigurationError::invalid("h_mix"))?;
        UnitInterval::new(self.glazing_ratio)
            .map_err(ConfigurationError::invalid("glazing_ratio"))?;
        UnitInterval::new(self.shgc).map_err(ConfigurationError::invalid("shgc"))?;
        StrictlyPositive::new(self.deep_ground_temp)
            .map_err(ConfigurationError::invalid("deep_ground_temp"))?;
        finite(self.deep_ground_temp, "deep_ground_temp")?;

        self.road.validate(&[
            "road.albedo",
            "road.emissivity",
            "road.conductance",
            "road.heat_capacity",
        ])?;
        self.wall.validate(&[
            "wall.albedo",
            "wall.emissivity",
            "wall.conductance",
            "wall.heat_capacity",
        ])?;
        self.roof.validate(&[
            "roof.albedo",
            "roof.emissivity",
            "roof.conductance",
            "roof.heat_capacity",
        ])?;

        UnitInterval::new(self.vegetation.albedo)
            .map_err(ConfigurationError::invalid("vegetation.albedo"))?;
        UnitInterval::new(self.vegetation.emissivity)
            .map_err(ConfigurationError::invalid("vegetation.emissivity"))?;
        UnitInterval::new(self.vegetation.latent_fraction)
            .map_err(ConfigurationError::invalid("vegetation.latent_fraction"))?;

        self.traffic.validate()
    }
}

/// Rejects `+inf`, which the sign constraints let through.
fn finite(value: f64, name: &'static str) -> Result<(), ConfigurationError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigurationError::invalid(name)(ConstraintError::AboveMaximum))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;

    #[test]
    fn traffic_follows_day_type() {
        let schedule = TrafficSchedule::default();

        // 2024-01-01 is a Monday, 2024-01-06 a Saturday, 2024-01-07 a Sunday.
        let monday = date(2024, 1, 1).at(8, 30, 0, 0);
        let saturday = date(2024, 1, 6).at(8, 30, 0, 0);
        let sunday = date(2024, 1, 7).at(8, 30, 0, 0);

        assert_eq!(schedule.fraction(monday), 0.9);
        assert_eq!(schedule.fraction(saturday), 0.5);
        assert_eq!(schedule.fraction(sunday), 0.4);
    }

    #[test]
    fn defaults_are_valid() {
        assert!(UrbanParameters::default().validate().is_ok());
    }

    #[test]
    fn rejects_out_of_range_fraction() {
        let params = UrbanParameters {
            tree_coverage: 1.5,
            ..UrbanParameters::default()
        };
        match params.validate() {
            Err(ConfigurationError::InvalidParameter { name, .. }) => {
                assert_eq!(name, "tree_coverage");
            }
            other => panic!("expected InvalidParameter, got {other:?}"),
        }
    }

    #[test]
    fn rejects_infinite_dimensions() {
        for (name, params) in [
            (
                "bld_height",
                UrbanParameters {
                    bld_height: f64::INFINITY,
                    ..UrbanParameters::default()
                },
            ),
            (
                "ver_to_hor",
                UrbanParameters {
                    ver_to_hor: f64::INFINITY,
                    ..UrbanParameters::default()
                },
            ),
            (
                "sens_anthrop",
                UrbanParameters {
                    sens_anthrop: f64::INFINITY,
                    ..UrbanParameters::default()
                },
            ),
        ] {
            match params.validate() {
                Err(ConfigurationError::InvalidParameter { name: bad, source }) => {
                    assert_eq!(bad, name);
                    assert_eq!(source, ConstraintError::AboveMaximum);
                }
                other => panic!("expected InvalidParameter for {name}, got {other:?}"),
            }
        }

        let mut params = UrbanParameters::default();
        params.road.heat_capacity = f64::INFINITY;
        assert!(matches!(
            params.validate(),
            Err(ConfigurationError::InvalidParameter {
                name: "road.heat_capacity",
                ..
            })
        ));
    }

    #[test]
    fn rejects_bad_traffic_fraction() {
        let mut params = UrbanParameters::default();
        params.traffic.sunday[3] = -0.1;
        assert!(matches!(
            params.validate(),
            Err(ConfigurationError::InvalidParameter { name: "traffic", .. })
        ));
    }

    #[test]
    fn deserializes_partial_json() {
        let params: UrbanParameters =
            serde_json::from_str(r#"{ "bld_height": 25.0, "tree_coverage": 0.0 }"#).unwrap();
        assert_eq!(params.bld_height, 25.0);
        assert_eq!(params.tree_coverage, 0.0);
        assert_eq!(params.bld_density, UrbanParameters::default().bld_density);
    }
}
