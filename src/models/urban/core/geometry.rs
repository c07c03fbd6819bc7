//! Canyon geometry derived once from the urban parameters.

use uom::si::{
    area::square_meter,
    f64::{Area, Length, Ratio, Volume},
    length::meter,
    ratio::ratio,
    volume::cubic_meter,
};

use super::{ConfigurationError, UrbanParameters};

/// Canyon geometry descriptors and bulk surface properties.
///
/// Areas are per urban cell: one square building footprint of width
/// `bld_width` plus its share of surrounding road, so the cell's plan area is
/// `roof_area + road_area` and its footprint fraction equals `bld_density`.
///
/// View factors follow the infinite-canyon approximation and satisfy
/// `road_conf + 2 · can_aspect · wall_conf = 1`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geometry {
    pub bld_height: Length,
    pub ver_to_hor: Ratio,
    pub bld_density: Ratio,
    pub tree_coverage: Ratio,
    pub bld_width: Length,
    pub can_width: Length,
    pub can_aspect: Ratio,
    /// Road sky-view factor.
    pub road_conf: Ratio,
    /// Wall sky-view factor.
    pub wall_conf: Ratio,
    pub fac_area: Area,
    pub road_area: Area,
    pub roof_area: Area,
    pub alb_wall: Ratio,
    /// Effective facade shortwave absorptivity, glazing included.
    pub fac_absor: Ratio,
    pub road_absor: Ratio,
    /// Fraction of the road shaded by tree canopy.
    pub road_shad: Ratio,
    /// Urban roughness length.
    pub z0u: Length,
    /// Urban displacement height.
    pub l_disp: Length,
}

impl Geometry {
    /// Derives the canyon geometry from raw urban parameters.
    ///
    /// Canyon width follows from building width and density so that the
    /// footprint fraction of a square cell is preserved. Roughness and
    /// displacement lengths follow Grimmond & Oke (1999) as functions of the
    /// frontal area density `ver_to_hor / 4`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigurationError`] if any ratio is outside its allowed
    /// range, the building height is not positive, or the inputs are so
    /// extreme that a derived length or area overflows or vanishes.
    pub fn derive(params: &UrbanParameters) -> Result<Self, ConfigurationError> {
        params.validate()?;

        let height = params.bld_height;
        let density = params.bld_density;

        let bld_width = 4.0 * height * density / params.ver_to_hor;
        let cell_width = bld_width / density.sqrt();
        let can_width = cell_width - bld_width;
        let can_aspect = height / can_width;

        // sqrt(a² + 1) − a, rearranged to avoid cancellation at large aspect.
        let road_conf = 1.0 / (can_aspect.hypot(1.0) + can_aspect);
        let wall_conf = 0.5 * (1.0 - road_conf) / can_aspect;

        let fac_area = 4.0 * bld_width * height;
        let road_area = cell_width * cell_width - bld_width * bld_width;
        let roof_area = bld_width * bld_width;

        for (quantity, value) in [
            ("bld_width", bld_width),
            ("can_width", can_width),
            ("can_aspect", can_aspect),
            ("fac_area", fac_area),
            ("road_area", road_area),
            ("roof_area", roof_area),
        ] {
            if !(value.is_finite() && value > 0.0) {
                return Err(ConfigurationError::DegenerateGeometry { quantity, value });
            }
        }

        let r_glaze = params.glazing_ratio;
        let fac_absor =
            (1.0 - r_glaze) * (1.0 - params.wall.albedo) + r_glaze * (1.0 - 0.75 * params.shgc);
        let road_absor = (1.0 - params.road_veg_coverage) * (1.0 - params.road.albedo);
        let road_shad = (params.tree_coverage / (1.0 - density)).min(1.0);

        let front_density = params.ver_to_hor / 4.0;

        Ok(Self {
            bld_height: Length::new::<meter>(height),
            ver_to_hor: Ratio::new::<ratio>(params.ver_to_hor),
            bld_density: Ratio::new::<ratio>(density),
            tree_coverage: Ratio::new::<ratio>(params.tree_coverage),
            bld_width: Length::new::<meter>(bld_width),
            can_width: Length::new::<meter>(can_width),
            can_aspect: Ratio::new::<ratio>(can_aspect),
            road_conf: Ratio::new::<ratio>(road_conf),
            wall_conf: Ratio::new::<ratio>(wall_conf),
            fac_area: Area::new::<square_meter>(fac_area),
            road_area: Area::new::<square_meter>(road_area),
            roof_area: Area::new::<square_meter>(roof_area),
            alb_wall: Ratio::new::<ratio>(params.wall.albedo),
            fac_absor: Ratio::new::<ratio>(fac_absor),
            road_absor: Ratio::new::<ratio>(road_absor),
            road_shad: Ratio::new::<ratio>(road_shad),
            z0u: Length::new::<meter>(roughness_length(front_density, height)),
            l_disp: Length::new::<meter>(displacement_length(front_density, height)),
        })
    }

    /// Plan area of one urban cell (roof plus road).
    #[must_use]
    pub fn cell_area(&self) -> Area {
        self.road_area + self.roof_area
    }

    /// Air volume of the canyon in one urban cell.
    #[must_use]
    pub fn canyon_volume(&self) -> Volume {
        Volume::new::<cubic_meter>(
            self.road_area.get::<square_meter>() * self.bld_height.get::<meter>(),
        )
    }

    /// Facade area per unit of building footprint.
    #[must_use]
    pub fn facade_to_footprint(&self) -> f64 {
        self.fac_area.get::<square_meter>() / self.roof_area.get::<square_meter>()
    }
}

fn roughness_length(front_density: f64, height: f64) -> f64 {
    front_density.min(0.15) * height
}

fn displacement_length(front_density: f64, height: f64) -> f64 {
    if front_density < 0.05 {
        3.0 * front_density * height
    } else if front_density < 0.15 {
        (0.15 + 5.5 * (front_density - 0.05)) * height
    } else if front_density < 1.0 {
        (0.7 + 0.35 * (front_density - 0.15)) * height
    } else {
        0.5 * height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn reference() -> UrbanParameters {
        UrbanParameters {
            bld_height: 10.0,
            ver_to_hor: 0.5,
            bld_density: 0.5,
            tree_coverage: 0.0,
            ..UrbanParameters::default()
        }
    }

    #[test]
    fn matches_reference_district() {
        let g = Geometry::derive(&reference()).unwrap();

        let golden = [
            (g.bld_width.get::<meter>(), 40.0),
            (g.can_width.get::<meter>(), 16.568_542_494_923_797),
            (g.can_aspect.get::<ratio>(), 0.603_553_390_593_274),
            (g.road_conf.get::<ratio>(), 0.564_469_167_106_977_5),
            (g.wall_conf.get::<ratio>(), 0.360_805_555_631_879_94),
            (g.fac_area.get::<square_meter>(), 1600.0),
            (g.road_area.get::<square_meter>(), 1600.0),
            (g.roof_area.get::<square_meter>(), 1600.0),
            (g.z0u.get::<meter>(), 1.25),
            (g.l_disp.get::<meter>(), 5.625),
        ];
        for (actual, expected) in golden {
            assert_relative_eq!(actual, expected, max_relative = 1e-10);
        }
    }

    #[test]
    fn aspect_is_exact_ratio() {
        for (height, ver_to_hor, density) in [(10.0, 0.5, 0.5), (35.0, 1.8, 0.3), (4.0, 0.1, 0.05)]
        {
            let params = UrbanParameters {
                bld_height: height,
                ver_to_hor,
                bld_density: density,
                ..UrbanParameters::default()
            };
            let g = Geometry::derive(&params).unwrap();

            assert_eq!(
                g.can_aspect.get::<ratio>(),
                g.bld_height.get::<meter>() / g.can_width.get::<meter>()
            );
            for factor in [g.road_conf, g.wall_conf, g.road_shad, g.fac_absor, g.road_absor] {
                let f = factor.get::<ratio>();
                assert!((0.0..=1.0).contains(&f), "view factor {f} outside [0, 1]");
            }
            assert_relative_eq!(
                g.road_conf.get::<ratio>()
                    + 2.0 * g.can_aspect.get::<ratio>() * g.wall_conf.get::<ratio>(),
                1.0,
                epsilon = 1e-12
            );
            assert!(g.road_area.get::<square_meter>() >= 0.0);
            assert_relative_eq!(
                g.roof_area.get::<square_meter>() / g.cell_area().get::<square_meter>(),
                density,
                max_relative = 1e-12
            );
        }
    }

    #[test]
    fn tree_shading_is_capped() {
        let params = UrbanParameters {
            bld_density: 0.6,
            tree_coverage: 0.5,
            ..UrbanParameters::default()
        };
        let g = Geometry::derive(&params).unwrap();
        assert_eq!(g.road_shad.get::<ratio>(), 1.0);
    }

    #[test]
    fn extreme_inputs_never_give_bad_view_factors() {
        for (bld_height, ver_to_hor) in [
            (1.0e300, 0.48),
            (10.0, 1.0e308),
            (10.0, 1.0e-300),
            (1.0e-300, 0.48),
            (1.0e150, 1.0e-150),
        ] {
            let params = UrbanParameters {
                bld_height,
                ver_to_hor,
                ..reference()
            };
            let Ok(g) = Geometry::derive(&params) else {
                continue;
            };
            for factor in [g.road_conf, g.wall_conf] {
                let f = factor.get::<ratio>();
                assert!(
                    (0.0..=1.0).contains(&f),
                    "view factor {f} outside [0, 1] for height {bld_height}, ratio {ver_to_hor}"
                );
            }
        }
    }

    #[test]
    fn large_aspect_keeps_view_factors_in_range() {
        let params = UrbanParameters {
            ver_to_hor: 1.0e12,
            ..reference()
        };
        let g = Geometry::derive(&params).unwrap();
        let aspect = g.can_aspect.get::<ratio>();

        assert!(g.road_conf.get::<ratio>() > 0.0);
        assert_relative_eq!(g.road_conf.get::<ratio>(), 0.5 / aspect, max_relative = 1e-6);
        assert_relative_eq!(
            g.road_conf.get::<ratio>() + 2.0 * aspect * g.wall_conf.get::<ratio>(),
            1.0,
            epsilon = 1e-12
        );
    }

    #[test]
    fn rejects_overflowing_geometry() {
        let params = UrbanParameters {
            ver_to_hor: 1.0e-300,
            ..reference()
        };
        assert!(matches!(
            Geometry::derive(&params),
            Err(ConfigurationError::DegenerateGeometry { .. })
        ));

        let infinite = UrbanParameters {
            bld_height: f64::INFINITY,
            ..reference()
        };
        assert!(matches!(
            Geometry::derive(&infinite),
            Err(ConfigurationError::InvalidParameter {
                name: "bld_height",
                ..
            })
        ));
    }

    #[test]
    fn rejects_invalid_inputs() {
        let zero_height = UrbanParameters {
            bld_height: 0.0,
            ..reference()
        };
        assert!(matches!(
            Geometry::derive(&zero_height),
            Err(ConfigurationError::InvalidParameter {
                name: "bld_height",
                ..
            })
        ));

        let full_density = UrbanParameters {
            bld_density: 1.0,
            ..reference()
        };
        assert!(matches!(
            Geometry::derive(&full_density),
            Err(ConfigurationError::InvalidParameter {
                name: "bld_density",
                ..
            })
        ));
    }
}
