//! Rural weather forcing supplied to the canyon each step.

use jiff::civil::DateTime;
use uom::si::f64::{HeatFluxDensity, Pressure, Ratio, ThermodynamicTemperature, Velocity};

/// Rural reference conditions for one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForcingSample {
    /// Dry-bulb air temperature.
    pub temperature: ThermodynamicTemperature,
    /// Specific humidity, kg/kg.
    pub humidity: Ratio,
    pub wind: Velocity,
    pub pressure: Pressure,
    /// Direct shortwave on a horizontal surface.
    pub direct_solar: HeatFluxDensity,
    /// Diffuse shortwave on a horizontal surface.
    pub diffuse_solar: HeatFluxDensity,
    /// Downwelling sky longwave.
    pub longwave: HeatFluxDensity,
    /// Rural upward sensible heat flux, the baseline for boundary-layer heating.
    pub rural_sensible: HeatFluxDensity,
}

/// A source of forcing keyed by simulated time.
pub trait ForcingFeed {
    /// Returns the forcing for `time`, or `None` if the feed does not cover it.
    fn forcing_at(&self, time: DateTime) -> Option<ForcingSample>;
}

/// Hourly weather records held constant within each hour.
///
/// Record `i` covers the interval `(start + i h, start + (i + 1) h]`, so a
/// step ending exactly on the hour still uses the record of the hour it
/// closes.
#[derive(Debug, Clone, PartialEq)]
pub struct HourlyForcing {
    start: DateTime,
    records: Vec<ForcingSample>,
}

impl HourlyForcing {
    #[must_use]
    pub fn new(start: DateTime, records: Vec<ForcingSample>) -> Self {
        Self { start, records }
    }

    #[must_use]
    pub fn start(&self) -> DateTime {
        self.start
    }

    #[must_use]
    pub fn records(&self) -> &[ForcingSample] {
        &self.records
    }

    /// Number of hours covered.
    #[must_use]
    pub fn hours(&self) -> usize {
        self.records.len()
    }
}

impl ForcingFeed for HourlyForcing {
    fn forcing_at(&self, time: DateTime) -> Option<ForcingSample> {
        let elapsed = time.duration_since(self.start).as_secs();
        if elapsed < 0 {
            return None;
        }
        let index = usize::try_from((elapsed.max(1) - 1) / 3600).ok()?;
        self.records.get(index).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::civil::date;
    use uom::si::thermodynamic_temperature::degree_celsius;

    use crate::models::urban::core::test_support::forcing;

    #[test]
    fn holds_each_record_for_its_hour() {
        let start = date(2024, 7, 1).at(0, 0, 0, 0);
        let feed = HourlyForcing::new(start, vec![forcing(20.0), forcing(21.0)]);

        let temp_at = |h, m| {
            feed.forcing_at(date(2024, 7, 1).at(h, m, 0, 0))
                .map(|s| s.temperature.get::<degree_celsius>())
        };

        assert_eq!(temp_at(0, 5).map(f64::round), Some(20.0));
        assert_eq!(temp_at(1, 0).map(f64::round), Some(20.0));
        assert_eq!(temp_at(1, 5).map(f64::round), Some(21.0));
        assert_eq!(temp_at(2, 0).map(f64::round), Some(21.0));
        assert_eq!(temp_at(2, 5), None);
    }

    #[test]
    fn nothing_before_start() {
        let start = date(2024, 7, 1).at(6, 0, 0, 0);
        let feed = HourlyForcing::new(start, vec![forcing(20.0)]);
        assert!(feed.forcing_at(date(2024, 7, 1).at(5, 0, 0, 0)).is_none());
    }
}
