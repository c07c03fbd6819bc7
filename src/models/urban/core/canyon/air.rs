//! Canyon air temperature and humidity balances.
//!
//! Within one outer iteration the surface temperatures are fixed, so both
//! balances are linear in the canyon value and are solved directly.

use super::SolveError;

/// A linear exchange `G · (source − x)` between the canyon air and a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct Coupling {
    pub(super) conductance: f64,
    pub(super) source: f64,
}

impl Coupling {
    /// Flow into the canyon when the canyon value is `x`.
    fn inflow(self, x: f64) -> f64 {
        self.conductance * (self.source - x)
    }
}

/// The `x` at which all couplings and the fixed source balance.
fn equilibrium(couplings: &[Coupling], fixed: f64, quantity: &'static str) -> Result<f64, SolveError> {
    let (weighted, total) = couplings.iter().fold((fixed, 0.0), |(w, g), c| {
        (w + c.conductance * c.source, g + c.conductance)
    });
    let x = weighted / total;
    if x.is_finite() {
        Ok(x)
    } else {
        Err(SolveError::NonFinite { quantity })
    }
}

/// Sensible heat balance of the canyon air, W and W/K per urban cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct SensibleBalance {
    pub(super) road: Coupling,
    pub(super) wall: Coupling,
    pub(super) window: Coupling,
    pub(super) tree: Coupling,
    pub(super) vent: Coupling,
    pub(super) ubl: Coupling,
    pub(super) storage: Coupling,
    /// HVAC waste heat released into the canyon.
    pub(super) hvac: f64,
    pub(super) traffic: f64,
}

/// Heat flows at the balanced canyon temperature, W per urban cell.
///
/// Injected terms are positive into the canyon; `vent`, `ubl` and
/// `storage` are positive when the canyon loses heat to them, so that
/// `road + wall + window + tree + hvac + traffic − vent − ubl = storage`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct SensibleFlows {
    pub(super) temp: f64,
    pub(super) road: f64,
    pub(super) wall: f64,
    pub(super) window: f64,
    pub(super) tree: f64,
    pub(super) vent: f64,
    pub(super) ubl: f64,
    pub(super) storage: f64,
}

impl SensibleBalance {
    pub(super) fn solve(&self) -> Result<SensibleFlows, SolveError> {
        let temp = equilibrium(
            &[
                self.road,
                self.wall,
                self.window,
                self.tree,
                self.vent,
                self.ubl,
                self.storage,
            ],
            self.hvac + self.traffic,
            "canyon temperature",
        )?;

        Ok(SensibleFlows {
            temp,
            road: self.road.inflow(temp),
            wall: self.wall.inflow(temp),
            window: self.window.inflow(temp),
            tree: self.tree.inflow(temp),
            vent: -self.vent.inflow(temp),
            ubl: -self.ubl.inflow(temp),
            storage: -self.storage.inflow(temp),
        })
    }
}

/// Moisture balance of the canyon air, kg/s and kg/s per unit humidity.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct MoistureBalance {
    pub(super) vent: Coupling,
    pub(super) ubl: Coupling,
    pub(super) storage: Coupling,
    /// Evaporation and anthropogenic moisture released into the canyon.
    pub(super) sources: f64,
}

/// Moisture flows at the balanced canyon humidity, kg/s per urban cell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct MoistureFlows {
    pub(super) hum: f64,
    /// Positive when moisture leaves the canyon to the boundary layer.
    pub(super) ubl: f64,
}

impl MoistureBalance {
    pub(super) fn solve(&self) -> Result<MoistureFlows, SolveError> {
        let hum = equilibrium(
            &[self.vent, self.ubl, self.storage],
            self.sources,
            "canyon humidity",
        )?;
        Ok(MoistureFlows {
            hum,
            ubl: -self.ubl.inflow(hum),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn coupling(conductance: f64, source: f64) -> Coupling {
        Coupling {
            conductance,
            source,
        }
    }

    fn balance() -> SensibleBalance {
        SensibleBalance {
            road: coupling(4000.0, 305.0),
            wall: coupling(9000.0, 301.0),
            window: coupling(1100.0, 295.0),
            tree: coupling(0.0, 300.0),
            vent: coupling(2500.0, 295.0),
            ubl: coupling(700.0, 299.0),
            storage: coupling(6500.0, 300.0),
            hvac: 20_000.0,
            traffic: 12_000.0,
        }
    }

    #[test]
    fn sensible_flows_close_the_budget() {
        let flows = balance().solve().unwrap();
        let injected = flows.road + flows.wall + flows.window + flows.tree + 32_000.0;
        assert_relative_eq!(
            injected - flows.vent - flows.ubl,
            flows.storage,
            epsilon = 1e-6
        );
        assert_relative_eq!(flows.tree, 0.0);
    }

    #[test]
    fn sources_warm_the_canyon() {
        let quiet = SensibleBalance {
            hvac: 0.0,
            traffic: 0.0,
            ..balance()
        }
        .solve()
        .unwrap();
        let busy = balance().solve().unwrap();
        assert!(busy.temp > quiet.temp);
    }

    #[test]
    fn humidity_relaxes_toward_sources() {
        let balance = MoistureBalance {
            vent: coupling(2.5, 0.010),
            ubl: coupling(0.7, 0.008),
            storage: coupling(6.5, 0.009),
            sources: 0.0,
        };
        let flows = balance.solve().unwrap();
        assert!(flows.hum > 0.008 && flows.hum < 0.010);
        assert_relative_eq!(flows.ubl, 0.7 * (flows.hum - 0.008), max_relative = 1e-12);
    }

    #[test]
    fn zero_conductance_is_not_finite() {
        let balance = MoistureBalance {
            vent: coupling(0.0, 0.010),
            ubl: coupling(0.0, 0.008),
            storage: coupling(0.0, 0.009),
            sources: 0.0,
        };
        assert!(matches!(balance.solve(), Err(SolveError::NonFinite { .. })));
    }
}
