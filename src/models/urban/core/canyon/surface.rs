//! Single-node surface energy balances and their root-find.

use std::convert::Infallible;

use twine_core::{EquationProblem, Model};
use twine_solvers::equation::bisection;
use uom::si::{
    f64::{HeatFluxDensity, ThermodynamicTemperature},
    heat_flux_density::watt_per_square_meter,
    thermodynamic_temperature::kelvin,
};

use crate::models::urban::core::{ConvergenceScope, ConvergenceWarning, StepWarning};

use super::{SolveError, SurfaceSolverConfig, error::NonPhysicalTemperature};

/// Step used to widen the bracket around a surface temperature guess, K.
const BRACKET_STEP: f64 = 25.0;
const MAX_BRACKET_EXPANSIONS: usize = 40;
const MIN_TEMPERATURE: f64 = 1.0;

/// An urban surface with its own energy balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Surface {
    Road,
    Wall,
    Roof,
    Vegetation,
}

/// Energy balance of one surface node, per m² of surface.
///
/// ```text
/// net(T) = S + ε·L − ε·σ·T⁴ − h·(T − T_air) − K·(T − T_in) − C/Δt·(T − T_prev) − E
/// ```
///
/// `net` decreases strictly with `T`, so it has exactly one root.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct SurfaceBalance {
    /// Absorbed shortwave, W/m².
    pub(super) shortwave: f64,
    /// Incident longwave, W/m².
    pub(super) longwave: f64,
    pub(super) emissivity: f64,
    pub(super) sigma: f64,
    /// Convective coefficient, W/m²·K.
    pub(super) convection: f64,
    /// K.
    pub(super) air_temp: f64,
    /// Conductance to the inner boundary, W/m²·K.
    pub(super) conductance: f64,
    /// K.
    pub(super) inner_temp: f64,
    /// Heat capacity over the step duration, W/m²·K.
    pub(super) storage: f64,
    /// Surface temperature at the end of the previous step, K.
    pub(super) previous_temp: f64,
    /// Evaporative loss, W/m².
    pub(super) latent: f64,
}

impl SurfaceBalance {
    pub(super) fn net(&self, temp: f64) -> f64 {
        self.shortwave + self.emissivity * self.longwave
            - self.emissivity * self.sigma * temp.powi(4)
            - self.convective(temp)
            - self.conductance * (temp - self.inner_temp)
            - self.storage * (temp - self.previous_temp)
            - self.latent
    }

    /// Sensible heat given to the air at `temp`, W/m².
    pub(super) fn convective(&self, temp: f64) -> f64 {
        self.convection * (temp - self.air_temp)
    }
}

/// Converged temperature of one surface and its sensible flux to the air.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct SurfaceFluxes {
    pub(super) temperature: ThermodynamicTemperature,
    pub(super) net: HeatFluxDensity,
    pub(super) convective: HeatFluxDensity,
}

/// Model adapter exposing the surface temperature as the sole input.
struct SurfaceModel<'a> {
    balance: &'a SurfaceBalance,
}

impl Model for SurfaceModel<'_> {
    type Input = ThermodynamicTemperature;
    type Output = SurfaceFluxes;
    type Error = NonPhysicalTemperature;

    fn call(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
        let temp = input.get::<kelvin>();
        if !(temp.is_finite() && temp >= MIN_TEMPERATURE) {
            return Err(NonPhysicalTemperature { temperature: temp });
        }
        Ok(SurfaceFluxes {
            temperature: *input,
            net: HeatFluxDensity::new::<watt_per_square_meter>(self.balance.net(temp)),
            convective: HeatFluxDensity::new::<watt_per_square_meter>(
                self.balance.convective(temp),
            ),
        })
    }
}

/// Residual is the net surface flux.
struct SurfaceProblem;

impl EquationProblem<1> for SurfaceProblem {
    type Input = ThermodynamicTemperature;
    type Output = SurfaceFluxes;
    type Error = Infallible;

    fn input(&self, x: &[f64; 1]) -> Result<Self::Input, Self::Error> {
        Ok(ThermodynamicTemperature::new::<kelvin>(x[0]))
    }

    fn residuals(
        &self,
        _input: &Self::Input,
        output: &Self::Output,
    ) -> Result<[f64; 1], Self::Error> {
        Ok([output.net.get::<watt_per_square_meter>()])
    }
}

/// Solves one surface balance for its temperature.
///
/// The bracket starts around `guess` and widens until the net flux changes
/// sign. If bisection reaches its cap the best iterate is kept and a
/// [`ConvergenceWarning`] is pushed to `warnings`.
///
/// # Errors
///
/// Returns a [`SolveError`] if no sign change is found, the balance is not
/// finite, or the bisection solver fails.
pub(super) fn solve_surface(
    surface: Surface,
    balance: &SurfaceBalance,
    guess: f64,
    config: &SurfaceSolverConfig,
    warnings: &mut Vec<StepWarning>,
) -> Result<SurfaceFluxes, SolveError> {
    let bracket = bracket(surface, balance, guess)?;

    let model = SurfaceModel { balance };
    let solution = bisection::solve(
        &model,
        &SurfaceProblem,
        bracket,
        &config.bisection(),
        |event: &bisection::Event<'_, _, _>| {
            // Too cold to be physical means the net flux would be positive there.
            if event.result().is_err() {
                return Some(bisection::Action::assume_positive());
            }
            None
        },
    )
    .map_err(|source| SolveError::Bisection { surface, source })?;

    if solution.status != bisection::Status::Converged {
        log::warn!(
            "{surface:?} balance hit {} bisection iterations (residual={:e} W/m²)",
            solution.iters,
            solution.residual
        );
        warnings.push(StepWarning::Convergence(ConvergenceWarning {
            scope: ConvergenceScope::Surface(surface),
            iters: solution.iters,
            change: solution.residual,
        }));
    }

    Ok(solution.snapshot.output)
}

/// Finds `[lower, upper]` with `net(lower) > 0 > net(upper)`.
fn bracket(surface: Surface, balance: &SurfaceBalance, guess: f64) -> Result<[f64; 2], SolveError> {
    let center = if guess.is_finite() {
        guess.max(MIN_TEMPERATURE)
    } else {
        balance.air_temp
    };
    let mut lower = (center - BRACKET_STEP).max(MIN_TEMPERATURE);
    let mut upper = center + BRACKET_STEP;

    for _ in 0..MAX_BRACKET_EXPANSIONS {
        let (at_lower, at_upper) = (balance.net(lower), balance.net(upper));
        if !(at_lower.is_finite() && at_upper.is_finite()) {
            return Err(SolveError::NonFinite {
                quantity: "surface balance",
            });
        }
        if at_lower >= 0.0 && at_upper <= 0.0 {
            return Ok([lower, upper]);
        }
        if at_lower < 0.0 {
            lower = (lower - BRACKET_STEP).max(MIN_TEMPERATURE);
        }
        if at_upper > 0.0 {
            upper += BRACKET_STEP;
        }
    }

    Err(SolveError::Unbracketed {
        surface,
        lower,
        upper,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    fn balance() -> SurfaceBalance {
        SurfaceBalance {
            shortwave: 400.0,
            longwave: 350.0,
            emissivity: 0.95,
            sigma: 5.67e-8,
            convection: 10.0,
            air_temp: 300.0,
            conductance: 1.5,
            inner_temp: 295.0,
            storage: 600.0,
            previous_temp: 302.0,
            latent: 0.0,
        }
    }

    #[test]
    fn root_zeroes_the_balance() {
        let mut warnings = Vec::new();
        let fluxes = solve_surface(
            Surface::Road,
            &balance(),
            300.0,
            &SurfaceSolverConfig::default(),
            &mut warnings,
        )
        .unwrap();

        let temp = fluxes.temperature.get::<kelvin>();
        assert!(warnings.is_empty());
        assert!(balance().net(temp).abs() < 1e-5);
        assert_relative_eq!(
            fluxes.convective.get::<watt_per_square_meter>(),
            10.0 * (temp - 300.0),
            max_relative = 1e-12
        );
    }

    #[test]
    fn bracket_widens_from_a_poor_guess() {
        let mut warnings = Vec::new();
        let near = solve_surface(
            Surface::Wall,
            &balance(),
            300.0,
            &SurfaceSolverConfig::default(),
            &mut warnings,
        )
        .unwrap();
        let far = solve_surface(
            Surface::Wall,
            &balance(),
            150.0,
            &SurfaceSolverConfig::default(),
            &mut warnings,
        )
        .unwrap();

        assert_relative_eq!(
            near.temperature.get::<kelvin>(),
            far.temperature.get::<kelvin>(),
            epsilon = 1e-6
        );
    }

    #[test]
    fn iteration_cap_is_a_warning() {
        let mut warnings = Vec::new();
        let config = SurfaceSolverConfig {
            max_iters: 2,
            ..SurfaceSolverConfig::default()
        };

        let fluxes =
            solve_surface(Surface::Roof, &balance(), 300.0, &config, &mut warnings).unwrap();

        assert!(fluxes.temperature.get::<kelvin>().is_finite());
        assert!(matches!(
            warnings.as_slice(),
            [StepWarning::Convergence(ConvergenceWarning {
                scope: ConvergenceScope::Surface(Surface::Roof),
                ..
            })]
        ));
    }

    #[test]
    fn non_finite_inputs_fail() {
        let mut warnings = Vec::new();
        let bad = SurfaceBalance {
            shortwave: f64::NAN,
            ..balance()
        };
        assert!(matches!(
            solve_surface(
                Surface::Road,
                &bad,
                300.0,
                &SurfaceSolverConfig::default(),
                &mut warnings
            ),
            Err(SolveError::NonFinite { .. })
        ));
    }
}
