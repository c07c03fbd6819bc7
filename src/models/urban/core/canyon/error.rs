use thiserror::Error;
use twine_solvers::equation::bisection;

use super::Surface;

/// Failure of a per-step canyon solve.
///
/// Reaching an iteration cap is not a failure; it is reported as a
/// [`ConvergenceWarning`](crate::models::urban::ConvergenceWarning).
#[derive(Debug, Error)]
pub enum SolveError {
    /// The bisection solver failed on a surface balance.
    #[error("bisection failed for the {surface:?} balance")]
    Bisection {
        surface: Surface,
        #[source]
        source: bisection::Error,
    },

    /// No sign change of the surface balance was found in the search range.
    #[error("{surface:?} balance has no root between {lower} K and {upper} K")]
    Unbracketed {
        surface: Surface,
        lower: f64,
        upper: f64,
    },

    /// The step duration is not a positive, finite number of seconds.
    #[error("step of {seconds} s is not positive")]
    InvalidStep { seconds: f64 },

    /// A balance produced a non-finite value.
    #[error("non-finite {quantity} in the canyon balance")]
    NonFinite { quantity: &'static str },
}

/// A surface temperature outside the physical range was requested.
#[derive(Debug, Clone, Copy, PartialEq, Error)]
#[error("surface temperature {temperature} K is not physical")]
pub struct NonPhysicalTemperature {
    pub temperature: f64,
}
