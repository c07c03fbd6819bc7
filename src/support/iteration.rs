//! Bounded fixed-point iteration.
//!
//! Coupled balances that are solved by repeated substitution share one
//! driver: the caller supplies an update rule and a normalized change
//! metric, and the driver stops when the change drops to `1.0` or below
//! (that is, every tracked quantity moved less than its own tolerance) or
//! when the iteration cap is reached.
//!
//! Reaching the cap is not an error. The last iterate is returned with
//! [`Status::MaxIters`] so the caller can decide how to report it.

/// Iteration limit for [`solve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config {
    /// Maximum number of update evaluations.
    pub max_iters: usize,
}

/// How a fixed-point solve ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The normalized change fell to `1.0` or below.
    Converged,
    /// The iteration cap was reached first.
    MaxIters,
}

/// Final iterate of a fixed-point solve.
#[derive(Debug, Clone, PartialEq)]
pub struct Solution<T> {
    pub state: T,
    pub status: Status,
    pub iters: usize,
    /// Normalized change between the last two iterates.
    pub change: f64,
}

/// Iterates `update` from `initial` until `change(previous, next) <= 1.0`.
///
/// A non-finite change is never treated as converged.
///
/// # Errors
///
/// Returns the first error produced by `update`.
pub fn solve<T, E>(
    initial: T,
    config: Config,
    mut update: impl FnMut(&T, usize) -> Result<T, E>,
    change: impl Fn(&T, &T) -> f64,
) -> Result<Solution<T>, E> {
    let mut state = initial;
    let mut last_change = f64::INFINITY;

    for iter in 1..=config.max_iters.max(1) {
        let next = update(&state, iter)?;
        last_change = change(&state, &next);
        state = next;

        log::trace!("fixed-point iteration {iter}: change={last_change:e}");

        if last_change.is_finite() && last_change <= 1.0 {
            return Ok(Solution {
                state,
                status: Status::Converged,
                iters: iter,
                change: last_change,
            });
        }
    }

    Ok(Solution {
        state,
        status: Status::MaxIters,
        iters: config.max_iters.max(1),
        change: last_change,
    })
}
