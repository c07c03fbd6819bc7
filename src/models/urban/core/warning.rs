use std::fmt;

use super::Surface;

/// A recoverable condition recorded alongside a step's output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StepWarning {
    Convergence(ConvergenceWarning),
    NumericClamp(NumericClampWarning),
}

impl fmt::Display for StepWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Convergence(w) => w.fmt(f),
            Self::NumericClamp(w) => w.fmt(f),
        }
    }
}

/// An iteration cap was reached; the last iterate was used.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConvergenceWarning {
    pub scope: ConvergenceScope,
    pub iters: usize,
    /// Last change normalized by its tolerance (or the last residual for surfaces).
    pub change: f64,
}

impl fmt::Display for ConvergenceWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} did not converge in {} iterations (change={:e})",
            self.scope, self.iters, self.change
        )
    }
}

/// Which iteration hit its cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceScope {
    /// The outer canyon air temperature/humidity loop.
    CanyonAir,
    /// A single surface temperature root-find.
    Surface(Surface),
}

/// A value was forced into its physical bounds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumericClampWarning {
    pub quantity: ClampedQuantity,
    /// Value before clamping, in SI units.
    pub requested: f64,
    /// Value after clamping, in SI units.
    pub applied: f64,
}

impl fmt::Display for NumericClampWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?} clamped from {} to {}",
            self.quantity, self.requested, self.applied
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClampedQuantity {
    RuralWind,
    CanyonWind,
    BoundaryLayerHeight,
}

impl StepWarning {
    pub(crate) fn clamp(quantity: ClampedQuantity, requested: f64, applied: f64) -> Self {
        log::debug!("{quantity:?} clamped from {requested} to {applied}");
        Self::NumericClamp(NumericClampWarning {
            quantity,
            requested,
            applied,
        })
    }
}
