//! Linear-fractional (Möbius) transforms
//!
//! `x ↦ (a·x + b) / (c·x + d)`
//!
//! All four arithmetic operators with one operand fixed are expressible in
//! this form, and the form is closed under composition, so any chain of
//! pending operators reduces to four coefficients.

use crate::EvalError;

/// A linear-fractional transform `x ↦ (a·x + b) / (c·x + d)`.
///
/// "Not set yet" is represented by `Option<LinearFractional>` at the use
/// site, never by a coefficient sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearFractional {
    a: f64,
    b: f64,
    c: f64,
    d: f64,
}

impl LinearFractional {
    /// Transform with explicit coefficients.
    pub fn new(a: f64, b: f64, c: f64, d: f64) -> Self {
        Self { a, b, c, d }
    }

    /// The identity transform `x ↦ x`.
    pub fn identity() -> Self {
        Self::new(1.0, 0.0, 0.0, 1.0)
    }

    /// Apply the transform to `x`.
    ///
    /// Fails with a domain error when the denominator `c·x + d` is zero;
    /// this is where a raked-away zero divisor finally surfaces.
    pub fn eval(&self, x: f64) -> Result<f64, EvalError> {
        let denom = self.c * x + self.d;
        if denom == 0.0 {
            return Err(EvalError::DivisionByZero);
        }
        Ok((self.a * x + self.b) / denom)
    }

    /// Compose with `inner`: the result applies `inner` first, then `self`.
    ///
    /// Equivalent to the 2×2 matrix product of the coefficient matrices, so
    /// composition is associative.
    pub fn compose(&self, inner: &LinearFractional) -> Self {
        Self::new(
            self.a * inner.a + self.b * inner.c,
            self.a * inner.b + self.b * inner.d,
            self.c * inner.a + self.d * inner.c,
            self.c * inner.b + self.d * inner.d,
        )
    }
}
