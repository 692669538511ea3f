//! Convergence checks for the iterative solvers.

use num_traits::Float;

/// Residual tolerance plus the cadence of the periodic convergence test.
///
/// Norms are not free, so the solvers only inspect the residual every
/// `test_every` iterations (and on the final permitted iteration where a
/// cap exists).
pub struct Convergence<T> {
    /// Absolute residual tolerance: stop once ‖r‖ < tol.
    pub tol: T,
    /// Inspect the residual every this many iterations.
    pub test_every: usize,
}

impl<T: Float> Convergence<T> {
    pub fn new(tol: T) -> Self {
        Self { tol, test_every: 25 }
    }

    /// Whether iteration `i` is one where the residual norm is inspected.
    pub fn should_test(&self, i: usize, last: bool) -> bool {
        i % self.test_every == 0 || last
    }

    /// The residual test itself.
    pub fn reached(&self, res_norm: T) -> bool {
        res_norm < self.tol
    }
}
