//! Biconjugate Gradient.
//!
//! BiCG runs a shadow recurrence against the adjoint system alongside the
//! primary one, so the operator must provide `rmatvec`. The shadow iterate
//! is bookkeeping only; the primary iterate is the output.

use num_traits::Float;

use crate::core::kernels::{axpy, dot, norm2, scale_add};
use crate::error::MfError;
use crate::operator::LinearOperator;
use crate::utils::convergence::Convergence;

/// BiCG for square nonsymmetric systems.
pub struct BicgSolver<T> {
    pub conv: Convergence<T>,
    /// Accepted for interface parity; the loop terminates only through the
    /// periodic residual test.
    pub maxiter: Option<usize>,
}

impl<T: Float> BicgSolver<T> {
    pub fn new(tol: T) -> Self {
        Self {
            conv: Convergence::new(tol),
            maxiter: None,
        }
    }
}

impl<T: Float + From<f64> + Send + Sync> BicgSolver<T> {
    /// Solve A·x = b, with `x` carrying the initial guess in and the
    /// solution out.
    ///
    /// Preconditioning and iteration callbacks are rejected up front; a
    /// missing adjoint product surfaces as [`MfError::Unsupported`] before
    /// the loop starts.
    pub fn solve(
        &self,
        a: &dyn LinearOperator<T>,
        m: Option<&dyn LinearOperator<T>>,
        b: &[T],
        x: &mut Vec<T>,
        callback: Option<&mut dyn FnMut(&[T])>,
    ) -> Result<(), MfError> {
        if m.is_some() {
            return Err(MfError::Unsupported("bicg does not accept a preconditioner"));
        }
        if callback.is_some() {
            return Err(MfError::Unsupported("bicg does not accept a callback"));
        }
        let (rows, cols) = a.shape();
        if rows != cols {
            return Err(MfError::NotSquare { rows, cols });
        }
        let n = cols;
        if b.len() != n {
            return Err(MfError::DimensionMismatch {
                expected: n,
                found: b.len(),
            });
        }
        if x.len() != n {
            return Err(MfError::DimensionMismatch {
                expected: n,
                found: x.len(),
            });
        }

        let mut ap = vec![T::zero(); n];
        a.matvec_into(x, &mut ap)?;
        let mut r: Vec<T> = b.iter().zip(&ap).map(|(&bi, &ai)| bi - ai).collect();
        if norm2(&r) < self.conv.tol {
            return Ok(());
        }

        // Shadow system seeded at zero; this is also where a missing adjoint
        // product fails.
        let xstar = vec![T::zero(); n];
        let mut atp = vec![T::zero(); n];
        a.rmatvec_into(&xstar, &mut atp)?;
        let mut rstar: Vec<T> = b.iter().zip(&atp).map(|(&bi, &ti)| bi - ti).collect();

        let mut p = r.clone();
        let mut pstar = rstar.clone();

        let mut i = 0usize;
        loop {
            a.matvec_into(&p, &mut ap)?;
            let alpha = dot(&rstar, &r) / dot(&pstar, &ap);
            axpy(x, &p, alpha);
            let r_prev = r.clone();
            let rstar_prev = rstar.clone();
            axpy(&mut r, &ap, -alpha);
            a.rmatvec_into(&pstar, &mut atp)?;
            axpy(&mut rstar, &atp, -alpha);
            if self.conv.should_test(i, false) && self.conv.reached(norm2(&r)) {
                break;
            }
            let beta = dot(&rstar, &r) / dot(&rstar_prev, &r_prev);
            scale_add(&mut p, &r, beta);
            scale_add(&mut pstar, &rstar, beta);
            i += 1;
        }
        Ok(())
    }
}
