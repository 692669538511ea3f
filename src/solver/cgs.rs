//! Conjugate Gradient Squared (Sonneveld).
//!
//! CGS squares the BiCG residual polynomial, trading smoother convergence
//! for avoiding the adjoint product entirely. It can stagnate or oscillate
//! on ill-conditioned systems; that failure mode is left visible to the
//! caller, not hidden.

use num_traits::Float;

use crate::core::kernels::{axpy, dot, norm2};
use crate::error::MfError;
use crate::operator::LinearOperator;
use crate::utils::convergence::Convergence;

/// CGS for square nonsymmetric systems.
pub struct CgsSolver<T> {
    pub conv: Convergence<T>,
    /// Accepted for interface parity; the loop terminates only through the
    /// periodic residual test.
    pub maxiter: Option<usize>,
}

impl<T: Float> CgsSolver<T> {
    pub fn new(tol: T) -> Self {
        Self {
            conv: Convergence::new(tol),
            maxiter: None,
        }
    }
}

impl<T: Float + From<f64> + Send + Sync> CgsSolver<T> {
    /// Solve A·x = b, with `x` carrying the initial guess in and the
    /// solution out.
    ///
    /// Preconditioning and iteration callbacks are rejected up front.
    pub fn solve(
        &self,
        a: &dyn LinearOperator<T>,
        m: Option<&dyn LinearOperator<T>>,
        b: &[T],
        x: &mut Vec<T>,
        callback: Option<&mut dyn FnMut(&[T])>,
    ) -> Result<(), MfError> {
        if m.is_some() {
            return Err(MfError::Unsupported("cgs does not accept a preconditioner"));
        }
        if callback.is_some() {
            return Err(MfError::Unsupported("cgs does not accept a callback"));
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

        // Fixed auxiliary direction; every inner product is taken against it.
        let rhat = r.clone();
        let mut p = r.clone();
        let mut u = r.clone();
        let mut q = vec![T::zero(); n];
        let mut upq = vec![T::zero(); n];
        let mut w = vec![T::zero(); n];

        let mut i = 0usize;
        loop {
            a.matvec_into(&p, &mut ap)?;
            let alpha = dot(&r, &rhat) / dot(&ap, &rhat);
            for ((qj, &uj), &apj) in q.iter_mut().zip(&u).zip(&ap) {
                *qj = uj - alpha * apj;
            }
            for ((t, &uj), &qj) in upq.iter_mut().zip(&u).zip(&q) {
                *t = uj + qj;
            }
            axpy(x, &upq, alpha);
            let r_prev = r.clone();
            a.matvec_into(&upq, &mut w)?;
            axpy(&mut r, &w, -alpha);
            if self.conv.should_test(i, false) && self.conv.reached(norm2(&r)) {
                break;
            }
            let beta = dot(&r, &rhat) / dot(&r_prev, &rhat);
            for ((uj, &rj), &qj) in u.iter_mut().zip(&r).zip(&q) {
                *uj = rj + beta * qj;
            }
            for ((pj, &uj), &qj) in p.iter_mut().zip(&u).zip(&q) {
                *pj = uj + beta * (qj + beta * *pj);
            }
            i += 1;
        }
        Ok(())
    }
}
