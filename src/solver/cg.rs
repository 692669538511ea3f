//! Preconditioned Conjugate Gradient (Hestenes–Stiefel).

use num_traits::Float;

use crate::core::kernels::{axpy, dot, norm2, scale_add};
use crate::error::MfError;
use crate::operator::{IdentityOperator, LinearOperator};
use crate::utils::convergence::Convergence;

/// CG for square (positive-definite) systems.
///
/// The only solver in the family that accepts a preconditioner: any
/// [`LinearOperator`] applied to the residual each iteration, defaulting to
/// the identity.
pub struct CgSolver<T> {
    pub conv: Convergence<T>,
    /// Iteration cap; defaults to 10·N when unset.
    pub maxiter: Option<usize>,
}

impl<T: Float> CgSolver<T> {
    pub fn new(tol: T) -> Self {
        Self {
            conv: Convergence::new(tol),
            maxiter: None,
        }
    }

    pub fn with_maxiter(mut self, maxiter: usize) -> Self {
        self.maxiter = Some(maxiter);
        self
    }
}

impl<T: Float + From<f64> + Send + Sync> CgSolver<T> {
    /// Solve A·x = b.
    ///
    /// `x` carries the initial guess in and the approximate solution out
    /// (zeros are the conventional cold start). `callback` is invoked with
    /// the current iterate at the start of every iteration and once more
    /// after the loop.
    ///
    /// Returns the iteration index at which the loop broke. The same
    /// integer comes back whether the residual test passed or the cap ran
    /// out; callers distinguish the two by comparing against the cap.
    pub fn solve(
        &self,
        a: &dyn LinearOperator<T>,
        m: Option<&dyn LinearOperator<T>>,
        b: &[T],
        x: &mut Vec<T>,
        mut callback: Option<&mut dyn FnMut(&[T])>,
    ) -> Result<usize, MfError> {
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
        let maxiter = self.maxiter.unwrap_or(10 * n);

        let identity;
        let m: &dyn LinearOperator<T> = match m {
            Some(op) => op,
            None => {
                identity = IdentityOperator::new(n);
                &identity
            }
        };

        let mut ap = vec![T::zero(); n];
        a.matvec_into(x, &mut ap)?;
        let mut r: Vec<T> = b.iter().zip(&ap).map(|(&bi, &ai)| bi - ai).collect();
        let mut p = vec![T::zero(); n];
        let mut z = vec![T::zero(); n];
        let mut rz = T::zero();

        let mut info = 0;
        for i in 0..maxiter {
            info = i;
            if let Some(cb) = callback.as_mut() {
                cb(x.as_slice());
            }
            m.matvec_into(&r, &mut z)?;
            if i == 0 {
                // p must not alias z; it is overwritten in place below.
                p.copy_from_slice(&z);
                rz = dot(&r, &z);
            } else {
                let old_rz = rz;
                rz = dot(&r, &z);
                let beta = rz / old_rz;
                scale_add(&mut p, &z, beta);
            }
            a.matvec_into(&p, &mut ap)?;
            let alpha = rz / dot(&p, &ap);
            axpy(x, &p, alpha);
            axpy(&mut r, &ap, -alpha);
            if self.conv.should_test(i, i == maxiter - 1) && self.conv.reached(norm2(&r)) {
                break;
            }
        }
        if let Some(cb) = callback {
            // On early convergence the callback has not yet seen the solution.
            cb(x.as_slice());
        }
        Ok(info)
    }
}
