//! Biconjugate Gradient Stabilized.
//!
//! BiCGSTAB smooths CGS with a local minimal-residual step. The method is
//! known to break down when the residual drifts nearly orthogonal to the
//! fixed shadow residual r̂; the loop restarts r̂ (and the search direction)
//! from the current residual whenever |r·r̂| falls under a small threshold.

use num_traits::Float;

use crate::core::kernels::{axpy, dot, norm2};
use crate::error::MfError;
use crate::operator::LinearOperator;
use crate::utils::convergence::Convergence;

/// BiCGSTAB for square nonsymmetric systems.
pub struct BiCgStabSolver<T> {
    pub conv: Convergence<T>,
    /// Accepted for interface parity; the loop terminates only through the
    /// periodic residual test.
    pub maxiter: Option<usize>,
}

impl<T: Float> BiCgStabSolver<T> {
    pub fn new(tol: T) -> Self {
        Self {
            conv: Convergence::new(tol),
            maxiter: None,
        }
    }
}

impl<T: Float + From<f64> + Send + Sync> BiCgStabSolver<T> {
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
            return Err(MfError::Unsupported(
                "bicgstab does not accept a preconditioner",
            ));
        }
        if callback.is_some() {
            return Err(MfError::Unsupported("bicgstab does not accept a callback"));
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

        let restart_tol: T = (1e-8f64).into();
        let mut rhat = r.clone();
        let mut p = r.clone();
        let mut s = vec![T::zero(); n];
        let mut as_ = vec![T::zero(); n];

        let mut i = 0usize;
        loop {
            a.matvec_into(&p, &mut ap)?;
            let alpha = dot(&r, &rhat) / dot(&ap, &rhat);
            for ((sj, &rj), &apj) in s.iter_mut().zip(&r).zip(&ap) {
                *sj = rj - alpha * apj;
            }
            if self.conv.should_test(i, false) && self.conv.reached(norm2(&s)) {
                // Half step only: s is already small enough that the
                // stabilization step is skipped on exit.
                axpy(x, &p, alpha);
                break;
            }
            a.matvec_into(&s, &mut as_)?;
            let omega = dot(&as_, &s) / dot(&as_, &as_);
            axpy(x, &p, alpha);
            axpy(x, &s, omega);
            let r_prev = r.clone();
            for ((rj, &sj), &asj) in r.iter_mut().zip(&s).zip(&as_) {
                *rj = sj - omega * asj;
            }
            if self.conv.should_test(i, false) && self.conv.reached(norm2(&r)) {
                break;
            }
            let beta = (alpha / omega) * dot(&r, &rhat) / dot(&r_prev, &rhat);
            for ((pj, &rj), &apj) in p.iter_mut().zip(&r).zip(&ap) {
                *pj = rj + beta * (*pj - omega * apj);
            }
            if dot(&r, &rhat).abs() < restart_tol {
                // Shadow residual nearly orthogonal to r: restart both it
                // and the search direction from the current residual.
                rhat.copy_from_slice(&r);
                p.copy_from_slice(&r);
            }
            i += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::MatrixOperator;
    use approx::assert_abs_diff_eq;
    use faer::Mat;

    #[test]
    fn solves_diagonally_dominant_nonsym() {
        let rows = [
            [10.0, 2.0, 0.0, 0.0, 0.0],
            [3.0, 15.0, 4.0, 0.0, 0.0],
            [0.0, -2.0, 8.0, 1.0, 0.0],
            [0.0, 0.0, 1.0, 7.0, 3.0],
            [0.0, 0.0, 0.0, 2.0, 12.0],
        ];
        let a = Mat::from_fn(5, 5, |i, j| rows[i][j]);
        let x_true = vec![1.0, 2.0, 3.0, 4.0, 5.0];
        let mut b = vec![0.0; 5];
        use crate::core::traits::MatVec;
        a.matvec(&x_true, &mut b);
        let op = MatrixOperator::new(a);
        let mut solver = BiCgStabSolver::new(1e-9);
        solver.conv.test_every = 1;
        let mut x = vec![0.0; 5];
        solver.solve(&op, None, &b, &mut x, None).unwrap();
        for (xi, ei) in x.iter().zip(&x_true) {
            assert_abs_diff_eq!(xi, ei, epsilon = 1e-6);
        }
    }

    #[test]
    fn stays_finite_on_rotation_dominant_system() {
        // Strong skew part pushes r·r̂ toward zero; the restart guard must
        // keep the iterates finite.
        let rows = [
            [2.0, -7.0, 0.0, 0.0],
            [7.0, 2.0, -1.0, 0.0],
            [0.0, 1.0, 3.0, -5.0],
            [0.0, 0.0, 5.0, 3.0],
        ];
        let a = Mat::from_fn(4, 4, |i, j| rows[i][j]);
        let b = vec![1.0, -1.0, 2.0, 0.5];
        let op = MatrixOperator::new(a);
        let mut solver = BiCgStabSolver::new(1e-8);
        solver.conv.test_every = 1;
        let mut x = vec![0.0; 4];
        solver.solve(&op, None, &b, &mut x, None).unwrap();
        assert!(x.iter().all(|xi| xi.is_finite()));
        let r = {
            let ax = op.matvec(&x).unwrap();
            b.iter()
                .zip(&ax)
                .map(|(&bi, &ai)| (bi - ai) * (bi - ai))
                .sum::<f64>()
                .sqrt()
        };
        assert!(r < 1e-6, "residual too large: {r:e}");
    }

    #[test]
    fn rejects_callback() {
        let a = Mat::from_fn(2, 2, |i, j| if i == j { 1.0 } else { 0.0 });
        let op = MatrixOperator::new(a);
        let solver = BiCgStabSolver::new(1e-8);
        let mut x = vec![0.0; 2];
        let mut cb = |_x: &[f64]| {};
        let err = solver
            .solve(&op, None, &[1.0, 1.0], &mut x, Some(&mut cb))
            .unwrap_err();
        assert!(matches!(err, MfError::Unsupported(_)));
    }
}
