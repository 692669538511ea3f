//! Direct-style CG driver for square positive-semidefinite systems.

use num_traits::Float;

use crate::core::kernels::{axpy, dot, scale_add};
use crate::core::traits::{MatShape, MatVec};
use crate::error::MfError;

/// Solve A·x = b by unpreconditioned conjugate gradients.
///
/// A must be square and is assumed positive semi-definite; general matrices
/// are out of scope for this entry point. The residual is tested every 25
/// iterations and on the last one, and the iteration count is capped at
/// `b.len()` — in exact arithmetic CG terminates within the dimension, so
/// failing every test is reported as [`MfError::ConvergenceFailure`] rather
/// than returning a bogus iterate.
pub fn spsolve<T, M>(a: &M, b: &[T]) -> Result<Vec<T>, MfError>
where
    T: Float + From<f64> + Send + Sync,
    M: MatVec<T> + MatShape,
{
    if a.nrows() != a.ncols() {
        return Err(MfError::NotSquare {
            rows: a.nrows(),
            cols: a.ncols(),
        });
    }
    let n = a.ncols();
    if b.len() != n {
        return Err(MfError::DimensionMismatch {
            expected: n,
            found: b.len(),
        });
    }

    let conv_iters = 25;
    let conv_threshold: T = (1e-10f64).into();

    let mut x = vec![T::zero(); n];
    let mut ap = vec![T::zero(); n];
    a.matvec(&x, &mut ap);
    let mut r: Vec<T> = b.iter().zip(&ap).map(|(&bi, &ai)| bi - ai).collect();
    let mut p = r.clone();
    let mut rsold = dot(&r, &r);

    let max_iters = b.len();
    let mut converged = None;
    for i in 0..max_iters {
        a.matvec(&p, &mut ap);
        let alpha = rsold / dot(&p, &ap);
        axpy(&mut x, &p, alpha);
        axpy(&mut r, &ap, -alpha);
        let rsnew = dot(&r, &r);
        if (i % conv_iters == 0 || i == max_iters - 1) && rsnew.sqrt() < conv_threshold {
            converged = Some(i);
            break;
        }
        let beta = rsnew / rsold;
        scale_add(&mut p, &r, beta);
        rsold = rsnew;
    }
    if converged.is_none() {
        return Err(MfError::ConvergenceFailure(max_iters));
    }
    Ok(x)
}
