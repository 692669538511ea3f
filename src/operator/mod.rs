//! The linear-operator abstraction consumed by every solver.
//!
//! Many iterative methods never need the entries of a matrix; they only need
//! products A·v (and, for the biconjugate and least-squares methods, Aᴴ·v).
//! [`LinearOperator`] captures exactly that, so the same solver loop runs
//! against dense, sparse, or purely implicit matrices.

use num_traits::Float;

use crate::error::MfError;

pub mod adapters;
pub mod compose;

pub use adapters::{FnOperator, IdentityOperator, MatrixOperator};
pub use compose::{AdjointOperator, ProductOperator, ScaledOperator, SumOperator};

/// Common interface for performing matrix-vector products.
///
/// Implementors provide `apply` (y = A·x) and, when the adjoint product is
/// available, `apply_adjoint` (y = Aᴴ·x). Callers go through the
/// shape-checked entry points: `matvec`/`rmatvec` allocate a fresh output,
/// while `matvec_into`/`rmatvec_into` write into a caller-provided buffer —
/// the form the solver loops use, since they apply the operator once or
/// twice per iteration.
///
/// Operators compose lazily: see [`compose`] for scaled, summed, product,
/// and adjoint views that defer to their operands instead of materializing
/// a combined matrix.
pub trait LinearOperator<T: Float> {
    /// Operator dimensions (rows, columns).
    fn shape(&self) -> (usize, usize);

    /// Compute y = A·x. Lengths are validated by the entry points below.
    fn apply(&self, x: &[T], y: &mut [T]) -> Result<(), MfError>;

    /// Compute y = Aᴴ·x. Operators without an adjoint keep the default.
    fn apply_adjoint(&self, _x: &[T], _y: &mut [T]) -> Result<(), MfError> {
        Err(MfError::Unsupported(
            "adjoint product is not implemented for this operator",
        ))
    }

    /// Whether `apply_adjoint` is available.
    fn has_adjoint(&self) -> bool {
        false
    }

    /// y = A·x into a fresh allocation.
    fn matvec(&self, x: &[T]) -> Result<Vec<T>, MfError> {
        let (m, _) = self.shape();
        let mut y = vec![T::zero(); m];
        self.matvec_into(x, &mut y)?;
        Ok(y)
    }

    /// y = A·x written into `out`, avoiding a per-call allocation.
    fn matvec_into(&self, x: &[T], out: &mut [T]) -> Result<(), MfError> {
        let (m, n) = self.shape();
        if x.len() != n {
            return Err(MfError::DimensionMismatch {
                expected: n,
                found: x.len(),
            });
        }
        if out.len() != m {
            return Err(MfError::DimensionMismatch {
                expected: m,
                found: out.len(),
            });
        }
        self.apply(x, out)
    }

    /// y = Aᴴ·x into a fresh allocation.
    fn rmatvec(&self, x: &[T]) -> Result<Vec<T>, MfError> {
        let (_, n) = self.shape();
        let mut y = vec![T::zero(); n];
        self.rmatvec_into(x, &mut y)?;
        Ok(y)
    }

    /// y = Aᴴ·x written into `out`.
    fn rmatvec_into(&self, x: &[T], out: &mut [T]) -> Result<(), MfError> {
        let (m, n) = self.shape();
        if x.len() != m {
            return Err(MfError::DimensionMismatch {
                expected: m,
                found: x.len(),
            });
        }
        if out.len() != n {
            return Err(MfError::DimensionMismatch {
                expected: n,
                found: out.len(),
            });
        }
        self.apply_adjoint(x, out)
    }
}
