//! Concrete operators: matrix-backed, identity, and closure-defined.

use std::cell::OnceCell;

use num_traits::Float;

use crate::core::traits::{ConjTranspose, MatShape, MatVec};
use crate::error::MfError;
use crate::operator::LinearOperator;

/// Adapter presenting a concrete matrix as a [`LinearOperator`].
///
/// The conjugate transpose is materialized on the first adjoint product and
/// cached for the lifetime of the adapter; repeatedly forming it per
/// iteration is the dominant avoidable cost in a naive rendition of the
/// biconjugate and least-squares methods. The wrapped matrix is assumed
/// immutable while the adapter is alive.
pub struct MatrixOperator<M> {
    a: M,
    ah: OnceCell<M>,
}

impl<M> MatrixOperator<M> {
    pub fn new(a: M) -> Self {
        Self {
            a,
            ah: OnceCell::new(),
        }
    }

    /// Borrow the wrapped matrix.
    pub fn inner(&self) -> &M {
        &self.a
    }
}

impl<T, M> LinearOperator<T> for MatrixOperator<M>
where
    T: Float,
    M: MatVec<T> + MatShape + ConjTranspose,
{
    fn shape(&self) -> (usize, usize) {
        (self.a.nrows(), self.a.ncols())
    }

    fn apply(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        self.a.matvec(x, y);
        Ok(())
    }

    fn apply_adjoint(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        let ah = self.ah.get_or_init(|| self.a.conj_transpose());
        ah.matvec(x, y);
        Ok(())
    }

    fn has_adjoint(&self) -> bool {
        true
    }
}

/// The identity as an operator; the trivial preconditioner for CG.
pub struct IdentityOperator {
    n: usize,
}

impl IdentityOperator {
    pub fn new(n: usize) -> Self {
        Self { n }
    }
}

impl<T: Float> LinearOperator<T> for IdentityOperator {
    fn shape(&self) -> (usize, usize) {
        (self.n, self.n)
    }

    // Copy-through in both orientations. The allocating entry points hand
    // back a fresh vector, never an alias of the input, so callers are free
    // to mutate the result in place.
    fn apply(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        y.copy_from_slice(x);
        Ok(())
    }

    fn apply_adjoint(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        y.copy_from_slice(x);
        Ok(())
    }

    fn has_adjoint(&self) -> bool {
        true
    }
}

type ApplyFn<T> = Box<dyn Fn(&[T], &mut [T])>;

/// Operator defined by caller-supplied closures.
///
/// The forward product is mandatory; the adjoint is attached with
/// [`FnOperator::with_adjoint`] and is a hard [`MfError::Unsupported`]
/// failure otherwise.
pub struct FnOperator<T> {
    shape: (usize, usize),
    matvec: ApplyFn<T>,
    rmatvec: Option<ApplyFn<T>>,
}

impl<T> FnOperator<T> {
    pub fn new(shape: (usize, usize), matvec: impl Fn(&[T], &mut [T]) + 'static) -> Self {
        Self {
            shape,
            matvec: Box::new(matvec),
            rmatvec: None,
        }
    }

    /// Attach the adjoint product y = Aᴴ·x.
    pub fn with_adjoint(mut self, rmatvec: impl Fn(&[T], &mut [T]) + 'static) -> Self {
        self.rmatvec = Some(Box::new(rmatvec));
        self
    }
}

impl<T: Float> LinearOperator<T> for FnOperator<T> {
    fn shape(&self) -> (usize, usize) {
        self.shape
    }

    fn apply(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        (self.matvec)(x, y);
        Ok(())
    }

    fn apply_adjoint(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        match &self.rmatvec {
            Some(f) => {
                f(x, y);
                Ok(())
            }
            None => Err(MfError::Unsupported("no adjoint closure was provided")),
        }
    }

    fn has_adjoint(&self) -> bool {
        self.rmatvec.is_some()
    }
}
