//! Lazy operator composition.
//!
//! Scaled, summed, product, and adjoint views delegate every product to
//! their operands, so a solver driven by a composite never pays for an
//! explicit matrix product. Constructors validate operand shapes up front;
//! capability (adjoint availability) propagates through the composition and
//! is still checked at call time.

use num_traits::Float;

use crate::error::MfError;
use crate::operator::LinearOperator;

/// alpha · A.
pub struct ScaledOperator<'a, T: Float> {
    alpha: T,
    inner: &'a dyn LinearOperator<T>,
}

impl<'a, T: Float> ScaledOperator<'a, T> {
    pub fn new(alpha: T, inner: &'a dyn LinearOperator<T>) -> Self {
        Self { alpha, inner }
    }
}

impl<'a, T: Float> LinearOperator<T> for ScaledOperator<'a, T> {
    fn shape(&self) -> (usize, usize) {
        self.inner.shape()
    }

    fn apply(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        self.inner.apply(x, y)?;
        for yi in y.iter_mut() {
            *yi = *yi * self.alpha;
        }
        Ok(())
    }

    fn apply_adjoint(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        // Real scalar field: conj(alpha) == alpha.
        self.inner.apply_adjoint(x, y)?;
        for yi in y.iter_mut() {
            *yi = *yi * self.alpha;
        }
        Ok(())
    }

    fn has_adjoint(&self) -> bool {
        self.inner.has_adjoint()
    }
}

/// A + B for operators of identical shape.
pub struct SumOperator<'a, T: Float> {
    left: &'a dyn LinearOperator<T>,
    right: &'a dyn LinearOperator<T>,
}

impl<'a, T: Float> SumOperator<'a, T> {
    pub fn new(
        left: &'a dyn LinearOperator<T>,
        right: &'a dyn LinearOperator<T>,
    ) -> Result<Self, MfError> {
        let (lm, ln) = left.shape();
        let (rm, rn) = right.shape();
        if (lm, ln) != (rm, rn) {
            return Err(MfError::ShapeMismatch(lm, ln, rm, rn));
        }
        Ok(Self { left, right })
    }
}

impl<'a, T: Float> LinearOperator<T> for SumOperator<'a, T> {
    fn shape(&self) -> (usize, usize) {
        self.left.shape()
    }

    fn apply(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        self.left.apply(x, y)?;
        let tmp = self.right.matvec(x)?;
        for (yi, &ti) in y.iter_mut().zip(&tmp) {
            *yi = *yi + ti;
        }
        Ok(())
    }

    fn apply_adjoint(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        self.left.apply_adjoint(x, y)?;
        let tmp = self.right.rmatvec(x)?;
        for (yi, &ti) in y.iter_mut().zip(&tmp) {
            *yi = *yi + ti;
        }
        Ok(())
    }

    fn has_adjoint(&self) -> bool {
        self.left.has_adjoint() && self.right.has_adjoint()
    }
}

/// A · B, applied right-to-left without forming the product matrix.
pub struct ProductOperator<'a, T: Float> {
    left: &'a dyn LinearOperator<T>,
    right: &'a dyn LinearOperator<T>,
}

impl<'a, T: Float> ProductOperator<'a, T> {
    pub fn new(
        left: &'a dyn LinearOperator<T>,
        right: &'a dyn LinearOperator<T>,
    ) -> Result<Self, MfError> {
        let (lm, ln) = left.shape();
        let (rm, rn) = right.shape();
        if ln != rm {
            return Err(MfError::ShapeMismatch(lm, ln, rm, rn));
        }
        Ok(Self { left, right })
    }
}

impl<'a, T: Float> LinearOperator<T> for ProductOperator<'a, T> {
    fn shape(&self) -> (usize, usize) {
        (self.left.shape().0, self.right.shape().1)
    }

    fn apply(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        let tmp = self.right.matvec(x)?;
        self.left.matvec_into(&tmp, y)
    }

    fn apply_adjoint(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        // (AB)ᴴ = Bᴴ Aᴴ.
        let tmp = self.left.rmatvec(x)?;
        self.right.rmatvec_into(&tmp, y)
    }

    fn has_adjoint(&self) -> bool {
        self.left.has_adjoint() && self.right.has_adjoint()
    }
}

/// Aᴴ as an operator in its own right.
pub struct AdjointOperator<'a, T: Float> {
    inner: &'a dyn LinearOperator<T>,
}

impl<'a, T: Float> AdjointOperator<'a, T> {
    pub fn new(inner: &'a dyn LinearOperator<T>) -> Self {
        Self { inner }
    }
}

impl<'a, T: Float> LinearOperator<T> for AdjointOperator<'a, T> {
    fn shape(&self) -> (usize, usize) {
        let (m, n) = self.inner.shape();
        (n, m)
    }

    fn apply(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        self.inner.apply_adjoint(x, y)
    }

    fn apply_adjoint(&self, x: &[T], y: &mut [T]) -> Result<(), MfError> {
        self.inner.apply(x, y)
    }

    fn has_adjoint(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::operator::MatrixOperator;
    use approx::assert_abs_diff_eq;
    use faer::Mat;

    fn mat_2x2(vals: [[f64; 2]; 2]) -> Mat<f64> {
        Mat::from_fn(2, 2, |i, j| vals[i][j])
    }

    #[test]
    fn scaled_and_sum_match_dense() {
        let a = MatrixOperator::new(mat_2x2([[1.0, 2.0], [3.0, 4.0]]));
        let b = MatrixOperator::new(mat_2x2([[0.0, 1.0], [1.0, 0.0]]));
        let scaled = ScaledOperator::new(2.0, &a);
        let sum = SumOperator::new(&scaled, &b).unwrap();
        let x = vec![1.0, -1.0];
        // (2A + B) x
        let y = sum.matvec(&x).unwrap();
        assert_abs_diff_eq!(y[0], 2.0 * (-1.0) + (-1.0), epsilon = 1e-12);
        assert_abs_diff_eq!(y[1], 2.0 * (-1.0) + 1.0, epsilon = 1e-12);
    }

    #[test]
    fn product_applies_right_to_left() {
        let a = MatrixOperator::new(mat_2x2([[1.0, 0.0], [0.0, 2.0]]));
        let b = MatrixOperator::new(mat_2x2([[0.0, 1.0], [1.0, 0.0]]));
        let prod = ProductOperator::new(&a, &b).unwrap();
        let y = prod.matvec(&[3.0, 5.0]).unwrap();
        // A (B x) = A [5, 3] = [5, 6]
        assert_abs_diff_eq!(y[0], 5.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y[1], 6.0, epsilon = 1e-12);
    }

    #[test]
    fn adjoint_swaps_orientation() {
        let a = MatrixOperator::new(Mat::from_fn(3, 2, |i, j| (i * 2 + j) as f64));
        let adj = AdjointOperator::new(&a);
        assert_eq!(adj.shape(), (2, 3));
        let x = vec![1.0, 1.0, 1.0];
        let y = adj.matvec(&x).unwrap();
        let z = a.rmatvec(&x).unwrap();
        assert_abs_diff_eq!(y[0], z[0], epsilon = 1e-12);
        assert_abs_diff_eq!(y[1], z[1], epsilon = 1e-12);
    }

    #[test]
    fn mismatched_sum_is_rejected() {
        let a = MatrixOperator::new(Mat::from_fn(3, 2, |_, _| 1.0));
        let b = MatrixOperator::new(mat_2x2([[1.0, 0.0], [0.0, 1.0]]));
        assert!(SumOperator::new(&a, &b).is_err());
        assert!(ProductOperator::new(&a, &b).is_ok());
        assert!(ProductOperator::new(&b, &a).is_err());
    }
}
