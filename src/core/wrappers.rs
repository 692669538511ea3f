//! Collaborator implementations for faer dense matrices.
//!
//! These impls let `faer::Mat` and `faer::MatRef` back a
//! [`MatrixOperator`](crate::operator::MatrixOperator) or be handed to
//! [`spsolve`](crate::solver::spsolve) directly. The scalar field is real,
//! so the conjugate transpose is the plain transpose.

use faer::{Mat, MatRef};
use num_traits::Float;

use crate::core::traits::{ConjTranspose, MatShape, MatVec};

impl<T: Float> MatVec<T> for Mat<T> {
    fn matvec(&self, x: &[T], y: &mut [T]) {
        assert_eq!(self.ncols(), x.len(), "input vector x has incorrect length");
        assert_eq!(self.nrows(), y.len(), "output vector y has incorrect length");
        for i in 0..self.nrows() {
            let mut acc = T::zero();
            for j in 0..self.ncols() {
                acc = acc + self[(i, j)] * x[j];
            }
            y[i] = acc;
        }
    }
}

impl<'a, T: Float> MatVec<T> for MatRef<'a, T> {
    fn matvec(&self, x: &[T], y: &mut [T]) {
        assert_eq!(self.ncols(), x.len(), "input vector x has incorrect length");
        assert_eq!(self.nrows(), y.len(), "output vector y has incorrect length");
        for i in 0..self.nrows() {
            let mut acc = T::zero();
            for j in 0..self.ncols() {
                acc = acc + self[(i, j)] * x[j];
            }
            y[i] = acc;
        }
    }
}

impl<T> MatShape for Mat<T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }
    fn ncols(&self) -> usize {
        self.ncols()
    }
}

impl<'a, T> MatShape for MatRef<'a, T> {
    fn nrows(&self) -> usize {
        self.nrows()
    }
    fn ncols(&self) -> usize {
        self.ncols()
    }
}

impl<T: Float> ConjTranspose for Mat<T> {
    fn conj_transpose(&self) -> Self {
        Mat::from_fn(self.ncols(), self.nrows(), |i, j| self[(j, i)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn matvec_small() {
        let a = Mat::from_fn(2, 3, |i, j| (i * 3 + j) as f64);
        let x = vec![1.0, 2.0, 3.0];
        let mut y = vec![0.0; 2];
        a.matvec(&x, &mut y);
        assert_abs_diff_eq!(y[0], 8.0, epsilon = 1e-12);
        assert_abs_diff_eq!(y[1], 26.0, epsilon = 1e-12);
    }

    #[test]
    fn transpose_swaps_axes() {
        let a = Mat::from_fn(2, 3, |i, j| (i * 3 + j) as f64);
        let at = a.conj_transpose();
        assert_eq!(MatShape::nrows(&at), 3);
        assert_eq!(MatShape::ncols(&at), 2);
        for i in 0..2 {
            for j in 0..3 {
                assert_abs_diff_eq!(at[(j, i)], a[(i, j)], epsilon = 1e-12);
            }
        }
    }
}
