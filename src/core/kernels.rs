//! Vector kernels for the solver loops.
//!
//! Every hot-path vector operation the solvers need once or twice per
//! iteration lives here: dot product, Euclidean norm, and the two fused
//! scalar updates (`axpy`: lhs += alpha·rhs, `scale_add`: lhs = beta·lhs +
//! rhs). The fused forms update `lhs` in place without an intermediate
//! allocation; each element of both operands is read before the
//! corresponding write, and the borrow rules keep `lhs` and `rhs` disjoint.
//!
//! With the `rayon` feature (default) the kernels run on parallel
//! iterators; the solvers above remain strictly sequential recurrences.

use num_traits::Float;

/// Dot product xᵀ y.
pub fn dot<T: Float + Send + Sync>(x: &[T], y: &[T]) -> T {
    assert_eq!(x.len(), y.len(), "vectors must have the same length");
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        x.par_iter()
            .zip(y.par_iter())
            .map(|(&xi, &yi)| xi * yi)
            .reduce(T::zero, |acc, v| acc + v)
    }
    #[cfg(not(feature = "rayon"))]
    {
        x.iter()
            .zip(y.iter())
            .map(|(&xi, &yi)| xi * yi)
            .fold(T::zero(), |acc, v| acc + v)
    }
}

/// Euclidean norm ‖x‖₂.
pub fn norm2<T: Float + Send + Sync>(x: &[T]) -> T {
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        x.par_iter()
            .map(|&xi| xi * xi)
            .reduce(T::zero, |acc, v| acc + v)
            .sqrt()
    }
    #[cfg(not(feature = "rayon"))]
    {
        x.iter()
            .map(|&xi| xi * xi)
            .fold(T::zero(), |acc, v| acc + v)
            .sqrt()
    }
}

/// Fused update lhs += alpha · rhs.
pub fn axpy<T: Float + Send + Sync>(lhs: &mut [T], rhs: &[T], alpha: T) {
    assert_eq!(lhs.len(), rhs.len(), "vectors must have the same length");
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        lhs.par_iter_mut()
            .zip(rhs.par_iter())
            .for_each(|(l, &r)| *l = *l + alpha * r);
    }
    #[cfg(not(feature = "rayon"))]
    {
        for (l, &r) in lhs.iter_mut().zip(rhs) {
            *l = *l + alpha * r;
        }
    }
}

/// Fused update lhs = beta · lhs + rhs (the search-direction update).
pub fn scale_add<T: Float + Send + Sync>(lhs: &mut [T], rhs: &[T], beta: T) {
    assert_eq!(lhs.len(), rhs.len(), "vectors must have the same length");
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        lhs.par_iter_mut()
            .zip(rhs.par_iter())
            .for_each(|(l, &r)| *l = beta * *l + r);
    }
    #[cfg(not(feature = "rayon"))]
    {
        for (l, &r) in lhs.iter_mut().zip(rhs) {
            *l = beta * *l + r;
        }
    }
}

/// In-place scaling x *= alpha.
pub fn scale<T: Float + Send + Sync>(x: &mut [T], alpha: T) {
    #[cfg(feature = "rayon")]
    {
        use rayon::prelude::*;
        x.par_iter_mut().for_each(|xi| *xi = *xi * alpha);
    }
    #[cfg(not(feature = "rayon"))]
    {
        for xi in x.iter_mut() {
            *xi = *xi * alpha;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn dot_and_norm() {
        let x = vec![1.0, 2.0, 3.0];
        let y = vec![4.0, -5.0, 6.0];
        assert_abs_diff_eq!(dot(&x, &y), 12.0, epsilon = 1e-12);
        assert_abs_diff_eq!(norm2(&x), 14.0f64.sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn fused_updates() {
        let mut lhs = vec![1.0, 2.0];
        axpy(&mut lhs, &[10.0, 20.0], 0.5);
        assert_abs_diff_eq!(lhs[0], 6.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lhs[1], 12.0, epsilon = 1e-12);

        let mut lhs = vec![1.0, 2.0];
        scale_add(&mut lhs, &[10.0, 20.0], 3.0);
        assert_abs_diff_eq!(lhs[0], 13.0, epsilon = 1e-12);
        assert_abs_diff_eq!(lhs[1], 26.0, epsilon = 1e-12);

        let mut x = vec![2.0, -4.0];
        scale(&mut x, 0.5);
        assert_abs_diff_eq!(x[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(x[1], -2.0, epsilon = 1e-12);
    }
}
