//! Tests for the operator abstraction: adapters, shape validation, adjoint
//! capability, and lazy composition.

use approx::assert_abs_diff_eq;
use faer::Mat;
use matfree::core::traits::{ConjTranspose, MatShape, MatVec};
use matfree::{
    AdjointOperator, CsrMatrix, FnOperator, IdentityOperator, LinearOperator, MatrixOperator,
    MfError, ProductOperator, ScaledOperator, SumOperator,
};
use std::cell::Cell;
use std::rc::Rc;

#[test]
fn identity_matvec_never_aliases_its_input() {
    let ident = IdentityOperator::new(4);
    let x = vec![1.0, 2.0, 3.0, 4.0];
    let mut y = ident.matvec(&x).unwrap();
    assert_eq!(y, x);
    y[2] = -7.0;
    assert_eq!(x[2], 3.0);
    let mut z = ident.rmatvec(&x).unwrap();
    z[0] = 99.0;
    assert_eq!(x[0], 1.0);
}

#[test]
fn matvec_and_rmatvec_validate_lengths() {
    let op = MatrixOperator::new(Mat::from_fn(3, 2, |i, j| (i + 2 * j) as f64));
    assert!(matches!(
        op.matvec(&[1.0; 3]).unwrap_err(),
        MfError::DimensionMismatch { expected: 2, found: 3 }
    ));
    assert!(matches!(
        op.rmatvec(&[1.0; 2]).unwrap_err(),
        MfError::DimensionMismatch { expected: 3, found: 2 }
    ));
    let mut short = vec![0.0; 2];
    assert!(op.matvec_into(&[1.0; 2], &mut short).is_err());
}

// Matrix probe counting transpose materializations.
struct CountingMat {
    inner: Mat<f64>,
    transposes: Rc<Cell<usize>>,
}

impl MatShape for CountingMat {
    fn nrows(&self) -> usize {
        self.inner.nrows()
    }
    fn ncols(&self) -> usize {
        self.inner.ncols()
    }
}

impl MatVec<f64> for CountingMat {
    fn matvec(&self, x: &[f64], y: &mut [f64]) {
        self.inner.matvec(x, y)
    }
}

impl ConjTranspose for CountingMat {
    fn conj_transpose(&self) -> Self {
        self.transposes.set(self.transposes.get() + 1);
        CountingMat {
            inner: self.inner.conj_transpose(),
            transposes: Rc::clone(&self.transposes),
        }
    }
}

#[test]
fn matrix_operator_materializes_the_transpose_once() {
    let transposes = Rc::new(Cell::new(0));
    let op = MatrixOperator::new(CountingMat {
        inner: Mat::from_fn(3, 3, |i, j| (i * 3 + j) as f64),
        transposes: Rc::clone(&transposes),
    });
    let x = vec![1.0, 0.5, -2.0];
    let first = op.rmatvec(&x).unwrap();
    let second = op.rmatvec(&x).unwrap();
    let third = op.rmatvec(&x).unwrap();
    assert_eq!(first, second);
    assert_eq!(second, third);
    assert_eq!(transposes.get(), 1);
    // The forward product never triggers a materialization.
    op.matvec(&x).unwrap();
    assert_eq!(transposes.get(), 1);
}

#[test]
fn fn_operator_supports_only_what_it_was_given() {
    let op = FnOperator::new((3, 3), |x: &[f64], y: &mut [f64]| {
        for (yi, &xi) in y.iter_mut().zip(x) {
            *yi = 2.0 * xi;
        }
    });
    assert!(!LinearOperator::<f64>::has_adjoint(&op));
    assert!(matches!(
        op.rmatvec(&[1.0; 3]).unwrap_err(),
        MfError::Unsupported(_)
    ));

    let both = FnOperator::new((3, 3), |x: &[f64], y: &mut [f64]| {
        for (yi, &xi) in y.iter_mut().zip(x) {
            *yi = 2.0 * xi;
        }
    })
    .with_adjoint(|x: &[f64], y: &mut [f64]| {
        for (yi, &xi) in y.iter_mut().zip(x) {
            *yi = 2.0 * xi;
        }
    });
    assert!(LinearOperator::<f64>::has_adjoint(&both));
    assert_eq!(both.rmatvec(&[1.0, 2.0, 3.0]).unwrap(), vec![2.0, 4.0, 6.0]);
}

#[test]
fn composed_operators_match_explicit_combination() {
    let a_mat = Mat::from_fn(2, 2, |i, j| [[1.0, 2.0], [3.0, 4.0]][i][j]);
    let b_mat = Mat::from_fn(2, 2, |i, j| [[0.0, -1.0], [1.0, 0.0]][i][j]);
    let a = MatrixOperator::new(a_mat.clone());
    let b = MatrixOperator::new(b_mat.clone());

    let x = vec![2.0, -1.0];

    // (0.5·A + B)·x against the densified combination.
    let half_a = ScaledOperator::new(0.5, &a);
    let sum = SumOperator::new(&half_a, &b).unwrap();
    let got = sum.matvec(&x).unwrap();
    for i in 0..2 {
        let want = 0.5 * (a_mat[(i, 0)] * x[0] + a_mat[(i, 1)] * x[1])
            + b_mat[(i, 0)] * x[0]
            + b_mat[(i, 1)] * x[1];
        assert_abs_diff_eq!(got[i], want, epsilon = 1e-12);
    }

    // (A·B)·x = A·(B·x).
    let prod = ProductOperator::new(&a, &b).unwrap();
    let got = prod.matvec(&x).unwrap();
    let bx = b.matvec(&x).unwrap();
    let want = a.matvec(&bx).unwrap();
    assert_eq!(got, want);

    // Aᴴ as a first-class operator agrees with rmatvec, and its adjoint is
    // the forward product again.
    let adj = AdjointOperator::new(&a);
    assert_eq!(adj.matvec(&x).unwrap(), a.rmatvec(&x).unwrap());
    assert_eq!(adj.rmatvec(&x).unwrap(), a.matvec(&x).unwrap());

    // Adjoint capability propagates through composition.
    let no_adj = FnOperator::new((2, 2), |x: &[f64], y: &mut [f64]| y.copy_from_slice(x));
    let mixed = SumOperator::new(&a, &no_adj).unwrap();
    assert!(!mixed.has_adjoint());
    assert!(mixed.rmatvec(&x).is_err());
}

#[test]
fn csr_backs_a_matrix_operator() {
    // [[4, 0, 1],
    //  [0, 2, 0],
    //  [1, 0, 3]]
    let a = CsrMatrix::from_csr(
        3,
        3,
        vec![0, 2, 3, 5],
        vec![0, 2, 1, 0, 2],
        vec![4.0, 1.0, 2.0, 1.0, 3.0],
    );
    let dense = Mat::from_fn(3, 3, |i, j| {
        [[4.0, 0.0, 1.0], [0.0, 2.0, 0.0], [1.0, 0.0, 3.0]][i][j]
    });
    let op = MatrixOperator::new(a);
    let dop = MatrixOperator::new(dense);
    let x = vec![1.0, -2.0, 0.5];
    assert_eq!(op.matvec(&x).unwrap(), dop.matvec(&x).unwrap());
    assert_eq!(op.rmatvec(&x).unwrap(), dop.rmatvec(&x).unwrap());
}
