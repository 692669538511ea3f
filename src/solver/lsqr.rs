//! LSQR: sparse least squares via Golub–Kahan bidiagonalization.
//!
//! Solves `Ax = b`, `min ‖Ax − b‖²`, or the damped variant
//! `min ‖Ax − b‖² + damp²‖x − x0‖²` for A of any shape and rank, touching A
//! only through `matvec`/`rmatvec`. Each iteration extends the
//! bidiagonalization by one column, folds it into an upper-bidiagonal
//! system with plane rotations, and updates running estimates of the
//! operator norm, condition number, and residual norms that drive the
//! stopping tests.
//!
//! References: Paige & Saunders, "LSQR: An algorithm for sparse linear
//! equations and sparse least squares", ACM TOMS 8(1), 1982.

use num_traits::Float;

use crate::core::kernels::{axpy, norm2, scale, scale_add};
use crate::error::MfError;
use crate::operator::LinearOperator;

/// Reason LSQR terminated, in the classical 0–7 encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LsqrStop {
    /// x = 0 is the exact solution; no iterations were run.
    ZeroSolution,
    /// Ax − b is small enough, given atol and btol.
    Compatible,
    /// The least-squares solution is good enough, given atol.
    LeastSquares,
    /// The condition estimate has exceeded conlim.
    ConditionLimit,
    /// Ax − b is as small as this machine can make it.
    MachineCompatible,
    /// The least-squares solution is as good as this machine allows.
    MachineLeastSquares,
    /// The condition estimate is too large for this machine.
    MachineConditionLimit,
    /// The iteration limit was reached.
    IterationLimit,
}

impl LsqrStop {
    /// The classical integer code (0..=7).
    pub fn code(self) -> u8 {
        match self {
            LsqrStop::ZeroSolution => 0,
            LsqrStop::Compatible => 1,
            LsqrStop::LeastSquares => 2,
            LsqrStop::ConditionLimit => 3,
            LsqrStop::MachineCompatible => 4,
            LsqrStop::MachineLeastSquares => 5,
            LsqrStop::MachineConditionLimit => 6,
            LsqrStop::IterationLimit => 7,
        }
    }
}

/// Solution and diagnostics returned by [`LsqrSolver::solve`].
#[derive(Clone, Debug)]
pub struct LsqrResult<T> {
    pub x: Vec<T>,
    pub istop: LsqrStop,
    /// Iteration count at termination.
    pub itn: usize,
    /// ‖b − Ax‖.
    pub r1norm: T,
    /// sqrt(‖b − Ax‖² + damp²‖x − x0‖²); equals `r1norm` when damp = 0.
    pub r2norm: T,
    /// Frobenius-norm estimate of [A; damp·I].
    pub anorm: T,
    /// Condition estimate of [A; damp·I].
    pub acond: T,
    /// Estimate of ‖Aᴴr − damp²(x − x0)‖.
    pub arnorm: T,
    /// ‖x‖.
    pub xnorm: T,
    /// Diagonal estimates of (AᴴA + damp²I)⁻¹, populated when `calc_var`
    /// is set.
    pub var: Vec<T>,
}

/// Least-squares solver configuration.
///
/// `atol`/`btol` are relative-error estimates for the entries of A and b;
/// iterations stop once the backward-error tests they bound are satisfied.
/// `conlim` aborts the solve when the condition estimate grows past it.
/// All three may be set to zero; machine-epsilon guards keep the tests
/// well-defined.
pub struct LsqrSolver<T> {
    pub damp: T,
    pub atol: T,
    pub btol: T,
    pub conlim: T,
    /// Iteration cap; defaults to 2·N when unset.
    pub iter_lim: Option<usize>,
    /// Accumulate per-coordinate variance estimates into `var`.
    pub calc_var: bool,
}

impl<T: Float + From<f64> + Send + Sync> Default for LsqrSolver<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Float + From<f64> + Send + Sync> LsqrSolver<T> {
    pub fn new() -> Self {
        Self {
            damp: T::zero(),
            atol: (1e-6f64).into(),
            btol: (1e-6f64).into(),
            conlim: (1e8f64).into(),
            iter_lim: None,
            calc_var: false,
        }
    }

    /// Solve `min ‖Ax − b‖²` (damped when `damp > 0`), starting from `x0`
    /// or zeros.
    pub fn solve(
        &self,
        a: &dyn LinearOperator<T>,
        b: &[T],
        x0: Option<&[T]>,
    ) -> Result<LsqrResult<T>, MfError> {
        let (m, n) = a.shape();
        if b.len() != m {
            return Err(MfError::DimensionMismatch {
                expected: m,
                found: b.len(),
            });
        }
        if let Some(x0) = x0 {
            if x0.len() != n {
                return Err(MfError::DimensionMismatch {
                    expected: n,
                    found: x0.len(),
                });
            }
        }

        let zero = T::zero();
        let one = T::one();
        let eps = T::epsilon();
        let iter_lim = self.iter_lim.unwrap_or(2 * n);
        let dampsq = self.damp * self.damp;
        let ctol = if self.conlim > zero { one / self.conlim } else { zero };

        let mut var = vec![zero; n];
        let mut itn = 0usize;
        let mut anorm = zero;
        let mut acond = zero;
        let mut ddnorm = zero;
        let mut res2 = zero;
        let mut xnorm = zero;
        let mut xxnorm = zero;
        let mut z = zero;
        let mut cs2 = -one;
        let mut sn2 = zero;

        // First bidiagonalization vectors: beta·u = b − A·x0, alfa·v = Aᴴ·u.
        let mut u = b.to_vec();
        let bnorm = norm2(b);

        let mut x;
        let mut beta;
        match x0 {
            None => {
                x = vec![zero; n];
                beta = bnorm;
            }
            Some(x0) => {
                x = x0.to_vec();
                let ax = a.matvec(&x)?;
                for (ui, &axi) in u.iter_mut().zip(&ax) {
                    *ui = *ui - axi;
                }
                beta = norm2(&u);
            }
        }

        let mut v;
        let mut alfa;
        if beta > zero {
            scale(&mut u, one / beta);
            v = a.rmatvec(&u)?;
            alfa = norm2(&v);
        } else {
            v = x.clone();
            alfa = zero;
        }
        if alfa > zero {
            scale(&mut v, one / alfa);
        }
        let mut w = v.clone();

        let mut rhobar = alfa;
        let mut phibar = beta;
        let mut rnorm = beta;
        let mut r1norm = rnorm;
        let mut r2norm = rnorm;
        let mut arnorm = alfa * beta;

        if arnorm == zero {
            // b = 0 (or x0 already exact): the zero correction is the answer.
            return Ok(LsqrResult {
                x,
                istop: LsqrStop::ZeroSolution,
                itn,
                r1norm,
                r2norm,
                anorm,
                acond,
                arnorm,
                xnorm,
                var,
            });
        }

        let mut istop: Option<LsqrStop> = None;
        let mut tmp_m = vec![zero; m];
        let mut tmp_n = vec![zero; n];

        while itn < iter_lim {
            itn += 1;

            // Extend the bidiagonalization:
            //   beta·u = A·v − alfa·u,   alfa·v = Aᴴ·u − beta·v.
            a.matvec_into(&v, &mut tmp_m)?;
            scale_add(&mut u, &tmp_m, -alfa);
            beta = norm2(&u);

            if beta > zero {
                scale(&mut u, one / beta);
                anorm = (anorm * anorm + alfa * alfa + beta * beta + dampsq).sqrt();
                a.rmatvec_into(&u, &mut tmp_n)?;
                scale_add(&mut v, &tmp_n, -beta);
                alfa = norm2(&v);
                if alfa > zero {
                    scale(&mut v, one / alfa);
                }
            }

            // Rotation eliminating the damping parameter; alters the
            // diagonal (rhobar) of the lower-bidiagonal matrix.
            let (rhobar1, psi) = if self.damp > zero {
                let rhobar1 = (rhobar * rhobar + dampsq).sqrt();
                let cs1 = rhobar / rhobar1;
                let sn1 = self.damp / rhobar1;
                let psi = sn1 * phibar;
                phibar = cs1 * phibar;
                (rhobar1, psi)
            } else {
                (rhobar, zero)
            };

            // Rotation eliminating the subdiagonal element (beta), giving an
            // upper-bidiagonal matrix.
            let (cs, sn, rho) = sym_ortho(rhobar1, beta);

            let theta = sn * alfa;
            rhobar = -cs * alfa;
            let phi = cs * phibar;
            phibar = sn * phibar;
            let tau = sn * phi;

            // Update x and w, accumulating ‖d_k‖² for the condition estimate.
            let t1 = phi / rho;
            let t2 = -theta / rho;
            let mut dknorm_sq = zero;
            for &wj in w.iter() {
                let dkj = wj / rho;
                dknorm_sq = dknorm_sq + dkj * dkj;
            }
            ddnorm = ddnorm + dknorm_sq;
            if self.calc_var {
                for (vj, &wj) in var.iter_mut().zip(&w) {
                    let dkj = wj / rho;
                    *vj = *vj + dkj * dkj;
                }
            }
            axpy(&mut x, &w, t1);
            scale_add(&mut w, &v, t2);

            // Rotation on the right eliminating the super-diagonal element
            // (theta); tracks ‖x‖ without reforming x.
            let delta = sn2 * rho;
            let gambar = -cs2 * rho;
            let rhs = phi - delta * z;
            let zbar = rhs / gambar;
            xnorm = (xxnorm + zbar * zbar).sqrt();
            let gamma = (gambar * gambar + theta * theta).sqrt();
            cs2 = gambar / gamma;
            sn2 = theta / gamma;
            z = rhs / gamma;
            xxnorm = xxnorm + z * z;

            // Estimate the condition of Abar and the norms of rbar and
            // Abarᴴ·rbar.
            acond = anorm * ddnorm.sqrt();
            let res1 = phibar * phibar;
            res2 = res2 + psi * psi;
            rnorm = (res1 + res2).sqrt();
            arnorm = alfa * tau.abs();

            // r1norm is recovered from r2norm by removing the damping term;
            // the subtraction cancels but stays accurate enough.
            if self.damp > zero {
                let r1sq = rnorm * rnorm - dampsq * xxnorm;
                r1norm = r1sq.abs().sqrt();
                if r1sq < zero {
                    r1norm = -r1norm;
                }
            } else {
                r1norm = rnorm;
            }
            r2norm = rnorm;

            let test1 = rnorm / bnorm;
            let test2 = arnorm / (anorm * rnorm + eps);
            let test3 = one / (acond + eps);
            let t1 = test1 / (one + anorm * xnorm / bnorm);
            let rtol = self.btol + self.atol * anorm * xnorm / bnorm;

            // The machine-precision guards keep the tests meaningful when
            // atol, btol, or conlim are set to zero.
            if itn >= iter_lim {
                istop = Some(LsqrStop::IterationLimit);
            }
            if one + test3 <= one {
                istop = Some(LsqrStop::MachineConditionLimit);
            }
            if one + test2 <= one {
                istop = Some(LsqrStop::MachineLeastSquares);
            }
            if one + t1 <= one {
                istop = Some(LsqrStop::MachineCompatible);
            }

            // Tolerances set by the caller.
            if test3 <= ctol {
                istop = Some(LsqrStop::ConditionLimit);
            }
            if test2 <= self.atol {
                istop = Some(LsqrStop::LeastSquares);
            }
            if test1 <= rtol {
                istop = Some(LsqrStop::Compatible);
            }

            if istop.is_some() {
                break;
            }
        }

        Ok(LsqrResult {
            x,
            istop: istop.unwrap_or(LsqrStop::ZeroSolution),
            itn,
            r1norm,
            r2norm,
            anorm,
            acond,
            arnorm,
            xnorm,
            var,
        })
    }
}

/// Stable construction of a Givens rotation (Choi's SymOrtho): returns
/// (c, s, r) with c·a + s·b = r and s·a − c·b = 0, avoiding overflow from
/// forming a² + b² directly.
fn sym_ortho<T: Float>(a: T, b: T) -> (T, T, T) {
    if b == T::zero() {
        (sign(a), T::zero(), a.abs())
    } else if a == T::zero() {
        (T::zero(), sign(b), b.abs())
    } else if b.abs() > a.abs() {
        let tau = a / b;
        let s = sign(b) / (T::one() + tau * tau).sqrt();
        let c = s * tau;
        (c, s, b / s)
    } else {
        let tau = b / a;
        let c = sign(a) / (T::one() + tau * tau).sqrt();
        let s = c * tau;
        (c, s, a / c)
    }
}

// sign(0) = 0, unlike `Float::signum`.
fn sign<T: Float>(x: T) -> T {
    if x > T::zero() {
        T::one()
    } else if x < T::zero() {
        -T::one()
    } else {
        T::zero()
    }
}
