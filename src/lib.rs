//! matfree: Krylov subspace solvers over a lazy linear-operator abstraction
//!
//! This crate provides iterative solvers (CG, CGS, BiCG, BiCGSTAB, LSQR) for
//! large sparse or implicit linear systems, together with a composable
//! [`LinearOperator`](operator::LinearOperator) interface so the same solver
//! code runs against dense, sparse, or matrix-free operators.

pub mod core;
pub mod error;
pub mod matrix;
pub mod operator;
pub mod solver;
pub mod utils;

// Re-exports for convenience
pub use crate::core::kernels;
pub use crate::core::traits::{ConjTranspose, MatShape, MatVec};
pub use error::MfError;
pub use matrix::CsrMatrix;
pub use operator::{
    AdjointOperator, FnOperator, IdentityOperator, LinearOperator, MatrixOperator,
    ProductOperator, ScaledOperator, SumOperator,
};
pub use solver::{
    BiCgStabSolver, BicgSolver, CgSolver, CgsSolver, LsqrResult, LsqrSolver, LsqrStop, spsolve,
};
pub use utils::convergence::Convergence;
