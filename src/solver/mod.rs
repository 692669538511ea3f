//! The Krylov solver family.
//!
//! Every solver here consumes the [`LinearOperator`](crate::operator::LinearOperator)
//! abstraction (or the raw collaborator seam, for [`spsolve`]) and the
//! vector kernels; none commits to a concrete matrix representation.

pub mod spsolve;
pub use spsolve::spsolve;

pub mod cg;
pub use cg::CgSolver;

pub mod cgs;
pub use cgs::CgsSolver;

pub mod bicg;
pub use bicg::BicgSolver;

pub mod bicgstab;
pub use bicgstab::BiCgStabSolver;

pub mod lsqr;
pub use lsqr::{LsqrResult, LsqrSolver, LsqrStop};
