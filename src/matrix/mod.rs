//! Concrete matrix types implementing the collaborator seams.

pub mod sparse;
pub use sparse::CsrMatrix;
