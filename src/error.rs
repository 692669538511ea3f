use thiserror::Error;

// Unified error type for matfree

#[derive(Error, Debug)]
pub enum MfError {
    #[error("dimension mismatch: expected vector of length {expected}, got {found}")]
    DimensionMismatch { expected: usize, found: usize },
    #[error("matrix must be square, got {rows}x{cols}")]
    NotSquare { rows: usize, cols: usize },
    #[error("incompatible operator shapes: ({0}, {1}) and ({2}, {3})")]
    ShapeMismatch(usize, usize, usize, usize),
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
    #[error("did not converge within {0} iterations")]
    ConvergenceFailure(usize),
}
