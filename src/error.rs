use thiserror::Error;

/// Top-level error type for the tagmesh crate.
#[derive(Debug, Error)]
pub enum TagmeshError {
    #[error(transparent)]
    Geometry(#[from] GeometryError),

    #[error(transparent)]
    Complex(#[from] ComplexError),

    #[error(transparent)]
    Operation(#[from] OperationError),

    #[error(transparent)]
    Slice(#[from] SliceError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors related to geometric computations.
#[derive(Debug, Error)]
pub enum GeometryError {
    #[error("zero-length vector")]
    ZeroVector,
}

/// Errors raised by the labeled tetrahedral complex.
#[derive(Debug, Error)]
pub enum ComplexError {
    #[error("entity not found: {0}")]
    EntityNotFound(String),

    #[error("vertex index {index} out of range for {count} vertices")]
    VertexIndexOutOfRange { index: usize, count: usize },

    #[error("triangle shared by more than two tetrahedra")]
    NonManifoldFacet,

    #[error("facet tag mismatch: expected {expected}, found {found}")]
    InconsistentPatch { expected: String, found: String },

    #[error("vertex is still used by a cell in the complex")]
    VertexInUse,

    #[error("invalid complex: {0}")]
    Invalid(String),

    #[error("malformed mesh file at line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// Errors related to editing operations.
#[derive(Debug, Error)]
pub enum OperationError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

/// Errors related to slice construction and triangulation.
#[derive(Debug, Error)]
pub enum SliceError {
    #[error("invalid slice parameters: {0}")]
    InvalidParameters(String),

    #[error("triangulation failed: {0}")]
    Triangulation(String),
}

/// Convenience type alias for results using [`TagmeshError`].
pub type Result<T> = std::result::Result<T, TagmeshError>;
