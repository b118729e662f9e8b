use thiserror::Error;

/// Failures reported by engine primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("node storage exhausted (limit: {limit} nodes)")]
    MemoryOut { limit: usize },

    /// A node creation triggered dynamic reordering; intermediate results of
    /// the interrupted computation no longer follow the variable order.
    #[error("operation interrupted by dynamic reordering")]
    Reordered,

    #[error("{0} is not implemented by this backend")]
    NotImplemented(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T, E = EngineError> = std::result::Result<T, E>;
