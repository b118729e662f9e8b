use bdd_engine::EngineError;
use thiserror::Error;

/// Failures surfaced by the bridge.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Double initialization, bad engine hints, unknown reorder or operator code.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Length mismatch, shrinking the variable count, out-of-range variable or
    /// level, operands from different managers.
    #[error("invalid argument: {0}")]
    Argument(String),

    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),

    #[error("manager is not initialized")]
    UseAfterShutdown,

    #[error("{0} is not implemented by this backend")]
    NotImplemented(&'static str),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl From<EngineError> for Error {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::MemoryOut { .. } | EngineError::Reordered => Error::ResourceExhaustion(e.to_string()),
            EngineError::NotImplemented(what) => Error::NotImplemented(what),
            EngineError::InvalidArgument(msg) => Error::Argument(msg),
            EngineError::InvalidConfig(msg) => Error::Configuration(msg),
        }
    }
}
