//! Runtime error taxonomy
//!
//! Every error here is a synchronous report of a caller programming error.
//! Nothing in the runtime retries or recovers from them in place.

use thiserror::Error;

/// Result alias used across the runtime
pub type RuntimeResult<T> = Result<T, RuntimeError>;

/// Runtime-level errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuntimeError {
    /// Missing owner, empty state list, empty data key, bad numeric input
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// The same FSM state type, FSM name, module type or module binding registered twice
    #[error("Duplicate registration: {0}")]
    DuplicateRegistration(String),

    /// Operation not legal in the current lifecycle state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Strict pool checks, unbound module interfaces, wrong variable types
    #[error("Type contract violation: {0}")]
    TypeContractViolation(String),

    /// A module could not be resolved or constructed
    #[error("Not found: {0}")]
    NotFound(String),
}
