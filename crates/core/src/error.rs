//! Engine error type.
//!
//! Almost every engine operation is total. The only rejected inputs are
//! malformed arguments: an unknown direction or action, a grid smaller than
//! 2x2, a win tile that is not a reachable power of two, or a hand-built grid
//! holding values that cannot occur in play.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl EngineError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EngineError::InvalidArgument(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
