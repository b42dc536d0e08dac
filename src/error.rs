//! Engine error type

use thiserror::Error;

/// Errors raised inside the optimization engine.
///
/// None of these escape `Optimizer::optimize`; they are converted into a
/// failed outcome carrying the message.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid routing model: {0}")]
    InvalidModel(String),

    #[error("arithmetic overflow while {0}")]
    ArithmeticOverflow(&'static str),

    #[error("optimization cancelled")]
    Cancelled,

    #[error("internal error: {0}")]
    Internal(String),
}
