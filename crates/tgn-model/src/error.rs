use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ModelError {
    #[error("unknown TGn channel model {0:?}: expected one of B, C, D, E")]
    UnknownModelLetter(String),

    #[error("sampling-rate expansion factor must be at least 1, got {0}")]
    InvalidExpansionFactor(u32),
}

pub type ModelResult<T> = Result<T, ModelError>;
