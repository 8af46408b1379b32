use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("identifier must not be empty")]
    EmptyId,

    #[error("invalid identifier {0:?}: {1}")]
    InvalidId(String, &'static str),
}

pub type ModelResult<T> = Result<T, ModelError>;
