use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CertError {
    #[error("{0} is not a readable directory")]
    NotADirectory(PathBuf),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{url} answered {status}")]
    UnexpectedStatus { url: String, status: u16 },
}

pub type CertResult<T> = Result<T, CertError>;
