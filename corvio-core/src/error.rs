use thiserror::Error;

#[derive(Error, Debug)]
pub enum CorvioError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("http transport error: {0}")]
    Http(String),

    #[error("unexpected http status: {0}")]
    HttpStatus(u16),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl CorvioError {
    /// The backend status code carried by this error, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::HttpStatus(code) => Some(*code),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CorvioError>;
