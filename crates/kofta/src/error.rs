use kofta_core::prompt::ValidationError;

/// Per-request failures. None of these are fatal to the process or session.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Missing or empty input, the caller's fault.
    #[error("{0}")]
    Validation(String),

    /// The completion API or the gateway failed.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The wallet is absent, has no account, or rejected the transaction.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// The generated source could not be compiled for deployment.
    #[error("Compile error: {0}")]
    Compile(String),

    /// The document store could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(String),
}

impl From<ValidationError> for Error {
    fn from(err: ValidationError) -> Self {
        Error::Validation(err.to_string())
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Persistence(err.to_string())
    }
}
