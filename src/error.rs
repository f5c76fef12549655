//! Errors that can happen in this crate

/// Every failure this crate can report.
///
/// The variants follow who is to blame: the deployment (`Configuration`), the caller
/// (`Validation`, `UnsupportedOperation`), the hosted database (`ExternalService`),
/// or the connection between a presentation surface and the task API (`ClientSync`).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A required environment value or a required schema field is missing
    #[error("{0}")]
    Configuration(String),
    /// The request is missing a required field, or carries an invalid one
    #[error("{0}")]
    Validation(String),
    /// The request asks for something the current database schema cannot do
    #[error("{0}")]
    UnsupportedOperation(String),
    /// The external store failed or answered with a non-success status
    #[error("{0}")]
    ExternalService(String),
    /// A call from a presentation surface to the task API failed
    #[error("{0}")]
    ClientSync(String),
}

impl Error {
    /// Whether this error is the caller's fault (and should be reported as such)
    pub fn is_caller_error(&self) -> bool {
        matches!(self, Error::Validation(_) | Error::UnsupportedOperation(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::ExternalService(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::ExternalService(format!("Unable to decode a response: {}", err))
    }
}

impl From<url::ParseError> for Error {
    fn from(err: url::ParseError) -> Self {
        Error::Configuration(format!("Invalid URL: {}", err))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
