use axum::http::StatusCode;
use std::time::Duration;
use thiserror::Error;

use crate::signature::SignatureError;

/// Le nom ne désigne pas exactement un hôte connu.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    #[error("host {name:?} not found")]
    NotFound { name: String },
    #[error("host {name:?} is ambiguous ({} matches: {})", .matches.len(), .matches.join(", "))]
    Ambiguous { name: String, matches: Vec<String> },
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("authentication failed: {0}")]
    Authentication(#[from] SignatureError),

    #[error("malformed input: {0}")]
    MalformedInput(String),

    #[error("interaction carried no actions")]
    NoActions,

    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    #[error("remote call failed: {0}")]
    RemoteCall(String),

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout { operation: &'static str, after: Duration },
}

impl Error {
    pub fn status(&self) -> StatusCode {
        match self {
            Error::Authentication(_) => StatusCode::UNAUTHORIZED,
            Error::NoActions => StatusCode::BAD_REQUEST,
            Error::MalformedInput(_)
            | Error::Resolution(_)
            | Error::RemoteCall(_)
            | Error::Transport(_)
            | Error::Timeout { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::MalformedInput(e.to_string())
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::RemoteCall(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
