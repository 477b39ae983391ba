// src/error/types.rs
use serde::Serialize;
use thiserror::Error;

use crate::domain::DomainError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Provider not registered: {0}")]
    ProviderNotFound(String),

    #[error("Provider already registered: {0}")]
    DuplicateProvider(String),

    #[error("Registration closed, lifecycle already started (provider: {0})")]
    RegistrationClosed(String),

    #[error("Provider {0} is not of the requested type")]
    ProviderTypeMismatch(String),

    #[error("Provider registry has been dropped")]
    RegistryUnavailable,

    #[error("Route not found: {0}")]
    RouteNotFound(String),

    #[error("Route already registered: {0}")]
    DuplicateRoute(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),

    #[error("Page probe failed: {0}")]
    Probe(#[from] ProbeError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Integration error: {0}")]
    Integration(String),

    #[error("Other error: {0}")]
    Other(String),
}

/// Failure of a script executed against the embedded page.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    #[error("script threw: {0}")]
    Script(String),

    #[error("timed out after {0}ms")]
    Timeout(u64),

    #[error("page is not attached")]
    Unavailable,

    #[error("unexpected result shape: {0}")]
    UnexpectedShape(String),
}

impl Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl From<regex::Error> for AppError {
    fn from(err: regex::Error) -> Self {
        AppError::Other(format!("Regex error: {}", err))
    }
}

pub type AppResult<T> = Result<T, AppError>;
