//! Application-wide error types using thiserror
//!
//! Layer errors (`ApiError`, `StoreError`) convert into `AppError` at the
//! points where a flow spans both the backend and local persistence.

use thiserror::Error;

use crate::api::errors::ApiError;
use crate::api::store::StoreError;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("API error: {0}")]
    Api(#[from] ApiError),

    #[error("Session store error: {0}")]
    Store(#[from] StoreError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;
