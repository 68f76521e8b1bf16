//! Error taxonomy for the storage and publish layers.
//!
//! REST maps these onto HTTP in one place (`rest::ApiError`); everything below
//! stays transport-agnostic.

use thiserror::Error;

/// Failures from the identity store and project registry.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("username `{0}` is already taken")]
    DuplicateUsername(String),

    #[error("username `{0}` is not usable as a directory name")]
    InvalidUsername(String),

    /// Unknown username and wrong password are deliberately indistinguishable.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("storage backend error: {0}")]
    Backend(#[from] sled::Error),

    #[error("corrupt record: {0}")]
    Corrupt(#[from] serde_json::Error),

    #[error("corrupt identifier in index: {0}")]
    BadId(#[from] uuid::Error),

    #[error("credential hashing failed: {0}")]
    Credential(#[from] bcrypt::BcryptError),
}

/// Failures from the publish pipeline.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("project name is empty")]
    EmptyProjectName,

    #[error("project name `{0}` is not usable as a directory name")]
    InvalidProjectName(String),

    #[error(transparent)]
    Registry(#[from] StoreError),

    /// Any filesystem failure while writing or swapping the artifact set.
    #[error("failed to write artifact set: {0}")]
    PublishFailed(#[from] std::io::Error),
}
