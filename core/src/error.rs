//! Error types for the PetFriends client.
//!
//! # Design
//! HTTP statuses are never errors here: a 403 or 400 from the service is an
//! ordinary `ApiResponse`. `ApiError` only covers the cases where no response
//! could be produced at all.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by `PetFriends` operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The photo to upload could not be read.
    #[error("cannot read photo {}: {source}", .path.display())]
    Photo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The request could not be built, sent, or read back.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// Errors raised while loading `Settings`.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Env(#[from] envconfig::Error),

    /// A credential variable is missing.
    #[error("missing credentials: set PETFRIENDS_EMAIL and PETFRIENDS_PASSWORD")]
    MissingCredentials,
}
