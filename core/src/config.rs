//! Environment-driven settings for runs against a PetFriends deployment.
//!
//! Credentials are only needed by tests that log in to a live service, so
//! they are optional here and checked by `Settings::credentials`.

use envconfig::Envconfig;

use crate::error::ConfigError;
use crate::types::Credentials;

pub const DEFAULT_BASE_URL: &str = "https://petfriends1.herokuapp.com/";

#[derive(Envconfig, Debug, Clone)]
pub struct Settings {
    /// Root of the deployment, with or without a trailing slash.
    #[envconfig(from = "PETFRIENDS_BASE_URL", default = "https://petfriends1.herokuapp.com/")]
    pub base_url: String,

    #[envconfig(from = "PETFRIENDS_EMAIL")]
    pub email: Option<String>,

    /// Never logged.
    #[envconfig(from = "PETFRIENDS_PASSWORD")]
    pub password: Option<String>,

    /// Call log target, appended to across runs.
    #[envconfig(from = "PETFRIENDS_LOG_FILE", default = "log.txt")]
    pub log_file: String,
}

impl Settings {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self::init_from_env()?)
    }

    /// The configured login pair, if both halves are set.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        match (&self.email, &self.password) {
            (Some(email), Some(password)) => Ok(Credentials::new(email.as_str(), password.as_str())),
            _ => Err(ConfigError::MissingCredentials),
        }
    }
}
