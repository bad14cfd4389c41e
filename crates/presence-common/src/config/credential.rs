//! Token provider reading from the configuration file

use async_trait::async_trait;
use presence_core::{CredentialError, CredentialSource};
use std::path::PathBuf;

use super::app_config::{AppConfig, ConfigError};

/// Reads the token from the config file on every request, so a token
/// rotated on disk is used by the next identify.
#[derive(Debug, Clone)]
pub struct ConfigCredential {
    path: PathBuf,
}

impl ConfigCredential {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl CredentialSource for ConfigCredential {
    async fn credential(&self) -> Result<String, CredentialError> {
        let config = match AppConfig::load(&self.path, false) {
            Ok(config) => config,
            Err(ConfigError::NotFound(path)) => {
                return Err(CredentialError::Unavailable(format!(
                    "{} not found",
                    path.display()
                )))
            }
            Err(e) => return Err(CredentialError::Unavailable(e.to_string())),
        };

        if !config.has_token() {
            return Err(CredentialError::Missing);
        }
        Ok(config.token.trim().to_string())
    }
}
