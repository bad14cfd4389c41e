//! Domain errors - error types for the domain layer

use thiserror::Error;

/// Presence fields that cannot be rendered at all.
///
/// Field-level problems (missing application id, bad buttons) are recovered
/// inside the builder and reported as warnings instead.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PresenceValidationError {
    #[error("Activity name is empty")]
    EmptyName,

    #[error("Activity name too long: max {max} characters")]
    NameTooLong { max: usize },
}

/// Elapsed-time storage failures
#[derive(Debug, Error)]
pub enum StoreError {
    // =========================================================================
    // Infrastructure Errors (wrapped)
    // =========================================================================
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Other(String),
}

/// Credential acquisition failures
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("No credential configured")]
    Missing,

    #[error("Credential source unavailable: {0}")]
    Unavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        assert_eq!(
            PresenceValidationError::EmptyName.to_string(),
            "Activity name is empty"
        );
        assert_eq!(
            PresenceValidationError::NameTooLong { max: 128 }.to_string(),
            "Activity name too long: max 128 characters"
        );
        assert_eq!(CredentialError::Missing.to_string(), "No credential configured");
    }

    #[test]
    fn test_store_error_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = StoreError::from(io);
        assert!(err.to_string().contains("denied"));
    }
}
