use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Cryptographic error: {0}")]
    Crypto(#[from] CryptoError),

    #[error("Too many requests, retry in {} seconds", .retry_after.as_secs())]
    RateLimited { retry_after: std::time::Duration },

    #[error("Configuration error: {0}")]
    Config(String),
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("User not found")]
    UserNotFound,

    #[error("Account deactivated")]
    AccountDeactivated,

    #[error("Account locked until {until}")]
    AccountLocked { until: chrono::DateTime<chrono::Utc> },
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Session expired")]
    Expired,

    #[error("Session revoked")]
    Revoked,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Migration error: {0}")]
    Migration(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Record not found")]
    NotFound,

    #[error("Constraint violation: {0}")]
    Constraint(String),
}

#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid email format: {0}")]
    InvalidEmail(String),

    #[error("Invalid username: {0}")]
    InvalidUsername(String),

    #[error("Invalid password: {0}")]
    InvalidPassword(String),

    #[error("Invalid field: {0}")]
    InvalidField(String),

    #[error("Missing required field: {0}")]
    MissingField(String),
}

#[derive(Debug, Error)]
pub enum CryptoError {
    #[error("JWT signing failed: {0}")]
    JwtSigning(String),

    #[error("Password hashing failed: {0}")]
    PasswordHash(String),
}

impl Error {
    pub fn is_auth_error(&self) -> bool {
        matches!(self, Error::Auth(_))
    }

    pub fn is_validation_error(&self) -> bool {
        matches!(self, Error::Validation(_))
    }

    pub fn is_storage_error(&self) -> bool {
        matches!(self, Error::Storage(_))
    }

    pub fn is_session_error(&self) -> bool {
        matches!(self, Error::Session(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let auth_error = Error::Auth(AuthError::InvalidCredentials);
        assert_eq!(
            auth_error.to_string(),
            "Authentication error: Invalid credentials"
        );

        let validation_error =
            Error::Validation(ValidationError::InvalidEmail("test@".to_string()));
        assert_eq!(
            validation_error.to_string(),
            "Validation error: Invalid email format: test@"
        );

        let storage_error = Error::Storage(StorageError::NotFound);
        assert_eq!(storage_error.to_string(), "Storage error: Record not found");
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::Auth(AuthError::InvalidCredentials).is_auth_error());
        assert!(Error::Session(SessionError::Expired).is_session_error());
        assert!(Error::Storage(StorageError::NotFound).is_storage_error());
        assert!(
            Error::Validation(ValidationError::MissingField("email".to_string()))
                .is_validation_error()
        );
        assert!(!Error::Storage(StorageError::NotFound).is_auth_error());
    }

    #[test]
    fn test_error_from_conversions() {
        let error: Error = AuthError::InvalidCredentials.into();
        assert!(matches!(error, Error::Auth(AuthError::InvalidCredentials)));

        let error: Error = SessionError::Revoked.into();
        assert!(matches!(error, Error::Session(SessionError::Revoked)));
    }
}
