use crate::{
    Error, User, UserId,
    error::{AuthError, CryptoError},
    repositories::{PasswordRepository, UserRepository},
    services::UserService,
    validation::validate_password,
};
use std::sync::Arc;

/// Service for password authentication operations
pub struct PasswordService<U: UserRepository, P: PasswordRepository> {
    user_service: Arc<UserService<U>>,
    password_repository: Arc<P>,
}

impl<U: UserRepository, P: PasswordRepository> PasswordService<U, P> {
    /// Create a new PasswordService with the given repositories
    pub fn new(user_repository: Arc<U>, password_repository: Arc<P>) -> Self {
        let user_service = Arc::new(UserService::new(user_repository));
        Self {
            user_service,
            password_repository,
        }
    }

    /// Register a new user with a password
    ///
    /// Returns the user whether newly created or already existing. This prevents
    /// user enumeration attacks by not revealing whether an email is already in use.
    ///
    /// If the user already exists, their password is NOT updated; otherwise an
    /// attacker could take over an account by re-registering with a victim's
    /// email and their own password.
    pub async fn register_user(
        &self,
        email: &str,
        username: &str,
        password: &str,
    ) -> Result<User, Error> {
        // Validate password strength before any other operations
        validate_password(password)?;

        if let Some(existing_user) = self.user_service.get_user_by_email(email).await? {
            return Ok(existing_user);
        }

        // Hash before inserting so a user row never exists without a credential
        let password_hash = Self::hash_password(password)?;

        // Email and username validation happens in UserService
        let user = self.user_service.create_user(email, username).await?;

        self.password_repository
            .set_password_hash(&user.id, &password_hash)
            .await?;

        Ok(user)
    }

    /// Verify a password for an already-loaded user
    ///
    /// A missing hash is reported as invalid credentials, indistinguishable
    /// from a wrong password.
    pub async fn verify_for_user(&self, user_id: &UserId, password: &str) -> Result<bool, Error> {
        let password_hash = match self.password_repository.get_password_hash(user_id).await? {
            Some(hash) => hash,
            None => return Ok(false),
        };

        Self::verify_password(password, &password_hash)
    }

    /// Authenticate a user with email and password
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<User, Error> {
        let user = self
            .user_service
            .get_user_by_email(email)
            .await?
            .ok_or(Error::Auth(AuthError::InvalidCredentials))?;

        if !self.verify_for_user(&user.id, password).await? {
            return Err(Error::Auth(AuthError::InvalidCredentials));
        }

        Ok(user)
    }

    /// Change a user's password, checking the current one first
    pub async fn change_password(
        &self,
        user_id: &UserId,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), Error> {
        validate_password(new_password)?;

        if !self.verify_for_user(user_id, current_password).await? {
            return Err(Error::Auth(AuthError::InvalidCredentials));
        }

        let new_hash = Self::hash_password(new_password)?;

        self.password_repository
            .set_password_hash(user_id, &new_hash)
            .await?;

        Ok(())
    }

    /// Set a user's password without checking the old one
    ///
    /// Used by the reset flow, where possession of a valid reset token
    /// stands in for knowledge of the current password.
    pub async fn set_password(&self, user_id: &UserId, password: &str) -> Result<(), Error> {
        validate_password(password)?;

        let password_hash = Self::hash_password(password)?;
        self.password_repository
            .set_password_hash(user_id, &password_hash)
            .await
    }

    /// Remove a user's password
    pub async fn remove_password(&self, user_id: &UserId) -> Result<(), Error> {
        self.password_repository.remove_password_hash(user_id).await
    }

    /// Hash a password using argon2
    fn hash_password(password: &str) -> Result<String, Error> {
        use password_auth::generate_hash;
        Ok(generate_hash(password))
    }

    /// Verify a password against a hash
    ///
    /// A mismatch is `Ok(false)`. An unparseable stored hash is an
    /// infrastructure fault, not a wrong password; it must surface as an
    /// error so callers do not count it against the user's lockout budget.
    fn verify_password(password: &str, hash: &str) -> Result<bool, Error> {
        use password_auth::VerifyError;
        match password_auth::verify_password(password, hash) {
            Ok(()) => Ok(true),
            Err(VerifyError::PasswordInvalid) => Ok(false),
            Err(VerifyError::Parse(e)) => {
                Err(Error::Crypto(CryptoError::PasswordHash(e.to_string())))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repositories::{PasswordRepository, UserRepository};
    use crate::user::NewUser;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct MockUserRepository {
        pub users: Arc<Mutex<HashMap<UserId, User>>>,
    }

    impl MockUserRepository {
        async fn by_email(&self, email: &str) -> Option<User> {
            self.users
                .lock()
                .await
                .values()
                .find(|u| u.email == email)
                .cloned()
        }
    }

    #[async_trait]
    impl UserRepository for MockUserRepository {
        async fn create(&self, new_user: NewUser) -> Result<User, Error> {
            let user = User::builder()
                .id(new_user.id)
                .email(new_user.email)
                .username(new_user.username)
                .email_verified_at(new_user.email_verified_at)
                .build()
                .map_err(Error::Validation)?;

            self.users.lock().await.insert(user.id.clone(), user.clone());
            Ok(user)
        }

        async fn find_by_id(&self, id: &UserId) -> Result<Option<User>, Error> {
            Ok(self.users.lock().await.get(id).cloned())
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<User>, Error> {
            Ok(self.by_email(email).await)
        }

        async fn find_by_username(&self, username: &str) -> Result<Option<User>, Error> {
            Ok(self
                .users
                .lock()
                .await
                .values()
                .find(|u| u.username == username)
                .cloned())
        }

        async fn update(&self, user: &User) -> Result<User, Error> {
            self.users
                .lock()
                .await
                .insert(user.id.clone(), user.clone());
            Ok(user.clone())
        }

        async fn delete(&self, id: &UserId) -> Result<(), Error> {
            self.users.lock().await.remove(id);
            Ok(())
        }

        async fn mark_email_verified(&self, user_id: &UserId) -> Result<(), Error> {
            if let Some(user) = self.users.lock().await.get_mut(user_id) {
                user.email_verified_at = Some(Utc::now());
            }
            Ok(())
        }

        async fn set_active(&self, user_id: &UserId, is_active: bool) -> Result<(), Error> {
            if let Some(user) = self.users.lock().await.get_mut(user_id) {
                user.is_active = is_active;
            }
            Ok(())
        }

        async fn record_login_failure(&self, user_id: &UserId) -> Result<u32, Error> {
            let mut users = self.users.lock().await;
            let user = users
                .get_mut(user_id)
                .ok_or(Error::Auth(AuthError::UserNotFound))?;
            user.failed_login_attempts += 1;
            Ok(user.failed_login_attempts)
        }

        async fn lock_until(
            &self,
            user_id: &UserId,
            locked_until: DateTime<Utc>,
        ) -> Result<(), Error> {
            if let Some(user) = self.users.lock().await.get_mut(user_id) {
                user.locked_until = Some(locked_until);
            }
            Ok(())
        }

        async fn reset_lockout(&self, user_id: &UserId) -> Result<(), Error> {
            if let Some(user) = self.users.lock().await.get_mut(user_id) {
                user.failed_login_attempts = 0;
                user.locked_until = None;
            }
            Ok(())
        }

        async fn record_login_success(&self, user_id: &UserId) -> Result<(), Error> {
            if let Some(user) = self.users.lock().await.get_mut(user_id) {
                user.failed_login_attempts = 0;
                user.locked_until = None;
                user.last_login_at = Some(Utc::now());
            }
            Ok(())
        }
    }

    #[derive(Default)]
    pub(crate) struct MockPasswordRepository {
        pub passwords: Arc<Mutex<HashMap<UserId, String>>>,
    }

    #[async_trait]
    impl PasswordRepository for MockPasswordRepository {
        async fn set_password_hash(&self, user_id: &UserId, hash: &str) -> Result<(), Error> {
            self.passwords
                .lock()
                .await
                .insert(user_id.clone(), hash.to_string());
            Ok(())
        }

        async fn get_password_hash(&self, user_id: &UserId) -> Result<Option<String>, Error> {
            Ok(self.passwords.lock().await.get(user_id).cloned())
        }

        async fn remove_password_hash(&self, user_id: &UserId) -> Result<(), Error> {
            self.passwords.lock().await.remove(user_id);
            Ok(())
        }
    }

    fn service() -> PasswordService<MockUserRepository, MockPasswordRepository> {
        PasswordService::new(
            Arc::new(MockUserRepository::default()),
            Arc::new(MockPasswordRepository::default()),
        )
    }

    #[tokio::test]
    async fn test_register_and_authenticate() {
        let service = service();

        let user = service
            .register_user("test@example.com", "test", "password123")
            .await
            .unwrap();
        assert_eq!(user.email, "test@example.com");

        let authed = service
            .authenticate("test@example.com", "password123")
            .await
            .unwrap();
        assert_eq!(authed.id, user.id);
    }

    #[tokio::test]
    async fn test_authenticate_wrong_password() {
        let service = service();

        service
            .register_user("test@example.com", "test", "password123")
            .await
            .unwrap();

        let result = service.authenticate("test@example.com", "wrong-pass").await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_authenticate_unknown_email_same_error() {
        let service = service();

        let result = service.authenticate("nobody@example.com", "password123").await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));
    }

    #[tokio::test]
    async fn test_register_existing_email_returns_existing_user() {
        let service = service();

        let first = service
            .register_user("test@example.com", "test", "password123")
            .await
            .unwrap();

        // Re-registration must not reveal the collision or replace the password
        let second = service
            .register_user("test@example.com", "other", "hijacked-pass")
            .await
            .unwrap();
        assert_eq!(second.id, first.id);

        assert!(
            service
                .authenticate("test@example.com", "password123")
                .await
                .is_ok()
        );
        assert!(
            service
                .authenticate("test@example.com", "hijacked-pass")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_corrupt_stored_hash_is_a_crypto_error_not_a_mismatch() {
        use crate::error::CryptoError;

        let service = service();
        let user = service
            .register_user("test@example.com", "test", "password123")
            .await
            .unwrap();

        service
            .password_repository
            .set_password_hash(&user.id, "not-a-phc-string")
            .await
            .unwrap();

        // An unreadable hash must not masquerade as a wrong password
        let result = service.verify_for_user(&user.id, "password123").await;
        assert!(matches!(
            result,
            Err(Error::Crypto(CryptoError::PasswordHash(_)))
        ));
    }

    #[tokio::test]
    async fn test_register_rejects_weak_password() {
        let service = service();

        let result = service.register_user("test@example.com", "test", "short").await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_change_password() {
        let service = service();

        let user = service
            .register_user("test@example.com", "test", "password123")
            .await
            .unwrap();

        service
            .change_password(&user.id, "password123", "new-password456")
            .await
            .unwrap();

        assert!(
            service
                .authenticate("test@example.com", "new-password456")
                .await
                .is_ok()
        );
        assert!(
            service
                .authenticate("test@example.com", "password123")
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_change_password_requires_current() {
        let service = service();

        let user = service
            .register_user("test@example.com", "test", "password123")
            .await
            .unwrap();

        let result = service
            .change_password(&user.id, "wrong-current", "new-password456")
            .await;
        assert!(matches!(
            result,
            Err(Error::Auth(AuthError::InvalidCredentials))
        ));
    }
}
