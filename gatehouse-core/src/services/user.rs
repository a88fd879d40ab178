use crate::{
    Error, User, UserId,
    repositories::UserRepository,
    user::NewUser,
    validation::{validate_email, validate_username},
};
use std::sync::Arc;

/// Service for user management operations
pub struct UserService<R: UserRepository> {
    repository: Arc<R>,
}

impl<R: UserRepository> UserService<R> {
    /// Create a new UserService with the given repository
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Create a new user
    pub async fn create_user(&self, email: &str, username: &str) -> Result<User, Error> {
        validate_email(email)?;
        validate_username(username)?;

        let new_user = NewUser::new(email.to_string(), username.to_string());

        self.repository.create(new_user).await
    }

    /// Get a user by ID
    pub async fn get_user(&self, user_id: &UserId) -> Result<Option<User>, Error> {
        self.repository.find_by_id(user_id).await
    }

    /// Get a user by email
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, Error> {
        self.repository.find_by_email(email).await
    }

    /// Get a user by username
    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, Error> {
        self.repository.find_by_username(username).await
    }

    /// Update a user
    pub async fn update_user(&self, user: &User) -> Result<User, Error> {
        self.repository.update(user).await
    }

    /// Delete a user; sessions, password hash, and tokens cascade
    pub async fn delete_user(&self, user_id: &UserId) -> Result<(), Error> {
        self.repository.delete(user_id).await
    }

    /// Mark a user's email as verified
    pub async fn verify_email(&self, user_id: &UserId) -> Result<(), Error> {
        self.repository.mark_email_verified(user_id).await
    }

    /// Activate or deactivate an account
    pub async fn set_active(&self, user_id: &UserId, is_active: bool) -> Result<(), Error> {
        self.repository.set_active(user_id, is_active).await
    }
}
