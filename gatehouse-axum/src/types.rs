use chrono::{DateTime, Utc};
use gatehouse::{Session, User};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub remember_me: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResetTokenRequest {
    pub token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyEmailRequest {
    pub token: String,
}

/// The user shape returned to clients.
///
/// Lockout counters and timestamps used internally never leave the server.
#[derive(Debug, Clone, Serialize)]
pub struct UserBody {
    pub id: String,
    pub email: String,
    pub username: String,
    pub email_verified: bool,
    pub is_admin: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserBody {
    fn from(user: User) -> Self {
        Self {
            id: user.id.to_string(),
            email: user.email,
            username: user.username,
            email_verified: user.email_verified_at.is_some(),
            is_admin: user.is_admin,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthResponse {
    pub user: UserBody,
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

impl AuthResponse {
    pub fn new(user: User, session: &Session) -> Self {
        Self {
            user: user.into(),
            token: session.token.as_str().to_string(),
            expires_at: session.expires_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub user: UserBody,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionResponse {
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyResetTokenResponse {
    pub valid: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Client address and user agent, pulled off each request for session rows
/// and the audit trail.
#[derive(Debug, Clone)]
pub struct ConnectionInfo {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

/// How the auth cookie is issued.
#[derive(Debug, Clone)]
pub struct CookieConfig {
    pub name: String,
    pub http_only: bool,
    pub secure: bool,
    pub same_site: CookieSameSite,
    pub path: String,
}

#[derive(Debug, Clone, Default)]
pub enum CookieSameSite {
    Strict,
    #[default]
    Lax,
    None,
}

impl Default for CookieConfig {
    fn default() -> Self {
        Self {
            name: "gatehouse_session".to_string(),
            http_only: true,
            secure: true,
            same_site: CookieSameSite::Lax,
            path: "/".to_string(),
        }
    }
}

impl CookieConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Secure flag off, for plain-HTTP local development.
    pub fn development() -> Self {
        Self {
            secure: false,
            ..Self::default()
        }
    }

    /// Secure iff running in production, matching `AuthConfig::production`.
    pub fn for_environment(production: bool) -> Self {
        Self {
            secure: production,
            ..Self::default()
        }
    }
}
