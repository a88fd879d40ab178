//! # Gatehouse Axum Integration
//!
//! Ready-to-use Axum routes and middleware for the Gatehouse authentication
//! stack: registration, login with lockout and rate limiting, logout,
//! session introspection, password change/reset, email verification, and an
//! admin surface, all speaking `{"error", "code"}` JSON on failure.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use axum::Router;
//! use gatehouse::{AuthConfig, Gatehouse, SqliteRepositoryProvider};
//! use gatehouse_axum::{routes, CookieConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let repositories = Arc::new(SqliteRepositoryProvider::connect("sqlite://gatehouse.db").await?);
//!     let config = AuthConfig::from_env()?;
//!     let cookie_config = CookieConfig::for_environment(config.production);
//!
//!     let gatehouse = Arc::new(Gatehouse::new(repositories, config)?);
//!     gatehouse.migrate().await?;
//!
//!     let app = Router::new().nest("/auth", routes(gatehouse).with_cookie_config(cookie_config).build());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:3000").await?;
//!     axum::serve(listener, app.into_make_service_with_connect_info::<std::net::SocketAddr>()).await?;
//!     Ok(())
//! }
//! ```

mod error;
mod extractors;
mod middleware;
mod routes;
mod types;

pub use error::{ApiError, Result};
pub use extractors::{AuthUser, BearerOrCookieToken, OptionalAuthUser};
pub use middleware::{AuthState, auth_middleware, require_admin, require_auth};
pub use routes::create_router;
pub use types::{
    AuthResponse, ChangePasswordRequest, ConnectionInfo, CookieConfig, CookieSameSite,
    HealthResponse, LoginRequest, MessageResponse, PasswordResetRequest, RegisterRequest,
    ResetPasswordRequest, SessionResponse, UserBody, UserResponse, VerifyEmailRequest,
    VerifyResetTokenRequest, VerifyResetTokenResponse,
};

use axum::Router;
use gatehouse::Gatehouse;
use gatehouse_core::repositories::RepositoryProvider;
use std::sync::Arc;

/// Create authentication routes for your Axum application.
///
/// Returns a builder so the cookie policy can be set before the router is
/// built; nest the result at any path (e.g. "/auth").
pub fn routes<R>(gatehouse: Arc<Gatehouse<R>>) -> AuthRouterBuilder<R>
where
    R: RepositoryProvider + 'static,
{
    AuthRouterBuilder {
        gatehouse,
        cookie_config: CookieConfig::default(),
    }
}

/// Builder for configuring authentication routes.
pub struct AuthRouterBuilder<R: RepositoryProvider> {
    gatehouse: Arc<Gatehouse<R>>,
    cookie_config: CookieConfig,
}

impl<R: RepositoryProvider + 'static> AuthRouterBuilder<R> {
    /// Set custom cookie configuration.
    pub fn with_cookie_config(mut self, config: CookieConfig) -> Self {
        self.cookie_config = config;
        self
    }

    /// Build the router with the configured options.
    pub fn build(self) -> Router {
        create_router(self.gatehouse, self.cookie_config)
    }
}

impl<R: RepositoryProvider + 'static> From<AuthRouterBuilder<R>> for Router {
    fn from(builder: AuthRouterBuilder<R>) -> Self {
        builder.build()
    }
}
