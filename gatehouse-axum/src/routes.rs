use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::{Cookie, SameSite};
use chrono::{DateTime, Utc};
use gatehouse::{Gatehouse, UserId};
use gatehouse_core::repositories::RepositoryProvider;

use crate::{
    error::{ApiError, Result},
    extractors::{AuthUser, BearerOrCookieToken},
    middleware::{AuthState, auth_middleware, require_admin},
    types::*,
};

pub fn create_router<R>(gatehouse: Arc<Gatehouse<R>>, cookie_config: CookieConfig) -> Router
where
    R: RepositoryProvider + 'static,
{
    let state = AuthState { gatehouse };

    let admin_routes = Router::new()
        .route("/admin/users/{id}", delete(delete_user_handler))
        .route_layer(axum::middleware::from_fn_with_state(
            state.clone(),
            require_admin::<R>,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .route("/register", post(register_handler))
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route("/session", get(get_session_handler).delete(logout_handler))
        .route("/user", get(get_user_handler))
        .route("/password", post(change_password_handler))
        .route(
            "/password/reset/request",
            post(request_password_reset_handler),
        )
        .route("/password/reset/verify", post(verify_reset_token_handler))
        .route("/password/reset/confirm", post(reset_password_handler))
        .route(
            "/email/verify/request",
            post(request_email_verification_handler),
        )
        .route(
            "/email/verify/confirm",
            post(confirm_email_verification_handler),
        )
        .merge(admin_routes)
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::<R>,
        ))
        .with_state(state)
        .layer(axum::Extension(cookie_config))
}

fn same_site(config: &CookieConfig) -> SameSite {
    match config.same_site {
        CookieSameSite::Strict => SameSite::Strict,
        CookieSameSite::Lax => SameSite::Lax,
        CookieSameSite::None => SameSite::None,
    }
}

/// Build the auth cookie with a max-age matching the session expiry.
fn auth_cookie(config: &CookieConfig, token: &str, expires_at: DateTime<Utc>) -> Cookie<'static> {
    let max_age = (expires_at - Utc::now()).num_seconds().max(0);

    Cookie::build((config.name.clone(), token.to_string()))
        .path(config.path.clone())
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(same_site(config))
        .max_age(time::Duration::seconds(max_age))
        .build()
}

fn removal_cookie(config: &CookieConfig) -> Cookie<'static> {
    Cookie::build((config.name.clone(), ""))
        .path(config.path.clone())
        .http_only(config.http_only)
        .secure(config.secure)
        .same_site(same_site(config))
        .max_age(time::Duration::ZERO)
        .build()
}

async fn health_handler<R>(State(state): State<AuthState<R>>) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.gatehouse.health_check().await?;

    Ok(Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    }))
}

async fn register_handler<R>(
    State(state): State<AuthState<R>>,
    axum::Extension(cookie_config): axum::Extension<CookieConfig>,
    connection_info: ConnectionInfo,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let (user, session) = state
        .gatehouse
        .register(
            &payload.email,
            &payload.username,
            &payload.password,
            connection_info.user_agent,
            connection_info.ip,
        )
        .await?;

    let cookie = auth_cookie(&cookie_config, session.token.as_str(), session.expires_at);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(AuthResponse::new(user, &session)),
    ))
}

async fn login_handler<R>(
    State(state): State<AuthState<R>>,
    axum::Extension(cookie_config): axum::Extension<CookieConfig>,
    connection_info: ConnectionInfo,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let (user, session) = state
        .gatehouse
        .login(
            &payload.email,
            &payload.password,
            payload.remember_me,
            connection_info.user_agent,
            connection_info.ip,
        )
        .await?;

    let cookie = auth_cookie(&cookie_config, session.token.as_str(), session.expires_at);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(AuthResponse::new(user, &session)),
    ))
}

async fn logout_handler<R>(
    State(state): State<AuthState<R>>,
    axum::Extension(cookie_config): axum::Extension<CookieConfig>,
    connection_info: ConnectionInfo,
    BearerOrCookieToken(token): BearerOrCookieToken,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    if let Some(token) = token {
        state
            .gatehouse
            .logout(&token, connection_info.user_agent, connection_info.ip)
            .await?;
    }

    let cookie = removal_cookie(&cookie_config);

    Ok((
        [(header::SET_COOKIE, cookie.to_string())],
        Json(MessageResponse {
            message: "Successfully logged out".to_string(),
        }),
    ))
}

async fn get_session_handler<R>(
    State(state): State<AuthState<R>>,
    BearerOrCookieToken(token): BearerOrCookieToken,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let token = token.ok_or(ApiError::Unauthorized)?;
    let session = state
        .gatehouse
        .get_session(&token)
        .await?
        .ok_or(ApiError::Unauthorized)?;

    Ok(Json(SessionResponse {
        expires_at: session.expires_at,
        created_at: session.created_at,
    }))
}

async fn get_user_handler(AuthUser(user): AuthUser) -> Result<impl IntoResponse> {
    Ok(Json(UserResponse { user: user.into() }))
}

async fn change_password_handler<R>(
    State(state): State<AuthState<R>>,
    axum::Extension(cookie_config): axum::Extension<CookieConfig>,
    connection_info: ConnectionInfo,
    AuthUser(user): AuthUser,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let session = state
        .gatehouse
        .change_password(
            &user.id,
            &payload.current_password,
            &payload.new_password,
            connection_info.user_agent,
            connection_info.ip,
        )
        .await?;

    let cookie = auth_cookie(&cookie_config, session.token.as_str(), session.expires_at);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(AuthResponse::new(user, &session)),
    ))
}

async fn request_password_reset_handler<R>(
    State(state): State<AuthState<R>>,
    connection_info: ConnectionInfo,
    Json(payload): Json<PasswordResetRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state
        .gatehouse
        .request_password_reset(&payload.email, connection_info.ip)
        .await?;

    // Identical body whether or not the email matched an account
    Ok(Json(MessageResponse {
        message: "If an account with that email exists, a password reset link has been sent."
            .to_string(),
    }))
}

async fn verify_reset_token_handler<R>(
    State(state): State<AuthState<R>>,
    Json(payload): Json<VerifyResetTokenRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let valid = state.gatehouse.verify_reset_token(&payload.token).await?;

    Ok(Json(VerifyResetTokenResponse { valid }))
}

async fn reset_password_handler<R>(
    State(state): State<AuthState<R>>,
    axum::Extension(cookie_config): axum::Extension<CookieConfig>,
    connection_info: ConnectionInfo,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let (user, session) = state
        .gatehouse
        .confirm_password_reset(
            &payload.token,
            &payload.new_password,
            connection_info.user_agent,
            connection_info.ip,
        )
        .await?;

    // The reset token proved account control, so the client is logged
    // straight in on the new credential
    let cookie = auth_cookie(&cookie_config, session.token.as_str(), session.expires_at);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(AuthResponse::new(user, &session)),
    ))
}

async fn request_email_verification_handler<R>(
    State(state): State<AuthState<R>>,
    AuthUser(user): AuthUser,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.gatehouse.request_email_verification(&user.id).await?;

    Ok(Json(MessageResponse {
        message: "Verification email sent".to_string(),
    }))
}

async fn confirm_email_verification_handler<R>(
    State(state): State<AuthState<R>>,
    axum::Extension(cookie_config): axum::Extension<CookieConfig>,
    connection_info: ConnectionInfo,
    Json(payload): Json<VerifyEmailRequest>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    let (user, session) = state
        .gatehouse
        .confirm_email_verification(
            &payload.token,
            connection_info.user_agent,
            connection_info.ip,
        )
        .await?;

    let cookie = auth_cookie(&cookie_config, session.token.as_str(), session.expires_at);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie.to_string())],
        Json(AuthResponse::new(user, &session)),
    ))
}

async fn delete_user_handler<R>(
    State(state): State<AuthState<R>>,
    Path(id): Path<String>,
) -> Result<impl IntoResponse>
where
    R: RepositoryProvider,
{
    state.gatehouse.delete_user(&UserId::new(&id)).await?;

    Ok(Json(MessageResponse {
        message: "User deleted".to_string(),
    }))
}
