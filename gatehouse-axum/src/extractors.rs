use std::net::SocketAddr;

use axum::{
    Extension, RequestPartsExt,
    extract::{ConnectInfo, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use axum_extra::{TypedHeader, extract::CookieJar, headers::UserAgent};
use gatehouse::{SessionToken, User};

use crate::{
    error::ApiError,
    types::{ConnectionInfo, CookieConfig},
};

impl<S> FromRequestParts<S> for ConnectionInfo
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user_agent = parts
            .extract::<Option<TypedHeader<UserAgent>>>()
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid user agent header"))?
            .map(|ua| ua.to_string());

        let ip = parts
            .extract::<ConnectInfo<SocketAddr>>()
            .await
            .ok()
            .map(|addr| addr.ip().to_string());

        Ok(ConnectionInfo { ip, user_agent })
    }
}

/// The authenticated user, injected by the auth middleware.
///
/// Rejects with a generic 401 when the request did not authenticate.
pub struct AuthUser(pub User);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Extension(user): Extension<User> =
            parts.extract().await.map_err(|_| ApiError::Unauthorized)?;

        Ok(AuthUser(user))
    }
}

/// Like [`AuthUser`] but absent instead of rejecting.
pub struct OptionalAuthUser(pub Option<User>);

impl<S> FromRequestParts<S> for OptionalAuthUser
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = parts.extensions.get::<User>().cloned();

        Ok(OptionalAuthUser(user))
    }
}

/// The bearer token, from `Authorization: Bearer` first, then the auth
/// cookie.
pub struct BearerOrCookieToken(pub Option<SessionToken>);

impl<S> FromRequestParts<S> for BearerOrCookieToken
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        if let Some(token) = parts
            .headers
            .get("Authorization")
            .and_then(|header| header.to_str().ok())
            .and_then(|header| header.strip_prefix("Bearer "))
        {
            return Ok(BearerOrCookieToken(Some(SessionToken::new(token))));
        }

        let cookie_name = parts
            .extensions
            .get::<CookieConfig>()
            .map(|config| config.name.clone())
            .unwrap_or_else(|| CookieConfig::default().name);

        let jar = parts
            .extract::<CookieJar>()
            .await
            .map_err(|_| (StatusCode::BAD_REQUEST, "Invalid cookie header"))?;

        let token = jar
            .get(&cookie_name)
            .map(|cookie| SessionToken::new(cookie.value()));

        Ok(BearerOrCookieToken(token))
    }
}
