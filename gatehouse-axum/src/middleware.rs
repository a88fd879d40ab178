use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use gatehouse::{AuthDecision, Gatehouse, User};
use gatehouse_core::repositories::RepositoryProvider;

use crate::{error::ApiError, extractors::BearerOrCookieToken};

pub struct AuthState<R: RepositoryProvider> {
    pub gatehouse: Arc<Gatehouse<R>>,
}

impl<R: RepositoryProvider> Clone for AuthState<R> {
    fn clone(&self) -> Self {
        Self {
            gatehouse: self.gatehouse.clone(),
        }
    }
}

/// Authorize the request if possible, without requiring it.
///
/// Inserts the user into request extensions when the token checks out, and
/// passes through otherwise. Handlers that need authentication use the
/// `AuthUser` extractor, which rejects when no user was injected.
pub async fn auth_middleware<R>(
    State(state): State<AuthState<R>>,
    token: BearerOrCookieToken,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    R: RepositoryProvider,
{
    if let BearerOrCookieToken(Some(token)) = token {
        match state.gatehouse.authorize(&token).await? {
            AuthDecision::Authenticated(user) => {
                request.extensions_mut().insert::<User>(user);
            }
            decision => {
                // Reason stays server-side; the client sees nothing unless a
                // handler requires auth, and then only a generic 401
                tracing::debug!(?decision, "Request token did not authorize");
            }
        }
    }

    Ok(next.run(request).await)
}

/// Reject the request unless it authenticates.
///
/// Every non-authenticated outcome maps to the same generic 401; the
/// specific reason is logged, never returned.
pub async fn require_auth<R>(
    State(state): State<AuthState<R>>,
    token: BearerOrCookieToken,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    R: RepositoryProvider,
{
    let BearerOrCookieToken(Some(token)) = token else {
        return Err(ApiError::Unauthorized);
    };

    match state.gatehouse.authorize(&token).await? {
        AuthDecision::Authenticated(user) => {
            request.extensions_mut().insert::<User>(user);
            Ok(next.run(request).await)
        }
        decision => {
            tracing::debug!(?decision, "Rejecting unauthenticated request");
            Err(ApiError::Unauthorized)
        }
    }
}

/// Reject the request unless it authenticates as an admin.
///
/// A valid non-admin gets 403; everything else gets the same 401 as
/// [`require_auth`].
pub async fn require_admin<R>(
    State(state): State<AuthState<R>>,
    token: BearerOrCookieToken,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError>
where
    R: RepositoryProvider,
{
    let BearerOrCookieToken(Some(token)) = token else {
        return Err(ApiError::Unauthorized);
    };

    match state.gatehouse.authorize(&token).await? {
        AuthDecision::Authenticated(user) if user.is_admin => {
            request.extensions_mut().insert::<User>(user);
            Ok(next.run(request).await)
        }
        AuthDecision::Authenticated(_) => Err(ApiError::Forbidden),
        decision => {
            tracing::debug!(?decision, "Rejecting unauthenticated admin request");
            Err(ApiError::Unauthorized)
        }
    }
}
