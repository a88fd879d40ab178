//! Signed bearer token codec
//!
//! Produces and verifies the compact HS256 credential a client presents on
//! every request. The claims are deliberately minimal: a user id, a random
//! token id, issued-at and expiry. Profile data never rides in the signed
//! payload; the request authorizer reloads the live user row instead of
//! trusting stale claims.
//!
//! Verification fails closed: a malformed token, a bad signature, and an
//! expired token all come back as errors, never as a panic into caller
//! logic. Revocation is not intrinsic to the token; it is delegated to the
//! session ledger.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    error::{CryptoError, SessionError},
    session::SessionToken,
    user::UserId,
};

/// Minimum length, in bytes, for the signing secret.
pub const MIN_SECRET_LEN: usize = 32;

/// Default bearer token lifetime.
pub const STANDARD_LIFETIME: Duration = Duration::days(7);

/// Bearer token lifetime when the client asked to be remembered.
pub const EXTENDED_LIFETIME: Duration = Duration::days(30);

/// JWT claims for bearer tokens.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject - user ID
    pub sub: String,
    /// Issued at in seconds (as UTC timestamp)
    pub iat: i64,
    /// Expiration time in seconds (as UTC timestamp)
    pub exp: i64,
    /// Random token ID. `iat` has second granularity, so without this two
    /// tokens signed back-to-back for the same user would be byte-identical
    /// and session rotation would replace a token with itself.
    pub jti: String,
    /// Issuer
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
}

impl TokenClaims {
    pub fn user_id(&self) -> UserId {
        UserId::new(&self.sub)
    }

    pub fn expires_at(&self) -> DateTime<Utc> {
        DateTime::from_timestamp(self.exp, 0).unwrap_or_else(Utc::now)
    }
}

/// Signs and verifies bearer tokens with a server-held HS256 secret.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: Option<String>,
    standard_lifetime: Duration,
    extended_lifetime: Duration,
}

impl TokenCodec {
    /// Create a codec from a signing secret.
    ///
    /// Secrets shorter than [`MIN_SECRET_LEN`] bytes are rejected; callers
    /// treat that as a fatal startup condition, not a per-request error.
    pub fn new(secret: &[u8]) -> Result<Self, Error> {
        if secret.len() < MIN_SECRET_LEN {
            return Err(Error::Config(format!(
                "Signing secret must be at least {MIN_SECRET_LEN} bytes"
            )));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer: None,
            standard_lifetime: STANDARD_LIFETIME,
            extended_lifetime: EXTENDED_LIFETIME,
        })
    }

    /// Set the issuer claim.
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    /// Override the standard and extended lifetimes.
    pub fn with_lifetimes(mut self, standard: Duration, extended: Duration) -> Self {
        self.standard_lifetime = standard;
        self.extended_lifetime = extended;
        self
    }

    /// The lifetime a token signed now would get.
    pub fn lifetime(&self, extended: bool) -> Duration {
        if extended {
            self.extended_lifetime
        } else {
            self.standard_lifetime
        }
    }

    /// Sign a new bearer token for a user.
    ///
    /// Returns the token together with its expiry so callers can create the
    /// matching session ledger row and cookie max-age without re-decoding.
    pub fn sign(
        &self,
        user_id: &UserId,
        extended: bool,
    ) -> Result<(SessionToken, DateTime<Utc>), Error> {
        let now = Utc::now();
        let expires_at = now + self.lifetime(extended);

        let claims = TokenClaims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            jti: crate::crypto::generate_secure_token(),
            iss: self.issuer.clone(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| CryptoError::JwtSigning(e.to_string()))?;

        Ok((SessionToken::new(&token), expires_at))
    }

    /// Verify a bearer token and return its claims.
    pub fn verify(&self, token: &SessionToken) -> Result<TokenClaims, Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = &self.issuer {
            validation.set_issuer(&[issuer]);
        }

        let token_data = decode::<TokenClaims>(token.as_str(), &self.decoding_key, &validation)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
                    Error::Session(SessionError::Expired)
                }
                _ => Error::Session(SessionError::InvalidToken(format!(
                    "JWT validation failed: {e}"
                ))),
            })?;

        Ok(token_data.claims)
    }
}
