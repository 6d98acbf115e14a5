//! Seam to the external identity provider.

use async_trait::async_trait;
use axum::http::{header, HeaderMap};
use thiserror::Error;

use crate::{
    types::UserId,
    utils::{
        cookies::{cookie_from_headers, ACCESS_COOKIE_NAME},
        jwt::verify_access_token,
    },
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub id: UserId,
    pub email: Option<String>,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("invalid access token")]
    InvalidToken,
    #[error("identity provider unavailable: {0}")]
    Unavailable(String),
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// `Ok(None)` when the request carries no credentials at all.
    async fn current_user(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<AuthenticatedUser>, IdentityError>;

    /// Ends the provider-side session for the request's credentials.
    async fn sign_out(&self, headers: &HeaderMap) -> Result<(), IdentityError>;
}

/// Verifies HS256 access tokens issued by the identity provider, read from a
/// bearer header or the `access_token` cookie.
#[derive(Clone)]
pub struct JwtIdentityProvider {
    secret: String,
}

impl JwtIdentityProvider {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentityProvider {
    async fn current_user(
        &self,
        headers: &HeaderMap,
    ) -> Result<Option<AuthenticatedUser>, IdentityError> {
        let Some(token) = access_token_from_headers(headers) else {
            return Ok(None);
        };
        let claims = verify_access_token(&token, &self.secret).map_err(|err| {
            tracing::debug!(error = %err, "Rejected access token");
            IdentityError::InvalidToken
        })?;
        let id = claims
            .sub
            .parse::<UserId>()
            .map_err(|_| IdentityError::InvalidToken)?;
        Ok(Some(AuthenticatedUser {
            id,
            email: claims.email,
        }))
    }

    async fn sign_out(&self, _headers: &HeaderMap) -> Result<(), IdentityError> {
        // Stateless tokens: clearing the cookie is all there is to do.
        Ok(())
    }
}

pub fn access_token_from_headers(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(parse_bearer_token)
        .map(str::to_string)
        .or_else(|| cookie_from_headers(headers, ACCESS_COOKIE_NAME))
}

fn parse_bearer_token(header: &str) -> Option<&str> {
    let (scheme, rest) = header.split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = rest.trim();
    (!token.is_empty()).then_some(token)
}
