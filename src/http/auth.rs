use crate::http::AppState;
use crate::http::handler::ApiError;
use crate::models::Identity;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::{HeaderMap, request::Parts};
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;
use thiserror::Error;

/// Claims carried by the bearer tokens this service accepts.
///
/// `sub` is the author id as a decimal string.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: u64,
}

impl Claims {
    pub fn new(author_id: i64, exp: u64) -> Self {
        Self {
            sub: author_id.to_string(),
            exp,
        }
    }
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error(transparent)]
    Invalid(#[from] jsonwebtoken::errors::Error),
    #[error(r#"Token subject "{0}" is not an author id"#)]
    Subject(String),
}

/// Verifies HS256 bearer tokens and yields the author id they were issued to.
#[derive(Clone)]
pub struct TokenDecoder {
    key: DecodingKey,
    validation: Validation,
}

impl TokenDecoder {
    pub fn new(secret: &str) -> Self {
        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    pub fn decode(&self, token: &str) -> Result<i64, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.key, &self.validation)?;
        let sub = data.claims.sub;
        sub.parse().map_err(|_| TokenError::Subject(sub))
    }
}

/// A boolean rule over permission names.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionRule {
    All(&'static [&'static str]),
    Any(&'static [&'static str]),
}

impl PermissionRule {
    pub fn is_satisfied_by(&self, identity: &Identity) -> bool {
        match self {
            Self::All(names) => names.iter().all(|name| identity.has_permission(name)),
            Self::Any(names) => names.iter().any(|name| identity.has_permission(name)),
        }
    }
}

/// Names the permission rule guarding a route.
pub trait Requirement: Send + Sync + 'static {
    const RULE: PermissionRule;
}

pub struct CreateUsers;

impl Requirement for CreateUsers {
    const RULE: PermissionRule = PermissionRule::All(&["create_users"]);
}

pub struct DeleteUsers;

impl Requirement for DeleteUsers {
    const RULE: PermissionRule = PermissionRule::All(&["delete_users"]);
}

pub struct UpdateUsers;

impl Requirement for UpdateUsers {
    const RULE: PermissionRule = PermissionRule::Any(&["update_users", "update_private_users"]);
}

/// Extracts the caller's identity and rejects the request unless it satisfies
/// `R::RULE`.
///
/// Place it before any body extractor so unauthorized requests are turned
/// away before their body is read.
#[derive(Debug)]
pub struct Authorized<R> {
    identity: Identity,
    _requirement: PhantomData<R>,
}

impl<R> Authorized<R> {
    pub const fn identity(&self) -> &Identity {
        &self.identity
    }
}

impl<R: Requirement> FromRequestParts<AppState> for Authorized<R> {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(&parts.headers)
            .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

        let author_id = state.tokens().decode(token).map_err(|err| {
            tracing::debug!(error = %err, "rejected bearer token");
            ApiError::Unauthorized("Invalid bearer token".to_string())
        })?;

        let identity = state
            .within(state.authors().find_identity(author_id))
            .await?;

        if !R::RULE.is_satisfied_by(&identity) {
            tracing::info!(
                author_id,
                rule = ?R::RULE,
                path = %parts.uri.path(),
                "permission denied"
            );
            return Err(ApiError::Forbidden("Permission denied".to_string()));
        }

        Ok(Self {
            identity,
            _requirement: PhantomData,
        })
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}
