//! Bearer token identity
//!
//! Maps static bearer tokens from configuration to user ids.

use crate::access_control::Identity;
use crate::auth::provider::IdentityProvider;
use crate::error::AuthError;
use crate::model::UserId;
use crate::util::SecretString;
use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use std::collections::HashMap;
use tracing::trace;

const BEARER_PREFIX: &str = "Bearer ";

/// Static bearer token identity provider
#[derive(Debug, Clone)]
pub struct TokenIdentityProvider {
    tokens: Vec<(UserId, SecretString)>,
}

impl TokenIdentityProvider {
    /// Create from a user id → token map
    pub fn new(tokens: &HashMap<String, SecretString>) -> Result<Self, AuthError> {
        if let Some((user, _)) = tokens.iter().find(|(_, token)| token.is_empty()) {
            return Err(AuthError::Failed(format!("empty token configured for '{user}'")));
        }

        let mut tokens: Vec<_> = tokens
            .iter()
            .map(|(user, token)| (UserId::new(user.as_str()), token.clone()))
            .collect();
        tokens.sort_by(|a, b| a.0.cmp(&b.0));
        Ok(Self { tokens })
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    fn lookup(&self, presented: &str) -> Option<&UserId> {
        // Compare against every token so timing does not reveal the position
        let mut found = None;
        for (user, token) in &self.tokens {
            if token.matches(presented) && found.is_none() {
                found = Some(user);
            }
        }
        found
    }
}

#[async_trait]
impl IdentityProvider for TokenIdentityProvider {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let Some(value) = headers.get(header::AUTHORIZATION) else {
            return Ok(Identity::Anonymous);
        };

        let token = value
            .to_str()
            .ok()
            .and_then(|v| v.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::InvalidToken)?;

        let user = self.lookup(token).ok_or(AuthError::UnknownCredentials)?;
        trace!(user = %user, "Bearer token accepted");
        Ok(Identity::User(user.clone()))
    }

    fn mechanism(&self) -> &'static str {
        "bearer token"
    }
}
