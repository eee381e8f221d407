//! Trusted header identity
//!
//! For deployments behind an authenticating proxy that forwards the user id
//! in a request header.

use crate::access_control::Identity;
use crate::auth::provider::IdentityProvider;
use crate::error::AuthError;
use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName};

/// Identity taken verbatim from a trusted header
#[derive(Debug, Clone)]
pub struct HeaderIdentityProvider {
    header: HeaderName,
}

impl HeaderIdentityProvider {
    pub fn new(header: &str) -> Result<Self, AuthError> {
        let header = HeaderName::try_from(header)
            .map_err(|e| AuthError::Failed(format!("invalid identity header '{header}': {e}")))?;
        Ok(Self { header })
    }

    pub fn header(&self) -> &HeaderName {
        &self.header
    }
}

#[async_trait]
impl IdentityProvider for HeaderIdentityProvider {
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let Some(value) = headers.get(&self.header) else {
            return Ok(Identity::Anonymous);
        };
        let user = value
            .to_str()
            .map_err(|_| AuthError::Failed(format!("{} is not valid UTF-8", self.header)))?
            .trim();
        if user.is_empty() {
            return Err(AuthError::InvalidToken);
        }
        Ok(Identity::user(user))
    }

    fn mechanism(&self) -> &'static str {
        "trusted header"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[tokio::test]
    async fn test_header_identity() {
        let provider = HeaderIdentityProvider::new("X-Remote-User").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-remote-user", HeaderValue::from_static(" alice "));
        let identity = provider.authenticate(&headers).await.unwrap();
        assert_eq!(identity, Identity::user("alice"));
    }

    #[tokio::test]
    async fn test_absent_header_is_anonymous() {
        let provider = HeaderIdentityProvider::new("x-remote-user").unwrap();
        let identity = provider.authenticate(&HeaderMap::new()).await.unwrap();
        assert_eq!(identity, Identity::Anonymous);
    }

    #[tokio::test]
    async fn test_blank_header_rejected() {
        let provider = HeaderIdentityProvider::new("x-remote-user").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("x-remote-user", HeaderValue::from_static(""));
        assert!(provider.authenticate(&headers).await.is_err());
    }

    #[test]
    fn test_invalid_header_name() {
        assert!(HeaderIdentityProvider::new("not a header").is_err());
    }
}
