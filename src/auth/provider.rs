//! Identity provider trait
//!
//! Establishes who is calling from the request headers. Authentication
//! happens before authorization: a provider either yields an [`Identity`]
//! (possibly anonymous) or rejects the credentials outright.

use crate::access_control::Identity;
use crate::error::AuthError;
// async_trait required for dyn-compatibility with Arc<dyn IdentityProvider>
use async_trait::async_trait;
use axum::http::HeaderMap;
use std::sync::Arc;

/// Identity provider trait
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Identify the caller.
    ///
    /// Returns [`Identity::Anonymous`] when no credentials were presented and
    /// an error when credentials were presented but are not acceptable.
    async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError>;

    /// Short name of the mechanism (for logging)
    fn mechanism(&self) -> &'static str;
}

/// Shared identity provider handle
pub type SharedIdentityProvider = Arc<dyn IdentityProvider>;
