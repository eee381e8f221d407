//! Authentication module
//!
//! Establishes the caller's identity before authorization. Supports static
//! bearer tokens and a trusted header set by an authenticating proxy.

pub mod header;
pub mod provider;
pub mod token;

pub use header::HeaderIdentityProvider;
pub use provider::{IdentityProvider, SharedIdentityProvider};
pub use token::TokenIdentityProvider;

use crate::config::{IdentityConfig, IdentityMode};
use crate::error::AuthError;
use std::sync::Arc;
use tracing::warn;

/// Create an identity provider from configuration
pub fn create_identity_provider(
    config: &IdentityConfig,
) -> Result<SharedIdentityProvider, AuthError> {
    match config.mode {
        IdentityMode::Token => {
            let provider = TokenIdentityProvider::new(&config.tokens)?;
            if provider.is_empty() {
                warn!("No bearer tokens configured, every caller will be anonymous");
            }
            Ok(Arc::new(provider))
        }
        IdentityMode::Header => Ok(Arc::new(HeaderIdentityProvider::new(&config.header)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_token_provider() {
        let provider = create_identity_provider(&IdentityConfig::default()).unwrap();
        assert_eq!(provider.mechanism(), "bearer token");
    }

    #[test]
    fn test_create_header_provider() {
        let config = IdentityConfig {
            mode: IdentityMode::Header,
            ..Default::default()
        };
        let provider = create_identity_provider(&config).unwrap();
        assert_eq!(provider.mechanism(), "trusted header");
    }
}
