//! Authorization middleware
//!
//! Identifies the caller, decides the request and either forwards it with the
//! [`ClassifiedRequest`] and [`Identity`] in its extensions or answers with a
//! JSON error.

use crate::access_control::{Authorizer, Identity};
use crate::auth::SharedIdentityProvider;
use crate::error::{AuthError, AuthzError};
use axum::{
    Json,
    extract::{Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error};

/// Shared state of the authorization middleware
#[derive(Clone)]
pub struct AuthzState {
    pub authorizer: Arc<Authorizer>,
    pub identity: SharedIdentityProvider,
}

impl AuthzState {
    pub fn new(authorizer: Arc<Authorizer>, identity: SharedIdentityProvider) -> Self {
        Self {
            authorizer,
            identity,
        }
    }
}

/// Error body returned by the middleware
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub reason: String,
}

/// Why a request was turned away
#[derive(Debug)]
pub enum Rejection {
    Auth(AuthError),
    Authz(AuthzError),
}

impl From<AuthError> for Rejection {
    fn from(err: AuthError) -> Self {
        Rejection::Auth(err)
    }
}

impl From<AuthzError> for Rejection {
    fn from(err: AuthzError) -> Self {
        Rejection::Authz(err)
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        let (status, error, reason) = match self {
            Rejection::Auth(err) => (
                StatusCode::UNAUTHORIZED,
                "identity_unresolved",
                err.to_string(),
            ),
            Rejection::Authz(err) => {
                let status = match &err {
                    AuthzError::MalformedRequest(_) => StatusCode::BAD_REQUEST,
                    AuthzError::IdentityUnresolved { .. } => StatusCode::UNAUTHORIZED,
                    AuthzError::PolicyDenied { .. } => StatusCode::FORBIDDEN,
                    AuthzError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
                };
                let reason = match &err {
                    AuthzError::MalformedRequest(inner) => inner.to_string(),
                    AuthzError::IdentityUnresolved { reason }
                    | AuthzError::PolicyDenied { reason, .. } => reason.clone(),
                    AuthzError::StoreUnavailable(inner) => inner.to_string(),
                };
                (status, err.kind(), reason)
            }
        };

        let body = Json(ErrorBody { error, reason });
        if status == StatusCode::UNAUTHORIZED {
            (status, [(header::WWW_AUTHENTICATE, "Bearer")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// Authorization middleware for use with `axum::middleware::from_fn_with_state`
pub async fn authz_middleware(
    State(state): State<AuthzState>,
    request: Request,
    next: Next,
) -> Result<Response, Rejection> {
    // The body is not Sync, so only the parts are borrowed across awaits
    let (mut parts, body) = request.into_parts();

    let identity = state
        .identity
        .authenticate(&parts.headers)
        .await
        .inspect_err(|e| debug!(error = %e, "Authentication failed"))?;

    let classified = state
        .authorizer
        .require(parts.method.as_str(), parts.uri.path(), &identity)
        .await
        .inspect_err(|e| {
            if e.is_retryable() {
                error!(method = %parts.method, path = %parts.uri.path(), error = %e, "Authorization could not be evaluated");
            }
        })?;

    parts.extensions.insert(classified);
    parts.extensions.insert::<Identity>(identity);
    Ok(next.run(Request::from_parts(parts, body)).await)
}
