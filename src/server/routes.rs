//! HTTP routes
//!
//! Everything behind the authorization middleware. `/healthz` is outside the
//! API prefixes, so it is always allowed; any other path answers with what
//! the authorizer made of it.

use crate::access_control::Identity;
use crate::request::ClassifiedRequest;
use crate::server::middleware::{AuthzState, authz_middleware};
use axum::{Extension, Json, Router, middleware, routing::get};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Response of the catch-all route
#[derive(Debug, Serialize)]
pub struct Admitted {
    pub identity: Identity,
    pub request: ClassifiedRequest,
}

/// Build the router with the authorization middleware applied to every route
pub fn build_router(state: AuthzState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .fallback(admitted)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(middleware::from_fn_with_state(state, authz_middleware)),
        )
}

async fn healthz() -> &'static str {
    "ok"
}

async fn admitted(
    Extension(identity): Extension<Identity>,
    Extension(request): Extension<ClassifiedRequest>,
) -> Json<Admitted> {
    Json(Admitted { identity, request })
}
