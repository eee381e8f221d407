//! Authorizer
//!
//! Classify, resolve, decide. Non-resource requests are allowed without
//! consulting the store; resource requests are decided against the effective
//! rules of the caller for the request's namespace.

use crate::access_control::engine;
use crate::access_control::resolver::RoleResolver;
use crate::access_control::types::{Decision, Identity, NON_RESOURCE_REQUEST};
use crate::error::{AuthzError, AuthzResult};
use crate::request::{ClassifiedRequest, RequestClassifier};
use tracing::{debug, info};

/// A decided request
#[derive(Debug, Clone)]
pub struct Authorization {
    pub identity: Identity,
    pub request: ClassifiedRequest,
    pub decision: Decision,
}

impl Authorization {
    pub fn is_allowed(&self) -> bool {
        self.decision.allowed
    }

    /// Turn a deny into the matching error.
    ///
    /// An anonymous caller without a grant is reported as unidentified, so
    /// the caller can be asked to authenticate.
    pub fn into_result(self) -> AuthzResult<ClassifiedRequest> {
        if self.decision.allowed {
            return Ok(self.request);
        }
        match self.identity {
            Identity::Anonymous => Err(AuthzError::IdentityUnresolved {
                reason: self.decision.reason,
            }),
            Identity::User(_) => Err(AuthzError::PolicyDenied {
                verb: self.request.verb.to_string(),
                resource: self.request.resource_path(),
                reason: self.decision.reason,
            }),
        }
    }
}

/// Entry point of the authorization core
#[derive(Debug, Clone)]
pub struct Authorizer {
    classifier: RequestClassifier,
    resolver: RoleResolver,
}

impl Authorizer {
    pub fn new(classifier: RequestClassifier, resolver: RoleResolver) -> Self {
        Self {
            classifier,
            resolver,
        }
    }

    pub fn classifier(&self) -> &RequestClassifier {
        &self.classifier
    }

    pub fn resolver(&self) -> &RoleResolver {
        &self.resolver
    }

    /// Decide a raw request.
    ///
    /// Errors only when no decision could be made (malformed request or an
    /// unavailable store); a deny is a successful [`Authorization`].
    pub async fn authorize(
        &self,
        method: &str,
        path: &str,
        identity: &Identity,
    ) -> AuthzResult<Authorization> {
        let request = self.classifier.classify(method, path)?;
        self.authorize_classified(request, identity).await
    }

    /// Decide an already classified request
    pub async fn authorize_classified(
        &self,
        request: ClassifiedRequest,
        identity: &Identity,
    ) -> AuthzResult<Authorization> {
        if !request.is_resource_request {
            debug!(path = %request.path, "Non-resource request, skipping policy evaluation");
            return Ok(Authorization {
                identity: identity.clone(),
                request,
                decision: Decision::allow(NON_RESOURCE_REQUEST),
            });
        }

        let effective = self
            .resolver
            .effective_rules(identity, &request.namespace)
            .await?;
        let decision = engine::authorize(&effective, &request);

        if decision.allowed {
            debug!(
                principal = %identity,
                verb = %request.verb,
                resource = %request.resource_path(),
                reason = %decision.reason,
                "Request allowed"
            );
        } else {
            info!(
                principal = %identity,
                verb = %request.verb,
                resource = %request.resource_path(),
                reason = %decision.reason,
                "Request denied"
            );
        }

        Ok(Authorization {
            identity: identity.clone(),
            request,
            decision,
        })
    }

    /// Decide and require an allow, returning the classified request
    pub async fn require(
        &self,
        method: &str,
        path: &str,
        identity: &Identity,
    ) -> AuthzResult<ClassifiedRequest> {
        self.authorize(method, path, identity).await?.into_result()
    }
}
