//! Error types for rbac-gate
//!
//! This module defines the error hierarchy used throughout the crate.
//! We use `thiserror` for library-style errors that are part of the API,
//! and convert to HTTP responses only at the middleware boundary.

use thiserror::Error;

/// Top-level application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Policy store error: {0}")]
    Store(#[from] StoreError),

    #[error("Authorization error: {0}")]
    Authz(#[from] AuthzError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(String),

    #[error("Invalid configuration: {message}")]
    Invalid { message: String },

    #[error("Missing required configuration: {field}")]
    Missing { field: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request classification errors
///
/// Every variant means "request malformed", never "request unauthorized".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ClassifyError {
    #[error("unsupported HTTP method '{method}' for resource path '{path}'")]
    UnsupportedMethod { method: String, path: String },

    #[error("path segment '{segment}' is not valid percent-encoded UTF-8")]
    InvalidSegment { segment: String },
}

/// Errors decoding a persisted rule list
#[derive(Error, Debug)]
pub enum RulesError {
    #[error("unsupported rules schema version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("malformed rules document: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// Policy model validation errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ModelError {
    #[error("{kind} name must not be empty")]
    EmptyName { kind: &'static str },

    #[error("namespace-scoped role '{role}' requires a namespace")]
    MissingNamespace { role: String },

    #[error("invalid namespace '{namespace}': must be a lowercase DNS label")]
    InvalidNamespace { namespace: String },

    #[error("system group '{name}' cannot be modified this way")]
    SystemGroup { name: String },
}

/// Policy store errors
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    #[error("{kind} '{name}' already exists")]
    AlreadyExists { kind: &'static str, name: String },

    #[error("policy store unavailable: {0}")]
    Unavailable(String),

    #[error("policy store lookup timed out after {timeout_ms} ms")]
    Timeout { timeout_ms: u64 },

    #[error("invalid policy data: {0}")]
    Invalid(#[from] ModelError),

    #[error("invalid rules: {0}")]
    Rules(#[from] RulesError),

    #[error("failed to read policy snapshot: {0}")]
    Snapshot(String),
}

impl StoreError {
    pub fn not_found(kind: &'static str, name: impl Into<String>) -> Self {
        Self::NotFound {
            kind,
            name: name.into(),
        }
    }

    pub fn already_exists(kind: &'static str, name: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            name: name.into(),
        }
    }
}

/// Authorization pipeline errors
///
/// `MalformedRequest` and `StoreUnavailable` mean policy could not be
/// evaluated; `PolicyDenied` and `IdentityUnresolved` are definitive answers.
#[derive(Error, Debug)]
pub enum AuthzError {
    #[error("malformed request: {0}")]
    MalformedRequest(#[from] ClassifyError),

    #[error("identity unresolved: {reason}")]
    IdentityUnresolved { reason: String },

    #[error("policy store unavailable: {0}")]
    StoreUnavailable(#[source] StoreError),

    #[error("access denied for {verb} on '{resource}': {reason}")]
    PolicyDenied {
        verb: String,
        resource: String,
        reason: String,
    },
}

impl AuthzError {
    /// Short machine-readable kind, used in logs and response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            AuthzError::MalformedRequest(_) => "malformed_request",
            AuthzError::IdentityUnresolved { .. } => "identity_unresolved",
            AuthzError::StoreUnavailable(_) => "store_unavailable",
            AuthzError::PolicyDenied { .. } => "policy_denied",
        }
    }

    /// Whether a caller may reasonably retry the same request later
    pub fn is_retryable(&self) -> bool {
        matches!(self, AuthzError::StoreUnavailable(_))
    }
}

impl From<StoreError> for AuthzError {
    fn from(err: StoreError) -> Self {
        AuthzError::StoreUnavailable(err)
    }
}

/// Authentication errors
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Invalid token format")]
    InvalidToken,

    #[error("Unknown credentials")]
    UnknownCredentials,

    #[error("Authentication failed: {0}")]
    Failed(String),
}

/// Result type alias for the application
pub type Result<T> = std::result::Result<T, AppError>;

/// Result type alias for policy store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Result type alias for authorization operations
pub type AuthzResult<T> = std::result::Result<T, AuthzError>;
