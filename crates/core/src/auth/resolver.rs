//! Request-scoped credential resolution
//!
//! Picks exactly one authentication strategy per inbound request. Precedence,
//! first match wins:
//!
//! 1. `Authorization: Bearer <token>` on the inbound request
//! 2. `OCI_TOKEN`
//! 3. `OCI_USERNAME` + `OCI_PASSWORD`
//! 4. the default credential store (Docker `config.json`)

use http::header::AUTHORIZATION;
use http::HeaderMap;
use std::fmt;

/// Environment variable holding a registry bearer token.
pub const TOKEN_ENV: &str = "OCI_TOKEN";
/// Environment variable holding a registry username.
pub const USERNAME_ENV: &str = "OCI_USERNAME";
/// Environment variable holding a registry password.
pub const PASSWORD_ENV: &str = "OCI_PASSWORD";

const BEARER_PREFIX: &str = "Bearer ";

/// Authentication strategy for outbound registry calls.
#[derive(Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Bearer token sent as-is to the registry.
    Bearer(String),
    /// Username/password pair.
    Basic { username: String, password: String },
    /// Look the registry up in the local credential store at call time.
    DefaultKeychain,
}

impl AuthStrategy {
    /// Name of the strategy, safe to log.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Bearer(_) => "bearer",
            Self::Basic { .. } => "basic",
            Self::DefaultKeychain => "default_keychain",
        }
    }
}

// Secrets stay out of Debug output.
impl fmt::Debug for AuthStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bearer(_) => f.write_str("Bearer(<redacted>)"),
            Self::Basic { username, .. } => f
                .debug_struct("Basic")
                .field("username", username)
                .field("password", &"<redacted>")
                .finish(),
            Self::DefaultKeychain => f.write_str("DefaultKeychain"),
        }
    }
}

/// Credential values captured from the process environment.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct EnvCredentials {
    pub token: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl EnvCredentials {
    /// Read `OCI_TOKEN`, `OCI_USERNAME` and `OCI_PASSWORD`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable lookup. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.is_empty());
        Self {
            token: non_empty(TOKEN_ENV),
            username: non_empty(USERNAME_ENV),
            password: non_empty(PASSWORD_ENV),
        }
    }
}

impl fmt::Debug for EnvCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnvCredentials")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Resolve the authentication strategy for one request.
///
/// Never fails: with no credentials anywhere the default credential store is
/// used and any authentication failure is left to the registry call.
pub fn resolve_auth(headers: &HeaderMap, env: &EnvCredentials) -> AuthStrategy {
    if let Some(token) = bearer_from_headers(headers) {
        tracing::info!(
            strategy = "bearer",
            source = "authorization_header",
            "Using bearer token from Authorization header for OCI registry"
        );
        return AuthStrategy::Bearer(token);
    }

    if let Some(token) = env.token.as_deref().filter(|t| !t.is_empty()) {
        tracing::info!(
            strategy = "bearer",
            source = TOKEN_ENV,
            "Using bearer token from {} environment variable for OCI registry",
            TOKEN_ENV
        );
        return AuthStrategy::Bearer(token.to_string());
    }

    if let (Some(username), Some(password)) = (
        env.username.as_deref().filter(|u| !u.is_empty()),
        env.password.as_deref().filter(|p| !p.is_empty()),
    ) {
        tracing::info!(
            strategy = "basic",
            source = "environment",
            "Using username/password authentication for OCI registry"
        );
        return AuthStrategy::Basic {
            username: username.to_string(),
            password: password.to_string(),
        };
    }

    tracing::info!(
        strategy = "default_keychain",
        "Using default keychain for OCI registry authentication"
    );
    AuthStrategy::DefaultKeychain
}

fn bearer_from_headers(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    value.strip_prefix(BEARER_PREFIX).map(str::to_string)
}
