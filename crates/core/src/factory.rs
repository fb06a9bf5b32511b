// Per-request registry client construction

use crate::auth::{resolve_auth, EnvCredentials};
use crate::client::{ImageRegistry, RegistryClient};
use http::HeaderMap;
use std::sync::Arc;

/// Builds a registry client for one inbound request.
pub trait ClientFactory: Send + Sync {
    fn client(&self, headers: &HeaderMap) -> Arc<dyn ImageRegistry>;
}

impl<F> ClientFactory for F
where
    F: Fn(&HeaderMap) -> Arc<dyn ImageRegistry> + Send + Sync,
{
    fn client(&self, headers: &HeaderMap) -> Arc<dyn ImageRegistry> {
        self(headers)
    }
}

/// Resolves credentials from the request headers and the live process
/// environment, then builds a fresh [`RegistryClient`].
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvClientFactory;

impl EnvClientFactory {
    pub fn new() -> Self {
        Self
    }

    /// The client a request with `headers` would get, given `env`.
    pub fn build(headers: &HeaderMap, env: &EnvCredentials) -> RegistryClient {
        RegistryClient::new(resolve_auth(headers, env))
    }
}

impl ClientFactory for EnvClientFactory {
    fn client(&self, headers: &HeaderMap) -> Arc<dyn ImageRegistry> {
        Arc::new(Self::build(headers, &EnvCredentials::from_env()))
    }
}

/// Hands every request the same client, ignoring headers.
#[derive(Clone)]
pub struct FixedClient(Arc<dyn ImageRegistry>);

impl FixedClient {
    pub fn new(client: Arc<dyn ImageRegistry>) -> Self {
        Self(client)
    }
}

impl ClientFactory for FixedClient {
    fn client(&self, _headers: &HeaderMap) -> Arc<dyn ImageRegistry> {
        self.0.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::AuthStrategy;
    use http::header::AUTHORIZATION;
    use http::HeaderValue;

    #[test]
    fn test_build_uses_header_token() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        let env = EnvCredentials {
            token: Some("env-token".to_string()),
            ..Default::default()
        };

        let client = EnvClientFactory::build(&headers, &env);
        assert_eq!(client.auth(), &AuthStrategy::Bearer("abc".to_string()));
    }

    #[test]
    fn test_build_is_fresh_per_request() {
        let env = EnvCredentials {
            username: Some("user".to_string()),
            password: Some("pass".to_string()),
            ..Default::default()
        };

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer first"));
        let first = EnvClientFactory::build(&headers, &env);
        let second = EnvClientFactory::build(&HeaderMap::new(), &env);

        assert_eq!(first.auth().kind(), "bearer");
        assert_eq!(second.auth().kind(), "basic");
    }

    #[test]
    fn test_fixed_client_ignores_headers() {
        let shared: Arc<dyn ImageRegistry> =
            Arc::new(RegistryClient::new(AuthStrategy::DefaultKeychain));
        let factory = FixedClient::new(shared.clone());

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer abc"));
        assert!(Arc::ptr_eq(&factory.client(&headers), &shared));
    }
}
