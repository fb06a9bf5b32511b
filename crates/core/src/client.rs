//! Registry client adapter
//!
//! [`RegistryClient`] wraps `oci_client::Client` behind the [`ImageRegistry`]
//! trait. Every operation parses its input, then runs one registry unit of
//! work bounded by the client's timeout.

use crate::auth::AuthStrategy;
use crate::error::{RegistryError, Result};
use oci_client::client::ClientConfig;
use oci_client::errors::OciDistributionError;
use oci_client::manifest::OciImageManifest;
use oci_client::{Client, Reference};
use serde::de::DeserializeOwned;
use std::fmt;
use std::future::Future;
use std::time::Duration;

/// Timeout applied to each registry call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Read-only access to an OCI registry.
#[async_trait::async_trait]
pub trait ImageRegistry: Send + Sync {
    /// Fetch an image's manifest and config blob.
    async fn get_image(&self, image_ref: &str) -> Result<ImageHandle>;

    /// Fetch an image's manifest.
    async fn get_manifest(&self, image_ref: &str) -> Result<OciImageManifest> {
        Ok(self.get_image(image_ref).await?.into_manifest())
    }

    /// Fetch an image's config as untyped JSON.
    async fn get_config(&self, image_ref: &str) -> Result<serde_json::Value> {
        self.get_image(image_ref).await?.config()
    }

    /// List all tags of a repository, in registry order.
    async fn list_tags(&self, repository: &str) -> Result<Vec<String>>;
}

/// A fetched image: manifest, manifest digest and the raw config blob.
///
/// The config is decoded on demand so that a malformed blob is reported as
/// [`RegistryError::Config`] rather than a fetch failure.
#[derive(Debug, Clone)]
pub struct ImageHandle {
    reference: String,
    manifest: OciImageManifest,
    digest: String,
    raw_config: String,
}

impl ImageHandle {
    pub fn new(
        reference: impl Into<String>,
        manifest: OciImageManifest,
        digest: impl Into<String>,
        raw_config: impl Into<String>,
    ) -> Self {
        Self {
            reference: reference.into(),
            manifest,
            digest: digest.into(),
            raw_config: raw_config.into(),
        }
    }

    /// The reference the image was fetched by.
    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn manifest(&self) -> &OciImageManifest {
        &self.manifest
    }

    pub fn into_manifest(self) -> OciImageManifest {
        self.manifest
    }

    /// Digest of the manifest itself.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Decode the config blob as JSON, keeping every field.
    pub fn config(&self) -> Result<serde_json::Value> {
        self.config_as()
    }

    /// Decode the config blob into a typed view.
    pub fn config_as<T: DeserializeOwned>(&self) -> Result<T> {
        serde_json::from_str(&self.raw_config).map_err(|e| RegistryError::Config(e.to_string()))
    }
}

/// OCI registry client bound to one authentication strategy.
///
/// Cheap to build; construct one per inbound request.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    auth: AuthStrategy,
    timeout: Duration,
}

impl RegistryClient {
    pub fn new(auth: AuthStrategy) -> Self {
        Self {
            auth,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// Override the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn auth(&self) -> &AuthStrategy {
        &self.auth
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn oci_client() -> Client {
        let mut config = ClientConfig::default();
        config.user_agent = concat!("ocireg-mcp/", env!("CARGO_PKG_VERSION"));
        Client::new(config)
    }

    async fn bounded<T, F>(&self, fut: F) -> std::result::Result<T, CallError>
    where
        F: Future<Output = std::result::Result<T, OciDistributionError>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result.map_err(CallError::Registry),
            Err(_) => Err(CallError::TimedOut(self.timeout)),
        }
    }
}

/// Outcome of a failed bounded registry call.
enum CallError {
    Registry(OciDistributionError),
    TimedOut(Duration),
}

impl fmt::Display for CallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Registry(e) => write!(f, "{}", e),
            Self::TimedOut(timeout) => write!(f, "request timed out after {}s", timeout.as_secs()),
        }
    }
}

impl CallError {
    fn into_fetch(self) -> RegistryError {
        match self {
            Self::Registry(e) => classify_pull_error(e),
            timed_out => RegistryError::Fetch(timed_out.to_string()),
        }
    }

    fn into_list(self) -> RegistryError {
        RegistryError::List(self.to_string())
    }
}

#[async_trait::async_trait]
impl ImageRegistry for RegistryClient {
    async fn get_image(&self, image_ref: &str) -> Result<ImageHandle> {
        let reference = parse_reference(image_ref)?;
        let auth = self.auth.registry_auth(reference.registry()).await;
        let client = Self::oci_client();

        tracing::debug!(image = %reference, auth = self.auth.kind(), "Fetching image");

        let (manifest, digest, config) = self
            .bounded(client.pull_manifest_and_config(&reference, &auth))
            .await
            .map_err(CallError::into_fetch)?;

        let image = ImageHandle::new(image_ref, manifest, digest, config);
        tracing::debug!(image = image.reference(), digest = image.digest(), "Fetched image");
        Ok(image)
    }

    async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        let reference = parse_repository(repository)?;
        let auth = self.auth.registry_auth(reference.registry()).await;
        let client = Self::oci_client();

        tracing::debug!(
            repository = reference.repository(),
            registry = reference.registry(),
            "Listing tags"
        );

        let response = self
            .bounded(client.list_tags(&reference, &auth, None, None))
            .await
            .map_err(CallError::into_list)?;

        Ok(response.tags)
    }
}

/// Parse an image reference (`[registry/]repository[:tag][@digest]`).
pub fn parse_reference(image_ref: &str) -> Result<Reference> {
    image_ref
        .parse::<Reference>()
        .map_err(|e| RegistryError::ParseReference(e.to_string()))
}

/// Parse a repository name; tags and digests are rejected.
pub fn parse_repository(repository: &str) -> Result<Reference> {
    let last_segment = repository.rsplit('/').next().unwrap_or(repository);
    if repository.contains('@') || last_segment.contains(':') {
        return Err(RegistryError::ParseRepository(format!(
            "repository must not include a tag or digest: {}",
            repository
        )));
    }

    repository
        .parse::<Reference>()
        .map_err(|e| RegistryError::ParseRepository(e.to_string()))
}

fn classify_pull_error(err: OciDistributionError) -> RegistryError {
    match err {
        e @ (OciDistributionError::ManifestParsingError(_)
        | OciDistributionError::VersionedParsingError(_)
        | OciDistributionError::UnsupportedSchemaVersionError(_)
        | OciDistributionError::UnsupportedMediaTypeError(_)) => {
            RegistryError::Manifest(e.to_string())
        }
        e => RegistryError::Fetch(e.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INVALID_REFERENCE: &str = "invalid:reference:format";

    fn client() -> RegistryClient {
        RegistryClient::new(AuthStrategy::Bearer("test-token".to_string()))
    }

    #[test]
    fn test_new_client_defaults() {
        let client = RegistryClient::new(AuthStrategy::DefaultKeychain);
        assert_eq!(client.timeout(), DEFAULT_TIMEOUT);
        assert_eq!(client.auth(), &AuthStrategy::DefaultKeychain);
    }

    #[tokio::test]
    async fn test_get_image_invalid_reference() {
        let err = client().get_image(INVALID_REFERENCE).await.unwrap_err();
        assert!(matches!(err, RegistryError::ParseReference(_)));
        assert!(err.to_string().contains("parsing image reference"));
    }

    #[tokio::test]
    async fn test_get_manifest_invalid_reference() {
        let err = client().get_manifest(INVALID_REFERENCE).await.unwrap_err();
        assert!(err.to_string().contains("parsing image reference"));
    }

    #[tokio::test]
    async fn test_get_config_invalid_reference() {
        let err = client().get_config(INVALID_REFERENCE).await.unwrap_err();
        assert!(err.to_string().contains("parsing image reference"));
    }

    #[tokio::test]
    async fn test_list_tags_unreachable_repository() {
        let client = RegistryClient::new(AuthStrategy::Bearer("test-token".to_string()))
            .with_timeout(Duration::from_secs(5));

        let err = client.list_tags("invalid/repo/format").await.unwrap_err();
        assert!(matches!(err, RegistryError::List(_)));
        assert!(err.to_string().contains("listing tags"));
    }

    #[test]
    fn test_parse_repository_rejects_tag_and_digest() {
        let err = parse_repository("docker.io/library/alpine:latest").unwrap_err();
        assert!(err.to_string().contains("parsing repository name"));

        assert!(parse_repository("docker.io/library/alpine@sha256:abc").is_err());
    }

    #[test]
    fn test_parse_repository_accepts_registry_port() {
        let reference = parse_repository("localhost:5000/team/app").unwrap();
        assert_eq!(reference.registry(), "localhost:5000");
        assert_eq!(reference.repository(), "team/app");
    }

    #[test]
    fn test_manifest_decode_failures_are_manifest_errors() {
        let err = classify_pull_error(OciDistributionError::ManifestParsingError(
            "expected value".to_string(),
        ));
        assert!(matches!(err, RegistryError::Manifest(_)));
        assert!(err.to_string().starts_with("getting manifest: "));

        let err = classify_pull_error(OciDistributionError::UnsupportedMediaTypeError(
            "application/x-unknown".to_string(),
        ));
        assert!(matches!(err, RegistryError::Manifest(_)));

        let err = classify_pull_error(OciDistributionError::AuthenticationFailure(
            "denied".to_string(),
        ));
        assert!(matches!(err, RegistryError::Fetch(_)));
        assert!(err.to_string().starts_with("fetching image: "));
    }

    #[tokio::test(start_paused = true)]
    async fn test_registry_call_timeout() {
        let client = client();

        let never = std::future::pending::<std::result::Result<(), OciDistributionError>>();
        let err = match client.bounded(never).await {
            Err(e) => e.into_fetch(),
            Ok(()) => panic!("pending call completed"),
        };
        assert_eq!(
            err,
            RegistryError::Fetch("request timed out after 30s".to_string())
        );

        let client = client.with_timeout(Duration::from_secs(5));
        let never = std::future::pending::<std::result::Result<(), OciDistributionError>>();
        let err = match client.bounded(never).await {
            Err(e) => e.into_list(),
            Ok(()) => panic!("pending call completed"),
        };
        assert_eq!(err.to_string(), "listing tags: request timed out after 5s");
    }

    #[test]
    fn test_config_decode_error() {
        let manifest: OciImageManifest = serde_json::from_value(serde_json::json!({
            "schemaVersion": 2,
            "config": {
                "mediaType": "application/vnd.oci.image.config.v1+json",
                "digest": "sha256:abc",
                "size": 2
            },
            "layers": []
        }))
        .unwrap();
        let image = ImageHandle::new("example.com/app:1", manifest, "sha256:def", "not json");

        let err = image.config().unwrap_err();
        assert!(matches!(err, RegistryError::Config(_)));
        assert_eq!(image.reference(), "example.com/app:1");
        assert_eq!(image.digest(), "sha256:def");
    }
}
