//! Default credential store backed by Docker's `config.json`
//!
//! The file lives at `$DOCKER_CONFIG/config.json`, or `~/.docker/config.json`
//! when `DOCKER_CONFIG` is unset. Only inline `auths` entries are read;
//! credential helpers are not invoked.

use base64::Engine;
use oci_client::secrets::RegistryAuth;
use serde::Deserialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Environment variable overriding the Docker config directory.
pub const DOCKER_CONFIG_ENV: &str = "DOCKER_CONFIG";

const DOCKER_HUB_LEGACY_KEY: &str = "https://index.docker.io/v1/";

/// Failure to load the credential store.
#[derive(Debug, thiserror::Error)]
pub enum CredentialStoreError {
    #[error("cannot determine home directory")]
    NoHome,

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Parsed `auths` section of a Docker config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DockerConfigAuth {
    #[serde(default)]
    auths: HashMap<String, AuthEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct AuthEntry {
    /// Base64-encoded "username:password"
    auth: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

impl DockerConfigAuth {
    /// Load from the default location. A missing file is an empty store.
    pub fn load() -> Result<Self, CredentialStoreError> {
        let path = Self::default_config_path()?;
        Self::load_from_path(&path)
    }

    /// Load from a specific path. A missing file is an empty store.
    pub fn load_from_path(path: &Path) -> Result<Self, CredentialStoreError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let contents = std::fs::read_to_string(path).map_err(|source| CredentialStoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        serde_json::from_str(&contents).map_err(|source| CredentialStoreError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Get `(username, password)` for a registry host.
    pub fn get_credentials(&self, registry: &str) -> Option<(String, String)> {
        if let Some(entry) = self.auths.get(registry) {
            return entry.credentials();
        }

        if let Some(entry) = self.auths.get(&format!("https://{}", registry)) {
            return entry.credentials();
        }

        if is_docker_hub(registry) {
            if let Some(entry) = self.auths.get(DOCKER_HUB_LEGACY_KEY) {
                return entry.credentials();
            }
        }

        None
    }

    /// Translate the stored credentials for `registry` into client auth.
    pub fn registry_auth(&self, registry: &str) -> RegistryAuth {
        match self.get_credentials(registry) {
            Some((username, password)) => RegistryAuth::Basic(username, password),
            None => {
                tracing::debug!(registry, "No stored credentials, using anonymous access");
                RegistryAuth::Anonymous
            }
        }
    }

    fn default_config_path() -> Result<PathBuf, CredentialStoreError> {
        if let Some(dir) = std::env::var_os(DOCKER_CONFIG_ENV).filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir).join("config.json"));
        }

        let home = dirs::home_dir().ok_or(CredentialStoreError::NoHome)?;
        Ok(home.join(".docker").join("config.json"))
    }
}

impl AuthEntry {
    fn credentials(&self) -> Option<(String, String)> {
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            return Some((username.clone(), password.clone()));
        }

        self.auth.as_deref().and_then(decode_auth)
    }
}

fn decode_auth(auth: &str) -> Option<(String, String)> {
    let decoded = base64::engine::general_purpose::STANDARD.decode(auth).ok()?;
    let decoded = String::from_utf8(decoded).ok()?;
    let (username, password) = decoded.split_once(':')?;
    Some((username.to_string(), password.to_string()))
}

fn is_docker_hub(registry: &str) -> bool {
    matches!(
        registry,
        "docker.io" | "index.docker.io" | "registry-1.docker.io"
    )
}

/// Resolve credentials for `registry` from the default credential store.
///
/// The file is read on the blocking pool. Load failures fall back to
/// anonymous access; the registry call reports whatever authentication
/// error follows.
pub async fn keychain_auth(registry: &str) -> RegistryAuth {
    match tokio::task::spawn_blocking(DockerConfigAuth::load).await {
        Ok(Ok(store)) => store.registry_auth(registry),
        Ok(Err(e)) => {
            tracing::warn!(registry, error = %e, "Failed to load Docker config, using anonymous access");
            RegistryAuth::Anonymous
        }
        Err(e) => {
            tracing::warn!(registry, error = %e, "Docker config lookup task failed, using anonymous access");
            RegistryAuth::Anonymous
        }
    }
}
