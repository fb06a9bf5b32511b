//! Registry authentication
//!
//! Resolves which credentials outbound registry calls use and turns the
//! chosen strategy into `oci_client` auth once the target registry is known.

pub mod docker_config;
pub mod resolver;

pub use docker_config::{keychain_auth, CredentialStoreError, DockerConfigAuth, DOCKER_CONFIG_ENV};
pub use resolver::{
    resolve_auth, AuthStrategy, EnvCredentials, PASSWORD_ENV, TOKEN_ENV, USERNAME_ENV,
};

use oci_client::secrets::RegistryAuth;

impl AuthStrategy {
    /// Concrete client auth for a registry host.
    pub async fn registry_auth(&self, registry: &str) -> RegistryAuth {
        match self {
            Self::Bearer(token) => RegistryAuth::Bearer(token.clone()),
            Self::Basic { username, password } => {
                RegistryAuth::Basic(username.clone(), password.clone())
            }
            Self::DefaultKeychain => keychain_auth(registry).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_explicit_strategies_map_directly() {
        let auth = AuthStrategy::Bearer("token".to_string())
            .registry_auth("ghcr.io")
            .await;
        assert!(matches!(auth, RegistryAuth::Bearer(ref t) if t == "token"));

        let auth = AuthStrategy::Basic {
            username: "user".to_string(),
            password: "pass".to_string(),
        }
        .registry_auth("ghcr.io")
        .await;
        assert!(matches!(auth, RegistryAuth::Basic(ref u, ref p) if u == "user" && p == "pass"));
    }

    #[tokio::test]
    async fn test_default_keychain_reads_docker_config() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("config.json"),
            r#"{"auths": {"ghcr.io": {"auth": "dXNlcm5hbWU6cGFzc3dvcmQ="}}}"#,
        )
        .unwrap();
        std::env::set_var(DOCKER_CONFIG_ENV, temp_dir.path());

        let found = AuthStrategy::DefaultKeychain.registry_auth("ghcr.io").await;
        let missing = AuthStrategy::DefaultKeychain.registry_auth("quay.io").await;
        std::env::remove_var(DOCKER_CONFIG_ENV);

        assert!(matches!(
            found,
            RegistryAuth::Basic(ref u, ref p) if u == "username" && p == "password"
        ));
        assert!(matches!(missing, RegistryAuth::Anonymous));
    }
}
