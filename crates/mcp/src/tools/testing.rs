// In-memory registry double for tool tests

use ocireg_core::{ImageHandle, ImageRegistry, OciImageManifest, RegistryError, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const ALPINE: &str = "docker.io/library/alpine:3.19";

pub const ALPINE_CONFIG: &str = r#"{
    "architecture": "amd64",
    "os": "linux",
    "created": "2024-01-27T00:30:48.743965523Z",
    "config": {"Env": ["PATH=/usr/local/sbin:/usr/local/bin:/usr/sbin:/usr/bin:/sbin:/bin"], "Cmd": ["/bin/sh"]},
    "rootfs": {"type": "layers", "diff_ids": ["sha256:d4fc045c9e3a848011de66f34b81f052d4f2c15a17bb196d637e526349601820"]},
    "history": [{"created": "2024-01-27T00:30:48.624602109Z", "created_by": "ADD file:37a76ec18f9887751cd8473744917d08b7431fc4085097bb6a09d81b41775473 in / "}]
}"#;

pub fn alpine_manifest() -> OciImageManifest {
    serde_json::from_value(serde_json::json!({
        "schemaVersion": 2,
        "mediaType": "application/vnd.oci.image.manifest.v1+json",
        "config": {
            "mediaType": "application/vnd.oci.image.config.v1+json",
            "digest": "sha256:05455a08881ea9cf0e752bc48e61bbd71a34c029bb13df01e40e3e70e0d007bd",
            "size": 1471
        },
        "layers": [{
            "mediaType": "application/vnd.oci.image.layer.v1.tar+gzip",
            "digest": "sha256:4abcf20661432fb2d719aaf90656f55c287f8ca915dc1c92ec14ff61e67fbaf8",
            "size": 3408729
        }],
        "annotations": {"org.opencontainers.image.version": "3.19"}
    }))
    .unwrap()
}

/// Serves canned images and tag lists, counting every call.
#[derive(Default)]
pub struct FakeRegistry {
    images: HashMap<String, (OciImageManifest, String)>,
    tags: HashMap<String, Vec<String>>,
    calls: AtomicUsize,
}

impl FakeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_image(mut self, reference: &str, manifest: OciImageManifest, config: &str) -> Self {
        self.images
            .insert(reference.to_string(), (manifest, config.to_string()));
        self
    }

    pub fn with_alpine(self) -> Self {
        self.with_image(ALPINE, alpine_manifest(), ALPINE_CONFIG)
    }

    pub fn with_tags(mut self, repository: &str, tags: &[&str]) -> Self {
        self.tags.insert(
            repository.to_string(),
            tags.iter().map(|t| t.to_string()).collect(),
        );
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl ImageRegistry for FakeRegistry {
    async fn get_image(&self, image_ref: &str) -> Result<ImageHandle> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ocireg_core::client::parse_reference(image_ref)?;

        let (manifest, config) = self
            .images
            .get(image_ref)
            .ok_or_else(|| RegistryError::Fetch(format!("MANIFEST_UNKNOWN: {}", image_ref)))?;
        Ok(ImageHandle::new(image_ref, manifest.clone(), "sha256:manifest", config.clone()))
    }

    async fn list_tags(&self, repository: &str) -> Result<Vec<String>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        ocireg_core::client::parse_repository(repository)?;

        self.tags
            .get(repository)
            .cloned()
            .ok_or_else(|| RegistryError::List(format!("NAME_UNKNOWN: {}", repository)))
    }
}
