// Derived image summary for the image-info tool

use crate::client::ImageHandle;
use crate::error::Result;
use chrono::{DateTime, FixedOffset, SecondsFormat};
use serde::{Deserialize, Serialize};

/// Creation time reported when the config carries none.
pub const UNKNOWN_CREATED: &str = "0001-01-01T00:00:00Z";

/// Summary of an image: config descriptor plus the platform fields of its config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageInfo {
    /// Digest of the config blob.
    pub digest: String,
    /// Size of the config blob in bytes.
    pub size: i64,
    pub architecture: String,
    pub os: String,
    /// RFC3339, second precision.
    pub created: String,
    /// Number of layers in the manifest.
    pub layers: usize,
}

/// The fields of an image config the summary needs.
#[derive(Debug, Default, Deserialize)]
struct PlatformConfig {
    #[serde(default)]
    architecture: Option<String>,
    #[serde(default)]
    os: Option<String>,
    #[serde(default)]
    created: Option<DateTime<FixedOffset>>,
}

impl ImageInfo {
    /// Build the summary from a fetched image. Fails if the config blob is not
    /// valid JSON.
    pub fn from_image(image: &ImageHandle) -> Result<Self> {
        let manifest = image.manifest();
        let config: PlatformConfig = image.config_as()?;

        Ok(Self {
            digest: manifest.config.digest.clone(),
            size: manifest.config.size,
            architecture: config.architecture.unwrap_or_default(),
            os: config.os.unwrap_or_default(),
            created: config
                .created
                .map(|created| created.to_rfc3339_opts(SecondsFormat::Secs, true))
                .unwrap_or_else(|| UNKNOWN_CREATED.to_string()),
            layers: manifest.layers.len(),
        })
    }
}
