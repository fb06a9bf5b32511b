// Error taxonomy for registry operations

/// Result type for registry operations.
pub type Result<T> = std::result::Result<T, RegistryError>;

/// Errors surfaced by the registry client adapter.
///
/// The display prefixes are stable; callers match on them in user-facing text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    /// The image reference could not be parsed.
    #[error("parsing image reference: {0}")]
    ParseReference(String),

    /// The repository name could not be parsed.
    #[error("parsing repository name: {0}")]
    ParseRepository(String),

    /// Network or registry-protocol failure while fetching an image.
    #[error("fetching image: {0}")]
    Fetch(String),

    /// The registry returned a manifest that could not be decoded.
    #[error("getting manifest: {0}")]
    Manifest(String),

    /// The config blob could not be decoded.
    #[error("getting config: {0}")]
    Config(String),

    /// Network or registry-protocol failure while listing tags.
    #[error("listing tags: {0}")]
    List(String),
}

impl RegistryError {
    /// Short machine-friendly label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ParseReference(_) | Self::ParseRepository(_) => "parse",
            Self::Fetch(_) => "fetch",
            Self::Manifest(_) => "manifest",
            Self::Config(_) => "config",
            Self::List(_) => "list",
        }
    }
}
