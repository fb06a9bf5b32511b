// Core registry access for the OCI registry MCP server

pub mod auth;
pub mod client;
pub mod error;
pub mod factory;
pub mod image;

pub use auth::{resolve_auth, AuthStrategy, EnvCredentials};
pub use client::{ImageHandle, ImageRegistry, RegistryClient, DEFAULT_TIMEOUT};
pub use error::{RegistryError, Result};
pub use factory::{ClientFactory, EnvClientFactory, FixedClient};
pub use image::ImageInfo;

// Re-exported so downstream crates name the same manifest type.
pub use oci_client::manifest::OciImageManifest;
