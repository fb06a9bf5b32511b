pub const SERVICE_NAME: &str = "ocireg-mcp";
pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
pub const MCP_PORT_ENV: &str = "MCP_PORT";

/// Runtime configuration assembled from the command line and environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    pub version: String,
}

impl ServerConfig {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            name: SERVICE_NAME.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, DEFAULT_PORT)
    }
}

/// Port from the `MCP_PORT` value. Unset or empty selects the default;
/// anything unusable is logged and replaced by the default.
pub fn port_from_env(value: Option<&str>) -> u16 {
    let value = match value {
        Some(value) if !value.is_empty() => value,
        _ => return DEFAULT_PORT,
    };

    let port: i64 = match value.parse() {
        Ok(port) => port,
        Err(_) => {
            tracing::warn!(
                "Invalid {} value: {} (must be a valid number), using default port {}",
                MCP_PORT_ENV,
                value,
                DEFAULT_PORT
            );
            return DEFAULT_PORT;
        }
    };

    u16::try_from(port).unwrap_or_else(|_| {
        tracing::warn!(
            "Invalid {} value: {} (must be between 0 and 65535), using default port {}",
            MCP_PORT_ENV,
            value,
            DEFAULT_PORT
        );
        DEFAULT_PORT
    })
}

/// Final listen port: the command line wins over the environment.
pub fn resolve_port(cli_port: Option<i64>, env_port: u16) -> u16 {
    let Some(port) = cli_port else {
        return env_port;
    };

    u16::try_from(port).unwrap_or_else(|_| {
        tracing::warn!(
            "Invalid port number: {} (must be between 0 and 65535), using default port {}",
            port,
            DEFAULT_PORT
        );
        DEFAULT_PORT
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_from_env() {
        let cases = [
            (Some("9090"), 9090),
            (None, DEFAULT_PORT),
            (Some(""), DEFAULT_PORT),
            (Some("not-a-number"), DEFAULT_PORT),
            (Some("0"), 0),
            (Some("-1"), DEFAULT_PORT),
            (Some("65536"), DEFAULT_PORT),
            (Some("65535"), 65535),
            (Some(" 9090"), DEFAULT_PORT),
        ];

        for (value, expected) in cases {
            assert_eq!(port_from_env(value), expected, "MCP_PORT={:?}", value);
        }
    }

    #[test]
    fn test_resolve_port() {
        assert_eq!(resolve_port(None, 9090), 9090);
        assert_eq!(resolve_port(Some(3000), 9090), 3000);
        assert_eq!(resolve_port(Some(0), 9090), 0);
        assert_eq!(resolve_port(Some(-5), 9090), DEFAULT_PORT);
        assert_eq!(resolve_port(Some(70000), 9090), DEFAULT_PORT);
    }

    #[test]
    fn test_server_config() {
        let config = ServerConfig::default();
        assert_eq!(config.addr(), "0.0.0.0:8080");
        assert_eq!(config.name, "ocireg-mcp");
        assert!(!config.version.is_empty());
    }
}
