// Configuration structs
//
// The client is configured explicitly at construction; nothing here
// mutates process-wide environment state.

use std::time::Duration;

use crate::errors::ConfigError;

/// Default Kubo RPC API port.
pub const DEFAULT_API_PORT: u16 = 5001;
/// Default HTTP gateway port.
pub const DEFAULT_GATEWAY_PORT: u16 = 8080;
/// Default bound for control-plane requests (health check, pin, search).
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Immutable client configuration.
///
/// Both ports are required; use [`ClientConfig::builder`] to override the
/// defaults or to load from a config file via [`super::load_config`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Gateway host, without scheme or port (e.g. "127.0.0.1").
    pub host_address: String,

    /// Kubo RPC API port.
    pub api_port: u16,

    /// HTTP gateway port used for content reads.
    pub gateway_port: u16,

    /// STAC API endpoint, if catalog search is used.
    pub stac_endpoint: Option<String>,

    /// Name of the daemon binary to probe for and launch.
    pub daemon_binary: String,

    /// Whether to supervise (probe/launch/health-check) a local daemon at
    /// client construction. Only applies when the host is local.
    pub auto_spawn: bool,

    /// Bounded timeout applied to control-plane requests.
    pub request_timeout: Duration,
}

impl ClientConfig {
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Base URL of the Kubo RPC API, e.g. `http://127.0.0.1:5001/api/v0`.
    pub fn api_url(&self) -> String {
        format!("http://{}:{}/api/v0", self.host_address, self.api_port)
    }

    /// Base URL of the HTTP gateway, e.g. `http://127.0.0.1:8080`.
    pub fn gateway_url(&self) -> String {
        format!("http://{}:{}", self.host_address, self.gateway_port)
    }

    /// Whether the configured gateway is on this host. Daemon supervision
    /// only applies to local nodes.
    pub fn is_local(&self) -> bool {
        matches!(self.host_address.as_str(), "127.0.0.1" | "localhost" | "::1")
    }
}

/// Builder for [`ClientConfig`].
///
/// Ports default to the standard Kubo values but may be explicitly unset;
/// `build` then fails with [`ConfigError::MissingPort`].
#[derive(Debug, Clone)]
pub struct ClientConfigBuilder {
    host_address: String,
    api_port: Option<u16>,
    gateway_port: Option<u16>,
    stac_endpoint: Option<String>,
    daemon_binary: String,
    auto_spawn: bool,
    request_timeout: Duration,
}

impl Default for ClientConfigBuilder {
    fn default() -> Self {
        Self {
            host_address: "127.0.0.1".to_string(),
            api_port: Some(DEFAULT_API_PORT),
            gateway_port: Some(DEFAULT_GATEWAY_PORT),
            stac_endpoint: None,
            daemon_binary: "ipfs".to_string(),
            auto_spawn: true,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl ClientConfigBuilder {
    pub fn host_address(mut self, host: impl Into<String>) -> Self {
        self.host_address = host.into();
        self
    }

    /// Set or clear the API port. Passing `None` makes `build` fail.
    pub fn api_port(mut self, port: impl Into<Option<u16>>) -> Self {
        self.api_port = port.into();
        self
    }

    /// Set or clear the gateway port. Passing `None` makes `build` fail.
    pub fn gateway_port(mut self, port: impl Into<Option<u16>>) -> Self {
        self.gateway_port = port.into();
        self
    }

    pub fn stac_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.stac_endpoint = Some(endpoint.into());
        self
    }

    pub fn daemon_binary(mut self, binary: impl Into<String>) -> Self {
        self.daemon_binary = binary.into();
        self
    }

    pub fn auto_spawn(mut self, auto_spawn: bool) -> Self {
        self.auto_spawn = auto_spawn;
        self
    }

    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn build(self) -> Result<ClientConfig, ConfigError> {
        let api_port = self.api_port.ok_or(ConfigError::MissingPort("api_port"))?;
        let gateway_port = self
            .gateway_port
            .ok_or(ConfigError::MissingPort("gateway_port"))?;

        if api_port == 0 {
            return Err(ConfigError::InvalidPort {
                name: "api_port",
                value: api_port,
            });
        }
        if gateway_port == 0 {
            return Err(ConfigError::InvalidPort {
                name: "gateway_port",
                value: gateway_port,
            });
        }

        Ok(ClientConfig {
            host_address: self.host_address,
            api_port,
            gateway_port,
            stac_endpoint: self.stac_endpoint,
            daemon_binary: self.daemon_binary,
            auto_spawn: self.auto_spawn,
            request_timeout: self.request_timeout,
        })
    }
}
