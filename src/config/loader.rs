// Configuration loader
// Loads client settings from ~/.ipfs-stac/config.toml when present,
// falling back to built-in defaults.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use super::settings::{ClientConfig, DEFAULT_API_PORT, DEFAULT_GATEWAY_PORT};
use crate::errors::ConfigError;

#[derive(Debug, Deserialize)]
struct TomlConfig {
    #[serde(default = "default_host")]
    host_address: String,
    #[serde(default = "default_api_port")]
    api_port: u16,
    #[serde(default = "default_gateway_port")]
    gateway_port: u16,
    #[serde(default)]
    stac_endpoint: Option<String>,
    #[serde(default = "default_daemon_binary")]
    daemon_binary: String,
    #[serde(default = "default_auto_spawn")]
    auto_spawn: bool,
    #[serde(default)]
    request_timeout_secs: Option<u64>,
}

fn default_auto_spawn() -> bool {
    true
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
    DEFAULT_API_PORT
}

fn default_gateway_port() -> u16 {
    DEFAULT_GATEWAY_PORT
}

fn default_daemon_binary() -> String {
    "ipfs".to_string()
}

/// Load configuration from the default config file, or defaults when the
/// file does not exist.
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    match dirs::home_dir() {
        Some(home) => {
            let path = home.join(".ipfs-stac/config.toml");
            if path.exists() {
                load_from_path(&path)
            } else {
                ClientConfig::builder().build()
            }
        }
        None => ClientConfig::builder().build(),
    }
}

/// Load configuration from an explicit TOML file path.
pub fn load_from_path(path: &Path) -> Result<ClientConfig, ConfigError> {
    let display = path.display().to_string();
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: display.clone(),
        source,
    })?;

    let parsed: TomlConfig = toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: display,
        source,
    })?;

    let mut builder = ClientConfig::builder()
        .host_address(parsed.host_address)
        .api_port(parsed.api_port)
        .gateway_port(parsed.gateway_port)
        .daemon_binary(parsed.daemon_binary)
        .auto_spawn(parsed.auto_spawn);

    if let Some(endpoint) = parsed.stac_endpoint {
        builder = builder.stac_endpoint(endpoint);
    }
    if let Some(secs) = parsed.request_timeout_secs {
        builder = builder.request_timeout(Duration::from_secs(secs));
    }

    builder.build()
}
