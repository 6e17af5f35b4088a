// Configuration module
// Public interface for client configuration

mod loader;
mod settings;

pub use loader::{load_config, load_from_path};
pub use settings::{ClientConfig, ClientConfigBuilder};
