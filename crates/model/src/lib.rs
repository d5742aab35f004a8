pub mod plugin;
use std::net::SocketAddr;

pub use plugin::*;

pub mod constants;
use serde::{Deserialize, Serialize};

/// Configuration of the demonstration host.
///
/// Plugin instances are created in the order they are listed, the order they run in
/// is decided by their priority.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Socket address the host listens on.
    pub listen: SocketAddr,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<PluginConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen: constants::DEFAULT_LISTEN,
            plugins: Default::default(),
        }
    }
}

impl Config {
    pub fn plugin_ids(&self) -> impl Iterator<Item = &PluginInstanceId> {
        self.plugins.iter().map(|config| &config.id)
    }
}
