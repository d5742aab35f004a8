use hellogate_model::PluginConfig;
use serde::{Deserialize, Serialize};

use crate::layer::{AccessChain, PluginFunction};

/// A configured plugin, living in a [`PluginRepository`](crate::PluginRepository).
#[derive(Debug)]
pub struct PluginInstance {
    pub config: PluginConfig,
    pub priority: i32,
    pub plugin_function: PluginFunction,
}

/// What a host may read back about an instance.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PluginInstanceSnapshot {
    pub config: PluginConfig,
    pub priority: i32,
}

impl PluginInstance {
    pub fn snapshot(&self) -> PluginInstanceSnapshot {
        PluginInstanceSnapshot {
            config: self.config.clone(),
            priority: self.priority,
        }
    }
    /// A chain running only this instance.
    pub fn chain(&self) -> AccessChain {
        AccessChain::new([(self.config.id.clone(), self.plugin_function.clone())])
    }
}
