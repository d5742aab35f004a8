use std::path::PathBuf;

use clap::Parser;
use serde::{Deserialize, Serialize};

/// Hellogate start up arguments
#[derive(Debug, Serialize, Deserialize, Clone, Parser)]
#[command(version, about, long_about = None)]
pub struct Args {
    /// The config file path, a toml file
    ///
    /// # Example
    /// `-c /path/to/config.toml`
    #[arg(short, long, env = "HELLOGATE_CONFIG", required_unless_present = "dump")]
    pub config: Option<PathBuf>,
    /// Print the registered plugins as json and exit
    #[arg(long)]
    pub dump: bool,
}
