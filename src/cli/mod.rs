// CLI module for quotagate
// Author: kelexine (https://github.com/kelexine)

use crate::config::AppConfig;
use clap::Parser;
use std::path::PathBuf;

/// quotagate - Quota-enforcing, response-caching gateway for LLM chat APIs
#[derive(Parser, Debug)]
#[command(name = "quotagate", version, about, long_about = None)]
pub struct Args {
    /// Path to a TOML config file (default: ~/.quotagate/config.toml)
    #[arg(short, long, env = "QUOTAGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Override the bind address
    #[arg(long)]
    pub host: Option<String>,

    /// Override the listen port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl Args {
    /// Apply command-line overrides on top of the loaded configuration
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(host) = &self.host {
            config.server.host = host.clone();
        }
        if let Some(port) = self.port {
            config.server.port = port;
        }
    }
}
