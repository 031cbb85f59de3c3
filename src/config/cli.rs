//! Command-line flags.

use std::path::PathBuf;

use clap::Parser;

use crate::config::schema::ServiceConfig;

/// Flags override values from the config file or the compiled-in defaults.
#[derive(Debug, Parser)]
#[command(name = "heicker")]
#[command(about = "HEIC to JPEG conversion service", version)]
pub struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// IP to bind
    #[arg(long)]
    pub ip: Option<String>,

    /// Port to bind
    #[arg(long)]
    pub port: Option<u16>,

    /// Maximum file upload size in MB
    #[arg(long)]
    pub max_size_mb: Option<u64>,

    /// Maximum number of allowable concurrent requests
    #[arg(long)]
    pub max_concurrent: Option<usize>,

    /// Serve filepath
    #[arg(long)]
    pub serve_path: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,
}

impl Cli {
    pub fn apply(&self, config: &mut ServiceConfig) {
        if let Some(ip) = &self.ip {
            config.listener.ip = ip.clone();
        }
        if let Some(port) = self.port {
            config.listener.port = port;
        }
        if let Some(mb) = self.max_size_mb {
            config.limits.max_size_mb = mb;
        }
        if let Some(n) = self.max_concurrent {
            config.limits.max_concurrent = n;
        }
        if let Some(path) = &self.serve_path {
            config.static_files.serve_path = path.clone();
        }
        if let Some(level) = &self.log_level {
            config.observability.log_level = level.clone();
        }
    }
}
