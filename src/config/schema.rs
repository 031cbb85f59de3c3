//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the service.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the conversion service.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind ip and port).
    pub listener: ListenerConfig,

    /// Upload and concurrency limits.
    pub limits: LimitsConfig,

    /// Static form page and assets.
    pub static_files: StaticFilesConfig,

    /// Encoder settings.
    pub conversion: ConversionConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerConfig {
    /// IP to bind.
    pub ip: String,

    /// Port to bind.
    pub port: u16,
}

impl ListenerConfig {
    /// `ip:port`, bracketing IPv6 literals.
    pub fn bind_address(&self) -> String {
        if self.ip.contains(':') {
            format!("[{}]:{}", self.ip, self.port)
        } else {
            format!("{}:{}", self.ip, self.port)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            ip: "0.0.0.0".to_string(),
            port: 8191,
        }
    }
}

/// Upload and concurrency limits.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum upload size in MiB.
    pub max_size_mb: u64,

    /// Maximum number of conversions running at once.
    pub max_concurrent: usize,
}

impl LimitsConfig {
    /// Upload ceiling in bytes.
    pub fn max_upload_bytes(&self) -> u64 {
        self.max_size_mb << 20
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_size_mb: 2,
            max_concurrent: 10,
        }
    }
}

/// Static file configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct StaticFilesConfig {
    /// Directory holding `index.html`, `css/` and `fonts/`.
    pub serve_path: String,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            serve_path: "/opt/heicker/public".to_string(),
        }
    }
}

/// Target encoder configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ConversionConfig {
    /// JPEG quality, 1-100.
    pub jpeg_quality: u8,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self { jpeg_quality: 75 }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 60 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
